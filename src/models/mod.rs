pub mod history;
pub mod node;

pub use history::HistoryStatsInput;
pub use node::{AddNodeRequest, AddNodeResponse, NodeList};
