pub mod oid;
pub mod session;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod value;

pub use oid::{ObjectId, OidParseError};
pub use session::{Credential, Snmp2Session, SnmpTransport, VarBind};
pub use value::SnmpValue;
