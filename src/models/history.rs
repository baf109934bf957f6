use serde::{Deserialize, Serialize};

/// Параметры вызова `GetHistoryStats` по требованию.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryStatsInput {
    pub ip_address: String,
    pub community: String,
}
