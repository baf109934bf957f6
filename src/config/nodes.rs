use serde::{Deserialize, Serialize};

fn default_poll_interval() -> u64 {
    60
}

/// Эндпоинт, регистрируемый при старте.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    /// `host` или `host:port`, по умолчанию порт 161
    pub address: String,
    /// По умолчанию `auth.community`
    #[serde(default)]
    pub community: Option<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}
