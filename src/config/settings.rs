use serde::{Deserialize, Serialize};

/// Настройки из секций `connection`, `auth`, `walk`, `scheduler`, `query`, `server` и
/// `events`. Любую секцию и любое поле можно опустить.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub connection: ConnectionSettings,
    pub auth: AuthSettings,
    pub walk: WalkTableSettings,
    pub scheduler: SchedulerSettings,
    pub query: QuerySettings,
    pub server: ServerSettings,
    pub events: EventSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Таймаут одного SNMP запроса (секунды)
    pub request_timeout_secs: u64,
    /// Лимит времени на весь обход таблицы (секунды)
    pub walk_timeout_secs: u64,
    /// max-repetitions для GETBULK
    pub max_repetitions: u32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 3,
            walk_timeout_secs: 30,
            max_repetitions: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Community для узлов, у которых нет своего
    pub community: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            community: "public".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkTableSettings {
    /// Сколько разных строк оставлять за обход
    pub max_rows: usize,
    /// OID записи mefSoamDmHistoryStatsTable
    pub dm_history_table_oid: String,
}

impl Default for WalkTableSettings {
    fn default() -> Self {
        Self {
            max_rows: 1024,
            dm_history_table_oid: "1.3.6.1.4.1.15007.1.3.1.4.4.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Период тика и начальная задержка (секунды)
    pub period_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self { period_secs: 60 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Сколько обходов по запросу разрешено одновременно
    pub max_concurrent: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self { max_concurrent: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    /// Сколько событий буферизуется на подписчика, прежде чем самый медленный начнёт их терять
    pub channel_capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}
