use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::Path;
use tokio::time::Duration;
use tracing::info;

pub mod nodes;
pub mod settings;

pub use nodes::NodeConfig;
pub use settings::Settings;

use crate::snmp::{Credential, ObjectId};
use crate::table::WalkSettings;

pub const DEFAULT_CONFIG_PATH: &str = "./config/soam-collector.yaml";

/// Конфигурация приложения: настройки плюс узлы, опрашиваемые со старта.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub settings: Settings,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

impl AppConfig {
    /// Загружает из `SOAM_CONFIG`, иначе из пути по умолчанию, иначе встроенные значения.
    pub fn from_env() -> Result<Self> {
        match env::var("SOAM_CONFIG") {
            Ok(path) => Self::load(path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH),
            Err(_) => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Загружает и проверяет YAML файл.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = serde_yml::from_str(content).context("failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.settings;
        if s.connection.request_timeout_secs == 0 {
            bail!("connection.request_timeout_secs must be positive");
        }
        if s.connection.walk_timeout_secs == 0 {
            bail!("connection.walk_timeout_secs must be positive");
        }
        if s.connection.max_repetitions == 0 {
            bail!("connection.max_repetitions must be positive");
        }
        if s.walk.max_rows == 0 {
            bail!("walk.max_rows must be positive");
        }
        if s.scheduler.period_secs == 0 {
            bail!("scheduler.period_secs must be positive");
        }
        if s.query.max_concurrent == 0 {
            bail!("query.max_concurrent must be positive");
        }
        self.dm_history_entry()?;

        let mut seen = HashSet::new();
        for node in &self.nodes {
            if node.id.is_empty() {
                bail!("node with address {} has an empty id", node.address);
            }
            if !seen.insert(node.id.as_str()) {
                bail!("node id '{}' is listed twice", node.id);
            }
            if node.poll_interval_secs == 0 {
                bail!("node '{}' has a zero poll interval", node.id);
            }
        }
        Ok(())
    }

    /// Адрес HTTP сервера, переопределяется `SOAM_LISTEN`.
    pub fn get_listen(&self) -> String {
        env::var("SOAM_LISTEN").unwrap_or_else(|_| self.settings.server.listen.clone())
    }

    /// Период планировщика, переопределяется `SOAM_POLL_PERIOD` (секунды).
    pub fn get_poll_period(&self) -> Duration {
        Duration::from_secs(env_secs("SOAM_POLL_PERIOD").unwrap_or(self.settings.scheduler.period_secs))
    }

    /// Таймаут одного запроса, переопределяется `SOAM_TIMEOUT` (секунды).
    pub fn get_request_timeout(&self) -> Duration {
        Duration::from_secs(
            env_secs("SOAM_TIMEOUT").unwrap_or(self.settings.connection.request_timeout_secs),
        )
    }

    /// Community для узлов без своего, переопределяется `SOAM_COMMUNITY`.
    pub fn get_community(&self) -> String {
        env::var("SOAM_COMMUNITY").unwrap_or_else(|_| self.settings.auth.community.clone())
    }

    pub fn dm_history_entry(&self) -> Result<ObjectId> {
        let oid = &self.settings.walk.dm_history_table_oid;
        oid.parse::<ObjectId>()
            .with_context(|| format!("walk.dm_history_table_oid '{}' is not an OID", oid))
    }

    pub fn walk_settings(&self) -> WalkSettings {
        WalkSettings {
            max_repetitions: self.settings.connection.max_repetitions,
            max_rows: self.settings.walk.max_rows,
            walk_timeout: Duration::from_secs(self.settings.connection.walk_timeout_secs),
        }
    }

    pub fn node_credential(&self, node: &NodeConfig) -> Credential {
        let community = node
            .community
            .clone()
            .unwrap_or_else(|| self.get_community());
        Credential::new(&node.address, community)
    }

    pub fn debug_config(&self) {
        info!(
            listen = %self.get_listen(),
            period_secs = self.get_poll_period().as_secs(),
            request_timeout_secs = self.get_request_timeout().as_secs(),
            walk_timeout_secs = self.settings.connection.walk_timeout_secs,
            table_oid = %self.settings.walk.dm_history_table_oid,
            nodes = self.nodes.len(),
            "configuration loaded"
        );
    }
}

fn env_secs(name: &str) -> Option<u64> {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|secs| *secs > 0)
}
