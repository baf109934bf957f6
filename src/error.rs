use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ошибка обхода таблицы.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalkError {
    /// Агент недоступен, истёк таймаут или сессия закрыта. Следующий тик повторит попытку.
    #[error("transport error: {0}")]
    Transport(String),
    /// Ответ не соответствует объявленной форме таблицы.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl WalkError {
    pub fn category(&self) -> FaultCategory {
        match self {
            WalkError::Transport(_) => FaultCategory::Transport,
            WalkError::Protocol(_) => FaultCategory::Protocol,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            WalkError::Transport(msg) | WalkError::Protocol(msg) => msg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCategory {
    Transport,
    Protocol,
    Internal,
}

impl fmt::Display for FaultCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultCategory::Transport => "TransportError",
            FaultCategory::Protocol => "ProtocolError",
            FaultCategory::Internal => "InternalError",
        };
        f.write_str(name)
    }
}

/// Значение колонки имеет неверный SNMP тип.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, got {found}")]
pub struct FieldError {
    pub expected: &'static str,
    pub found: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("no subscriber for event stream")]
    NoSubscribers,
}

/// Неуспешный результат запроса по требованию.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{category}: {message}")]
pub struct QueryFault {
    pub category: FaultCategory,
    pub message: String,
}

impl QueryFault {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            category: FaultCategory::Internal,
            message: message.into(),
        }
    }
}

impl From<WalkError> for QueryFault {
    fn from(err: WalkError) -> Self {
        Self {
            category: err.category(),
            message: err.message().to_string(),
        }
    }
}

/// Текст пойманной паники, если его удаётся достать.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
