//! Сбор истории производительности Ethernet service OAM (MEF SOAM) по SNMPv2c.
//!
//! [`SoamProvider`](provider::SoamProvider) опрашивает каждый зарегистрированный узел по таймеру,
//! обходит `mefSoamDmHistoryStatsTable` и публикует типизированные строки как
//! [`SoamEvent`](collector::SoamEvent). Тот же обход доступен по требованию через
//! [`get_history_stats`](provider::SoamProvider::get_history_stats).

pub mod collector;
pub mod config;
pub mod error;
pub mod formatter;
pub mod handlers;
pub mod mib;
pub mod models;
pub mod provider;
pub mod query;
pub mod routes;
pub mod snmp;
pub mod table;
