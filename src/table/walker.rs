use tokio::time::{Duration, Instant, timeout};
use tracing::{debug, warn};

use super::result::WalkResult;
use super::rows::RowSet;
use super::shape::TableShape;
use crate::error::WalkError;
use crate::snmp::{Credential, SnmpTransport, SnmpValue};

/// Лимиты каждого обхода.
#[derive(Debug, Clone)]
pub struct WalkSettings {
    /// max-repetitions для GETBULK.
    pub max_repetitions: u32,
    /// Сколько разных строк оставлять за обход.
    pub max_rows: usize,
    /// Верхняя граница на весь обход, со всеми запросами.
    pub walk_timeout: Duration,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self {
            max_repetitions: 10,
            max_rows: 1024,
            walk_timeout: Duration::from_secs(30),
        }
    }
}

/// Обходит SNMP таблицу через GETBULK и раскладывает varbind'ы по [`TableShape`].
#[derive(Debug, Clone, Default)]
pub struct TableWalker {
    settings: WalkSettings,
}

impl TableWalker {
    pub fn new(settings: WalkSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &WalkSettings {
        &self.settings
    }

    pub async fn walk<B: Default, R>(
        &self,
        session: &dyn SnmpTransport,
        target: &Credential,
        shape: &TableShape<B, R>,
    ) -> Result<WalkResult<R>, WalkError> {
        let started = Instant::now();

        let result = match timeout(
            self.settings.walk_timeout,
            self.walk_rows(session, target, shape),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(WalkError::Transport(format!(
                    "walk of {} on {} exceeded {:?}",
                    shape.name(),
                    target.address(),
                    self.settings.walk_timeout
                )));
            }
        };

        debug!(
            table = shape.name(),
            agent = target.address(),
            rows = result.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "table walk finished"
        );

        if result.is_partial() {
            warn!(
                table = shape.name(),
                agent = target.address(),
                dropped = result.dropped().len(),
                "dropping incomplete rows"
            );
        }
        if result.is_truncated() {
            warn!(
                table = shape.name(),
                agent = target.address(),
                max_rows = self.settings.max_rows,
                "row budget exhausted"
            );
        }

        Ok(result)
    }

    async fn walk_rows<B: Default, R>(
        &self,
        session: &dyn SnmpTransport,
        target: &Credential,
        shape: &TableShape<B, R>,
    ) -> Result<WalkResult<R>, WalkError> {
        let mut rows = RowSet::new(shape, self.settings.max_rows);
        let mut cursor = shape.entry().clone();

        'walk: loop {
            let varbinds = session
                .get_bulk(target, &cursor, self.settings.max_repetitions)
                .await?;

            if varbinds.is_empty() {
                break;
            }

            for varbind in varbinds {
                if varbind.value == SnmpValue::EndOfMibView
                    || !varbind.oid.starts_with(shape.entry())
                {
                    break 'walk;
                }

                // OID должны возрастать, иначе обход не закончится
                if varbind.oid <= cursor {
                    return Err(WalkError::Protocol(format!(
                        "{} returned {} after {}",
                        target.address(),
                        varbind.oid,
                        cursor
                    )));
                }

                rows.accept(&varbind.oid, &varbind.value)?;
                cursor = varbind.oid;
            }
        }

        Ok(rows.finish())
    }
}
