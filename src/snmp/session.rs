use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use snmp2::AsyncSession;
use tokio::sync::Mutex;
use tokio::time::{Duration, timeout};
use tracing::{debug, info};

use super::{ObjectId, SnmpValue};
use crate::error::WalkError;

const DEFAULT_SNMP_PORT: u16 = 161;

/// Адрес агента и SNMPv2c community.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential {
    address: String,
    community: String,
}

impl Credential {
    /// В `address` можно не указывать порт, тогда используется 161.
    pub fn new(address: impl Into<String>, community: impl Into<String>) -> Self {
        let address = address.into();
        let address = if has_port(&address) {
            address
        } else if address.starts_with('[') {
            format!("{}:{}", address, DEFAULT_SNMP_PORT)
        } else if address.contains(':') {
            format!("[{}]:{}", address, DEFAULT_SNMP_PORT)
        } else {
            format!("{}:{}", address, DEFAULT_SNMP_PORT)
        };
        Self {
            address,
            community: community.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn community(&self) -> &str {
        &self.community
    }
}

fn has_port(address: &str) -> bool {
    if address.starts_with('[') {
        return address.contains("]:");
    }
    // У голого IPv6 несколько двоеточий и нет порта
    address.matches(':').count() == 1
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address)
            .field("community", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: ObjectId,
    pub value: SnmpValue,
}

impl VarBind {
    pub fn new(oid: ObjectId, value: SnmpValue) -> Self {
        Self { oid, value }
    }
}

/// Общая на процесс SNMP сессия, через которую идут все обходы.
///
/// Реализация должна принимать параллельные запросы от планировщика и
/// от воркеров запросов.
#[async_trait]
pub trait SnmpTransport: Send + Sync {
    /// Один GETBULK, начиная после `from`.
    async fn get_bulk(
        &self,
        target: &Credential,
        from: &ObjectId,
        max_repetitions: u32,
    ) -> Result<Vec<VarBind>, WalkError>;

    /// Освобождает сокеты. Последующие запросы падают с транспортной ошибкой.
    async fn close(&self);
}

/// Сессия на `snmp2`. Держит одну UDP сессию на пару агент и community.
pub struct Snmp2Session {
    sessions: Mutex<HashMap<Credential, Arc<Mutex<AsyncSession>>>>,
    request_timeout: Duration,
    closed: AtomicBool,
}

impl Snmp2Session {
    pub fn open(request_timeout: Duration) -> Self {
        info!(timeout_ms = request_timeout.as_millis() as u64, "SNMP session opened");
        Self {
            sessions: Mutex::new(HashMap::new()),
            request_timeout,
            closed: AtomicBool::new(false),
        }
    }

    async fn session_for(&self, target: &Credential) -> Result<Arc<Mutex<AsyncSession>>, WalkError> {
        cached_or_open(&self.sessions, target, || async {
            let session = timeout(
                self.request_timeout,
                AsyncSession::new_v2c(target.address(), target.community().as_bytes(), 2),
            )
            .await
            .map_err(|_| {
                WalkError::Transport(format!("opening session to {} timed out", target.address()))
            })?
            .map_err(|e| {
                WalkError::Transport(format!("cannot open session to {}: {}", target.address(), e))
            })?;
            debug!(agent = target.address(), "SNMP session created");
            Ok(Mutex::new(session))
        })
        .await
    }

    async fn evict(&self, target: &Credential) {
        self.sessions.lock().await.remove(target);
    }
}

/// Возвращает закэшированное значение для `key` или открывает новое. Блокировка кэша
/// на время `open` не держится. При гонке побеждает первая вставка.
async fn cached_or_open<K, V, F, Fut>(
    cache: &Mutex<HashMap<K, Arc<V>>>,
    key: &K,
    open: F,
) -> Result<Arc<V>, WalkError>
where
    K: Eq + Hash + Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, WalkError>>,
{
    if let Some(value) = cache.lock().await.get(key) {
        return Ok(value.clone());
    }
    let opened = Arc::new(open().await?);
    Ok(cache
        .lock()
        .await
        .entry(key.clone())
        .or_insert(opened)
        .clone())
}

#[async_trait]
impl SnmpTransport for Snmp2Session {
    async fn get_bulk(
        &self,
        target: &Credential,
        from: &ObjectId,
        max_repetitions: u32,
    ) -> Result<Vec<VarBind>, WalkError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(WalkError::Transport("SNMP session is closed".to_string()));
        }

        let start = from.to_snmp()?;
        let session = self.session_for(target).await?;
        let mut session = session.lock().await;

        let result = match timeout(
            self.request_timeout,
            session.getbulk(&[&start], 0, max_repetitions),
        )
        .await
        {
            Ok(Ok(resp)) => {
                let mut varbinds = Vec::new();
                for (oid, value) in resp.varbinds {
                    varbinds.push(VarBind::new(
                        ObjectId::from_snmp(&oid)?,
                        SnmpValue::from_snmp(&value),
                    ));
                }
                Ok(varbinds)
            }
            Ok(Err(e)) => Err(WalkError::Transport(format!(
                "GETBULK to {} failed: {}",
                target.address(),
                e
            ))),
            Err(_) => Err(WalkError::Transport(format!(
                "GETBULK to {} timed out after {:?}",
                target.address(),
                self.request_timeout
            ))),
        };
        drop(session);

        // Сокет, пропустивший ответ, может отдать его следующему запросу
        if matches!(result, Err(WalkError::Transport(_))) {
            self.evict(target).await;
        }
        result
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut sessions = self.sessions.lock().await;
        let open = sessions.len();
        sessions.clear();
        info!(sessions = open, "SNMP session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_port_is_appended() {
        assert_eq!(Credential::new("10.0.0.1", "public").address(), "10.0.0.1:161");
        assert_eq!(Credential::new("10.0.0.1:1161", "public").address(), "10.0.0.1:1161");
        assert_eq!(Credential::new("fe80::1", "public").address(), "[fe80::1]:161");
        assert_eq!(Credential::new("[fe80::1]:162", "public").address(), "[fe80::1]:162");
        assert_eq!(Credential::new("[2001:db8::1]", "public").address(), "[2001:db8::1]:161");
    }

    #[test]
    fn debug_hides_community() {
        let text = format!("{:?}", Credential::new("10.0.0.1", "s3cret"));
        assert!(!text.contains("s3cret"));
        assert!(text.contains("10.0.0.1:161"));
    }

    #[tokio::test]
    async fn closed_session_refuses_requests() {
        let session = Snmp2Session::open(Duration::from_millis(50));
        session.close().await;

        let err = session
            .get_bulk(
                &Credential::new("127.0.0.1", "public"),
                &crate::oid![1, 3, 6, 1],
                10,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WalkError::Transport(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_open_does_not_block_other_targets() {
        let cache: Arc<Mutex<HashMap<&'static str, Arc<u32>>>> = Arc::default();

        let slow_cache = cache.clone();
        let slow = tokio::spawn(async move {
            cached_or_open(&*slow_cache, &"slow", || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(1)
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(1)).await;

        let fast = timeout(
            Duration::from_secs(1),
            cached_or_open(&*cache, &"fast", || async { Ok(2) }),
        )
        .await
        .expect("fast target waited for the slow one")
        .unwrap();
        assert_eq!(*fast, 2);

        assert_eq!(*slow.await.unwrap().unwrap(), 1);
        let reused = cached_or_open(&*cache, &"slow", || async { Ok(9) })
            .await
            .unwrap();
        assert_eq!(*reused, 1);
    }
}
