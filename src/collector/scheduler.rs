use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

use super::endpoint::MonitoredEndpoint;
use super::registry::EndpointRegistry;
use crate::error::panic_message;

/// Период тика и начальная задержка по умолчанию.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60);

enum State {
    Stopped,
    Running {
        shutdown: watch::Sender<bool>,
        handle: JoinHandle<()>,
    },
}

/// Периодический драйвер: опрашивает каждый зарегистрированный эндпоинт раз за тик.
///
/// Первый тик срабатывает через один период после [`start`](Self::start). Тик, наступивший,
/// пока предыдущий ещё опрашивает, пропускается.
pub struct Scheduler {
    registry: Arc<EndpointRegistry>,
    period: Duration,
    state: Mutex<State>,
    busy: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(registry: Arc<EndpointRegistry>, period: Duration) -> Self {
        Self {
            registry,
            period,
            state: Mutex::new(State::Stopped),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), State::Running { .. })
    }

    /// Запускает цикл тиков. Возвращает `false`, если он уже запущен.
    pub fn start(&self) -> bool {
        let mut state = self.state.lock();
        if matches!(*state, State::Running { .. }) {
            return false;
        }

        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(run(
            self.registry.clone(),
            self.period,
            self.busy.clone(),
            rx,
        ));
        *state = State::Running { shutdown, handle };

        info!(period_secs = self.period.as_secs(), "scheduler started");
        true
    }

    /// Останавливает цикл тиков и ждёт его завершения. Уже начатый тик доходит до конца.
    pub async fn stop(&self) {
        let state = std::mem::replace(&mut *self.state.lock(), State::Stopped);
        let State::Running { shutdown, handle } = state else {
            return;
        };

        let _ = shutdown.send(true);
        if let Err(e) = handle.await {
            error!("scheduler loop ended abnormally: {}", e);
        }
        info!("scheduler stopped");
    }

    /// Выполняет один тик сразу, вне таймера.
    pub async fn run_tick(&self) {
        poll_all(&self.registry.snapshot()).await;
    }
}

async fn run(
    registry: Arc<EndpointRegistry>,
    period: Duration,
    busy: Arc<AtomicBool>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        if busy.swap(true, Ordering::AcqRel) {
            warn!("previous tick still polling, skipping this one");
            continue;
        }

        let endpoints = registry.snapshot();
        debug!(endpoints = endpoints.len(), "tick");
        let guard = BusyGuard(busy.clone());
        tokio::spawn(async move {
            poll_all(&endpoints).await;
            drop(guard);
        });
    }
}

struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Опрашивает все эндпоинты параллельно. Паника в одном опросе логируется и не задевает остальные.
pub(crate) async fn poll_all(endpoints: &[Arc<MonitoredEndpoint>]) {
    let polls = endpoints.iter().map(|endpoint| async move {
        if let Err(payload) = AssertUnwindSafe(endpoint.poll()).catch_unwind().await {
            error!(
                node = endpoint.id(),
                "poll panicked: {}",
                panic_message(payload.as_ref())
            );
        }
    });
    join_all(polls).await;
}
