//! Refresh cycles, the active layer, and the periodic timer.
//!
//! # Serialization
//!
//! Every cycle runs while holding `gate`, an async mutex, so at most one
//! fetch → parse → swap is in flight and cycles complete in the order they
//! started. The swap itself happens under the short `state` lock through
//! [`LayerCollection::replace_layer`], so the old layer only leaves the
//! collection once its replacement has parsed.
//!
//! # Overlap
//!
//! A timer tick that finds the gate taken is skipped (`TickSkipped`), never
//! queued. `set_source` and manual refreshes wait for the gate instead. Ticks
//! whose time passes while their own timer is still busy are dropped by the
//! interval itself, which keeps the schedule aligned to `t0 + k * interval`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use foundation::ids::IdAllocator;
use layers::{Layer, LayerCollection, LayerId, SharedLayer};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ParseError, RefreshError};
use crate::events::{CycleTrigger, EventBus, RefreshEvent};
use crate::fetch::SourceFetcher;
use crate::parser::OverlayParser;
use crate::policy::RefreshPolicy;
use crate::source::ValidSource;

/// Back-reference to the layer this scheduler installed.
///
/// The collection owns the layer; this only observes it.
#[derive(Debug, Clone)]
pub struct ActiveLayer {
    id: LayerId,
    layer: Weak<dyn Layer>,
}

impl ActiveLayer {
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// `None` once the engine has dropped the layer.
    pub fn upgrade(&self) -> Option<SharedLayer> {
        self.layer.upgrade()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshStatus {
    pub source: Option<String>,
    pub interval_secs: Option<u64>,
    pub active_layer: Option<LayerId>,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub ticks_skipped: u64,
}

#[derive(Debug, Default)]
struct CycleState {
    current: Option<ValidSource>,
    active: Option<ActiveLayer>,
}

#[derive(Debug, Default)]
struct Counters {
    completed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

struct Shared {
    fetcher: Arc<dyn SourceFetcher>,
    parser: Arc<dyn OverlayParser>,
    collection: Arc<dyn LayerCollection>,
    ids: IdAllocator,
    gate: AsyncMutex<()>,
    state: Mutex<CycleState>,
    counters: Counters,
    events: EventBus,
}

struct TimerHandle {
    interval: Duration,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the active layer, the current source and the refresh timer.
///
/// The timer runs on the runtime the scheduler was created in, so policy
/// changes may come from any thread.
pub struct RefreshScheduler {
    shared: Arc<Shared>,
    timer: Mutex<Option<TimerHandle>>,
    runtime: Handle,
}

impl RefreshScheduler {
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        parser: Arc<dyn OverlayParser>,
        collection: Arc<dyn LayerCollection>,
        events: EventBus,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                fetcher,
                parser,
                collection,
                ids: IdAllocator::default(),
                gate: AsyncMutex::new(()),
                state: Mutex::new(CycleState::default()),
                counters: Counters::default(),
                events,
            }),
            timer: Mutex::new(None),
            runtime: Handle::current(),
        }
    }

    /// Runs one cycle against `source` and makes it the current source if
    /// the cycle succeeds. On failure nothing changes.
    pub async fn adopt_source(&self, source: ValidSource) -> Result<LayerId, RefreshError> {
        let _gate = self.shared.gate.lock().await;
        self.shared
            .run_cycle(&source, CycleTrigger::SetSource, true)
            .await
    }

    /// Re-fetches the current source. `Ok(None)` when there is none yet.
    pub async fn refresh_now(&self) -> Result<Option<LayerId>, RefreshError> {
        let _gate = self.shared.gate.lock().await;
        self.shared.refresh_current(CycleTrigger::Manual).await
    }

    /// Retires the running timer (if any) and starts the one `policy` asks for.
    ///
    /// A cycle already in flight on the old timer still completes and is
    /// applied.
    pub fn apply_policy(&self, policy: RefreshPolicy) {
        let mut timer = self.timer.lock();
        if let Some(old) = timer.take() {
            old.cancel.cancel();
            info!(interval_secs = old.interval.as_secs(), "overlay refresh timer stopped");
            self.shared.events.emit(RefreshEvent::TimerStopped);
        }

        if let RefreshPolicy::Periodic(interval) = policy {
            let cancel = CancellationToken::new();
            let task = self.runtime.spawn(run_timer(
                Arc::clone(&self.shared),
                interval,
                cancel.clone(),
            ));
            info!(interval_secs = interval.as_secs(), "overlay refresh timer started");
            self.shared
                .events
                .emit(RefreshEvent::TimerStarted { interval });
            *timer = Some(TimerHandle {
                interval,
                cancel,
                task,
            });
        }
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.timer
            .lock()
            .as_ref()
            .map_or(RefreshPolicy::Disabled, |t| RefreshPolicy::Periodic(t.interval))
    }

    /// Removes the active layer and forgets the current source.
    ///
    /// The timer keeps running; its ticks find no source and do nothing.
    pub async fn clear(&self) -> Option<LayerId> {
        let _gate = self.shared.gate.lock().await;
        let mut state = self.shared.state.lock();
        state.current = None;
        let active = state.active.take()?;
        self.shared.collection.remove_layer(active.id);
        drop(state);

        info!(layer = %active.id, "overlay layer cleared");
        self.shared
            .events
            .emit(RefreshEvent::LayerCleared { layer: active.id });
        Some(active.id)
    }

    /// Stops the timer and waits for a tick that is mid-cycle to finish.
    pub async fn shutdown(&self) {
        let handle = self.timer.lock().take();
        if let Some(handle) = handle {
            handle.cancel.cancel();
            if let Err(err) = handle.task.await {
                warn!(error = %err, "overlay refresh timer task ended abnormally");
            }
            self.shared.events.emit(RefreshEvent::TimerStopped);
        }
    }

    pub fn current_source(&self) -> Option<ValidSource> {
        self.shared.state.lock().current.clone()
    }

    pub fn active_layer(&self) -> Option<ActiveLayer> {
        self.shared.state.lock().active.clone()
    }

    pub fn status(&self) -> RefreshStatus {
        let (source, active_layer) = {
            let state = self.shared.state.lock();
            (
                state.current.as_ref().map(ValidSource::label),
                state.active.as_ref().map(ActiveLayer::id),
            )
        };
        let counters = &self.shared.counters;
        RefreshStatus {
            source,
            interval_secs: self.policy().interval().map(|i| i.as_secs()),
            active_layer,
            cycles_completed: counters.completed.load(Ordering::Relaxed),
            cycles_failed: counters.failed.load(Ordering::Relaxed),
            ticks_skipped: counters.skipped.load(Ordering::Relaxed),
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.get_mut().take() {
            handle.cancel.cancel();
        }
    }
}

impl Shared {
    async fn tick(&self, tick: u64) {
        let Ok(_gate) = self.gate.try_lock() else {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            debug!(tick, "refresh cycle already in flight, skipping tick");
            self.events.emit(RefreshEvent::TickSkipped { tick });
            return;
        };
        // Failures are logged and broadcast inside the cycle; the timer keeps going.
        let _ = self.refresh_current(CycleTrigger::Tick(tick)).await;
    }

    /// Caller must hold `gate`.
    async fn refresh_current(&self, trigger: CycleTrigger) -> Result<Option<LayerId>, RefreshError> {
        let current = self.state.lock().current.clone();
        let Some(source) = current else {
            debug!(%trigger, "no overlay source set, nothing to refresh");
            return Ok(None);
        };
        self.run_cycle(&source, trigger, false).await.map(Some)
    }

    /// Caller must hold `gate`.
    async fn run_cycle(
        &self,
        source: &ValidSource,
        trigger: CycleTrigger,
        adopt: bool,
    ) -> Result<LayerId, RefreshError> {
        match self.fetch_and_parse(source).await {
            Ok(layer) => Ok(self.install(source, layer, trigger, adopt)),
            Err(error) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(source = %source, %trigger, error = %error, "overlay refresh failed");
                self.events.emit(RefreshEvent::CycleFailed {
                    source: source.label(),
                    trigger,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    async fn fetch_and_parse(&self, source: &ValidSource) -> Result<SharedLayer, RefreshError> {
        let payload = self.fetcher.fetch(source).await?;
        let id = LayerId(self.ids.next_id());
        let name = source.label();
        let parser = Arc::clone(&self.parser);

        let layer = tokio::task::spawn_blocking(move || parser.parse(id, &name, &payload))
            .await
            .map_err(|e| ParseError::Task(e.to_string()))??;
        Ok(layer)
    }

    fn install(
        &self,
        source: &ValidSource,
        layer: SharedLayer,
        trigger: CycleTrigger,
        adopt: bool,
    ) -> LayerId {
        let id = layer.id();
        let weak = Arc::downgrade(&layer);

        let mut state = self.state.lock();
        let replaced = state.active.take().map(|a| a.id);
        self.collection.replace_layer(replaced, layer);
        state.active = Some(ActiveLayer { id, layer: weak });
        if adopt {
            state.current = Some(source.clone());
        }
        drop(state);

        self.counters.completed.fetch_add(1, Ordering::Relaxed);
        info!(layer = %id, replaced = ?replaced, source = %source, %trigger, "overlay layer installed");
        self.events.emit(RefreshEvent::LayerInstalled {
            layer: id,
            replaced,
            source: source.label(),
            trigger,
        });
        id
    }
}

async fn run_timer(shared: Arc<Shared>, interval: Duration, cancel: CancellationToken) {
    // The first tick completes immediately.
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut tick: u64 = 0;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        // Not raced against `cancel`: a started cycle always finishes.
        shared.tick(tick).await;
        tick += 1;
    }

    debug!(ticks = tick, "overlay refresh timer task exiting");
}
