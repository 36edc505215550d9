use std::time::Duration;

use layers::LayerId;
use tokio::sync::broadcast;

use crate::error::RefreshError;

/// What started a refresh cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CycleTrigger {
    SetSource,
    Manual,
    /// 0-based tick of the active timer.
    Tick(u64),
}

impl std::fmt::Display for CycleTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleTrigger::SetSource => write!(f, "set-source"),
            CycleTrigger::Manual => write!(f, "manual"),
            CycleTrigger::Tick(n) => write!(f, "tick {n}"),
        }
    }
}

/// Notifications for the presentation layer.
///
/// Timer ticks have no caller to return an error to, so failures are surfaced
/// here as well as in the logs.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    LayerInstalled {
        layer: LayerId,
        replaced: Option<LayerId>,
        source: String,
        trigger: CycleTrigger,
    },
    CycleFailed {
        source: String,
        trigger: CycleTrigger,
        error: RefreshError,
    },
    TickSkipped {
        tick: u64,
    },
    LayerCleared {
        layer: LayerId,
    },
    TimerStarted {
        interval: Duration,
    },
    TimerStopped,
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RefreshEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn emit(&self, event: RefreshEvent) {
        // Nobody listening is fine.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.tx.subscribe()
    }
}
