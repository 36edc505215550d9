//! Fixtures shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use layers::{LayerCollection, LayerId, SceneLayers, SharedLayer};
use parking_lot::Mutex;
use serde_json::json;

use crate::error::FetchError;
use crate::fetch::{BoxFuture, SourceFetcher};
use crate::source::ValidSource;

/// A minimal earthquake feed with one point feature per `(lon, lat)`.
pub fn quake_feed(points: &[(f64, f64)]) -> Vec<u8> {
    let features: Vec<_> = points
        .iter()
        .enumerate()
        .map(|(i, (lon, lat))| {
            json!({
                "type": "Feature",
                "id": format!("quake{i}"),
                "properties": { "mag": 2.5 + i as f64 / 10.0, "place": "somewhere" },
                "geometry": { "type": "Point", "coordinates": [lon, lat, 10.0] }
            })
        })
        .collect();
    serde_json::to_vec(&json!({ "type": "FeatureCollection", "features": features }))
        .expect("serialize feed")
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Replays a script of responses; the last one repeats forever.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<Vec<u8>, FetchError>>>,
    delay: Duration,
    calls: AtomicUsize,
    last_source: Mutex<Option<ValidSource>>,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Result<Vec<u8>, FetchError>>) -> Self {
        assert!(!script.is_empty(), "script needs at least one response");
        Self {
            script: Mutex::new(script.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_source: Mutex::new(None),
        }
    }

    pub fn repeating(payload: Vec<u8>) -> Self {
        Self::new(vec![Ok(payload)])
    }

    /// Every fetch sleeps this long (on the Tokio clock) before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_source(&self) -> Option<ValidSource> {
        self.last_source.lock().clone()
    }

    fn next_response(&self) -> Result<Vec<u8>, FetchError> {
        let mut script = self.script.lock();
        if script.len() > 1 {
            script.pop_front().expect("non-empty")
        } else {
            script.front().cloned().expect("non-empty")
        }
    }
}

impl SourceFetcher for ScriptedFetcher {
    fn fetch<'a>(&'a self, source: &'a ValidSource) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_source.lock() = Some(source.clone());
            let response = self.next_response();
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            response
        })
    }
}

/// [`SceneLayers`] that counts mutations and remembers its peak size.
#[derive(Debug, Default)]
pub struct RecordingCollection {
    inner: SceneLayers,
    adds: AtomicUsize,
    removes: AtomicUsize,
    max_len: AtomicUsize,
}

impl RecordingCollection {
    pub fn ids(&self) -> Vec<LayerId> {
        self.inner.ids()
    }

    pub fn adds(&self) -> usize {
        self.adds.load(Ordering::SeqCst)
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }

    pub fn max_len(&self) -> usize {
        self.max_len.load(Ordering::SeqCst)
    }
}

impl LayerCollection for RecordingCollection {
    fn add_layer(&self, layer: SharedLayer) {
        self.inner.add_layer(layer);
        self.adds.fetch_add(1, Ordering::SeqCst);
        self.max_len.fetch_max(self.inner.len(), Ordering::SeqCst);
    }

    fn remove_layer(&self, id: LayerId) -> bool {
        let removed = self.inner.remove_layer(id);
        if removed {
            self.removes.fetch_add(1, Ordering::SeqCst);
        }
        removed
    }

    fn contains(&self, id: LayerId) -> bool {
        self.inner.contains(id)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
