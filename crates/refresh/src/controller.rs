//! Operator-facing entry point.

use std::sync::Arc;

use layers::{LayerCollection, LayerId};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::RefreshConfig;
use crate::error::{RefreshError, RejectionReason};
use crate::events::{EventBus, RefreshEvent};
use crate::fetch::{DefaultFetcher, SourceFetcher};
use crate::parser::{GeoJsonParser, OverlayParser};
use crate::policy::RefreshPolicy;
use crate::scheduler::{ActiveLayer, RefreshScheduler, RefreshStatus};
use crate::source::{SourceDescriptor, SourceResolver, ValidSource};

/// Validates operator input and drives the [`RefreshScheduler`].
///
/// Must be created inside a Tokio runtime. The refresh timer is spawned onto
/// that runtime, so the synchronous operations can be called from any thread,
/// including a UI thread the runtime does not own.
pub struct OverlayController {
    resolver: SourceResolver,
    scheduler: RefreshScheduler,
    events: EventBus,
}

impl OverlayController {
    /// GeoJSON over files and http(s), installing into `collection`.
    pub fn new(
        config: &RefreshConfig,
        collection: Arc<dyn LayerCollection>,
    ) -> Result<Self, RefreshError> {
        let fetcher = DefaultFetcher::new(config)?;
        Ok(Self::with_collaborators(
            config,
            collection,
            Arc::new(fetcher),
            Arc::new(GeoJsonParser),
        ))
    }

    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn with_collaborators(
        config: &RefreshConfig,
        collection: Arc<dyn LayerCollection>,
        fetcher: Arc<dyn SourceFetcher>,
        parser: Arc<dyn OverlayParser>,
    ) -> Self {
        let events = EventBus::new(config.event_capacity);
        Self {
            resolver: SourceResolver::new(config.default_address.clone()),
            scheduler: RefreshScheduler::new(fetcher, parser, collection, events.clone()),
            events,
        }
    }

    /// Validates `descriptor`, then fetches and installs it immediately.
    ///
    /// The new source becomes current only once its layer is installed; a
    /// rejected or failed source leaves the previous one (and its timer) alone.
    pub async fn set_source(&self, descriptor: SourceDescriptor) -> Result<LayerId, RefreshError> {
        let source = self.validate(descriptor).await.map_err(|reason| {
            warn!(error = %reason, "overlay source rejected");
            RefreshError::from(reason)
        })?;
        info!(source = %source, "overlay source accepted");
        self.scheduler.adopt_source(source).await
    }

    /// File checks touch the filesystem, so they run on the blocking pool.
    async fn validate(&self, descriptor: SourceDescriptor) -> Result<ValidSource, RejectionReason> {
        let path = match descriptor {
            SourceDescriptor::FilePath(path) => path,
            address @ SourceDescriptor::EndpointAddress(_) => {
                return self.resolver.validate(&address);
            }
        };

        let resolver = self.resolver.clone();
        let checked = SourceDescriptor::FilePath(path.clone());
        tokio::task::spawn_blocking(move || resolver.validate(&checked))
            .await
            .unwrap_or_else(|e| {
                Err(RejectionReason::UnreadableFile {
                    path,
                    reason: e.to_string(),
                })
            })
    }

    /// Applies a refresh interval in whole seconds. `0` stops refreshing.
    ///
    /// A negative value is rejected and the running timer is left as is.
    pub fn set_interval(&self, seconds: i64) -> Result<RefreshPolicy, RefreshError> {
        let policy = RefreshPolicy::from_seconds(seconds).map_err(|err| {
            warn!(seconds, "refresh interval rejected");
            err
        })?;
        self.set_policy(policy);
        Ok(policy)
    }

    pub fn set_policy(&self, policy: RefreshPolicy) {
        info!(%policy, "overlay refresh policy applied");
        self.scheduler.apply_policy(policy);
    }

    /// Refreshes the current source out of schedule.
    pub async fn refresh_now(&self) -> Result<Option<LayerId>, RefreshError> {
        self.scheduler.refresh_now().await
    }

    pub async fn clear(&self) -> Option<LayerId> {
        self.scheduler.clear().await
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.scheduler.policy()
    }

    pub fn current_source(&self) -> Option<ValidSource> {
        self.scheduler.current_source()
    }

    pub fn active_layer(&self) -> Option<ActiveLayer> {
        self.scheduler.active_layer()
    }

    pub fn status(&self) -> RefreshStatus {
        self.scheduler.status()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.events.subscribe()
    }
}
