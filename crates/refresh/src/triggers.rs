//! Handlers for the host UI's "open file", "set URL" and "set refresh rate"
//! actions. Each one maps straight onto a controller operation; showing the
//! error dialog is left to the caller via [`RefreshError::user_message`].

use std::path::PathBuf;

use layers::LayerId;
use tracing::warn;

use crate::controller::OverlayController;
use crate::error::RefreshError;
use crate::policy::RefreshPolicy;
use crate::source::SourceDescriptor;

impl OverlayController {
    pub async fn on_open_file_requested(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<LayerId, RefreshError> {
        self.set_source(SourceDescriptor::file(path)).await
    }

    /// Empty input falls back to the default address.
    pub async fn on_set_address_requested(&self, raw: &str) -> Result<LayerId, RefreshError> {
        self.set_source(SourceDescriptor::address(raw)).await
    }

    /// Accepts the raw text of the refresh-rate field.
    pub fn on_set_interval_requested(&self, raw: &str) -> Result<RefreshPolicy, RefreshError> {
        let policy = RefreshPolicy::parse(raw).inspect_err(|err| {
            warn!(input = raw, error = %err, "refresh rate input rejected");
        })?;
        self.set_policy(policy);
        Ok(policy)
    }
}
