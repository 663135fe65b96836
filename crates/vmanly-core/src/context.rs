// ── Sync context ──
//
// Everything one run needs: the authenticated client, the per-kind
// listing cache and the action polling bounds. Constructed once per run
// and passed explicitly; the resolver, synchronizer, reattacher and
// exporter are inherent methods implemented in their own modules.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};
use vmanly_api::transport::{TlsMode, TransportConfig};
use vmanly_api::VmanageClient;

use crate::config::{ControllerConfig, PollConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::EntityKind;
use crate::resolve::EntityIndex;

pub struct SyncContext {
    pub(crate) client: VmanageClient,
    pub(crate) cache: DashMap<EntityKind, Arc<EntityIndex>>,
    pub(crate) poll: PollConfig,
}

impl SyncContext {
    /// Wrap an already-authenticated client.
    pub fn new(client: VmanageClient, poll: PollConfig) -> Self {
        Self {
            client,
            cache: DashMap::new(),
            poll,
        }
    }

    /// Build a client from `config` and log in.
    pub async fn connect(config: &ControllerConfig) -> Result<Self, CoreError> {
        let transport = build_transport(config);
        let client = VmanageClient::new(config.url.clone(), &transport)?;
        client.login(&config.username, &config.password).await?;
        debug!(url = %config.url, "session authentication successful");
        Ok(Self::new(client, config.poll))
    }

    /// End the session. Failures are logged, not returned.
    pub async fn disconnect(&self) {
        if let Err(e) = self.client.logout().await {
            warn!(error = %e, "logout failed");
        }
    }

    pub fn client(&self) -> &VmanageClient {
        &self.client
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }
}

fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        cookie_jar: None, // VmanageClient::new adds one automatically
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
