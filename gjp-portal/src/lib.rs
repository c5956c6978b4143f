//! # gjp-portal
//!
//! Client for the Global Journal submission portal: session handling, the
//! five-step manuscript submission wizard with local drafts, and the HTTP
//! gateway to the journal backend.
//!
//! [`Portal`] wires the pieces together over one [`LocalStore`] and one
//! [`EventBus`]. Every component receives what it needs explicitly; nothing
//! reads global state.

pub mod account;
pub mod auth_gate;
pub mod cli;
pub mod drafts;
pub mod error;
pub mod gateway;
pub mod models;
pub mod session;
pub mod validation;
pub mod wizard;

pub use account::AccountService;
pub use auth_gate::{AuthGate, GateOptions, Navigator, Route};
pub use drafts::{DraftKey, DraftStore};
pub use error::{PortalError, PortalResult};
pub use gateway::{GatewayError, HttpBackend, PortalBackend, RetryPolicy, SubmissionGateway};
pub use session::{Session, SessionError, SessionToken};
pub use wizard::{SubmissionWizard, Submitted, WizardStep};

use gjp_common::config::{ensure_directory_exists, PortalConfig, RetryConfig};
use gjp_common::events::EventBus;
use gjp_common::{FileStore, LocalStore};
use std::sync::Arc;
use tracing::info;

/// Application context shared by every command
#[derive(Clone)]
pub struct Portal {
    events: EventBus,
    session: Session,
    drafts: DraftStore,
    backend: Arc<dyn PortalBackend>,
    retry: RetryConfig,
}

impl Portal {
    /// File-backed store under the configured root folder, HTTP backend at
    /// the configured base URL
    pub fn from_config(config: &PortalConfig) -> PortalResult<Self> {
        let storage_dir = config.storage_dir();
        ensure_directory_exists(&storage_dir)?;
        let store: Arc<dyn LocalStore> = Arc::new(FileStore::open(&storage_dir)?);

        let events = EventBus::default();
        let session = Session::new(store.clone(), events.clone());
        let backend = HttpBackend::new(&config.base_url, config.request_timeout, session.clone())?;

        info!(
            storage = %storage_dir.display(),
            base_url = %backend.base_url(),
            timeout_ms = config.request_timeout.as_millis(),
            "Portal initialized"
        );

        Ok(Self::assemble(store, events, session, Arc::new(backend), config.retry.clone()))
    }

    /// Context over an arbitrary store and backend
    pub fn with_backend(
        store: Arc<dyn LocalStore>,
        backend: Arc<dyn PortalBackend>,
        retry: RetryConfig,
    ) -> Self {
        let events = EventBus::default();
        let session = Session::new(store.clone(), events.clone());
        Self::assemble(store, events, session, backend, retry)
    }

    fn assemble(
        store: Arc<dyn LocalStore>,
        events: EventBus,
        session: Session,
        backend: Arc<dyn PortalBackend>,
        retry: RetryConfig,
    ) -> Self {
        let drafts = DraftStore::new(store, events.clone());
        Self {
            events,
            session,
            drafts,
            backend,
            retry,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(
            self.backend.clone(),
            self.session.clone(),
            RetryPolicy::from_config(&self.retry),
            RetryPolicy::login_from_config(&self.retry),
        )
    }

    pub fn submissions(&self) -> SubmissionGateway {
        SubmissionGateway::new(
            self.backend.clone(),
            self.session.clone(),
            RetryPolicy::from_config(&self.retry),
        )
    }

    /// Wizard resumed at the persisted step
    pub fn wizard(&self) -> SubmissionWizard {
        SubmissionWizard::open(self.drafts.clone())
    }

    /// Mount an auth gate over this portal's session
    pub fn gate<N: Navigator>(&self, navigator: N, options: GateOptions, route: Route) -> AuthGate<N> {
        AuthGate::mount(self.session.clone(), navigator, options, vec![route.to_string()])
    }
}
