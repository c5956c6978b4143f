//! Auth Gate
//!
//! Guards protected views. The gate evaluates the session on mount, when its
//! dependency list changes, and when a login/logout event is drained from its
//! event subscription. It never blocks and never polls.

use crate::session::Session;
use crate::wizard::WizardStep;
use gjp_common::events::PortalEvent;
use std::fmt;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

/// Blocking notification raised when `warn` is set
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please login to access this page";

/// Navigation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Profile,
    Submissions,
    Wizard(WizardStep),
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Login => write!(f, "/login"),
            Route::Profile => write!(f, "/profile"),
            Route::Submissions => write!(f, "/submissions"),
            Route::Wizard(step) => write!(f, "/submission/{}", step),
        }
    }
}

/// Side effects requested by the gate
pub trait Navigator {
    fn navigate(&self, route: Route);

    /// Modal message the user has to acknowledge
    fn notify_blocking(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateOptions {
    /// Navigate to the login route when unauthenticated
    pub redirect: bool,
    /// Raise [`LOGIN_REQUIRED_MESSAGE`] before redirecting
    pub warn: bool,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            redirect: true,
            warn: false,
        }
    }
}

pub struct AuthGate<N: Navigator> {
    session: Session,
    navigator: N,
    options: GateOptions,
    events: broadcast::Receiver<PortalEvent>,
    dependencies: Vec<String>,
    authenticated: bool,
}

impl<N: Navigator> AuthGate<N> {
    /// Subscribe to session events and evaluate once
    pub fn mount(
        session: Session,
        navigator: N,
        options: GateOptions,
        dependencies: Vec<String>,
    ) -> Self {
        let events = session.subscribe();
        let mut gate = Self {
            session,
            navigator,
            options,
            events,
            dependencies,
            authenticated: false,
        };
        gate.evaluate();
        gate
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn options(&self) -> GateOptions {
        self.options
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Re-evaluate if the dependency list differs from the last one seen
    pub fn update_dependencies(&mut self, dependencies: Vec<String>) -> bool {
        if dependencies != self.dependencies {
            self.dependencies = dependencies;
            self.evaluate();
        }
        self.authenticated
    }

    /// Drain pending events; re-evaluate once if any touched the session
    pub fn process_events(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.events.try_recv() {
                Ok(event) => changed |= event.affects_session(),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Auth gate lagged behind session events");
                    changed = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if changed {
            self.evaluate();
        }
        self.authenticated
    }

    fn evaluate(&mut self) -> bool {
        self.authenticated = self.session.is_logged_in();
        debug!(authenticated = self.authenticated, "Auth gate evaluated");

        if !self.authenticated && self.options.redirect {
            if self.options.warn {
                self.navigator.notify_blocking(LOGIN_REQUIRED_MESSAGE);
            }
            self.navigator.navigate(Route::Login);
        }
        self.authenticated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionToken;
    use chrono::{Duration, Utc};
    use gjp_common::events::EventBus;
    use gjp_common::MemoryStore;
    use std::cell::RefCell;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        routes: RefCell<Vec<Route>>,
        notices: RefCell<Vec<String>>,
    }

    impl Navigator for &Recorder {
        fn navigate(&self, route: Route) {
            self.routes.borrow_mut().push(route);
        }

        fn notify_blocking(&self, message: &str) {
            self.notices.borrow_mut().push(message.to_string());
        }
    }

    fn session() -> Session {
        Session::new(Arc::new(MemoryStore::new()), EventBus::new(16))
    }

    fn token() -> SessionToken {
        SessionToken {
            id: "7".to_string(),
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            bearer: None,
        }
    }

    #[test]
    fn test_redirect_and_warn_without_token() {
        let recorder = Recorder::default();
        let gate = AuthGate::mount(
            session(),
            &recorder,
            GateOptions {
                redirect: true,
                warn: true,
            },
            vec!["/profile".to_string()],
        );

        assert!(!gate.is_authenticated());
        assert_eq!(*recorder.notices.borrow(), vec![LOGIN_REQUIRED_MESSAGE.to_string()]);
        assert_eq!(*recorder.routes.borrow(), vec![Route::Login]);
    }

    #[test]
    fn test_no_redirect_only_reports() {
        let recorder = Recorder::default();
        let gate = AuthGate::mount(
            session(),
            &recorder,
            GateOptions {
                redirect: false,
                warn: true,
            },
            Vec::new(),
        );

        assert!(!gate.is_authenticated());
        assert!(recorder.routes.borrow().is_empty());
        assert!(recorder.notices.borrow().is_empty());
    }

    #[test]
    fn test_logged_in_passes_silently() {
        let recorder = Recorder::default();
        let session = session();
        session.set_token(&token()).unwrap();

        let gate = AuthGate::mount(session, &recorder, GateOptions::default(), Vec::new());

        assert!(gate.is_authenticated());
        assert!(recorder.routes.borrow().is_empty());
    }

    #[test]
    fn test_login_event_flips_signal() {
        let recorder = Recorder::default();
        let session = session();
        let mut gate = AuthGate::mount(
            session.clone(),
            &recorder,
            GateOptions {
                redirect: false,
                warn: false,
            },
            Vec::new(),
        );
        assert!(!gate.is_authenticated());

        session.set_token(&token()).unwrap();
        assert!(gate.process_events());

        session.clear_token().unwrap();
        assert!(!gate.process_events());
    }

    #[test]
    fn test_unchanged_dependencies_do_not_reevaluate() {
        let recorder = Recorder::default();
        let mut gate = AuthGate::mount(
            session(),
            &recorder,
            GateOptions::default(),
            vec!["/profile".to_string()],
        );
        assert_eq!(recorder.routes.borrow().len(), 1);

        gate.update_dependencies(vec!["/profile".to_string()]);
        assert_eq!(recorder.routes.borrow().len(), 1);

        gate.update_dependencies(vec!["/submissions".to_string()]);
        assert_eq!(recorder.routes.borrow().len(), 2);
    }
}
