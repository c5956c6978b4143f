//! Account Service
//!
//! Login, logout, registration, profile and password reset. Login waits
//! between attempts; the other calls retry immediately.

use crate::error::PortalResult;
use crate::gateway::{call_with_retry, Ack, PortalBackend, RetryPolicy};
use crate::models::{Credentials, ProfileUpdate, Registration, UserProfile};
use crate::session::{Session, SessionToken};
use crate::validation;
use gjp_common::time;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AccountService {
    backend: Arc<dyn PortalBackend>,
    session: Session,
    policy: RetryPolicy,
    login_policy: RetryPolicy,
}

impl AccountService {
    pub fn new(
        backend: Arc<dyn PortalBackend>,
        session: Session,
        policy: RetryPolicy,
        login_policy: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            session,
            policy,
            login_policy,
        }
    }

    /// Authenticate and store the session token
    pub async fn login(&self, email: &str, password: &str) -> PortalResult<SessionToken> {
        validation::validate_login(email, password)?;

        let credentials = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let credentials = &credentials;

        let (grant, attempts) = call_with_retry(&self.session, self.login_policy, "login", || {
            self.backend.login(credentials)
        })
        .await?;

        let token = SessionToken::from_grant(&grant)?;
        self.session.set_token(&token)?;

        info!(user_id = %token.id, attempts, expires_at = %token.expires_at, "Logged in");
        Ok(token)
    }

    pub fn logout(&self) -> PortalResult<()> {
        self.session.clear_token()?;
        info!("Logged out");
        Ok(())
    }

    /// Create an account; the user still has to log in afterwards
    pub async fn register(&self, form: &Registration) -> PortalResult<Ack> {
        validation::validate_registration(form)?;

        let request = form.to_request();
        let request = &request;
        let (ack, _) = call_with_retry(&self.session, self.policy, "register", || {
            self.backend.register(request)
        })
        .await?;

        info!(username = %request.username, "Account registered");
        Ok(ack)
    }

    /// Profile of the logged-in user
    ///
    /// Fails locally with an expiry error when the stored token is past its
    /// expiry; nothing is transmitted in that case.
    pub async fn profile(&self) -> PortalResult<UserProfile> {
        let token = self.session.require_valid(time::now())?;
        let user_id = token.id.as_str();

        let (profile, _) = call_with_retry(&self.session, self.policy, "get_profile", || {
            self.backend.get_profile(user_id)
        })
        .await?;
        Ok(profile)
    }

    pub async fn update_profile(&self, form: &ProfileUpdate) -> PortalResult<Ack> {
        validation::validate_profile_update(form)?;
        let token = self.session.require_valid(time::now())?;

        let request = form.to_request(&token.id);
        let request = &request;
        let (ack, _) = call_with_retry(&self.session, self.policy, "update_profile", || {
            self.backend.update_profile(request)
        })
        .await?;

        info!(user_id = %token.id, password_changed = form.changes_password(), "Profile updated");
        Ok(ack)
    }

    pub async fn request_password_reset(&self, email: &str) -> PortalResult<Ack> {
        let mut errors = validation::ValidationErrors::new();
        if !validation::is_valid_email(email) {
            errors.push("email", "A valid email is required");
        }
        errors.into_result()?;

        let email = email.trim();
        let (ack, _) = call_with_retry(&self.session, self.policy, "reset_request", || {
            self.backend.request_password_reset(email)
        })
        .await?;
        Ok(ack)
    }

    pub async fn confirm_password_reset(
        &self,
        reset_token: &str,
        password: &str,
        confirm: &str,
    ) -> PortalResult<Ack> {
        validation::validate_password_reset(password, confirm)?;

        let (ack, _) = call_with_retry(&self.session, self.policy, "reset_confirm", || {
            self.backend.confirm_password_reset(reset_token, password)
        })
        .await?;
        Ok(ack)
    }
}
