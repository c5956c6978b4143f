//! Session State
//!
//! Holds the authentication token in the injected [`LocalStore`] under
//! [`TOKEN_KEY`]. `Session` is passed explicitly to every component that
//! needs it; tests hand it a `MemoryStore`.
//!
//! Storing or clearing the token broadcasts `LoggedIn` / `LoggedOut` on the
//! event bus so auth gates re-evaluate without polling.

use crate::models::LoginGrant;
use chrono::{DateTime, Utc};
use gjp_common::events::{EventBus, PortalEvent};
use gjp_common::{time, LocalStore, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Storage key of the session record
pub const TOKEN_KEY: &str = "userToken";

/// Persisted authentication record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    #[serde(deserialize_with = "crate::models::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(deserialize_with = "deserialize_expiry")]
    pub expires_at: DateTime<Utc>,
    /// Opaque bearer credential sent as `Authorization: Bearer ...`
    #[serde(rename = "token", default, skip_serializing_if = "Option::is_none")]
    pub bearer: Option<String>,
}

fn deserialize_expiry<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    time::parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized expiry timestamp {:?}", raw)))
}

impl SessionToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Build a token from a `login.php` response
    pub fn from_grant(grant: &LoginGrant) -> std::result::Result<Self, SessionError> {
        let expires_at = time::parse_timestamp(&grant.expires_at)
            .ok_or_else(|| SessionError::InvalidExpiry(grant.expires_at.clone()))?;
        Ok(Self {
            id: grant.user.id.clone(),
            name: grant.user.name.clone(),
            email: grant.user.email.clone(),
            expires_at,
            bearer: grant.token.clone(),
        })
    }
}

/// Why an authenticated call cannot proceed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("User not logged in")]
    NotLoggedIn,

    #[error("Token has expired. Please log in again.")]
    Expired { expired_at: DateTime<Utc> },

    #[error("Login response carried an unreadable expiry: {0}")]
    InvalidExpiry(String),
}

/// Handle to the persisted session
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn LocalStore>,
    events: EventBus,
}

impl Session {
    pub fn new(store: Arc<dyn LocalStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Persist the token; no shape validation
    pub fn set_token(&self, token: &SessionToken) -> Result<()> {
        let json = serde_json::to_string(token)?;
        self.store.set(TOKEN_KEY, &json)?;
        info!(user_id = %token.id, "Session token stored");
        self.events.emit_lossy(PortalEvent::LoggedIn {
            user_id: token.id.clone(),
            timestamp: time::now(),
        });
        Ok(())
    }

    /// Stored token, or `None` when absent or unreadable
    pub fn get_token(&self) -> Option<SessionToken> {
        let raw = match self.store.get(TOKEN_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read session token: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Ignoring malformed session token: {}", e);
                None
            }
        }
    }

    /// True iff a token record is present; expiry is not checked
    pub fn is_logged_in(&self) -> bool {
        self.store.contains(TOKEN_KEY).unwrap_or(false)
    }

    /// Remove the token and broadcast `LoggedOut`
    pub fn clear_token(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY)?;
        debug!("Session token cleared");
        self.events.emit_lossy(PortalEvent::LoggedOut {
            timestamp: time::now(),
        });
        Ok(())
    }

    /// The token, provided it exists and has not expired at `now`
    ///
    /// Called before any request that transmits the user id so an expired
    /// session fails locally instead of reaching the network. An expired
    /// token is removed, which broadcasts `LoggedOut`.
    pub fn require_valid(&self, now: DateTime<Utc>) -> std::result::Result<SessionToken, SessionError> {
        let token = self.get_token().ok_or(SessionError::NotLoggedIn)?;
        if token.is_expired_at(now) {
            warn!(user_id = %token.id, expired_at = %token.expires_at, "Session token expired");
            self.events.emit_lossy(PortalEvent::SessionExpired {
                expired_at: token.expires_at,
                timestamp: now,
            });
            if let Err(e) = self.clear_token() {
                warn!("Failed to remove expired session token: {}", e);
            }
            return Err(SessionError::Expired {
                expired_at: token.expires_at,
            });
        }
        Ok(token)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PortalEvent> {
        self.events.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }
}
