//! Shared fixtures for gjp-portal integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use gjp_common::config::RetryConfig;
use gjp_common::MemoryStore;
use gjp_portal::gateway::{Ack, GatewayResult, PortalBackend, SubmissionReceipt};
use gjp_portal::models::{
    ContributorList, Credentials, LoginGrant, ProfileUpdateRequest, RegisterRequest,
    SubmissionPayload, SubmissionSummary, UploadCandidate, UserProfile,
};
use gjp_portal::{Navigator, Portal, Route, SessionToken};
use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-process backend with scripted failures and a call log
#[derive(Default)]
pub struct ScriptedBackend {
    calls: Mutex<Vec<&'static str>>,
    submit_script: Mutex<VecDeque<GatewayResult<SubmissionReceipt>>>,
    profile_script: Mutex<VecDeque<GatewayResult<UserProfile>>>,
    pub payloads: Mutex<Vec<SubmissionPayload>>,
    pub synced_contributors: Mutex<Vec<(String, ContributorList)>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue results for the next `make_submission` calls; afterwards calls succeed
    pub fn script_submit(&self, results: Vec<GatewayResult<SubmissionReceipt>>) {
        self.submit_script.lock().unwrap().extend(results);
    }

    pub fn script_profile(&self, results: Vec<GatewayResult<UserProfile>>) {
        self.profile_script.lock().unwrap().extend(results);
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == endpoint)
            .count()
    }

    fn record(&self, endpoint: &'static str) {
        self.calls.lock().unwrap().push(endpoint);
    }
}

pub fn profile(id: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        name: "Asha Rao".to_string(),
        email: "asha@uni.edu".to_string(),
        affiliation: Some("IIT Delhi".to_string()),
        country: Some("India".to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl PortalBackend for ScriptedBackend {
    async fn login(&self, credentials: &Credentials) -> GatewayResult<LoginGrant> {
        self.record("login");
        Ok(serde_json::from_value(serde_json::json!({
            "user": {"id": 7, "name": "Asha Rao", "email": credentials.email},
            "expires_at": "2099-01-01 00:00:00",
        }))
        .unwrap())
    }

    async fn register(&self, _request: &RegisterRequest) -> GatewayResult<Ack> {
        self.record("register");
        Ok(Ack::default())
    }

    async fn get_profile(&self, user_id: &str) -> GatewayResult<UserProfile> {
        self.record("get_profile");
        match self.profile_script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(profile(user_id)),
        }
    }

    async fn update_profile(&self, _request: &ProfileUpdateRequest) -> GatewayResult<Ack> {
        self.record("update_profile");
        Ok(Ack::default())
    }

    async fn create_submission(&self, _title: &str, _submitted_by: &str) -> GatewayResult<Ack> {
        self.record("title_submission");
        Ok(Ack::default())
    }

    async fn make_submission(
        &self,
        payload: &SubmissionPayload,
    ) -> GatewayResult<SubmissionReceipt> {
        self.record("make_submission");
        self.payloads.lock().unwrap().push(payload.clone());
        match self.submit_script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(SubmissionReceipt {
                submission_id: Some("101".to_string()),
                message: None,
            }),
        }
    }

    async fn list_submissions(&self, _submitted_by: &str) -> GatewayResult<Vec<SubmissionSummary>> {
        self.record("get_submissions");
        Ok(Vec::new())
    }

    async fn delete_submission(&self, _submission_id: &str) -> GatewayResult<Ack> {
        self.record("delete_submission");
        Ok(Ack::default())
    }

    async fn save_contributors(
        &self,
        submission_id: &str,
        contributors: &ContributorList,
    ) -> GatewayResult<Ack> {
        self.record("save_contributors");
        self.synced_contributors
            .lock()
            .unwrap()
            .push((submission_id.to_string(), contributors.clone()));
        Ok(Ack::default())
    }

    async fn upload_file(&self, user_id: &str, file: &UploadCandidate) -> GatewayResult<String> {
        self.record("upload");
        Ok(format!("u{}_{}", user_id, file.file_name))
    }

    async fn request_password_reset(&self, _email: &str) -> GatewayResult<Ack> {
        self.record("reset_request");
        Ok(Ack::default())
    }

    async fn confirm_password_reset(&self, _token: &str, _password: &str) -> GatewayResult<Ack> {
        self.record("reset_confirm");
        Ok(Ack::default())
    }
}

/// Retries without waiting
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        delay_ms: 0,
        login_delay_ms: 0,
    }
}

/// Portal over a fresh `MemoryStore` and the given backend
pub fn memory_portal(backend: Arc<ScriptedBackend>) -> (Portal, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let portal = Portal::with_backend(store.clone(), backend, fast_retry());
    (portal, store)
}

pub fn valid_token() -> SessionToken {
    SessionToken {
        id: "7".to_string(),
        name: "Asha Rao".to_string(),
        email: "asha@uni.edu".to_string(),
        expires_at: Utc::now() + Duration::hours(2),
        bearer: None,
    }
}

pub fn expired_token() -> SessionToken {
    SessionToken {
        expires_at: Utc::now() - Duration::minutes(1),
        ..valid_token()
    }
}

/// Write a small file with the given name into `dir`
pub fn write_manuscript(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(b"Manuscript body used by tests").unwrap();
    path
}

/// Navigator that records what a gate asked for
#[derive(Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<Route>>,
    pub notices: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }

    fn notify_blocking(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}
