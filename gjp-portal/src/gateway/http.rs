//! HTTP client for the journal backend
//!
//! Every endpoint answers with a JSON envelope `{ success, message?, ... }`.
//! Status codes are mapped first (401/403, 404, other non-2xx), then the
//! envelope's `success` flag decides between data and [`GatewayError::Rejected`].

use super::{Ack, GatewayError, GatewayResult, PortalBackend, SubmissionReceipt};
use crate::models::{
    ContributorList, Credentials, LoginGrant, ProfileUpdateRequest, RegisterRequest,
    SubmissionPayload, SubmissionSummary, UploadCandidate, UserProfile,
};
use crate::session::Session;
use async_trait::async_trait;
use reqwest::{multipart, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

const USER_AGENT: &str = concat!(
    "gjp-portal/",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ")"
);

/// [`PortalBackend`] over reqwest
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
    session: Session,
}

impl HttpBackend {
    /// `base_url` is the directory holding the PHP endpoints
    pub fn new(base_url: &str, timeout: Duration, session: Session) -> GatewayResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            http_client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Attach `Authorization: Bearer` when the session carries an opaque token
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.get_token().and_then(|t| t.bearer) {
            Some(bearer) => request.bearer_auth(bearer),
            None => request,
        }
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> GatewayResult<Value> {
        let request = self.http_client.post(self.url(endpoint)).query(query).json(body);
        self.send(endpoint, request).await
    }

    async fn put_json<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> GatewayResult<Value> {
        let request = self.http_client.put(self.url(endpoint)).json(body);
        self.send(endpoint, request).await
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> GatewayResult<Value> {
        tracing::debug!(endpoint, "Calling backend");

        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(endpoint, status = status.as_u16(), bytes = body.len(), "Backend responded");

        read_envelope(status, &body)
    }
}

/// Map status and envelope to data or a typed error
pub(crate) fn read_envelope(status: StatusCode, body: &str) -> GatewayResult<Value> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return Err(GatewayError::AuthRejected {
                status: status.as_u16(),
                message,
            })
        }
        StatusCode::NOT_FOUND => return Err(GatewayError::NotFound(message)),
        s if !s.is_success() => {
            return Err(GatewayError::Server {
                status: s.as_u16(),
                message,
            })
        }
        _ => {}
    }

    let envelope = parsed.ok_or_else(|| {
        GatewayError::MalformedResponse(format!("body is not JSON: {:.80}", body))
    })?;

    match envelope.get("success") {
        Some(Value::Bool(true)) => Ok(envelope),
        Some(Value::Bool(false)) => Err(GatewayError::Rejected(message)),
        _ => Err(GatewayError::MalformedResponse(
            "envelope has no boolean `success`".to_string(),
        )),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> GatewayResult<T> {
    serde_json::from_value(value).map_err(|e| GatewayError::MalformedResponse(e.to_string()))
}

fn take_field(envelope: &mut Value, names: &[&str]) -> Option<Value> {
    let object = envelope.as_object_mut()?;
    names
        .iter()
        .filter_map(|name| object.remove(*name))
        .find(|v| !v.is_null())
}

#[async_trait]
impl PortalBackend for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> GatewayResult<LoginGrant> {
        let envelope = self.post_json("login.php", &[], credentials).await?;
        decode(envelope)
    }

    async fn register(&self, request: &RegisterRequest) -> GatewayResult<Ack> {
        decode(self.post_json("register.php", &[], request).await?)
    }

    async fn get_profile(&self, user_id: &str) -> GatewayResult<UserProfile> {
        let mut envelope = self
            .post_json("get_profile.php", &[], &json!({ "user_id": user_id }))
            .await?;
        let profile = take_field(&mut envelope, &["data", "user"]).ok_or_else(|| {
            GatewayError::MalformedResponse("profile response has no user data".to_string())
        })?;
        decode(profile)
    }

    async fn update_profile(&self, request: &ProfileUpdateRequest) -> GatewayResult<Ack> {
        decode(self.put_json("update_profile.php", request).await?)
    }

    async fn create_submission(&self, title: &str, submitted_by: &str) -> GatewayResult<Ack> {
        let body = json!({ "title": title, "submitted_by": submitted_by });
        decode(self.post_json("title_submission.php", &[], &body).await?)
    }

    async fn make_submission(
        &self,
        payload: &SubmissionPayload,
    ) -> GatewayResult<SubmissionReceipt> {
        decode(self.post_json("make_submission.php", &[], payload).await?)
    }

    async fn list_submissions(&self, submitted_by: &str) -> GatewayResult<Vec<SubmissionSummary>> {
        let mut envelope = self
            .post_json(
                "get_submissions.php",
                &[("submitted_by", submitted_by)],
                &json!({}),
            )
            .await?;
        match take_field(&mut envelope, &["submissions"]) {
            Some(list) => decode(list),
            None => Ok(Vec::new()),
        }
    }

    async fn delete_submission(&self, submission_id: &str) -> GatewayResult<Ack> {
        let body = json!({ "submissionId": submission_id });
        decode(self.post_json("delete_submission.php", &[], &body).await?)
    }

    async fn save_contributors(
        &self,
        submission_id: &str,
        contributors: &ContributorList,
    ) -> GatewayResult<Ack> {
        let body = json!({ "submissionId": submission_id, "contributors": contributors });
        decode(self.post_json("save_contributors.php", &[], &body).await?)
    }

    async fn upload_file(&self, user_id: &str, file: &UploadCandidate) -> GatewayResult<String> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| GatewayError::Storage(e.into()))?;

        let part = multipart::Part::bytes(bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("id", user_id.to_string());

        let request = self.http_client.post(self.url("upload.php")).multipart(form);
        let mut envelope = self.send("upload.php", request).await?;

        match take_field(&mut envelope, &["fileName"]) {
            Some(Value::String(name)) if !name.is_empty() => Ok(name),
            _ => Err(GatewayError::MalformedResponse(
                "upload response has no fileName".to_string(),
            )),
        }
    }

    async fn request_password_reset(&self, email: &str) -> GatewayResult<Ack> {
        let body = json!({ "email": email });
        decode(
            self.post_json("reset.php", &[("action", "request")], &body)
                .await?,
        )
    }

    async fn confirm_password_reset(&self, token: &str, password: &str) -> GatewayResult<Ack> {
        let body = json!({ "token": token, "password": password });
        decode(self.post_json("reset.php", &[("action", "reset")], &body).await?)
    }
}
