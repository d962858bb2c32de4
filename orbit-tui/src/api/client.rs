use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use super::upload::progress_body;
use super::{ApiError, ApiResult, MediaApi, UploadHandle, UploadRequest};
use crate::session::SessionContext;
use orbit_types::*;

/// API client for the Orbit media endpoints
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionContext,
}

impl ApiClient {
    /// Create a new API client. The token is read from `session` on every request.
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Helper to add the bearer token to a request if one is stored
    fn add_auth_header(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token() {
            Some(token) => req.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => req,
        }
    }

    /// Map non-success statuses to errors. A 401 wipes the session first.
    async fn check_status(&self, response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            log::warn!("Received 401 from {}, clearing session", response.url().path());
            if let Err(e) = self.session.clear() {
                log::error!("Failed to clear session after 401: {}", e);
            }
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .trim_end()
            .to_string()
        } else if body.contains("<html>") || body.contains("<!DOCTYPE") {
            format!(
                "Server returned {} error. Please check the server URL.",
                status.as_u16()
            )
        } else {
            body
        };

        match status.as_u16() {
            404 => Err(ApiError::NotFound(message)),
            400 => Err(ApiError::BadRequest(message)),
            code => Err(ApiError::Http {
                status: code,
                message,
            }),
        }
    }

    /// Helper to handle JSON API responses
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> ApiResult<T> {
        let response = self.check_status(response).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn upload_builder(&self, upload: &UploadRequest) -> reqwest::RequestBuilder {
        let url = self.url(&format!("/upload_media?{}", upload.query()));
        let mut req = self.add_auth_header(self.client.post(&url));
        if let Some(mime) = &upload.mime_type {
            req = req.header(CONTENT_TYPE, mime.as_str());
        }
        req
    }

    async fn send_with_progress(self, upload: UploadRequest, progress: watch::Sender<u8>) -> ApiResult<String> {
        let total = upload.body.len();
        let req = self
            .upload_builder(&upload)
            .header(CONTENT_LENGTH, total)
            .body(progress_body(upload.body.clone(), progress));

        let response = self.check_status(req.send().await?).await?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl MediaApi for ApiClient {
    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self.client.post(self.url("/login")).json(&request).send().await?;
        let login: LoginResponse = self.handle_response(response).await?;

        if let Some(token) = &login.token {
            let role = login.role.unwrap_or_default();
            if let Err(e) = self.session.store_login(token, role, username) {
                log::error!("Failed to persist session: {}", e);
            }
        }

        Ok(login)
    }

    async fn register(&self, username: &str, password: &str, role: Role) -> ApiResult<serde_json::Value> {
        let request = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            role,
        };
        let response = self.client.post(self.url("/register")).json(&request).send().await?;
        self.handle_response(response).await
    }

    async fn verify_token(&self) -> ApiResult<VerifyTokenResponse> {
        let req = self.add_auth_header(
            self.client
                .post(self.url("/verify_token"))
                .header(CONTENT_TYPE, "application/json"),
        );
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn list_media(&self) -> ApiResult<Vec<Post>> {
        let req = self.add_auth_header(self.client.get(self.url("/list_media")));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn search_media(&self, query: &str) -> ApiResult<Vec<Post>> {
        let url = self.url(&format!("/search_media?q={}", urlencoding::encode(query)));
        let req = self.add_auth_header(self.client.get(&url));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn upload_media(&self, upload: UploadRequest) -> ApiResult<String> {
        let req = self.upload_builder(&upload).body(upload.body.clone());
        let response = self.check_status(req.send().await?).await?;
        Ok(response.text().await?)
    }

    fn upload_media_with_progress(&self, upload: UploadRequest) -> UploadHandle {
        let (tx, rx) = watch::channel(0u8);
        let task = tokio::spawn(self.clone().send_with_progress(upload, tx));
        UploadHandle::new(rx, task)
    }

    async fn like_media(&self, name: &str) -> ApiResult<LikeResponse> {
        let url = self.url(&format!("/like_media?name={}", urlencoding::encode(name)));
        let req = self.add_auth_header(self.client.post(&url));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn delete_media(&self, name: &str) -> ApiResult<Option<serde_json::Value>> {
        let url = self.url(&format!("/delete_media?name={}", urlencoding::encode(name)));
        let req = self.add_auth_header(self.client.delete(&url));
        let response = self.check_status(req.send().await?).await?;

        let text = match response.text().await {
            Ok(text) => text,
            Err(_) => return Ok(None),
        };
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)),
        ))
    }

    async fn ai_caption(&self, name: &str) -> ApiResult<CaptionResponse> {
        let url = self.url(&format!("/ai_caption?name={}", urlencoding::encode(name)));
        let req = self.add_auth_header(self.client.get(&url));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn get_comments(&self, media_name: &str) -> ApiResult<Vec<Comment>> {
        let url = self.url(&format!(
            "/get_comments?media_name={}",
            urlencoding::encode(media_name)
        ));
        let req = self.add_auth_header(self.client.get(&url));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn add_comment(
        &self,
        media_name: &str,
        comment: &str,
        parent_id: Option<CommentId>,
    ) -> ApiResult<serde_json::Value> {
        let request = AddCommentRequest {
            media_name: media_name.to_string(),
            comment: comment.to_string(),
            parent_id,
        };
        let req = self.add_auth_header(self.client.post(self.url("/add_comment")).json(&request));
        let response = req.send().await?;
        self.handle_response(response).await
    }
}
