mod client;
mod error;
mod upload;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use upload::{uploaded_name, UploadHandle, UploadRequest};

use async_trait::async_trait;
use orbit_types::*;

/// Operations the screens need from the media API.
///
/// `ApiClient` is the production implementation; tests drive the application
/// through an in-memory fake.
#[async_trait]
pub trait MediaApi: Send + Sync {
    /// Exchange credentials for a token. A returned token is persisted in the session.
    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse>;

    async fn register(&self, username: &str, password: &str, role: Role) -> ApiResult<serde_json::Value>;

    /// Validate the stored bearer token.
    async fn verify_token(&self) -> ApiResult<VerifyTokenResponse>;

    async fn list_media(&self) -> ApiResult<Vec<Post>>;

    async fn search_media(&self, query: &str) -> ApiResult<Vec<Post>>;

    /// Raw-body upload; resolves to the new post's identifier.
    async fn upload_media(&self, upload: UploadRequest) -> ApiResult<String>;

    /// Raw-body upload on a background task with progress reporting and abort.
    /// Must be called from within a tokio runtime.
    fn upload_media_with_progress(&self, upload: UploadRequest) -> UploadHandle;

    async fn like_media(&self, name: &str) -> ApiResult<LikeResponse>;

    /// Resolves to the JSON body, the text body as a JSON string, or `None` for an empty body.
    async fn delete_media(&self, name: &str) -> ApiResult<Option<serde_json::Value>>;

    async fn ai_caption(&self, name: &str) -> ApiResult<CaptionResponse>;

    async fn get_comments(&self, media_name: &str) -> ApiResult<Vec<Comment>>;

    async fn add_comment(
        &self,
        media_name: &str,
        comment: &str,
        parent_id: Option<CommentId>,
    ) -> ApiResult<serde_json::Value>;
}
