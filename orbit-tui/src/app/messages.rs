//! Answers from background tasks and how each one lands in the app state.
//!
//! Optimistic changes are already on screen when a task starts; the handlers
//! here confirm them or roll back exactly the one change that failed.

use orbit_types::{CaptionResponse, Comment, LikeResponse, LoginResponse, Post, Role};

use super::state::{App, AuthState, Dialog, InputMode, Screen, StatusKind};
use super::tasks;
use crate::api::{uploaded_name, ApiError, ApiResult, UploadRequest};
use crate::auth::GuardOutcome;
use crate::feed::DeleteSnapshot;
use crate::log_to;
use crate::profile::UPLOAD_STATUS_TTL;
use crate::upload::UploadState;

/// Where a like was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeSource {
    Feed,
    /// The detail modal; `mirrored` when the feed row got the optimistic +1 too.
    Detail { mirrored: bool },
}

pub enum AppMessage {
    SessionChecked {
        result: anyhow::Result<GuardOutcome>,
        open_profile: Option<String>,
    },
    LoggedIn {
        username: String,
        result: ApiResult<LoginResponse>,
    },
    Registered {
        username: String,
        role: Role,
        result: ApiResult<serde_json::Value>,
    },
    FeedLoaded {
        request: u64,
        query: Option<String>,
        result: ApiResult<Vec<Post>>,
    },
    LikeSettled {
        name: String,
        source: LikeSource,
        result: ApiResult<LikeResponse>,
    },
    DeleteSettled {
        name: String,
        snapshot: DeleteSnapshot,
        result: ApiResult<Option<serde_json::Value>>,
    },
    CaptionGenerated {
        name: String,
        result: ApiResult<CaptionResponse>,
    },
    CommentsLoaded {
        name: String,
        result: ApiResult<Vec<Comment>>,
    },
    CommentAdded {
        name: String,
        result: ApiResult<serde_json::Value>,
    },
    UploadPrepared(anyhow::Result<UploadRequest>),
    UploadRetried(ApiResult<String>),
    ProfileLoaded {
        username: String,
        result: ApiResult<Vec<Post>>,
    },
    ProfilePicturePrepared {
        username: String,
        result: anyhow::Result<UploadRequest>,
    },
    OldProfilePicturesRemoved {
        username: String,
    },
}

impl AppMessage {
    pub fn label(&self) -> &'static str {
        match self {
            AppMessage::SessionChecked { .. } => "SessionChecked",
            AppMessage::LoggedIn { .. } => "LoggedIn",
            AppMessage::Registered { .. } => "Registered",
            AppMessage::FeedLoaded { .. } => "FeedLoaded",
            AppMessage::LikeSettled { .. } => "LikeSettled",
            AppMessage::DeleteSettled { .. } => "DeleteSettled",
            AppMessage::CaptionGenerated { .. } => "CaptionGenerated",
            AppMessage::CommentsLoaded { .. } => "CommentsLoaded",
            AppMessage::CommentAdded { .. } => "CommentAdded",
            AppMessage::UploadPrepared(_) => "UploadPrepared",
            AppMessage::UploadRetried(_) => "UploadRetried",
            AppMessage::ProfileLoaded { .. } => "ProfileLoaded",
            AppMessage::ProfilePicturePrepared { .. } => "ProfilePicturePrepared",
            AppMessage::OldProfilePicturesRemoved { .. } => "OldProfilePicturesRemoved",
        }
    }
}

impl App {
    /// Apply every answer that has arrived since the last frame.
    pub(super) fn process_messages(&mut self) {
        while let Some(message) = self.tasks.try_next() {
            match message {
                AppMessage::SessionChecked {
                    result,
                    open_profile,
                } => self.on_session_checked(result, open_profile),
                AppMessage::LoggedIn { username, result } => self.on_logged_in(username, result),
                AppMessage::Registered {
                    username,
                    role,
                    result,
                } => self.on_registered(username, role, result),
                AppMessage::FeedLoaded {
                    request,
                    query,
                    result,
                } => self.on_feed_loaded(request, query, result),
                AppMessage::LikeSettled {
                    name,
                    source,
                    result,
                } => self.on_like_settled(name, source, result),
                AppMessage::DeleteSettled {
                    name,
                    snapshot,
                    result,
                } => self.on_delete_settled(name, snapshot, result),
                AppMessage::CaptionGenerated { name, result } => {
                    self.on_caption_generated(name, result)
                }
                AppMessage::CommentsLoaded { name, result } => {
                    self.on_comments_loaded(name, result)
                }
                AppMessage::CommentAdded { name, result } => self.on_comment_added(name, result),
                AppMessage::UploadPrepared(result) => self.on_upload_prepared(result),
                AppMessage::UploadRetried(result) => self.on_upload_retried(result),
                AppMessage::ProfileLoaded { username, result } => {
                    self.on_profile_loaded(username, result)
                }
                AppMessage::ProfilePicturePrepared { username, result } => {
                    self.on_profile_picture_prepared(username, result)
                }
                AppMessage::OldProfilePicturesRemoved { username } => {
                    if let Some(profile) = self.profile.as_mut().filter(|p| p.username == username)
                    {
                        profile.cleaning = false;
                        self.complete_profile_update();
                    }
                }
            }
        }
    }

    fn on_session_checked(
        &mut self,
        result: anyhow::Result<GuardOutcome>,
        open_profile: Option<String>,
    ) {
        let role = match result {
            Ok(GuardOutcome::Authorized { role, username }) => {
                log::info!("Resumed session for {} ({})", username, role.as_str());
                role
            }
            Ok(GuardOutcome::Redirect { role, username, to }) => {
                log::info!("Resumed session for {}, routing to {:?}", username, to);
                role
            }
            Ok(GuardOutcome::Unauthenticated) => {
                self.show_login(None);
                return;
            }
            Err(e) => {
                log::error!("Session check failed: {:#}", e);
                self.show_login(Some(format!("Could not reach the server: {:#}", e)));
                return;
            }
        };

        self.auth_state = AuthState::new();
        self.upload = UploadState::new(self.current_username());
        self.navigate(Screen::home_for(role));
        self.load_feed();
        if let Some(username) = open_profile {
            self.open_profile(username);
        }
    }

    fn on_logged_in(&mut self, username: String, result: ApiResult<LoginResponse>) {
        self.auth_state.loading = false;
        match result {
            Ok(response) if response.token.is_some() => {
                let role = response.role.unwrap_or_default();
                log::info!("Logged in as {} ({})", username, role.as_str());
                self.auth_state = AuthState::new();
                self.upload = UploadState::new(self.current_username());
                self.navigate(Screen::home_for(role));
                self.load_feed();
            }
            Ok(_) => {
                self.auth_state.error = Some("Login failed: no token returned".to_string());
            }
            Err(e) => {
                log::warn!("Login failed: {}", e);
                self.auth_state.error = Some(format!("Login failed: {}", e));
            }
        }
    }

    fn on_registered(&mut self, username: String, role: Role, result: ApiResult<serde_json::Value>) {
        self.auth_state.loading = false;
        match result {
            Ok(_) => {
                log::info!("Registered {} as {}", username, role.as_str());
                self.auth_state.toggle_mode();
                self.auth_state.password.clear();
                self.auth_state.notice = Some("Account created. Please log in.".to_string());
            }
            Err(e) => {
                self.auth_state.error = Some(format!("Registration failed: {}", e));
            }
        }
    }

    fn on_feed_loaded(&mut self, request: u64, query: Option<String>, result: ApiResult<Vec<Post>>) {
        if !self.feed.is_current(request) {
            log_to!(self.log_config, Feed, "Ignoring superseded listing #{}", request);
            return;
        }
        match result {
            Ok(posts) => {
                match &query {
                    Some(query) => {
                        log_to!(self.log_config, Feed, "Search '{}' returned {} posts", query, posts.len())
                    }
                    None => log_to!(self.log_config, Feed, "Loaded {} posts", posts.len()),
                }
                self.feed.finish_load(posts);
            }
            Err(e) => {
                self.feed.fail_load(e.to_string());
                let context = if query.is_some() { "Search" } else { "Loading feed" };
                self.handle_api_error(context, &e);
            }
        }
    }

    fn on_like_settled(&mut self, name: String, source: LikeSource, result: ApiResult<LikeResponse>) {
        let mirrored = match source {
            LikeSource::Feed => true,
            LikeSource::Detail { mirrored } => mirrored,
        };
        let detail = match source {
            LikeSource::Detail { .. } => self.detail.as_mut().filter(|d| d.post.name == name),
            LikeSource::Feed => None,
        };

        match result {
            Ok(response) => {
                if let Some(detail) = detail {
                    detail.confirm_like(response.likes);
                }
                if mirrored {
                    self.feed.confirm_like(&name, response.likes);
                }
            }
            Err(e) => {
                if let Some(detail) = detail {
                    detail.revert_like();
                }
                if mirrored {
                    self.feed.revert_like(&name);
                }
                self.handle_api_error("Like", &e);
            }
        }
    }

    fn on_delete_settled(
        &mut self,
        name: String,
        snapshot: DeleteSnapshot,
        result: ApiResult<Option<serde_json::Value>>,
    ) {
        match result {
            Ok(body) => {
                log_to!(self.log_config, Feed, "Deleted {}: {:?}", name, body);
                self.set_status("Post deleted", StatusKind::Success);
            }
            Err(e) => {
                self.feed.restore(snapshot);
                if !self.handle_api_error("Delete", &e) {
                    self.dialog = Some(Dialog::Error {
                        title: "Delete failed".to_string(),
                        message: format!("Failed to delete post: {}", e),
                    });
                }
            }
        }
    }

    fn on_caption_generated(&mut self, name: String, result: ApiResult<CaptionResponse>) {
        match result {
            Ok(response) => match response.caption.filter(|c| !c.trim().is_empty()) {
                Some(caption) => {
                    self.feed.set_caption(&name, caption.clone());
                    if let Some(detail) = self.detail.as_mut().filter(|d| d.post.name == name) {
                        detail.post.caption = caption;
                    }
                    self.set_status("Caption updated", StatusKind::Success);
                }
                None => self.set_status("No caption returned", StatusKind::Info),
            },
            Err(e) => {
                self.handle_api_error("AI caption", &e);
            }
        }
    }

    fn on_comments_loaded(&mut self, name: String, result: ApiResult<Vec<Comment>>) {
        let Some(detail) = self.detail.as_mut().filter(|d| d.post.name == name) else {
            return;
        };
        match result {
            Ok(comments) => detail.set_comments(comments),
            Err(e) => {
                detail.set_comments(Vec::new());
                self.handle_api_error("Loading comments", &e);
            }
        }
    }

    fn on_comment_added(&mut self, name: String, result: ApiResult<serde_json::Value>) {
        let detail = self.detail.as_mut().filter(|d| d.post.name == name);
        match result {
            Ok(_) => {
                if let Some(detail) = detail {
                    detail.submitting = false;
                    detail.composer.clear();
                    detail.composer.active = false;
                    detail.reply_to = None;
                    self.input_mode = InputMode::Navigation;
                    self.load_comments();
                }
            }
            Err(e) => {
                if let Some(detail) = detail {
                    detail.submitting = false;
                }
                if !self.handle_api_error("Comment", &e) {
                    self.dialog = Some(Dialog::Error {
                        title: "Comment failed".to_string(),
                        message: "Failed to add comment. Please try again.".to_string(),
                    });
                }
            }
        }
    }

    fn on_upload_prepared(&mut self, result: anyhow::Result<UploadRequest>) {
        if !self.upload.preparing {
            log_to!(self.log_config, Upload, "Dropping prepared upload, it was cancelled");
            return;
        }
        self.upload.preparing = false;

        match result {
            Ok(request) => {
                log_to!(self.log_config, Upload, "Uploading {} bytes", request.body.len());
                self.upload.request = Some(request.clone());
                self.upload.handle = Some(self.api.upload_media_with_progress(request));
                self.upload.status = "Uploading...".to_string();
            }
            Err(e) => {
                log::error!("Preparing upload failed: {:#}", e);
                self.upload.status = format!("Crop failed: {:#}", e);
            }
        }
    }

    /// Result of the progress-reporting upload. Anything but a cancel or an
    /// expired session gets one more try through the plain endpoint.
    pub(super) fn finish_upload(&mut self, result: ApiResult<String>) {
        self.upload.progress = 0;
        let request = self.upload.request.take();

        match result {
            Ok(body) => self.upload_succeeded(body),
            Err(ApiError::Aborted) => {
                self.upload.status = "Upload cancelled".to_string();
            }
            Err(e) if e.is_unauthorized() => {
                self.handle_api_error("Upload", &e);
            }
            Err(e) => match request {
                Some(request) => {
                    log::warn!("Upload failed ({}), retrying without progress", e);
                    self.upload.status = "Upload failed, retrying...".to_string();
                    self.upload.retrying = true;
                    tasks::retry_upload(self.api.clone(), self.tasks.sender(), request);
                }
                None => {
                    if !self.handle_api_error("Upload", &e) {
                        self.upload.status = format!("Upload failed: {}", e);
                    }
                }
            },
        }
    }

    fn on_upload_retried(&mut self, result: ApiResult<String>) {
        if !self.upload.retrying {
            return;
        }
        self.upload.retrying = false;

        match result {
            Ok(body) => self.upload_succeeded(body),
            Err(e) => {
                if !self.handle_api_error("Upload", &e) {
                    self.upload.status = format!("Upload failed: {}", e);
                }
            }
        }
    }

    fn upload_succeeded(&mut self, body: String) {
        log_to!(self.log_config, Upload, "Upload finished: {}", body);
        self.upload.reset_after_upload();
        self.upload.status = "Uploaded successfully".to_string();
        self.set_status("Uploaded successfully", StatusKind::Success);
        self.navigate(Screen::home_for(self.current_role()));
        self.load_feed();
    }

    fn on_profile_loaded(&mut self, username: String, result: ApiResult<Vec<Post>>) {
        let Some(profile) = self.profile.as_mut().filter(|p| p.username == username) else {
            return;
        };
        match result {
            Ok(all) => profile.apply_listing(&all),
            Err(e) => {
                profile.fail_listing();
                self.handle_api_error("Loading profile", &e);
            }
        }
    }

    fn on_profile_picture_prepared(
        &mut self,
        username: String,
        result: anyhow::Result<UploadRequest>,
    ) {
        let Some(profile) = self
            .profile
            .as_mut()
            .filter(|p| p.username == username && p.preparing)
        else {
            return;
        };
        profile.preparing = false;

        match result {
            Ok(request) => {
                log_to!(
                    self.log_config,
                    Upload,
                    "Uploading profile picture ({} bytes)",
                    request.body.len()
                );
                profile.progress = 0;
                profile.handle = Some(self.api.upload_media_with_progress(request));
                self.set_status("Uploading profile picture...", StatusKind::Info);
            }
            Err(e) => {
                log::error!("Profile picture crop failed: {:#}", e);
                self.set_status_for("Upload failed", StatusKind::Error, UPLOAD_STATUS_TTL);
            }
        }
    }

    pub(super) fn finish_profile_upload(&mut self, result: ApiResult<String>) {
        let Some(username) = self.profile.as_ref().map(|p| p.username.clone()) else {
            return;
        };

        match result {
            Ok(body) => {
                self.set_status("Uploaded", StatusKind::Success);
                match uploaded_name(&body) {
                    Some(new_name) => {
                        if let Some(profile) = self.profile.as_mut() {
                            profile.cleaning = true;
                        }
                        tasks::remove_old_profile_pictures(
                            self.api.clone(),
                            self.tasks.sender(),
                            username,
                            new_name,
                        );
                    }
                    None => {
                        log::warn!("Upload response carried no name, keeping older profile pictures");
                        self.complete_profile_update();
                    }
                }
            }
            Err(ApiError::Aborted) => {
                self.set_status("Upload cancelled", StatusKind::Info);
            }
            Err(e) => {
                if let Some(profile) = self.profile.as_mut() {
                    profile.progress = 0;
                }
                if !self.handle_api_error("Profile picture upload", &e) {
                    self.set_status_for("Upload failed", StatusKind::Error, UPLOAD_STATUS_TTL);
                }
            }
        }
    }

    fn complete_profile_update(&mut self) {
        if let Some(profile) = self.profile.as_mut() {
            profile.clear_selection();
            profile.progress = 0;
        }
        self.load_profile();
        self.set_status_for(
            "Profile picture updated",
            StatusKind::Success,
            UPLOAD_STATUS_TTL,
        );
    }
}
