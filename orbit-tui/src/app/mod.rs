pub mod handlers;
pub mod messages;
pub mod state;
pub mod tasks;


pub use state::*;

use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use std::time::{Duration, Instant};

use orbit_types::{Role, PROFILE_PIC_CAPTION};

use crate::api::{ApiError, MediaApi};
use crate::config::{ConfigManager, UserPreferences};
use crate::crop::image_dimensions;
use crate::detail::DetailState;
use crate::feed::{FeedState, LoadPhase};
use crate::log_to;
use crate::logging::LogConfig;
use crate::profile::{CropPreview, ProfileState, PREVIEW_STATUS_TTL};
use crate::session::SessionContext;
use crate::ui::theme::ColorScheme;
use crate::upload::{self, UploadState};
use messages::LikeSource;
use tasks::{TaskQueue, UploadSource};

impl App {
    pub fn new(api: Arc<dyn MediaApi>, session: SessionContext) -> Self {
        let upload = UploadState::new(session.username());
        Self {
            running: true,
            screen: Screen::Login,
            api,
            session,
            auth_state: AuthState::new(),
            feed: FeedState::new(),
            detail: None,
            upload,
            profile: None,
            dialog: None,
            status: None,
            searching: false,
            show_help: false,
            input_mode: InputMode::Typing,
            return_screen: Screen::Feed,
            color_scheme: ColorScheme::default(),
            config_manager: None,
            log_config: LogConfig::default(),
            tasks: TaskQueue::new(),
        }
    }

    /// Attach the config directory and apply the saved preferences.
    pub fn with_config(mut self, config_manager: ConfigManager, log_config: LogConfig) -> Self {
        self.color_scheme = config_manager.load_preferences().color_scheme;
        self.config_manager = Some(config_manager);
        self.log_config = log_config;
        self
    }

    pub fn current_role(&self) -> Role {
        self.session.role().unwrap_or_default()
    }

    pub fn current_username(&self) -> Option<String> {
        self.session.username()
    }

    /// Validate the stored session in the background, then land on the
    /// screen for its role.
    ///
    /// `open_profile` is shown on top of the home screen once signed in.
    pub fn start(&mut self, open_profile: Option<String>) {
        if !self.session.is_authenticated() {
            self.show_login(None);
            return;
        }
        self.auth_state.loading = true;
        self.auth_state.notice = Some("Checking session...".to_string());
        log_to!(self.log_config, Api, "POST /verify_token");
        tasks::check_session(
            self.api.clone(),
            self.session.clone(),
            self.tasks.sender(),
            open_profile,
        );
    }

    /// Whether anything started from the UI is still running.
    pub fn is_busy(&self) -> bool {
        self.tasks.pending() > 0
            || self.upload.is_uploading()
            || self.profile.as_ref().is_some_and(ProfileState::is_uploading)
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.set_status_for(text, kind, STATUS_TTL);
    }

    pub fn set_status_for(&mut self, text: impl Into<String>, kind: StatusKind, ttl: Duration) {
        self.status = Some(StatusMessage::new(text, kind, ttl));
    }

    /// Drop expired status messages and like locks.
    pub fn clear_expired_messages(&mut self) {
        let now = Instant::now();
        if self.status.as_ref().is_some_and(|s| s.is_expired(now)) {
            self.status = None;
        }
        self.feed.likes_in_flight.expire(now);
    }

    /// Reset everything user specific and show the login form. Answers to
    /// requests started before this point are discarded.
    pub fn show_login(&mut self, notice: Option<String>) {
        if let Some(handle) = self.upload.handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.profile.as_mut().and_then(|p| p.handle.take()) {
            handle.abort();
        }
        self.tasks.reset();

        self.screen = Screen::Login;
        self.feed = FeedState::new();
        self.detail = None;
        self.profile = None;
        self.dialog = None;
        self.searching = false;
        self.upload = UploadState::default();
        self.auth_state = AuthState {
            notice,
            ..AuthState::new()
        };
        self.input_mode = InputMode::Typing;
    }

    /// Report a failed call. Returns true when the session ended and the
    /// login screen is now showing.
    pub fn handle_api_error(&mut self, context: &str, err: &ApiError) -> bool {
        log::error!("{} failed: {}", context, err);
        if err.is_unauthorized() {
            self.show_login(Some("Session expired. Please log in again.".to_string()));
            return true;
        }
        self.set_status(format!("{} failed: {}", context, err), StatusKind::Error);
        false
    }

    /// Move to `screen`, honouring role routing for the signed-in user.
    pub fn navigate(&mut self, screen: Screen) {
        let target = screen.routed_for(self.current_role());
        if target != screen {
            log::debug!("Routed {:?} to {:?}", screen, target);
        }

        self.screen = target;
        self.searching = false;
        self.input_mode = match target {
            Screen::Login | Screen::Upload => InputMode::Typing,
            _ => InputMode::Navigation,
        };

        match target {
            Screen::Creator => {
                self.feed.query.clear();
                self.feed.author_filter = self.current_username();
            }
            Screen::Feed => self.feed.author_filter = None,
            _ => {}
        }
        self.feed.clamp_selection();
    }

    // ----- Authentication -----

    pub fn login(&mut self) {
        if !self.auth_state.credentials_ready() {
            self.auth_state.error = Some("Username and password are required".to_string());
            return;
        }

        self.auth_state.loading = true;
        self.auth_state.error = None;
        let username = self.auth_state.username.trim().to_string();
        log_to!(self.log_config, Api, "POST /login as {}", username);

        tasks::login(
            self.api.clone(),
            self.tasks.sender(),
            username,
            self.auth_state.password.clone(),
        );
    }

    pub fn register(&mut self) {
        if !self.auth_state.credentials_ready() {
            self.auth_state.error = Some("Username and password are required".to_string());
            return;
        }

        self.auth_state.loading = true;
        self.auth_state.error = None;
        let username = self.auth_state.username.trim().to_string();
        log_to!(self.log_config, Api, "POST /register as {}", username);

        tasks::register(
            self.api.clone(),
            self.tasks.sender(),
            username,
            self.auth_state.password.clone(),
            self.auth_state.role,
        );
    }

    pub fn logout(&mut self) -> Result<()> {
        self.session.clear()?;
        log::info!("Logged out");
        self.show_login(Some("Logged out".to_string()));
        Ok(())
    }

    // ----- Feed -----

    pub fn load_feed(&mut self) {
        let request = self.feed.begin_load();
        log_to!(self.log_config, Api, "GET /list_media (#{})", request);
        tasks::load_feed(self.api.clone(), self.tasks.sender(), request, None);
    }

    /// Server-side search; an empty query reloads the full listing.
    pub fn search_remote(&mut self) {
        let query = self.feed.query.trim().to_string();
        if query.is_empty() {
            return self.load_feed();
        }

        let request = self.feed.begin_load();
        log_to!(self.log_config, Api, "GET /search_media?q={} (#{})", query, request);
        tasks::load_feed(self.api.clone(), self.tasks.sender(), request, Some(query));
    }

    pub fn like_selected(&mut self) {
        if let Some(name) = self.feed.selected_post().map(|p| p.name.clone()) {
            self.like_post(&name);
        }
    }

    /// Optimistic like with a per-post lock against rapid repeats. The +1 is
    /// on screen before the request leaves.
    pub fn like_post(&mut self, name: &str) {
        if !self.feed.likes_in_flight.try_acquire(name, Instant::now()) {
            log_to!(self.log_config, Feed, "Ignoring repeated like on {}", name);
            return;
        }
        if !self.feed.apply_like(name) {
            return;
        }

        log_to!(self.log_config, Api, "POST /like_media {}", name);
        tasks::like(
            self.api.clone(),
            self.tasks.sender(),
            name.to_string(),
            LikeSource::Feed,
        );
    }

    pub fn request_delete(&mut self) {
        if let Some(post) = self.feed.selected_post() {
            self.dialog = Some(Dialog::ConfirmDelete {
                name: post.name.clone(),
                caption: post.display_caption().to_string(),
            });
        }
    }

    pub fn confirm_delete(&mut self) {
        match self.dialog.take() {
            Some(Dialog::ConfirmDelete { name, .. }) => self.delete_post(&name),
            other => self.dialog = other,
        }
    }

    /// Remove the post right away and put it back where it was if the
    /// server refuses.
    pub fn delete_post(&mut self, name: &str) {
        let Some(snapshot) = self.feed.remove_post(name) else {
            return;
        };
        if self.detail.as_ref().is_some_and(|d| d.post.name == name) {
            self.detail = None;
        }

        log_to!(self.log_config, Api, "DELETE /delete_media {}", name);
        tasks::delete(
            self.api.clone(),
            self.tasks.sender(),
            name.to_string(),
            snapshot,
        );
    }

    pub fn ai_caption_selected(&mut self) {
        let Some(name) = self.feed.selected_post().map(|p| p.name.clone()) else {
            return;
        };

        self.set_status("Generating caption...", StatusKind::Info);
        log_to!(self.log_config, Api, "GET /ai_caption {}", name);
        tasks::ai_caption(self.api.clone(), self.tasks.sender(), name);
    }

    // ----- Detail modal -----

    pub fn open_detail(&mut self) {
        let Some(post) = self.feed.selected_post().cloned() else {
            return;
        };
        self.detail = Some(DetailState::new(post));
        self.load_comments();
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
        self.input_mode = InputMode::Navigation;
    }

    pub fn load_comments(&mut self) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        detail.comments_phase = LoadPhase::Loading;
        let name = detail.post.name.clone();
        log_to!(self.log_config, Api, "GET /get_comments {}", name);
        tasks::load_comments(self.api.clone(), self.tasks.sender(), name);
    }

    /// Like from the modal. Mirrors the optimistic count onto the feed row.
    pub fn detail_like(&mut self) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        if !detail.begin_like() {
            return;
        }
        let name = detail.post.name.clone();
        let mirrored = self.feed.apply_like(&name);

        log_to!(self.log_config, Api, "POST /like_media {}", name);
        tasks::like(
            self.api.clone(),
            self.tasks.sender(),
            name,
            LikeSource::Detail { mirrored },
        );
    }

    pub fn submit_comment(&mut self) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        if detail.submitting {
            return;
        }
        let Some(body) = detail.composer.submittable() else {
            return;
        };
        detail.submitting = true;
        let name = detail.post.name.clone();
        let parent = detail.reply_to.clone();
        log_to!(self.log_config, Api, "POST /add_comment {} parent={:?}", name, parent);

        tasks::add_comment(self.api.clone(), self.tasks.sender(), name, body, parent);
    }

    /// Open the media itself in the system browser.
    pub fn open_media_url(&mut self) {
        let url = match &self.detail {
            Some(detail) => Some(detail.post.url.clone()),
            None => self.feed.selected_post().map(|p| p.url.clone()),
        };
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            return;
        };

        if let Err(e) = webbrowser::open(&url) {
            log::warn!("Failed to open {}: {}", url, e);
            self.set_status(format!("Could not open browser: {}", e), StatusKind::Error);
        }
    }

    // ----- Upload -----

    pub async fn select_upload_file(&mut self) {
        let path = self.upload.path_input.clone();
        match upload::load_file(&path).await {
            Ok(file) => {
                self.upload.status = format!(
                    "Selected {} ({} KB)",
                    file.file_name(),
                    file.data.len().div_ceil(1024)
                );
                self.upload.select_file(file);
            }
            Err(e) => self.upload.status = format!("{:#}", e),
        }
    }

    pub fn suggest_caption(&mut self) {
        self.upload.suggest_caption(Local::now().date_naive());
    }

    /// Crop (when asked to) and send the selected file. Both steps run in
    /// the background; progress shows up on the next frames.
    pub fn start_upload(&mut self) {
        if self.upload.is_uploading() {
            return;
        }
        let Some(file) = self.upload.file.as_ref() else {
            self.upload.status = "Please select an image".to_string();
            return;
        };

        log_to!(
            self.log_config,
            Upload,
            "Preparing {} ({} bytes, crop {})",
            file.file_name(),
            file.data.len(),
            self.upload.crop_to_square
        );
        let source = UploadSource {
            data: file.data.clone(),
            mime_type: file.mime_type.clone(),
            crop_to_square: self.upload.crop_to_square,
            caption: self.upload.caption.clone(),
            username: self.upload.username.clone(),
        };

        self.upload.status = "Preparing upload...".to_string();
        self.upload.progress = 0;
        self.upload.preparing = true;
        tasks::prepare_upload(self.tasks.sender(), source);
    }

    pub fn cancel_upload(&mut self) {
        if !self.upload.is_uploading() {
            return;
        }
        if let Some(handle) = self.upload.handle.take() {
            handle.abort();
        }
        self.upload.preparing = false;
        self.upload.retrying = false;
        self.upload.request = None;
        self.upload.progress = 0;
        self.upload.status = "Upload cancelled".to_string();
        log_to!(self.log_config, Upload, "Upload cancelled by user");
    }

    // ----- Profile -----

    pub fn open_profile(&mut self, username: String) {
        let username = username.trim().to_string();
        if username.is_empty() {
            return;
        }
        if self.screen != Screen::Profile {
            self.return_screen = self.screen;
        }

        self.detail = None;
        self.profile = Some(ProfileState::new(username));
        self.screen = Screen::Profile;
        self.input_mode = InputMode::Navigation;
        self.load_profile();
    }

    pub fn close_profile(&mut self) {
        if self.profile.as_ref().is_some_and(ProfileState::is_uploading) {
            self.set_status("Profile picture upload in progress", StatusKind::Info);
            return;
        }
        self.profile = None;
        self.navigate(self.return_screen);
    }

    pub fn load_profile(&mut self) {
        let Some(profile) = self.profile.as_mut() else {
            return;
        };
        profile.phase = LoadPhase::Loading;
        let username = profile.username.clone();
        log_to!(self.log_config, Api, "GET /list_media for profile {}", username);
        tasks::load_profile(self.api.clone(), self.tasks.sender(), username);
    }

    /// Load the picked file and work out the square it will be cropped to.
    /// Only the image header is read for the preview.
    pub async fn select_profile_file(&mut self) {
        let Some(path) = self.profile.as_ref().map(|p| p.path_input.clone()) else {
            return;
        };

        let file = match upload::load_file(&path).await {
            Ok(file) => file,
            Err(e) => {
                self.set_status(format!("{:#}", e), StatusKind::Error);
                return;
            }
        };

        self.set_status_for("Previewing...", StatusKind::Info, PREVIEW_STATUS_TTL);
        let preview = match image_dimensions(&file.data) {
            Ok((width, height)) => Some(CropPreview::for_dimensions(width, height)),
            Err(e) => {
                log::warn!("Crop preview failed for {}: {:#}", file.file_name(), e);
                None
            }
        };

        if let Some(profile) = self.profile.as_mut() {
            profile.editing_path = false;
            profile.file = Some(file);
            profile.preview = preview;
        }
        self.input_mode = InputMode::Navigation;
    }

    pub fn upload_profile_picture(&mut self) {
        let current = self.current_username();
        let Some(profile) = self.profile.as_mut() else {
            return;
        };
        if profile.is_uploading() || !profile.is_own(current.as_deref()) {
            return;
        }
        let Some(file) = profile.file.as_ref() else {
            self.set_status("Choose a picture first", StatusKind::Info);
            return;
        };

        let source = UploadSource {
            data: file.data.clone(),
            mime_type: file.mime_type.clone(),
            crop_to_square: profile.crop_to_square,
            caption: PROFILE_PIC_CAPTION.to_string(),
            username: profile.username.clone(),
        };
        profile.preparing = true;
        profile.progress = 0;
        self.set_status("Preparing profile picture...", StatusKind::Info);
        tasks::prepare_profile_picture(self.tasks.sender(), source);
    }

    // ----- Background work -----

    /// Per-frame housekeeping: expire messages, apply finished background
    /// work and collect finished uploads. Never waits on the network.
    pub async fn tick(&mut self) {
        self.clear_expired_messages();
        self.process_messages();

        if let Some(handle) = &self.upload.handle {
            self.upload.progress = handle.progress();
            if handle.is_finished() {
                if let Some(handle) = self.upload.handle.take() {
                    let result = handle.finish().await;
                    self.finish_upload(result);
                }
            }
        }

        let finished = match self.profile.as_mut() {
            Some(profile) => match &profile.handle {
                Some(handle) => {
                    profile.progress = handle.progress();
                    if handle.is_finished() {
                        profile.handle.take()
                    } else {
                        None
                    }
                }
                None => None,
            },
            None => None,
        };
        if let Some(handle) = finished {
            let result = handle.finish().await;
            self.finish_profile_upload(result);
        }
    }

    pub fn cycle_color_scheme(&mut self) {
        self.color_scheme = self.color_scheme.next();
        let prefs = UserPreferences {
            color_scheme: self.color_scheme,
        };
        if let Some(config_manager) = &self.config_manager {
            if let Err(e) = config_manager.save_preferences(&prefs) {
                log::warn!("Failed to save preferences: {}", e);
            }
        }
        self.set_status(
            format!("Theme: {}", self.color_scheme.as_str()),
            StatusKind::Info,
        );
    }

    pub fn handle_key_event(&mut self, key: crossterm::event::KeyEvent) -> Result<Option<Action>> {
        handlers::handle_key_event(self, key)
    }

    /// Run the work a key press asked for. Network work is only started
    /// here and its answer arrives through [`App::tick`]. File selection
    /// reads the local disk before returning.
    pub async fn dispatch(&mut self, action: Action) -> Result<()> {
        log::debug!("Dispatching {:?}", action);
        match action {
            Action::Login => self.login(),
            Action::Register => self.register(),
            Action::Logout => self.logout()?,
            Action::LoadFeed => self.load_feed(),
            Action::SearchRemote => self.search_remote(),
            Action::LikeSelected => self.like_selected(),
            Action::ConfirmDelete => self.confirm_delete(),
            Action::AiCaptionSelected => self.ai_caption_selected(),
            Action::OpenDetail => self.open_detail(),
            Action::DetailLike => self.detail_like(),
            Action::SubmitComment => self.submit_comment(),
            Action::OpenMediaUrl => self.open_media_url(),
            Action::SelectUploadFile => self.select_upload_file().await,
            Action::SuggestCaption => self.suggest_caption(),
            Action::StartUpload => self.start_upload(),
            Action::CancelUpload => self.cancel_upload(),
            Action::OpenProfile(username) => self.open_profile(username),
            Action::SelectProfileFile => self.select_profile_file().await,
            Action::UploadProfilePicture => self.upload_profile_picture(),
            Action::CycleColorScheme => self.cycle_color_scheme(),
        }
        Ok(())
    }
}
