use std::sync::Arc;
use std::time::{Duration, Instant};

use orbit_types::Role;

use super::tasks::TaskQueue;
use crate::api::MediaApi;
use crate::auth::Surface;
use crate::config::ConfigManager;
use crate::detail::DetailState;
use crate::feed::FeedState;
use crate::profile::ProfileState;
use crate::session::SessionContext;
use crate::ui::theme::ColorScheme;
use crate::upload::UploadState;

/// How long ordinary status messages stay on screen.
pub const STATUS_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Navigation, // Browsing content, shortcuts active
    Typing,     // In text input, shortcuts disabled
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Feed,
    Creator,
    Upload,
    Profile,
}

impl Screen {
    pub fn surface(&self) -> Option<Surface> {
        match self {
            Screen::Login => None,
            Screen::Feed => Some(Surface::Consumer),
            Screen::Creator | Screen::Upload => Some(Surface::Creator),
            Screen::Profile => Some(Surface::Shared),
        }
    }

    /// Landing screen for a role.
    pub fn home_for(role: Role) -> Self {
        match role {
            Role::Consumer => Screen::Feed,
            Role::Creator => Screen::Creator,
        }
    }

    /// Where a session of `role` actually ends up when asking for this screen.
    pub fn routed_for(self, role: Role) -> Self {
        match (self.surface(), role) {
            (Some(Surface::Consumer), Role::Creator) => Screen::Creator,
            (Some(Surface::Creator), Role::Consumer) => Screen::Feed,
            _ => self,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Username,
    Password,
    Role,
}

/// Login / register form state
pub struct AuthState {
    pub mode: AuthMode,
    pub field: AuthField,
    pub username: String,
    pub password: String,
    pub role: Role,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl AuthState {
    pub fn new() -> Self {
        Self {
            mode: AuthMode::Login,
            field: AuthField::Username,
            username: String::new(),
            password: String::new(),
            role: Role::Consumer,
            loading: false,
            error: None,
            notice: None,
        }
    }

    pub fn next_field(&mut self) {
        self.field = match (self.field, self.mode) {
            (AuthField::Username, _) => AuthField::Password,
            (AuthField::Password, AuthMode::Register) => AuthField::Role,
            (AuthField::Password, AuthMode::Login) | (AuthField::Role, _) => AuthField::Username,
        };
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.field = AuthField::Username;
        self.error = None;
    }

    pub fn focused_input(&mut self) -> Option<&mut String> {
        match self.field {
            AuthField::Username => Some(&mut self.username),
            AuthField::Password => Some(&mut self.password),
            AuthField::Role => None,
        }
    }

    pub fn credentials_ready(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocking dialogs, resolved by key presses
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    ConfirmDelete { name: String, caption: String },
    Error { title: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Transient one-line message that clears itself
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    pub expires_at: Instant,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, kind: StatusKind, ttl: Duration) -> Self {
        Self {
            text: text.into(),
            kind,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Work a key press asks for beyond editing local state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Login,
    Register,
    Logout,
    LoadFeed,
    SearchRemote,
    LikeSelected,
    ConfirmDelete,
    AiCaptionSelected,
    OpenDetail,
    DetailLike,
    SubmitComment,
    OpenMediaUrl,
    SelectUploadFile,
    SuggestCaption,
    StartUpload,
    CancelUpload,
    OpenProfile(String),
    SelectProfileFile,
    UploadProfilePicture,
    CycleColorScheme,
}

/// Main application state
pub struct App {
    pub running: bool,
    pub screen: Screen,
    pub api: Arc<dyn MediaApi>,
    pub session: SessionContext,
    pub auth_state: AuthState,
    pub feed: FeedState,
    pub detail: Option<DetailState>,
    pub upload: UploadState,
    pub profile: Option<ProfileState>,
    pub dialog: Option<Dialog>,
    pub status: Option<StatusMessage>,
    /// Typing into the feed's search bar
    pub searching: bool,
    pub show_help: bool,
    pub input_mode: InputMode,
    /// Screen to return to when the profile view closes
    pub return_screen: Screen,
    pub color_scheme: ColorScheme,
    pub config_manager: Option<ConfigManager>,
    pub log_config: crate::logging::LogConfig,
    /// Network and crop work running in the background
    pub tasks: TaskQueue,
}
