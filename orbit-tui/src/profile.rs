//! Per-user profile: post grid, avatar, and profile picture replacement.
//!
//! Replacing a picture uploads the new one first and then deletes every other
//! profile picture of the user. Deletes run concurrently and individual
//! failures are logged, not surfaced.

use std::time::Duration;

use orbit_types::Post;

use crate::api::UploadHandle;
use crate::feed::LoadPhase;
use crate::upload::SelectedFile;

/// Delay before the "Previewing..." status clears.
pub const PREVIEW_STATUS_TTL: Duration = Duration::from_millis(800);
/// Delay before the post-upload status clears.
pub const UPLOAD_STATUS_TTL: Duration = Duration::from_millis(2200);

/// A user's slice of the media listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileListing {
    /// URL of the first profile picture listed for the user.
    pub picture_url: Option<String>,
    pub posts: Vec<Post>,
}

pub fn split_profile_listing(all: &[Post], username: &str) -> ProfileListing {
    let mine = all.iter().filter(|p| p.username == username);

    let picture_url = mine
        .clone()
        .find(|p| p.is_profile_picture())
        .map(|p| p.url.clone());
    let posts = mine.filter(|p| !p.is_profile_picture()).cloned().collect();

    ProfileListing { picture_url, posts }
}

/// Names of the user's profile pictures other than `keep`.
pub fn stale_profile_pictures(all: &[Post], username: &str, keep: &str) -> Vec<String> {
    all.iter()
        .filter(|p| p.username == username && p.is_profile_picture() && p.name != keep)
        .map(|p| p.name.clone())
        .collect()
}

/// Square preview geometry shown next to the original before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPreview {
    pub width: u32,
    pub height: u32,
    pub side: u32,
}

impl CropPreview {
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        let (_, _, side) = crate::crop::square_crop_rect(width, height);
        Self {
            width,
            height,
            side,
        }
    }
}

pub struct ProfileState {
    pub username: String,
    pub phase: LoadPhase,
    pub listing: ProfileListing,
    pub selected: usize,
    pub path_input: String,
    pub editing_path: bool,
    pub file: Option<SelectedFile>,
    pub crop_to_square: bool,
    pub preview: Option<CropPreview>,
    pub handle: Option<UploadHandle>,
    pub progress: u8,
    /// Cropping before the upload starts
    pub preparing: bool,
    /// Deleting the pictures the new upload replaces
    pub cleaning: bool,
}

impl ProfileState {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            phase: LoadPhase::Idle,
            listing: ProfileListing::default(),
            selected: 0,
            path_input: String::new(),
            editing_path: false,
            file: None,
            crop_to_square: true,
            preview: None,
            handle: None,
            progress: 0,
            preparing: false,
            cleaning: false,
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.preparing || self.handle.is_some() || self.cleaning
    }

    /// Only the signed-in user can change their own picture.
    pub fn is_own(&self, current_username: Option<&str>) -> bool {
        current_username == Some(self.username.as_str())
    }

    pub fn initial(&self) -> char {
        self.username
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }

    pub fn apply_listing(&mut self, all: &[Post]) {
        self.listing = split_profile_listing(all, &self.username);
        self.phase = LoadPhase::Loaded;
        self.selected = self
            .selected
            .min(self.listing.posts.len().saturating_sub(1));
    }

    pub fn fail_listing(&mut self) {
        self.listing = ProfileListing::default();
        self.phase = LoadPhase::Loaded;
        self.selected = 0;
    }

    pub fn clear_selection(&mut self) {
        self.file = None;
        self.preview = None;
        self.path_input.clear();
        self.editing_path = false;
    }

    pub fn select_next(&mut self) {
        if !self.listing.posts.is_empty() {
            self.selected = (self.selected + 1).min(self.listing.posts.len() - 1);
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}
