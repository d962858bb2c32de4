//! Upload screen state: file selection, caption, crop toggle and progress.

use anyhow::{Context, Result};
use bytes::Bytes;
use chrono::NaiveDate;
use image::ImageFormat;
use std::path::{Path, PathBuf};

use crate::api::{UploadHandle, UploadRequest};

/// A file read from disk and ready to upload.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub data: Bytes,
    pub mime_type: Option<String>,
}

impl SelectedFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// MIME type guessed from the file extension.
pub fn mime_for_path(path: &Path) -> Option<String> {
    ImageFormat::from_path(path)
        .ok()
        .map(|f| f.to_mime_type().to_string())
}

/// Read a file selected by path. A leading `~/` expands to the home directory.
pub async fn load_file(raw_path: &str) -> Result<SelectedFile> {
    let trimmed = raw_path.trim();
    if trimmed.is_empty() {
        anyhow::bail!("No file path given");
    }

    let path = match trimmed.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .context("Failed to determine home directory")?
            .join(rest),
        None => PathBuf::from(trimmed),
    };

    let data = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mime_type = mime_for_path(&path);

    Ok(SelectedFile {
        path,
        data: Bytes::from(data),
        mime_type,
    })
}

/// Heuristic caption built from the file name, the uploader and the date.
pub fn suggest_caption(file_name: Option<&str>, username: &str, today: NaiveDate) -> String {
    let Some(file_name) = file_name else {
        return "A moment worth sharing.".to_string();
    };

    let base = file_name.split('.').next().filter(|s| !s.is_empty()).unwrap_or("moment");
    let base = base.replace(['-', '_'], " ");
    let who = if username.trim().is_empty() {
        "someone"
    } else {
        username.trim()
    };

    format!(
        "A moment captured by @{}. {} - shared on {}.",
        who,
        base,
        today.format("%Y-%m-%d")
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadField {
    #[default]
    Path,
    Username,
    Caption,
}

impl UploadField {
    pub fn next(self) -> Self {
        match self {
            UploadField::Path => UploadField::Username,
            UploadField::Username => UploadField::Caption,
            UploadField::Caption => UploadField::Path,
        }
    }
}

#[derive(Default)]
pub struct UploadState {
    pub path_input: String,
    pub file: Option<SelectedFile>,
    pub username: String,
    pub caption: String,
    pub crop_to_square: bool,
    pub focus: UploadField,
    pub progress: u8,
    pub status: String,
    pub handle: Option<UploadHandle>,
    /// Cropping and building the request
    pub preparing: bool,
    /// Second attempt through the plain upload endpoint
    pub retrying: bool,
    /// Request behind the running upload, kept for the retry
    pub request: Option<UploadRequest>,
}

impl UploadState {
    pub fn new(username: Option<String>) -> Self {
        Self {
            username: username.unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.preparing || self.handle.is_some() || self.retrying
    }

    pub fn focused_input(&mut self) -> &mut String {
        match self.focus {
            UploadField::Path => &mut self.path_input,
            UploadField::Username => &mut self.username,
            UploadField::Caption => &mut self.caption,
        }
    }

    pub fn select_file(&mut self, file: SelectedFile) {
        self.path_input = file.path.display().to_string();
        self.file = Some(file);
    }

    pub fn suggest_caption(&mut self, today: NaiveDate) {
        let name = self.file.as_ref().map(SelectedFile::file_name);
        self.caption = suggest_caption(name.as_deref(), &self.username, today);
    }

    /// Reset after a successful upload. Username is kept.
    pub fn reset_after_upload(&mut self) {
        self.file = None;
        self.path_input.clear();
        self.caption.clear();
        self.progress = 0;
        self.handle = None;
        self.preparing = false;
        self.retrying = false;
        self.request = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_suggest_caption_without_file() {
        assert_eq!(suggest_caption(None, "luna", day()), "A moment worth sharing.");
    }

    #[test]
    fn test_suggest_caption_from_file_name() {
        assert_eq!(
            suggest_caption(Some("summer-trip_2024.final.jpg"), "luna", day()),
            "A moment captured by @luna. summer trip 2024 - shared on 2024-05-01."
        );
    }

    #[test]
    fn test_suggest_caption_unknown_user() {
        let caption = suggest_caption(Some("beach.png"), " ", day());
        assert!(caption.starts_with("A moment captured by @someone. beach"));
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a/b.PNG")).as_deref(), Some("image/png"));
        assert_eq!(mime_for_path(Path::new("photo.jpg")).as_deref(), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("notes.txt")), None);
    }

    #[tokio::test]
    async fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"bytes").unwrap();

        let selected = load_file(&file.path().display().to_string()).await.unwrap();
        assert_eq!(&selected.data[..], b"bytes");
        assert!(load_file("   ").await.is_err());
        assert!(load_file("/definitely/not/here.png").await.is_err());
    }

    #[test]
    fn test_focus_cycles() {
        let mut state = UploadState::new(Some("luna".to_string()));
        assert_eq!(state.focus, UploadField::Path);
        state.focus = state.focus.next();
        state.focused_input().push('!');
        assert_eq!(state.username, "luna!");
        assert_eq!(state.focus.next().next(), UploadField::Path);
    }

    #[test]
    fn test_reset_keeps_username() {
        let mut state = UploadState::new(Some("luna".to_string()));
        state.caption = "hi".to_string();
        state.progress = 40;
        state.retrying = true;
        state.request = Some(UploadRequest::new(vec![1u8], "hi", "luna"));
        assert!(state.is_uploading());
        state.reset_after_upload();
        assert!(!state.is_uploading());
        assert!(state.request.is_none());
        assert!(state.caption.is_empty());
        assert_eq!(state.progress, 0);
        assert_eq!(state.username, "luna");
    }
}
