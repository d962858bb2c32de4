use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::enums::Role;

/// Caption value that marks an upload as a user's profile picture rather than a feed item.
pub const PROFILE_PIC_CAPTION: &str = "__profile_pic__";

/// Username the API assigns to uploads without one.
pub const ANONYMOUS_USERNAME: &str = "anonymous";

// Roles arrive as free-form strings; anything unrecognised is treated as absent
mod lenient_role {
    use crate::enums::Role;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(Role::parse))
    }
}

// JSON null, a missing field and a non-array value all mean "nobody tagged"
mod lenient_list {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(serde_json::Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        })
    }
}

fn default_username() -> String {
    ANONYMOUS_USERNAME.to_string()
}

/// A media post as listed by the API. `name` is the storage identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub name: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_list::deserialize")]
    pub tagged_people: Vec<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

impl Post {
    /// Whether this record is a profile picture rather than a feed entry.
    pub fn is_profile_picture(&self) -> bool {
        self.caption == PROFILE_PIC_CAPTION
    }

    /// Case-insensitive substring match over caption, title, username, location and tags.
    /// An empty query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }

        let contains = |field: &str| field.to_lowercase().contains(&q);

        contains(&self.caption)
            || self.title.as_deref().is_some_and(contains)
            || contains(&self.username)
            || self.location.as_deref().is_some_and(contains)
            || self.tagged_people.iter().any(|p| contains(p))
    }

    /// Caption shown to users, falling back to the title.
    pub fn display_caption(&self) -> &str {
        if !self.caption.is_empty() {
            &self.caption
        } else {
            match self.title.as_deref() {
                Some(title) if !title.is_empty() => title,
                _ => "No caption",
            }
        }
    }

    pub fn is_video(&self) -> bool {
        let name = self.name.to_lowercase();
        [".mp4", ".mov", ".webm"].iter().any(|ext| name.contains(ext))
    }
}

/// Comment identifiers are numeric on some deployments and strings on others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommentId {
    Num(i64),
    Text(String),
}

impl CommentId {
    /// Zero and the empty string are treated as "no parent".
    pub fn is_unset(&self) -> bool {
        match self {
            CommentId::Num(n) => *n == 0,
            CommentId::Text(s) => s.is_empty(),
        }
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentId::Num(n) => write!(f, "{}", n),
            CommentId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CommentId {
    fn from(n: i64) -> Self {
        CommentId::Num(n)
    }
}

impl From<&str> for CommentId {
    fn from(s: &str) -> Self {
        CommentId::Text(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    #[serde(default)]
    pub parent_id: Option<CommentId>,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub media_name: Option<String>,
}

impl Comment {
    /// Parent reference, ignoring unset sentinels.
    pub fn parent(&self) -> Option<&CommentId> {
        self.parent_id.as_ref().filter(|p| !p.is_unset())
    }

    /// Calendar date of the timestamp, if it parses as RFC 3339.
    pub fn posted_on(&self) -> Option<String> {
        let raw = self.timestamp.as_deref()?;
        raw.parse::<DateTime<Utc>>()
            .ok()
            .map(|ts| ts.format("%Y-%m-%d").to_string())
    }
}

// API Request/Response types

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "lenient_role::deserialize")]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default, deserialize_with = "lenient_role::deserialize")]
    pub role: Option<Role>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    #[serde(default)]
    pub likes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionResponse {
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddCommentRequest {
    pub media_name: String,
    pub comment: String,
    pub parent_id: Option<CommentId>,
}
