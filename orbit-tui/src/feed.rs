//! Feed state and its optimistic reconciliation rules.
//!
//! Mutations are applied locally first and then either confirmed with the
//! server's answer or rolled back precisely. A failed like or delete never
//! triggers a reload, so unrelated local state survives.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use orbit_types::Post;

/// How long a post stays locked against repeated likes.
pub const LIKE_LOCK_DURATION: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
}

/// The removed post and where it stood, used to put it back on failure.
///
/// Only the one post is kept, so likes and deletes that settle while the
/// request is out are not undone by a restore.
#[derive(Debug, Clone)]
pub struct DeleteSnapshot {
    index: usize,
    post: Post,
}

/// Suppresses duplicate submissions per post. Entries expire on their own
/// after a fixed delay rather than when the request resolves.
#[derive(Debug)]
pub struct InFlightSet {
    entries: HashMap<String, Instant>,
    ttl: Duration,
}

impl InFlightSet {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Returns false if `name` is still locked.
    pub fn try_acquire(&mut self, name: &str, now: Instant) -> bool {
        self.expire(now);
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(name.to_string(), now);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn expire(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, started| now.saturating_duration_since(*started) < ttl);
    }
}

impl Default for InFlightSet {
    fn default() -> Self {
        Self::new(LIKE_LOCK_DURATION)
    }
}

#[derive(Debug, Default)]
pub struct FeedState {
    pub phase: LoadPhase,
    pub posts: Vec<Post>,
    pub query: String,
    /// Restricts the list to one author (creator dashboard, author filter).
    pub author_filter: Option<String>,
    pub selected: usize,
    pub error: Option<String>,
    pub likes_in_flight: InFlightSet,
    /// Id of the newest listing request; older answers are ignored.
    load_request: u64,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a listing request as started and return its id.
    pub fn begin_load(&mut self) -> u64 {
        self.phase = LoadPhase::Loading;
        self.error = None;
        self.load_request += 1;
        self.load_request
    }

    /// Whether `request` is still the newest listing request.
    pub fn is_current(&self, request: u64) -> bool {
        request == self.load_request
    }

    pub fn finish_load(&mut self, posts: Vec<Post>) {
        self.posts = posts;
        self.phase = LoadPhase::Loaded;
        self.clamp_selection();
    }

    /// A failed load leaves an empty feed with the error surfaced.
    pub fn fail_load(&mut self, error: impl Into<String>) {
        self.posts.clear();
        self.error = Some(error.into());
        self.phase = LoadPhase::Loaded;
        self.selected = 0;
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    /// Posts shown in the feed: profile pictures excluded, author filter and
    /// local query applied.
    pub fn visible_posts(&self) -> Vec<&Post> {
        self.posts
            .iter()
            .filter(|p| !p.is_profile_picture())
            .filter(|p| self.author_filter.as_ref().map_or(true, |a| &p.username == a))
            .filter(|p| p.matches_query(&self.query))
            .collect()
    }

    /// Clear the query and author filter.
    pub fn reset_filters(&mut self) {
        self.query.clear();
        self.author_filter = None;
        self.selected = 0;
    }

    pub fn selected_post(&self) -> Option<&Post> {
        self.visible_posts().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let len = self.visible_posts().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp_selection(&mut self) {
        let len = self.visible_posts().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    /// Username → avatar URL, taken from profile-picture posts. The first one
    /// listed for a user wins.
    pub fn profile_pictures(&self) -> HashMap<&str, &str> {
        let mut map = HashMap::new();
        for post in self.posts.iter().filter(|p| p.is_profile_picture()) {
            map.entry(post.username.as_str()).or_insert(post.url.as_str());
        }
        map
    }

    fn post_mut(&mut self, name: &str) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.name == name)
    }

    /// Optimistically add one like. Returns false if the post is not in the feed.
    pub fn apply_like(&mut self, name: &str) -> bool {
        match self.post_mut(name) {
            Some(post) => {
                post.likes += 1;
                true
            }
            None => false,
        }
    }

    /// Adopt the server's count, which may differ from local+1 under concurrent likes.
    pub fn confirm_like(&mut self, name: &str, server_likes: Option<i64>) {
        if let (Some(post), Some(likes)) = (self.post_mut(name), server_likes) {
            post.likes = likes;
        }
    }

    /// Undo one optimistic like.
    pub fn revert_like(&mut self, name: &str) {
        if let Some(post) = self.post_mut(name) {
            post.likes = (post.likes - 1).max(0);
        }
    }

    /// Optimistically remove a post, returning the snapshot to restore on failure.
    pub fn remove_post(&mut self, name: &str) -> Option<DeleteSnapshot> {
        let index = self.posts.iter().position(|p| p.name == name)?;
        let post = self.posts.remove(index);
        self.clamp_selection();
        Some(DeleteSnapshot { index, post })
    }

    /// Put a removed post back at its old position. A reload that already
    /// brought it back wins.
    pub fn restore(&mut self, snapshot: DeleteSnapshot) {
        if self.posts.iter().any(|p| p.name == snapshot.post.name) {
            return;
        }
        let index = snapshot.index.min(self.posts.len());
        self.posts.insert(index, snapshot.post);
        self.clamp_selection();
    }

    pub fn set_caption(&mut self, name: &str, caption: String) {
        if let Some(post) = self.post_mut(name) {
            post.caption = caption;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_types::PROFILE_PIC_CAPTION;

    fn post(name: &str, username: &str, caption: &str, likes: i64) -> Post {
        Post {
            name: name.to_string(),
            username: username.to_string(),
            caption: caption.to_string(),
            title: None,
            url: format!("https://cdn.example/{}", name),
            likes,
            location: None,
            tagged_people: Vec::new(),
            uploaded_at: None,
        }
    }

    fn loaded(posts: Vec<Post>) -> FeedState {
        let mut feed = FeedState::new();
        feed.begin_load();
        feed.finish_load(posts);
        feed
    }

    #[test]
    fn test_load_phases() {
        let mut feed = FeedState::new();
        assert_eq!(feed.phase, LoadPhase::Idle);
        feed.begin_load();
        assert!(feed.is_loading());
        feed.finish_load(vec![post("a", "u", "c", 0)]);
        assert_eq!(feed.phase, LoadPhase::Loaded);

        feed.begin_load();
        feed.fail_load("boom");
        assert_eq!(feed.phase, LoadPhase::Loaded);
        assert!(feed.posts.is_empty());
        assert_eq!(feed.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_profile_pictures_never_visible() {
        let feed = loaded(vec![
            post("a", "luna", PROFILE_PIC_CAPTION, 0),
            post("b", "luna", "beach", 0),
        ]);
        let visible: Vec<&str> = feed.visible_posts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(visible, vec!["b"]);
    }

    #[test]
    fn test_profile_picture_map_first_wins() {
        let feed = loaded(vec![
            post("new.jpg", "luna", PROFILE_PIC_CAPTION, 0),
            post("old.jpg", "luna", PROFILE_PIC_CAPTION, 0),
        ]);
        let map = feed.profile_pictures();
        assert_eq!(map.get("luna"), Some(&"https://cdn.example/new.jpg"));
    }

    #[test]
    fn test_query_filters_visible_posts() {
        let mut feed = loaded(vec![
            post("a", "luna", "my cat", 0),
            post("b", "catlover", "dog", 0),
            post("c", "sol", "bird", 0),
        ]);
        feed.query = "CAT".to_string();
        let visible: Vec<&str> = feed.visible_posts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(visible, vec!["a", "b"]);
    }

    #[test]
    fn test_author_filter() {
        let mut feed = loaded(vec![
            post("a", "luna", "one", 0),
            post("b", "sol", "two", 0),
            post("c", "luna", "three", 0),
        ]);
        feed.author_filter = Some("luna".to_string());
        feed.query = "three".to_string();
        let visible: Vec<&str> = feed.visible_posts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(visible, vec!["c"]);

        feed.reset_filters();
        assert_eq!(feed.visible_posts().len(), 3);
    }

    #[test]
    fn test_like_confirm_uses_server_count() {
        let mut feed = loaded(vec![post("a", "u", "c", 4)]);
        assert!(feed.apply_like("a"));
        assert_eq!(feed.posts[0].likes, 5);
        feed.confirm_like("a", Some(9));
        assert_eq!(feed.posts[0].likes, 9);
    }

    #[test]
    fn test_like_revert_restores_count() {
        let mut feed = loaded(vec![post("a", "u", "c", 4)]);
        feed.apply_like("a");
        feed.revert_like("a");
        assert_eq!(feed.posts[0].likes, 4);
    }

    #[test]
    fn test_like_unknown_post() {
        let mut feed = loaded(vec![post("a", "u", "c", 4)]);
        assert!(!feed.apply_like("zzz"));
    }

    #[test]
    fn test_delete_restore_is_exact() {
        let original = vec![post("a", "u", "1", 0), post("b", "u", "2", 0), post("c", "u", "3", 0)];
        let mut feed = loaded(original.clone());
        let snapshot = feed.remove_post("b").unwrap();
        assert_eq!(feed.posts.len(), 2);
        feed.restore(snapshot);
        assert_eq!(feed.posts, original);
    }

    #[test]
    fn test_restore_keeps_changes_made_meanwhile() {
        let mut feed = loaded(vec![post("a", "u", "1", 0), post("b", "u", "2", 0), post("c", "u", "3", 0)]);
        let first = feed.remove_post("a").unwrap();
        let second = feed.remove_post("c").unwrap();
        feed.apply_like("b");

        feed.restore(first);
        let names: Vec<&str> = feed.posts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(feed.posts[1].likes, 1);

        feed.restore(second);
        let names: Vec<&str> = feed.posts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_only_newest_load_is_current() {
        let mut feed = FeedState::new();
        let first = feed.begin_load();
        let second = feed.begin_load();
        assert!(!feed.is_current(first));
        assert!(feed.is_current(second));
    }

    #[test]
    fn test_remove_unknown_post_has_no_snapshot() {
        let mut feed = loaded(vec![post("a", "u", "1", 0)]);
        assert!(feed.remove_post("b").is_none());
    }

    #[test]
    fn test_in_flight_set_expires() {
        let mut set = InFlightSet::new(Duration::from_millis(100));
        let start = Instant::now();
        assert!(set.try_acquire("a", start));
        assert!(!set.try_acquire("a", start + Duration::from_millis(50)));
        assert!(set.try_acquire("b", start));
        assert!(set.try_acquire("a", start + Duration::from_millis(150)));
    }

    #[test]
    fn test_selection_clamped_after_delete() {
        let mut feed = loaded(vec![post("a", "u", "1", 0), post("b", "u", "2", 0)]);
        feed.selected = 1;
        feed.remove_post("b");
        assert_eq!(feed.selected, 0);
    }

    // Property-based tests
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_visible_posts_match_query_and_exclude_profile_pictures(
            captions in prop::collection::vec("[a-zA-Z _]{0,12}", 0..12),
            query in "[a-zA-Z]{0,3}"
        ) {
            let posts: Vec<Post> = captions
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let caption = if i % 3 == 0 { PROFILE_PIC_CAPTION } else { c.as_str() };
                    post(&format!("p{}", i), "someone", caption, 0)
                })
                .collect();
            let mut feed = loaded(posts);
            feed.query = query.clone();

            for p in feed.visible_posts() {
                prop_assert!(!p.is_profile_picture());
                prop_assert!(p.matches_query(&query));
            }
        }
    }
}
