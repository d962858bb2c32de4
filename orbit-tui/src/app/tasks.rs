//! Background work started by the app. Every task runs on the tokio runtime
//! and reports back with one [`AppMessage`]; the event loop drains them in
//! [`App::tick`](super::App::tick).

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use log::error;
use orbit_types::{CommentId, Role};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::messages::{AppMessage, LikeSource};
use crate::api::{MediaApi, UploadRequest};
use crate::auth::{AuthGuard, Surface};
use crate::crop::crop_to_square_async;
use crate::feed::DeleteSnapshot;
use crate::profile;
use crate::session::SessionContext;

type Envelope = (u64, AppMessage);

/// Channel the tasks answer on, plus bookkeeping of what is still out.
pub struct TaskQueue {
    tx: UnboundedSender<Envelope>,
    rx: UnboundedReceiver<Envelope>,
    pending: usize,
    /// Bumped when the session ends; answers for an older one are dropped.
    generation: u64,
}

/// Handed to one task. Sending is its only capability.
pub struct TaskSender {
    tx: UnboundedSender<Envelope>,
    generation: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            pending: 0,
            generation: 0,
        }
    }

    /// Reserve a slot for one more task.
    pub fn sender(&mut self) -> TaskSender {
        self.pending += 1;
        TaskSender {
            tx: self.tx.clone(),
            generation: self.generation,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Forget about work started so far.
    pub fn reset(&mut self) {
        self.generation += 1;
    }

    /// Next answer from work of the current generation, if one is waiting.
    pub fn try_next(&mut self) -> Option<AppMessage> {
        while let Ok((generation, message)) = self.rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            if generation == self.generation {
                return Some(message);
            }
            log::debug!("Dropping {} from an ended session", message.label());
        }
        None
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn<F>(tx: TaskSender, work: F)
where
    F: Future<Output = AppMessage> + Send + 'static,
{
    tokio::spawn(async move {
        let message = work.await;
        let label = message.label();
        if tx.tx.send((tx.generation, message)).is_err() {
            error!("failed to send {} message", label);
        }
    });
}

pub fn check_session(
    api: Arc<dyn MediaApi>,
    session: SessionContext,
    tx: TaskSender,
    open_profile: Option<String>,
) {
    spawn(tx, async move {
        let result = AuthGuard::new(api.as_ref(), &session)
            .check(Surface::Consumer)
            .await;
        AppMessage::SessionChecked {
            result,
            open_profile,
        }
    });
}

pub fn login(api: Arc<dyn MediaApi>, tx: TaskSender, username: String, password: String) {
    spawn(tx, async move {
        let result = api.login(&username, &password).await;
        AppMessage::LoggedIn { username, result }
    });
}

pub fn register(
    api: Arc<dyn MediaApi>,
    tx: TaskSender,
    username: String,
    password: String,
    role: Role,
) {
    spawn(tx, async move {
        let result = api.register(&username, &password, role).await;
        AppMessage::Registered {
            username,
            role,
            result,
        }
    });
}

/// Full listing, or a server-side search when `query` is set.
pub fn load_feed(api: Arc<dyn MediaApi>, tx: TaskSender, request: u64, query: Option<String>) {
    spawn(tx, async move {
        let result = match &query {
            Some(query) => api.search_media(query).await,
            None => api.list_media().await,
        };
        AppMessage::FeedLoaded {
            request,
            query,
            result,
        }
    });
}

pub fn like(api: Arc<dyn MediaApi>, tx: TaskSender, name: String, source: LikeSource) {
    spawn(tx, async move {
        let result = api.like_media(&name).await;
        AppMessage::LikeSettled {
            name,
            source,
            result,
        }
    });
}

pub fn delete(api: Arc<dyn MediaApi>, tx: TaskSender, name: String, snapshot: DeleteSnapshot) {
    spawn(tx, async move {
        let result = api.delete_media(&name).await;
        AppMessage::DeleteSettled {
            name,
            snapshot,
            result,
        }
    });
}

pub fn ai_caption(api: Arc<dyn MediaApi>, tx: TaskSender, name: String) {
    spawn(tx, async move {
        let result = api.ai_caption(&name).await;
        AppMessage::CaptionGenerated { name, result }
    });
}

pub fn load_comments(api: Arc<dyn MediaApi>, tx: TaskSender, name: String) {
    spawn(tx, async move {
        let result = api.get_comments(&name).await;
        AppMessage::CommentsLoaded { name, result }
    });
}

pub fn add_comment(
    api: Arc<dyn MediaApi>,
    tx: TaskSender,
    name: String,
    body: String,
    parent: Option<CommentId>,
) {
    spawn(tx, async move {
        let result = api.add_comment(&name, &body, parent).await;
        AppMessage::CommentAdded { name, result }
    });
}

/// What to send: the picked bytes, optionally cropped to a square first.
pub struct UploadSource {
    pub data: Bytes,
    pub mime_type: Option<String>,
    pub crop_to_square: bool,
    pub caption: String,
    pub username: String,
}

impl UploadSource {
    async fn into_request(self) -> anyhow::Result<UploadRequest> {
        let (body, mime_type) = if self.crop_to_square {
            let mime = self.mime_type.unwrap_or_default();
            let cropped = crop_to_square_async(self.data, mime).await?;
            (cropped.data, Some(cropped.mime_type))
        } else {
            (self.data, self.mime_type)
        };
        Ok(UploadRequest::new(body, self.caption, self.username).with_mime_type(mime_type))
    }
}

pub fn prepare_upload(tx: TaskSender, source: UploadSource) {
    spawn(tx, async move {
        AppMessage::UploadPrepared(source.into_request().await)
    });
}

/// Second attempt of a failed upload through the plain endpoint.
pub fn retry_upload(api: Arc<dyn MediaApi>, tx: TaskSender, request: UploadRequest) {
    spawn(tx, async move {
        AppMessage::UploadRetried(api.upload_media(request).await)
    });
}

pub fn load_profile(api: Arc<dyn MediaApi>, tx: TaskSender, username: String) {
    spawn(tx, async move {
        let result = api.list_media().await;
        AppMessage::ProfileLoaded { username, result }
    });
}

pub fn prepare_profile_picture(tx: TaskSender, source: UploadSource) {
    spawn(tx, async move {
        let username = source.username.clone();
        let result = source.into_request().await;
        AppMessage::ProfilePicturePrepared { username, result }
    });
}

/// Delete every profile picture of `username` except `keep`. Deletes run
/// concurrently; failures are logged and otherwise ignored.
pub fn remove_old_profile_pictures(
    api: Arc<dyn MediaApi>,
    tx: TaskSender,
    username: String,
    keep: String,
) {
    spawn(tx, async move {
        match api.list_media().await {
            Ok(all) => {
                let stale = profile::stale_profile_pictures(&all, &username, &keep);
                if !stale.is_empty() {
                    log::info!("Removing {} old profile pictures of {}", stale.len(), username);
                }
                let results = join_all(stale.iter().map(|name| api.delete_media(name))).await;
                for (name, result) in stale.iter().zip(results) {
                    if let Err(e) = result {
                        error!("Failed to delete old profile picture {}: {}", name, e);
                    }
                }
            }
            Err(e) => error!("Could not list media to clean up profile pictures: {}", e),
        }
        AppMessage::OldProfilePicturesRemoved { username }
    });
}
