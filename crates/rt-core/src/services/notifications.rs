//! # Notification Services
//!
//! Recording is best-effort: a failed write must never fail the operation
//! that triggered it (comment, like, follow, join), so [`record`] logs and
//! swallows store errors.

use uuid::Uuid;

use crate::error::Result;
use crate::models::{Notification, NotificationKind};
use crate::traits::NotificationRepo;

/// Writes a notification for `user_id`, logging (not propagating) failures.
pub async fn record(
    repo: &dyn NotificationRepo,
    user_id: Uuid,
    title: &str,
    message: String,
    kind: NotificationKind,
) {
    let notification = Notification::new(user_id, title, message, kind);
    if let Err(err) = repo.create(&notification).await {
        log::warn!("failed to record {} notification for {user_id}: {err}", kind.as_str());
    }
}

pub async fn list_notifications(
    repo: &dyn NotificationRepo,
    user_id: Uuid,
) -> Result<Vec<Notification>> {
    repo.list_for_user(user_id).await
}

/// Marks one notification read and returns the refreshed inbox.
pub async fn mark_read(
    repo: &dyn NotificationRepo,
    id: Uuid,
    user_id: Uuid,
) -> Result<Vec<Notification>> {
    repo.mark_read(id, user_id).await?;
    repo.list_for_user(user_id).await
}
