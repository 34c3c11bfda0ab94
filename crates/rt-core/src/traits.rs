//! # Core Traits (Ports)
//!
//! Any store plugin must implement these traits to be used by the binary.
//! All list-returning reads have a stable order so the reply-tree traversal
//! in `services::threads` can rely on it.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Community, Notification, Thread, User};

/// Data persistence contract for threads (posts and replies).
#[async_trait]
pub trait ThreadRepo: Send + Sync {
    async fn create(&self, thread: &Thread) -> Result<()>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Thread>>;
    /// Direct children of `parent_id`, in creation order.
    async fn find_by_parent(&self, parent_id: Uuid) -> Result<Vec<Thread>>;
    async fn find_by_author(&self, author: Uuid) -> Result<Vec<Thread>>;
    /// The subset of `ids` that still exist. Missing ids are skipped.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Thread>>;
    /// Top-level threads (no parent), newest first, plus the total count.
    async fn list_top_level(&self, limit: i64, offset: i64) -> Result<(Vec<Thread>, i64)>;
    /// Appends `child_id` to the parent's `children` list atomically.
    async fn append_child(&self, parent_id: Uuid, child_id: Uuid) -> Result<()>;
    async fn set_likes(&self, id: Uuid, likes: &[Uuid]) -> Result<()>;
    /// Bulk delete; returns the number of records removed.
    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64>;
    /// Deletes every thread posted into the community; returns the count.
    async fn delete_by_community(&self, community_id: Uuid) -> Result<u64>;
}

/// The id-list fields a [`User`] record carries. Push/pull operations are
/// addressed by field so the store stays a dumb document mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserList {
    Threads,
    Communities,
    Saved,
    Followers,
    Following,
}

/// Data persistence contract for user records.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create(&self, user: &User) -> Result<()>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>>;
    /// Case-insensitive name/username search, newest first, excluding
    /// `exclude` (the requesting user). Returns the page and the total count.
    async fn search(
        &self,
        term: &str,
        exclude: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64)>;
    /// Writes the profile fields (name, username, bio, avatar) of `user`.
    async fn update_profile(&self, user: &User) -> Result<()>;
    /// Appends `value` to one of the user's id lists ($push).
    async fn push(&self, id: Uuid, list: UserList, value: Uuid) -> Result<()>;
    /// Removes `value` from one of the user's id lists ($pull). Removing an
    /// absent value is a no-op.
    async fn pull(&self, id: Uuid, list: UserList, value: Uuid) -> Result<()>;
    /// Removes every id in `thread_ids` from the `threads` list of every
    /// user in `user_ids`. Idempotent and order-independent so cascade
    /// cleanup can be retried safely.
    async fn pull_threads(&self, user_ids: &[Uuid], thread_ids: &[Uuid]) -> Result<()>;
}

/// Data persistence contract for communities.
#[async_trait]
pub trait CommunityRepo: Send + Sync {
    async fn create(&self, community: &Community) -> Result<()>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Community>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<Community>>;
    /// Case-insensitive name/username search, newest first.
    async fn search(&self, term: &str, limit: i64, offset: i64) -> Result<(Vec<Community>, i64)>;
    async fn push_thread(&self, id: Uuid, thread_id: Uuid) -> Result<()>;
    /// Same contract as [`UserRepo::pull_threads`], for community records.
    async fn pull_threads(&self, community_ids: &[Uuid], thread_ids: &[Uuid]) -> Result<()>;
    async fn push_member(&self, id: Uuid, user_id: Uuid) -> Result<()>;
    async fn pull_member(&self, id: Uuid, user_id: Uuid) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Data persistence contract for notifications.
#[async_trait]
pub trait NotificationRepo: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<()>;
    /// All notifications for `user_id`, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>>;
    /// Marks the notification read. `NotFound` when it does not exist or
    /// belongs to a different user.
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<()>;
}

/// The bundle of store handles the domain services operate on. A single
/// plugin (e.g., the SQLite store) typically implements all four traits and
/// is shared across the fields.
#[derive(Clone)]
pub struct Stores {
    pub threads: Arc<dyn ThreadRepo>,
    pub users: Arc<dyn UserRepo>,
    pub communities: Arc<dyn CommunityRepo>,
    pub notifications: Arc<dyn NotificationRepo>,
}
