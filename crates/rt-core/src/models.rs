//! # Domain Models
//!
//! These structs represent the core entities of rusty-threads.
//! We use UUID v7 for time-ordered, globally unique identification.
//!
//! The reply graph is a tree stored via flat references: a reply carries
//! `parent_id`, and the parent carries the reply's id in `children`. The
//! `threads` lists on [`User`] and [`Community`] are weak back-references;
//! they denote attribution, not ownership, and are pruned when the referenced
//! thread is deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content-addressed image metadata, produced by the (external) asset store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub public_id: String,
    pub url: String,
}

/// A post or a reply; every node of the reply tree is a Thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: Uuid,
    pub text: String,
    /// Owning user, always present.
    pub author: Uuid,
    pub community: Option<Uuid>,
    /// `None` means top-level post; `Some` means this thread is a reply.
    pub parent_id: Option<Uuid>,
    /// Ids of direct replies, in attachment order. Kept in sync with the
    /// replies' `parent_id` by comment attachment.
    pub children: Vec<Uuid>,
    pub image: Option<ImageRef>,
    /// User ids that liked this thread. Maintained as a set: an id appears
    /// at most once.
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Thread {
    /// A fresh top-level post (no parent, no children yet).
    pub fn new_top_level(
        text: String,
        author: Uuid,
        community: Option<Uuid>,
        image: Option<ImageRef>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            text,
            author,
            community,
            parent_id: None,
            children: Vec::new(),
            image,
            likes: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// A fresh reply to `parent_id`. Replies never carry a community or an
    /// image of their own.
    pub fn new_reply(parent_id: Uuid, text: String, author: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            text,
            author,
            community: None,
            parent_id: Some(parent_id),
            children: Vec::new(),
            image: None,
            likes: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// An account holder. The various id lists are denormalized back-references
/// into the thread/community stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub avatar: Option<ImageRef>,
    pub bio: Option<String>,
    /// Ids of threads authored by this user.
    pub threads: Vec<Uuid>,
    /// Ids of communities this user is a member of.
    pub communities: Vec<Uuid>,
    /// Ids of threads this user saved for later.
    pub saved: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            name,
            username: None,
            email,
            avatar: None,
            bio: None,
            threads: Vec::new(),
            communities: Vec::new(),
            saved: Vec::new(),
            followers: Vec::new(),
            following: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// A user-created community that threads can be posted into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: Uuid,
    /// Unique handle (e.g., "rustaceans").
    pub username: String,
    pub name: String,
    pub image: Option<ImageRef>,
    pub bio: Option<String>,
    pub created_by: Uuid,
    /// Ids of threads posted into this community.
    pub threads: Vec<Uuid>,
    pub members: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Community {
    /// The creator is always the first member.
    pub fn new(
        username: String,
        name: String,
        bio: Option<String>,
        image: Option<ImageRef>,
        created_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            username,
            name,
            image,
            bio,
            created_by,
            threads: Vec::new(),
            members: vec![created_by],
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Comment,
    Like,
    Follow,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Comment => "comment",
            NotificationKind::Like => "like",
            NotificationKind::Follow => "follow",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "comment" => Some(NotificationKind::Comment),
            "like" => Some(NotificationKind::Like),
            "follow" => Some(NotificationKind::Follow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    #[default]
    Unread,
    Read,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Unread => "unread",
            NotificationStatus::Read => "read",
        }
    }
}

/// An in-app notification delivered to a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    /// Recipient.
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub status: NotificationStatus,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: Uuid, title: &str, message: String, kind: NotificationKind) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            title: title.to_string(),
            message,
            status: NotificationStatus::Unread,
            kind,
            created_at: Utc::now(),
        }
    }
}
