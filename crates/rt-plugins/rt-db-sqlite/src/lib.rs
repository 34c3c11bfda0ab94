//! # rt-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `rt-core` domain models.
//!
//! The document-style id lists (`children`, `likes`, `threads`, `members`,
//! ...) are stored as JSON TEXT columns; UUIDs are stored as 16-byte BLOBs.
//! Child attachment uses a single `json_insert` statement so two concurrent
//! comments on the same parent can never lose each other's update.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::collections::HashSet;
use uuid::Uuid;

use rt_core::error::{AppError, Result};
use rt_core::models::{
    Community, ImageRef, Notification, NotificationKind, NotificationStatus, Thread, User,
};
use rt_core::traits::{CommunityRepo, NotificationRepo, ThreadRepo, UserList, UserRepo};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id          BLOB PRIMARY KEY,
        name        TEXT NOT NULL,
        username    TEXT UNIQUE,
        email       TEXT NOT NULL UNIQUE,
        avatar      TEXT,
        bio         TEXT,
        threads     TEXT NOT NULL DEFAULT '[]',
        communities TEXT NOT NULL DEFAULT '[]',
        saved       TEXT NOT NULL DEFAULT '[]',
        followers   TEXT NOT NULL DEFAULT '[]',
        following   TEXT NOT NULL DEFAULT '[]',
        created_at  TIMESTAMP NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS threads (
        id          BLOB PRIMARY KEY,
        text        TEXT NOT NULL,
        author      BLOB NOT NULL,
        community   BLOB,
        parent_id   BLOB,
        children    TEXT NOT NULL DEFAULT '[]',
        image       TEXT,
        likes       TEXT NOT NULL DEFAULT '[]',
        created_at  TIMESTAMP NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_threads_parent ON threads (parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_threads_author ON threads (author)",
    "CREATE TABLE IF NOT EXISTS communities (
        id          BLOB PRIMARY KEY,
        username    TEXT NOT NULL UNIQUE,
        name        TEXT NOT NULL,
        image       TEXT,
        bio         TEXT,
        created_by  BLOB NOT NULL,
        threads     TEXT NOT NULL DEFAULT '[]',
        members     TEXT NOT NULL DEFAULT '[]',
        created_at  TIMESTAMP NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS notifications (
        id          BLOB PRIMARY KEY,
        user_id     BLOB NOT NULL,
        title       TEXT NOT NULL,
        message     TEXT NOT NULL,
        status      TEXT NOT NULL DEFAULT 'unread',
        kind        TEXT NOT NULL,
        created_at  TIMESTAMP NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications (user_id)",
];

/// SQLite-backed implementation of all four store traits.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects and runs the schema. A single connection is used: SQLite
    /// serializes writers anyway, and it keeps `sqlite::memory:` databases
    /// coherent across the pool.
    pub async fn new(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(store_err)?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
        }
        Ok(())
    }
}

// ── Mapping helpers ─────────────────────────────────────────────────────────

fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn ids_to_json(ids: &[Uuid]) -> String {
    let strings: Vec<String> = ids.iter().map(Uuid::to_string).collect();
    serde_json::Value::from(strings).to_string()
}

fn json_to_ids(raw: &str) -> Vec<Uuid> {
    serde_json::from_str::<Vec<String>>(raw)
        .map(|ids| {
            ids.iter()
                .filter_map(|s| Uuid::parse_str(s).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn image_to_json(image: &Option<ImageRef>) -> Result<Option<String>> {
    image
        .as_ref()
        .map(|i| serde_json::to_string(i).map_err(|e| AppError::StoreUnavailable(e.to_string())))
        .transpose()
}

fn store_err(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.message().contains("UNIQUE constraint failed") {
            return AppError::Conflict(db.message().to_string());
        }
    }
    AppError::StoreUnavailable(err.to_string())
}

/// Builds `?, ?, ...` for an `IN (...)` clause.
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn thread_from_row(row: &SqliteRow) -> Thread {
    Thread {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        text: row.get("text"),
        author: blob_to_uuid(row.get::<Vec<u8>, _>("author").as_slice()),
        community: row
            .get::<Option<Vec<u8>>, _>("community")
            .map(|b| blob_to_uuid(&b)),
        parent_id: row
            .get::<Option<Vec<u8>>, _>("parent_id")
            .map(|b| blob_to_uuid(&b)),
        children: json_to_ids(&row.get::<String, _>("children")),
        image: row
            .get::<Option<String>, _>("image")
            .and_then(|raw| serde_json::from_str(&raw).ok()),
        likes: json_to_ids(&row.get::<String, _>("likes")),
        created_at: row.get("created_at"),
    }
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        name: row.get("name"),
        username: row.get("username"),
        email: row.get("email"),
        avatar: row
            .get::<Option<String>, _>("avatar")
            .and_then(|raw| serde_json::from_str(&raw).ok()),
        bio: row.get("bio"),
        threads: json_to_ids(&row.get::<String, _>("threads")),
        communities: json_to_ids(&row.get::<String, _>("communities")),
        saved: json_to_ids(&row.get::<String, _>("saved")),
        followers: json_to_ids(&row.get::<String, _>("followers")),
        following: json_to_ids(&row.get::<String, _>("following")),
        created_at: row.get("created_at"),
    }
}

fn community_from_row(row: &SqliteRow) -> Community {
    Community {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        username: row.get("username"),
        name: row.get("name"),
        image: row
            .get::<Option<String>, _>("image")
            .and_then(|raw| serde_json::from_str(&raw).ok()),
        bio: row.get("bio"),
        created_by: blob_to_uuid(row.get::<Vec<u8>, _>("created_by").as_slice()),
        threads: json_to_ids(&row.get::<String, _>("threads")),
        members: json_to_ids(&row.get::<String, _>("members")),
        created_at: row.get("created_at"),
    }
}

fn notification_from_row(row: &SqliteRow) -> Notification {
    Notification {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        user_id: blob_to_uuid(row.get::<Vec<u8>, _>("user_id").as_slice()),
        title: row.get("title"),
        message: row.get("message"),
        status: match row.get::<String, _>("status").as_str() {
            "read" => NotificationStatus::Read,
            _ => NotificationStatus::Unread,
        },
        kind: NotificationKind::parse(&row.get::<String, _>("kind")).unwrap_or_default(),
        created_at: row.get("created_at"),
    }
}

fn user_list_column(list: UserList) -> &'static str {
    match list {
        UserList::Threads => "threads",
        UserList::Communities => "communities",
        UserList::Saved => "saved",
        UserList::Followers => "followers",
        UserList::Following => "following",
    }
}

// ── ThreadRepo ──────────────────────────────────────────────────────────────

#[async_trait]
impl ThreadRepo for SqliteStore {
    async fn create(&self, thread: &Thread) -> Result<()> {
        sqlx::query(
            "INSERT INTO threads (id, text, author, community, parent_id, children, image, likes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(thread.id))
        .bind(&thread.text)
        .bind(uuid_to_blob(thread.author))
        .bind(thread.community.map(uuid_to_blob))
        .bind(thread.parent_id.map(uuid_to_blob))
        .bind(ids_to_json(&thread.children))
        .bind(image_to_json(&thread.image)?)
        .bind(ids_to_json(&thread.likes))
        .bind(thread.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Thread>> {
        let row = sqlx::query("SELECT * FROM threads WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.as_ref().map(thread_from_row))
    }

    async fn find_by_parent(&self, parent_id: Uuid) -> Result<Vec<Thread>> {
        let rows = sqlx::query(
            "SELECT * FROM threads WHERE parent_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(uuid_to_blob(parent_id))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(rows.iter().map(thread_from_row).collect())
    }

    async fn find_by_author(&self, author: Uuid) -> Result<Vec<Thread>> {
        let rows = sqlx::query("SELECT * FROM threads WHERE author = ? ORDER BY created_at DESC")
            .bind(uuid_to_blob(author))
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(rows.iter().map(thread_from_row).collect())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Thread>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM threads WHERE id IN ({}) ORDER BY created_at DESC",
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(uuid_to_blob(*id));
        }
        let rows = query.fetch_all(&self.pool).await.map_err(store_err)?;
        Ok(rows.iter().map(thread_from_row).collect())
    }

    async fn list_top_level(&self, limit: i64, offset: i64) -> Result<(Vec<Thread>, i64)> {
        let rows = sqlx::query(
            "SELECT * FROM threads WHERE parent_id IS NULL
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM threads WHERE parent_id IS NULL")
                .fetch_one(&self.pool)
                .await
                .map_err(store_err)?;

        Ok((rows.iter().map(thread_from_row).collect(), total))
    }

    /// Single-statement append keeps this atomic under concurrent comments.
    async fn append_child(&self, parent_id: Uuid, child_id: Uuid) -> Result<()> {
        let updated =
            sqlx::query("UPDATE threads SET children = json_insert(children, '$[#]', ?) WHERE id = ?")
                .bind(child_id.to_string())
                .bind(uuid_to_blob(parent_id))
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
        if updated.rows_affected() == 0 {
            return Err(AppError::not_found("Thread", parent_id));
        }
        Ok(())
    }

    async fn set_likes(&self, id: Uuid, likes: &[Uuid]) -> Result<()> {
        let updated = sqlx::query("UPDATE threads SET likes = ? WHERE id = ?")
            .bind(ids_to_json(likes))
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        if updated.rows_affected() == 0 {
            return Err(AppError::not_found("Thread", id));
        }
        Ok(())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!("DELETE FROM threads WHERE id IN ({})", placeholders(ids.len()));
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(uuid_to_blob(*id));
        }
        let result = query.execute(&self.pool).await.map_err(store_err)?;
        Ok(result.rows_affected())
    }

    async fn delete_by_community(&self, community_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM threads WHERE community = ?")
            .bind(uuid_to_blob(community_id))
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected())
    }
}

// ── UserRepo ────────────────────────────────────────────────────────────────

#[async_trait]
impl UserRepo for SqliteStore {
    async fn create(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, name, username, email, avatar, bio, threads, communities, saved, followers, following, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(user.id))
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(image_to_json(&user.avatar)?)
        .bind(&user.bio)
        .bind(ids_to_json(&user.threads))
        .bind(ids_to_json(&user.communities))
        .bind(ids_to_json(&user.saved))
        .bind(ids_to_json(&user.followers))
        .bind(ids_to_json(&user.following))
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM users WHERE id IN ({}) ORDER BY created_at DESC",
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(uuid_to_blob(*id));
        }
        let rows = query.fetch_all(&self.pool).await.map_err(store_err)?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn search(
        &self,
        term: &str,
        exclude: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64)> {
        let pattern = format!("%{}%", term.trim());
        // An empty blob never equals a 16-byte id, so "exclude nobody" falls
        // out naturally.
        let exclude_blob = exclude.map(uuid_to_blob).unwrap_or_default();

        let rows = sqlx::query(
            "SELECT * FROM users
             WHERE (name LIKE ? OR username LIKE ?) AND id != ?
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&exclude_blob)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE (name LIKE ? OR username LIKE ?) AND id != ?",
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&exclude_blob)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        Ok((rows.iter().map(user_from_row).collect(), total))
    }

    async fn update_profile(&self, user: &User) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE users SET name = ?, username = ?, bio = ?, avatar = ? WHERE id = ?",
        )
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.bio)
        .bind(image_to_json(&user.avatar)?)
        .bind(uuid_to_blob(user.id))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        if updated.rows_affected() == 0 {
            return Err(AppError::not_found("User", user.id));
        }
        Ok(())
    }

    async fn push(&self, id: Uuid, list: UserList, value: Uuid) -> Result<()> {
        let column = user_list_column(list);
        let sql = format!(
            "UPDATE users SET {column} = json_insert({column}, '$[#]', ?) WHERE id = ?"
        );
        let updated = sqlx::query(&sql)
            .bind(value.to_string())
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        if updated.rows_affected() == 0 {
            return Err(AppError::not_found("User", id));
        }
        Ok(())
    }

    async fn pull(&self, id: Uuid, list: UserList, value: Uuid) -> Result<()> {
        let column = user_list_column(list);
        let select = format!("SELECT {column} FROM users WHERE id = ?");
        let row = sqlx::query(&select)
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?
            .ok_or_else(|| AppError::not_found("User", id))?;

        let kept: Vec<Uuid> = json_to_ids(&row.get::<String, _>(column))
            .into_iter()
            .filter(|v| *v != value)
            .collect();

        let update = format!("UPDATE users SET {column} = ? WHERE id = ?");
        sqlx::query(&update)
            .bind(ids_to_json(&kept))
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn pull_threads(&self, user_ids: &[Uuid], thread_ids: &[Uuid]) -> Result<()> {
        if user_ids.is_empty() || thread_ids.is_empty() {
            return Ok(());
        }
        let gone: HashSet<Uuid> = thread_ids.iter().copied().collect();
        for user_id in user_ids {
            let row = sqlx::query("SELECT threads FROM users WHERE id = ?")
                .bind(uuid_to_blob(*user_id))
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;
            let Some(row) = row else { continue };

            let kept: Vec<Uuid> = json_to_ids(&row.get::<String, _>("threads"))
                .into_iter()
                .filter(|id| !gone.contains(id))
                .collect();

            sqlx::query("UPDATE users SET threads = ? WHERE id = ?")
                .bind(ids_to_json(&kept))
                .bind(uuid_to_blob(*user_id))
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
        }
        Ok(())
    }
}

// ── CommunityRepo ───────────────────────────────────────────────────────────

#[async_trait]
impl CommunityRepo for SqliteStore {
    async fn create(&self, community: &Community) -> Result<()> {
        sqlx::query(
            "INSERT INTO communities (id, username, name, image, bio, created_by, threads, members, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(community.id))
        .bind(&community.username)
        .bind(&community.name)
        .bind(image_to_json(&community.image)?)
        .bind(&community.bio)
        .bind(uuid_to_blob(community.created_by))
        .bind(ids_to_json(&community.threads))
        .bind(ids_to_json(&community.members))
        .bind(community.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Community>> {
        let row = sqlx::query("SELECT * FROM communities WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.as_ref().map(community_from_row))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Community>> {
        let row = sqlx::query("SELECT * FROM communities WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.as_ref().map(community_from_row))
    }

    async fn search(&self, term: &str, limit: i64, offset: i64) -> Result<(Vec<Community>, i64)> {
        let pattern = format!("%{}%", term.trim());
        let rows = sqlx::query(
            "SELECT * FROM communities WHERE (name LIKE ? OR username LIKE ?)
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM communities WHERE (name LIKE ? OR username LIKE ?)",
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        Ok((rows.iter().map(community_from_row).collect(), total))
    }

    async fn push_thread(&self, id: Uuid, thread_id: Uuid) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE communities SET threads = json_insert(threads, '$[#]', ?) WHERE id = ?",
        )
        .bind(thread_id.to_string())
        .bind(uuid_to_blob(id))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        if updated.rows_affected() == 0 {
            return Err(AppError::not_found("Community", id));
        }
        Ok(())
    }

    async fn pull_threads(&self, community_ids: &[Uuid], thread_ids: &[Uuid]) -> Result<()> {
        if community_ids.is_empty() || thread_ids.is_empty() {
            return Ok(());
        }
        let gone: HashSet<Uuid> = thread_ids.iter().copied().collect();
        for community_id in community_ids {
            let row = sqlx::query("SELECT threads FROM communities WHERE id = ?")
                .bind(uuid_to_blob(*community_id))
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;
            let Some(row) = row else { continue };

            let kept: Vec<Uuid> = json_to_ids(&row.get::<String, _>("threads"))
                .into_iter()
                .filter(|id| !gone.contains(id))
                .collect();

            sqlx::query("UPDATE communities SET threads = ? WHERE id = ?")
                .bind(ids_to_json(&kept))
                .bind(uuid_to_blob(*community_id))
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
        }
        Ok(())
    }

    async fn push_member(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE communities SET members = json_insert(members, '$[#]', ?) WHERE id = ?",
        )
        .bind(user_id.to_string())
        .bind(uuid_to_blob(id))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        if updated.rows_affected() == 0 {
            return Err(AppError::not_found("Community", id));
        }
        Ok(())
    }

    async fn pull_member(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let row = sqlx::query("SELECT members FROM communities WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?
            .ok_or_else(|| AppError::not_found("Community", id))?;

        let kept: Vec<Uuid> = json_to_ids(&row.get::<String, _>("members"))
            .into_iter()
            .filter(|m| *m != user_id)
            .collect();

        sqlx::query("UPDATE communities SET members = ? WHERE id = ?")
            .bind(ids_to_json(&kept))
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM communities WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Community", id));
        }
        Ok(())
    }
}

// ── NotificationRepo ────────────────────────────────────────────────────────

#[async_trait]
impl NotificationRepo for SqliteStore {
    async fn create(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, title, message, status, kind, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(notification.id))
        .bind(uuid_to_blob(notification.user_id))
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.status.as_str())
        .bind(notification.kind.as_str())
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT * FROM notifications WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(uuid_to_blob(user_id))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(rows.iter().map(notification_from_row).collect())
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let updated =
            sqlx::query("UPDATE notifications SET status = 'read' WHERE id = ? AND user_id = ?")
                .bind(uuid_to_blob(id))
                .bind(uuid_to_blob(user_id))
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
        if updated.rows_affected() == 0 {
            return Err(AppError::not_found("Notification", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rt_core::services::threads::{add_comment, delete_thread, fetch_descendants, NewThread};
    use rt_core::services::threads::create_thread;
    use rt_core::traits::Stores;
    use std::sync::Arc;

    async fn memory_store() -> Arc<SqliteStore> {
        Arc::new(SqliteStore::new("sqlite::memory:").await.unwrap())
    }

    fn stores(store: &Arc<SqliteStore>) -> Stores {
        Stores {
            threads: store.clone(),
            users: store.clone(),
            communities: store.clone(),
            notifications: store.clone(),
        }
    }

    async fn seed_user(store: &SqliteStore, name: &str) -> User {
        let user = User::new(name.into(), format!("{}@example.com", name.to_lowercase()));
        UserRepo::create(store, &user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn round_trips_a_thread_with_image_and_likes() {
        let store = memory_store().await;
        let ann = seed_user(&store, "ann").await;

        let mut thread = Thread::new_top_level(
            "hello".into(),
            ann.id,
            None,
            Some(ImageRef {
                public_id: "thread/abc".into(),
                url: "https://cdn.example.com/abc.webp".into(),
            }),
        );
        thread.likes.push(ann.id);
        ThreadRepo::create(store.as_ref(), &thread).await.unwrap();

        let loaded = ThreadRepo::find_by_id(store.as_ref(), thread.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.text, "hello");
        assert_eq!(loaded.likes, vec![ann.id]);
        assert_eq!(loaded.image, thread.image);
        assert!(loaded.parent_id.is_none());
    }

    #[tokio::test]
    async fn children_stay_in_creation_order() {
        let store = memory_store().await;
        let stores = stores(&store);
        let ann = seed_user(&store, "ann").await;

        let root = create_thread(
            &stores,
            NewThread {
                text: "root".into(),
                author: ann.id,
                community: None,
                image: None,
            },
        )
        .await
        .unwrap();

        let mut expected = Vec::new();
        for i in 0..3 {
            let reply = add_comment(&stores, root.id, format!("reply {i}"), ann.id)
                .await
                .unwrap();
            expected.push(reply.id);
        }

        let children = ThreadRepo::find_by_parent(store.as_ref(), root.id)
            .await
            .unwrap();
        let got: Vec<Uuid> = children.iter().map(|t| t.id).collect();
        assert_eq!(got, expected);

        let parent = ThreadRepo::find_by_id(store.as_ref(), root.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(parent.children, expected);
    }

    #[tokio::test]
    async fn cascade_delete_works_against_sqlite() {
        let store = memory_store().await;
        let stores = stores(&store);
        let ann = seed_user(&store, "ann").await;
        let bob = seed_user(&store, "bob").await;

        let a = create_thread(
            &stores,
            NewThread {
                text: "a".into(),
                author: ann.id,
                community: None,
                image: None,
            },
        )
        .await
        .unwrap();
        let b = add_comment(&stores, a.id, "b".into(), bob.id).await.unwrap();
        add_comment(&stores, a.id, "c".into(), ann.id).await.unwrap();
        add_comment(&stores, b.id, "d".into(), bob.id).await.unwrap();

        let descendants = fetch_descendants(stores.threads.as_ref(), a.id)
            .await
            .unwrap();
        assert_eq!(descendants.len(), 3);

        let outcome = delete_thread(&stores, a.id).await.unwrap();
        assert_eq!(outcome.deleted, 4);

        let ann = UserRepo::find_by_id(store.as_ref(), ann.id)
            .await
            .unwrap()
            .unwrap();
        assert!(ann.threads.is_empty());
    }

    #[tokio::test]
    async fn duplicate_community_username_is_conflict() {
        let store = memory_store().await;
        let ann = seed_user(&store, "ann").await;

        let first = Community::new("rust".into(), "Rust".into(), None, None, ann.id);
        CommunityRepo::create(store.as_ref(), &first).await.unwrap();

        let dup = Community::new("rust".into(), "Rust Again".into(), None, None, ann.id);
        let err = CommunityRepo::create(store.as_ref(), &dup)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn user_list_push_and_pull() {
        let store = memory_store().await;
        let ann = seed_user(&store, "ann").await;
        let target = Uuid::now_v7();

        UserRepo::push(store.as_ref(), ann.id, UserList::Saved, target)
            .await
            .unwrap();
        let loaded = UserRepo::find_by_id(store.as_ref(), ann.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.saved, vec![target]);

        UserRepo::pull(store.as_ref(), ann.id, UserList::Saved, target)
            .await
            .unwrap();
        let loaded = UserRepo::find_by_id(store.as_ref(), ann.id)
            .await
            .unwrap()
            .unwrap();
        assert!(loaded.saved.is_empty());

        // Pulling an absent id is a no-op, not an error.
        UserRepo::pull(store.as_ref(), ann.id, UserList::Saved, target)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn mark_read_rejects_foreign_notifications() {
        let store = memory_store().await;
        let ann = seed_user(&store, "ann").await;
        let bob = seed_user(&store, "bob").await;

        let n = Notification::new(
            ann.id,
            "New Like",
            "bob liked your thread".into(),
            NotificationKind::Like,
        );
        NotificationRepo::create(store.as_ref(), &n).await.unwrap();

        let err = NotificationRepo::mark_read(store.as_ref(), n.id, bob.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));

        NotificationRepo::mark_read(store.as_ref(), n.id, ann.id)
            .await
            .unwrap();
        let inbox = NotificationRepo::list_for_user(store.as_ref(), ann.id)
            .await
            .unwrap();
        assert_eq!(inbox[0].status, NotificationStatus::Read);
    }
}
