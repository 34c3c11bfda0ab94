//! # Thread Services
//!
//! The reply-tree operations: posting, listing, descendant traversal,
//! cascade deletion, comment attachment, and the like toggle.
//!
//! Threads form a tree stored via flat references (`parent_id` up,
//! `children` down), so every operation here re-fetches records by id
//! instead of holding an in-memory object graph.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{ImageRef, NotificationKind, Thread};
use crate::services::notifications;
use crate::traits::{Stores, ThreadRepo, UserList};

/// Input for a new top-level post.
pub struct NewThread {
    pub text: String,
    pub author: Uuid,
    pub community: Option<Uuid>,
    pub image: Option<ImageRef>,
}

/// One page of the top-level feed.
pub struct ThreadPage {
    pub threads: Vec<Thread>,
    pub total_pages: i64,
}

/// A thread together with its full descendant list.
pub struct ThreadSubtree {
    pub thread: Thread,
    pub descendants: Vec<Thread>,
}

/// What a cascade delete removed.
#[derive(Debug)]
pub struct DeleteOutcome {
    pub deleted: u64,
}

/// Outcome of the like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Liked,
    Unliked,
}

/// All descendants of `root` (children, grandchildren, ...), pre-order:
/// a parent always appears before its own children, siblings in the order
/// the store returns them. Returns an empty list when `root` has no
/// children. Pure read; the caller is responsible for checking that `root`
/// itself exists.
///
/// One store round-trip per tree node, which is fine for the expected
/// reply-tree sizes.
pub async fn fetch_descendants(threads: &dyn ThreadRepo, root: Uuid) -> Result<Vec<Thread>> {
    let mut collected = Vec::new();
    collect_subtree(threads, root, &mut collected).await?;
    Ok(collected)
}

// Async recursion needs the boxed-future form.
fn collect_subtree<'a>(
    threads: &'a dyn ThreadRepo,
    id: Uuid,
    out: &'a mut Vec<Thread>,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        let children = threads.find_by_parent(id).await?;
        for child in children {
            let child_id = child.id;
            out.push(child);
            collect_subtree(threads, child_id, out).await?;
        }
        Ok(())
    })
}

/// Creates a top-level post and records the back-references on the author
/// and (when given) the community.
pub async fn create_thread(stores: &Stores, input: NewThread) -> Result<Thread> {
    if input.text.trim().is_empty() {
        return Err(AppError::ValidationError(
            "thread text must not be empty".into(),
        ));
    }

    let author = stores
        .users
        .find_by_id(input.author)
        .await?
        .ok_or_else(|| AppError::not_found("User", input.author))?;

    if let Some(community_id) = input.community {
        stores
            .communities
            .find_by_id(community_id)
            .await?
            .ok_or_else(|| AppError::not_found("Community", community_id))?;
    }

    let thread = Thread::new_top_level(input.text, author.id, input.community, input.image);
    stores.threads.create(&thread).await?;

    stores
        .users
        .push(author.id, UserList::Threads, thread.id)
        .await?;
    if let Some(community_id) = input.community {
        stores
            .communities
            .push_thread(community_id, thread.id)
            .await?;
    }

    Ok(thread)
}

/// The top-level feed, newest first.
pub async fn get_threads(threads: &dyn ThreadRepo, page: i64, limit: i64) -> Result<ThreadPage> {
    let limit = limit.max(1);
    let page = page.max(1);
    let offset = (page - 1) * limit;

    let (rows, total) = threads.list_top_level(limit, offset).await?;
    let total_pages = (total + limit - 1) / limit;

    Ok(ThreadPage {
        threads: rows,
        total_pages,
    })
}

pub async fn get_thread(threads: &dyn ThreadRepo, id: Uuid) -> Result<Thread> {
    threads
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Thread", id))
}

/// The thread plus every transitive reply under it.
pub async fn get_child_threads(threads: &dyn ThreadRepo, id: Uuid) -> Result<ThreadSubtree> {
    let thread = get_thread(threads, id).await?;
    let descendants = fetch_descendants(threads, id).await?;
    Ok(ThreadSubtree {
        thread,
        descendants,
    })
}

/// Removes the thread and its entire descendant subtree, then repairs the
/// back-references on the affected users and communities.
///
/// The deletion set is computed from a single traversal before any delete is
/// issued; a reply attached concurrently after that snapshot may survive as
/// an orphan. Back-reference pruning is best-effort: a failure there leaves
/// dangling ids behind (logged, not rolled back) and the cleanup can be
/// retried since pruning an absent id is a no-op.
pub async fn delete_thread(stores: &Stores, id: Uuid) -> Result<DeleteOutcome> {
    // 1. Load the root; its author/community feed the cleanup sets.
    let root = stores
        .threads
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Thread", id))?;

    // 2. Snapshot the full subtree. Any failure here aborts before a single
    //    delete is issued.
    let descendants = fetch_descendants(stores.threads.as_ref(), id).await?;

    // 3. Deletion set = {root} ∪ descendants.
    let mut doomed = Vec::with_capacity(descendants.len() + 1);
    doomed.push(root.id);
    doomed.extend(descendants.iter().map(|t| t.id));

    // 4. Distinct authors and communities across the whole subtree.
    let mut authors: BTreeSet<Uuid> = descendants.iter().map(|t| t.author).collect();
    authors.insert(root.author);
    let mut communities: BTreeSet<Uuid> =
        descendants.iter().filter_map(|t| t.community).collect();
    if let Some(community_id) = root.community {
        communities.insert(community_id);
    }

    // 5. Bulk delete the snapshot.
    let deleted = stores.threads.delete_many(&doomed).await?;

    // 6./7. Prune back-references. Losses here are accepted staleness.
    let author_ids: Vec<Uuid> = authors.into_iter().collect();
    if let Err(err) = stores.users.pull_threads(&author_ids, &doomed).await {
        log::warn!("cascade delete of {id}: user back-reference cleanup failed: {err}");
    }
    let community_ids: Vec<Uuid> = communities.into_iter().collect();
    if !community_ids.is_empty() {
        if let Err(err) = stores
            .communities
            .pull_threads(&community_ids, &doomed)
            .await
        {
            log::warn!("cascade delete of {id}: community back-reference cleanup failed: {err}");
        }
    }

    Ok(DeleteOutcome { deleted })
}

/// Attaches a new reply under `parent_id` and notifies the parent's author.
///
/// The reply record is created before the parent's `children` list is
/// updated, so a concurrent reader never observes a child id it cannot
/// resolve.
pub async fn add_comment(
    stores: &Stores,
    parent_id: Uuid,
    text: String,
    author: Uuid,
) -> Result<Thread> {
    if text.trim().is_empty() {
        return Err(AppError::ValidationError(
            "comment text must not be empty".into(),
        ));
    }

    let parent = stores
        .threads
        .find_by_id(parent_id)
        .await?
        .ok_or_else(|| AppError::not_found("Thread", parent_id))?;
    let user = stores
        .users
        .find_by_id(author)
        .await?
        .ok_or_else(|| AppError::not_found("User", author))?;

    let reply = Thread::new_reply(parent_id, text, author);
    stores.threads.create(&reply).await?;
    stores.threads.append_child(parent_id, reply.id).await?;

    if parent.author != author {
        notifications::record(
            stores.notifications.as_ref(),
            parent.author,
            "New Comment",
            format!(
                "{} commented on your thread: \"{}\"",
                user.name,
                excerpt(&parent.text)
            ),
            NotificationKind::Comment,
        )
        .await;
    }

    Ok(reply)
}

/// Toggles the caller's like on a thread. Liking (not unliking) someone
/// else's thread notifies its author.
pub async fn like_thread(
    stores: &Stores,
    thread_id: Uuid,
    user_id: Uuid,
) -> Result<(Thread, LikeAction)> {
    let mut thread = stores
        .threads
        .find_by_id(thread_id)
        .await?
        .ok_or_else(|| AppError::not_found("Thread", thread_id))?;
    let user = stores
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", user_id))?;

    let action = if thread.likes.contains(&user_id) {
        thread.likes.retain(|id| *id != user_id);
        LikeAction::Unliked
    } else {
        thread.likes.push(user_id);
        LikeAction::Liked
    };
    stores.threads.set_likes(thread_id, &thread.likes).await?;

    if action == LikeAction::Liked && thread.author != user_id {
        notifications::record(
            stores.notifications.as_ref(),
            thread.author,
            "New Like",
            format!(
                "{} liked your thread: \"{}\"",
                user.name,
                excerpt(&thread.text)
            ),
            NotificationKind::Like,
        )
        .await;
    }

    Ok((thread, action))
}

/// First 30 characters of `text`, with a trailing ellipsis when truncated.
fn excerpt(text: &str) -> String {
    if text.chars().count() > 30 {
        let head: String = text.chars().take(30).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
