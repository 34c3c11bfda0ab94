//! # Community Services
//!
//! Community lifecycle and membership. Deleting a community also deletes
//! the threads posted into it and prunes the membership back-references.

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Community, ImageRef, NotificationKind, Thread};
use crate::services::notifications;
use crate::services::users::get_user;
use crate::traits::{CommunityRepo, Stores, UserList};

pub struct NewCommunity {
    pub username: String,
    pub name: String,
    pub bio: Option<String>,
    pub image: Option<ImageRef>,
    pub created_by: Uuid,
}

pub struct CommunityPage {
    pub communities: Vec<Community>,
    pub is_next: bool,
}

/// Creates a community with the creator as its first member.
pub async fn create_community(stores: &Stores, input: NewCommunity) -> Result<Community> {
    if input.username.trim().is_empty() || input.name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "community username and name must not be empty".into(),
        ));
    }

    let creator = get_user(stores.users.as_ref(), input.created_by).await?;

    if stores
        .communities
        .find_by_username(&input.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("community username already exists".into()));
    }

    let community = Community::new(
        input.username,
        input.name,
        input.bio,
        input.image,
        creator.id,
    );
    stores.communities.create(&community).await?;
    stores
        .users
        .push(creator.id, UserList::Communities, community.id)
        .await?;

    Ok(community)
}

pub async fn get_community(communities: &dyn CommunityRepo, id: Uuid) -> Result<Community> {
    communities
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Community", id))
}

pub async fn list_communities(
    communities: &dyn CommunityRepo,
    search: &str,
    page: i64,
    page_size: i64,
) -> Result<CommunityPage> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let offset = (page - 1) * page_size;

    let (found, total) = communities.search(search, page_size, offset).await?;
    let is_next = total > offset + found.len() as i64;

    Ok(CommunityPage {
        communities: found,
        is_next,
    })
}

/// Threads posted into the community, resolved through the back-reference
/// list.
pub async fn get_community_threads(stores: &Stores, id: Uuid) -> Result<Vec<Thread>> {
    let community = get_community(stores.communities.as_ref(), id).await?;
    stores.threads.find_many(&community.threads).await
}

/// Adds the user to the community and notifies the community creator.
pub async fn join_community(stores: &Stores, community_id: Uuid, user_id: Uuid) -> Result<()> {
    let community = get_community(stores.communities.as_ref(), community_id).await?;
    let user = get_user(stores.users.as_ref(), user_id).await?;

    if community.members.contains(&user_id) {
        return Err(AppError::Conflict(
            "user is already a member of the community".into(),
        ));
    }

    stores
        .communities
        .push_member(community_id, user_id)
        .await?;
    stores
        .users
        .push(user_id, UserList::Communities, community_id)
        .await?;

    notifications::record(
        stores.notifications.as_ref(),
        community.created_by,
        "New Community Member",
        format!("{} has joined your community \"{}\"", user.name, community.name),
        NotificationKind::Follow,
    )
    .await;

    Ok(())
}

pub async fn leave_community(stores: &Stores, community_id: Uuid, user_id: Uuid) -> Result<()> {
    let community = get_community(stores.communities.as_ref(), community_id).await?;
    get_user(stores.users.as_ref(), user_id).await?;

    if !community.members.contains(&user_id) {
        return Err(AppError::Conflict(
            "user is not a member of this community".into(),
        ));
    }
    if community.created_by == user_id {
        return Err(AppError::ValidationError(
            "community creator cannot leave the community".into(),
        ));
    }

    stores
        .communities
        .pull_member(community_id, user_id)
        .await?;
    stores
        .users
        .pull(user_id, UserList::Communities, community_id)
        .await?;

    Ok(())
}

/// Deletes the community, every thread posted into it, and the membership
/// back-references. Only the creator may do this.
///
/// Member cleanup is best-effort, like the cascade-delete back-reference
/// pruning: a failed pull is logged and skipped.
pub async fn delete_community(
    stores: &Stores,
    community_id: Uuid,
    acting_user: Uuid,
) -> Result<()> {
    let community = get_community(stores.communities.as_ref(), community_id).await?;

    if community.created_by != acting_user {
        return Err(AppError::Unauthorized(
            "only the community creator can delete this community".into(),
        ));
    }

    stores.threads.delete_by_community(community_id).await?;

    for member in &community.members {
        if let Err(err) = stores
            .users
            .pull(*member, UserList::Communities, community_id)
            .await
        {
            log::warn!("delete of community {community_id}: membership cleanup for user {member} failed: {err}");
        }
    }

    stores.communities.delete(community_id).await?;
    Ok(())
}
