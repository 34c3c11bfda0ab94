//! # User Services
//!
//! Profile reads and updates, search, activity, saved threads, and the
//! follow graph.

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{ImageRef, NotificationKind, Thread, User};
use crate::services::notifications;
use crate::traits::{Stores, UserList, UserRepo};

/// Search/pagination parameters for [`list_users`].
pub struct UserQuery {
    pub search: String,
    pub page: i64,
    pub page_size: i64,
    /// The requesting user, excluded from results.
    pub exclude: Option<Uuid>,
}

pub struct UserPage {
    pub users: Vec<User>,
    /// Whether a further page exists beyond this one.
    pub is_next: bool,
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<ImageRef>,
}

/// Creates the account record. Onboarding happens at an external identity
/// provider; this just persists the resulting profile.
pub async fn register_user(users: &dyn UserRepo, name: String, email: String) -> Result<User> {
    if name.trim().is_empty() || email.trim().is_empty() {
        return Err(AppError::ValidationError(
            "name and email must not be empty".into(),
        ));
    }
    if users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(
            "an account with this email already exists".into(),
        ));
    }

    let user = User::new(name, email);
    users.create(&user).await?;
    Ok(user)
}

pub async fn get_user(users: &dyn UserRepo, id: Uuid) -> Result<User> {
    users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))
}

pub async fn list_users(users: &dyn UserRepo, query: UserQuery) -> Result<UserPage> {
    let page = query.page.max(1);
    let page_size = query.page_size.max(1);
    let offset = (page - 1) * page_size;

    let (found, total) = users
        .search(&query.search, query.exclude, page_size, offset)
        .await?;
    let is_next = total > offset + found.len() as i64;

    Ok(UserPage {
        users: found,
        is_next,
    })
}

/// Threads authored by the user, resolved through the back-reference list.
pub async fn get_user_threads(stores: &Stores, id: Uuid) -> Result<Vec<Thread>> {
    let user = get_user(stores.users.as_ref(), id).await?;
    stores.threads.find_many(&user.threads).await
}

/// Replies other people left on the user's threads.
pub async fn get_activity(stores: &Stores, id: Uuid) -> Result<Vec<Thread>> {
    let authored = stores.threads.find_by_author(id).await?;
    let child_ids: Vec<Uuid> = authored
        .iter()
        .flat_map(|t| t.children.iter().copied())
        .collect();

    let replies = stores.threads.find_many(&child_ids).await?;
    Ok(replies.into_iter().filter(|t| t.author != id).collect())
}

/// Adds the thread to the user's saved set, or removes it when already
/// there. Returns whether the thread is saved afterwards.
pub async fn toggle_save(stores: &Stores, user_id: Uuid, thread_id: Uuid) -> Result<bool> {
    let user = get_user(stores.users.as_ref(), user_id).await?;

    if user.saved.contains(&thread_id) {
        stores
            .users
            .pull(user_id, UserList::Saved, thread_id)
            .await?;
        Ok(false)
    } else {
        stores
            .users
            .push(user_id, UserList::Saved, thread_id)
            .await?;
        Ok(true)
    }
}

pub async fn get_saved_threads(stores: &Stores, user_id: Uuid) -> Result<Vec<Thread>> {
    let user = get_user(stores.users.as_ref(), user_id).await?;
    stores.threads.find_many(&user.saved).await
}

/// Adds `follower` to `followee`'s followers and vice versa, and notifies
/// the followee.
pub async fn follow(stores: &Stores, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
    if follower_id == followee_id {
        return Err(AppError::ValidationError(
            "you cannot follow yourself".into(),
        ));
    }

    let followee = get_user(stores.users.as_ref(), followee_id).await?;
    let follower = get_user(stores.users.as_ref(), follower_id).await?;

    if followee.followers.contains(&follower_id) {
        return Err(AppError::Conflict(
            "you are already following this user".into(),
        ));
    }

    stores
        .users
        .push(followee_id, UserList::Followers, follower_id)
        .await?;
    stores
        .users
        .push(follower_id, UserList::Following, followee_id)
        .await?;

    notifications::record(
        stores.notifications.as_ref(),
        followee_id,
        "New Follower",
        format!("{} started following you", follower.name),
        NotificationKind::Follow,
    )
    .await;

    Ok(())
}

pub async fn unfollow(stores: &Stores, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
    if follower_id == followee_id {
        return Err(AppError::ValidationError(
            "you cannot unfollow yourself".into(),
        ));
    }

    let followee = get_user(stores.users.as_ref(), followee_id).await?;
    get_user(stores.users.as_ref(), follower_id).await?;

    if !followee.followers.contains(&follower_id) {
        return Err(AppError::Conflict("you are not following this user".into()));
    }

    stores
        .users
        .pull(followee_id, UserList::Followers, follower_id)
        .await?;
    stores
        .users
        .pull(follower_id, UserList::Following, followee_id)
        .await?;

    Ok(())
}

pub async fn get_followers(stores: &Stores, id: Uuid) -> Result<Vec<User>> {
    let user = get_user(stores.users.as_ref(), id).await?;
    stores.users.find_many(&user.followers).await
}

pub async fn get_following(stores: &Stores, id: Uuid) -> Result<Vec<User>> {
    let user = get_user(stores.users.as_ref(), id).await?;
    stores.users.find_many(&user.following).await
}

pub async fn update_user(users: &dyn UserRepo, id: Uuid, update: ProfileUpdate) -> Result<User> {
    let mut user = get_user(users, id).await?;

    if let Some(name) = update.name {
        user.name = name;
    }
    if let Some(username) = update.username {
        if let Some(existing) = users.find_by_username(&username).await? {
            if existing.id != id {
                return Err(AppError::Conflict(
                    "username already exists, use a different one".into(),
                ));
            }
        }
        user.username = Some(username);
    }
    if let Some(bio) = update.bio {
        user.bio = Some(bio);
    }
    if let Some(avatar) = update.avatar {
        user.avatar = Some(avatar);
    }

    users.update_profile(&user).await?;
    Ok(user)
}
