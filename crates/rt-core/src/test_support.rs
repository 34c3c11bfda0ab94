//! In-memory store double for service tests. Backed by `Mutex<Vec<_>>` so
//! insertion order is the natural ordering, mirroring what the SQLite plugin
//! gives via `created_at`.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Community, Notification, NotificationStatus, Thread, User};
use crate::traits::{
    CommunityRepo, NotificationRepo, Stores, ThreadRepo, UserList, UserRepo,
};

#[derive(Default)]
pub struct MemoryStore {
    threads: Mutex<Vec<Thread>>,
    users: Mutex<Vec<User>>,
    communities: Mutex<Vec<Community>>,
    notifications: Mutex<Vec<Notification>>,
}

impl MemoryStore {
    pub fn stores(self: &Arc<Self>) -> Stores {
        Stores {
            threads: self.clone(),
            users: self.clone(),
            communities: self.clone(),
            notifications: self.clone(),
        }
    }

    pub fn seed_user(&self, name: &str) -> User {
        let user = User::new(
            name.to_string(),
            format!("{}@example.com", name.to_lowercase()),
        );
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn seed_community(&self, username: &str, created_by: Uuid) -> Community {
        let community = Community::new(
            username.to_string(),
            username.to_string(),
            None,
            None,
            created_by,
        );
        self.communities.lock().unwrap().push(community.clone());
        community
    }

    pub fn thread_count(&self) -> usize {
        self.threads.lock().unwrap().len()
    }
}

fn user_list_mut(user: &mut User, list: UserList) -> &mut Vec<Uuid> {
    match list {
        UserList::Threads => &mut user.threads,
        UserList::Communities => &mut user.communities,
        UserList::Saved => &mut user.saved,
        UserList::Followers => &mut user.followers,
        UserList::Following => &mut user.following,
    }
}

fn matches_term(term: &str, name: &str, username: Option<&str>) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    name.to_lowercase().contains(&term)
        || username.is_some_and(|u| u.to_lowercase().contains(&term))
}

#[async_trait]
impl ThreadRepo for MemoryStore {
    async fn create(&self, thread: &Thread) -> Result<()> {
        self.threads.lock().unwrap().push(thread.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Thread>> {
        Ok(self
            .threads
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn find_by_parent(&self, parent_id: Uuid) -> Result<Vec<Thread>> {
        Ok(self
            .threads
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.parent_id == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn find_by_author(&self, author: Uuid) -> Result<Vec<Thread>> {
        Ok(self
            .threads
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.author == author)
            .cloned()
            .collect())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Thread>> {
        Ok(self
            .threads
            .lock()
            .unwrap()
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn list_top_level(&self, limit: i64, offset: i64) -> Result<(Vec<Thread>, i64)> {
        let guard = self.threads.lock().unwrap();
        let top: Vec<Thread> = guard
            .iter()
            .rev() // newest first
            .filter(|t| t.parent_id.is_none())
            .cloned()
            .collect();
        let total = top.len() as i64;
        let page = top
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn append_child(&self, parent_id: Uuid, child_id: Uuid) -> Result<()> {
        let mut guard = self.threads.lock().unwrap();
        let parent = guard
            .iter_mut()
            .find(|t| t.id == parent_id)
            .ok_or_else(|| AppError::not_found("Thread", parent_id))?;
        parent.children.push(child_id);
        Ok(())
    }

    async fn set_likes(&self, id: Uuid, likes: &[Uuid]) -> Result<()> {
        let mut guard = self.threads.lock().unwrap();
        let thread = guard
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::not_found("Thread", id))?;
        thread.likes = likes.to_vec();
        Ok(())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64> {
        let mut guard = self.threads.lock().unwrap();
        let before = guard.len();
        guard.retain(|t| !ids.contains(&t.id));
        Ok((before - guard.len()) as u64)
    }

    async fn delete_by_community(&self, community_id: Uuid) -> Result<u64> {
        let mut guard = self.threads.lock().unwrap();
        let before = guard.len();
        guard.retain(|t| t.community != Some(community_id));
        Ok((before - guard.len()) as u64)
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(&self, user: &User) -> Result<()> {
        let mut guard = self.users.lock().unwrap();
        if guard.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(
                "UNIQUE constraint failed: users.email".into(),
            ));
        }
        guard.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn search(
        &self,
        term: &str,
        exclude: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64)> {
        let guard = self.users.lock().unwrap();
        let matched: Vec<User> = guard
            .iter()
            .rev()
            .filter(|u| Some(u.id) != exclude)
            .filter(|u| matches_term(term, &u.name, u.username.as_deref()))
            .cloned()
            .collect();
        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn update_profile(&self, user: &User) -> Result<()> {
        let mut guard = self.users.lock().unwrap();
        let existing = guard
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| AppError::not_found("User", user.id))?;
        existing.name = user.name.clone();
        existing.username = user.username.clone();
        existing.bio = user.bio.clone();
        existing.avatar = user.avatar.clone();
        Ok(())
    }

    async fn push(&self, id: Uuid, list: UserList, value: Uuid) -> Result<()> {
        let mut guard = self.users.lock().unwrap();
        let user = guard
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found("User", id))?;
        user_list_mut(user, list).push(value);
        Ok(())
    }

    async fn pull(&self, id: Uuid, list: UserList, value: Uuid) -> Result<()> {
        let mut guard = self.users.lock().unwrap();
        let user = guard
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found("User", id))?;
        user_list_mut(user, list).retain(|v| *v != value);
        Ok(())
    }

    async fn pull_threads(&self, user_ids: &[Uuid], thread_ids: &[Uuid]) -> Result<()> {
        let mut guard = self.users.lock().unwrap();
        for user in guard.iter_mut().filter(|u| user_ids.contains(&u.id)) {
            user.threads.retain(|t| !thread_ids.contains(t));
        }
        Ok(())
    }
}

#[async_trait]
impl CommunityRepo for MemoryStore {
    async fn create(&self, community: &Community) -> Result<()> {
        self.communities.lock().unwrap().push(community.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Community>> {
        Ok(self
            .communities
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Community>> {
        Ok(self
            .communities
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.username == username)
            .cloned())
    }

    async fn search(&self, term: &str, limit: i64, offset: i64) -> Result<(Vec<Community>, i64)> {
        let guard = self.communities.lock().unwrap();
        let matched: Vec<Community> = guard
            .iter()
            .rev()
            .filter(|c| matches_term(term, &c.name, Some(&c.username)))
            .cloned()
            .collect();
        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn push_thread(&self, id: Uuid, thread_id: Uuid) -> Result<()> {
        let mut guard = self.communities.lock().unwrap();
        let community = guard
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::not_found("Community", id))?;
        community.threads.push(thread_id);
        Ok(())
    }

    async fn pull_threads(&self, community_ids: &[Uuid], thread_ids: &[Uuid]) -> Result<()> {
        let mut guard = self.communities.lock().unwrap();
        for community in guard.iter_mut().filter(|c| community_ids.contains(&c.id)) {
            community.threads.retain(|t| !thread_ids.contains(t));
        }
        Ok(())
    }

    async fn push_member(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let mut guard = self.communities.lock().unwrap();
        let community = guard
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::not_found("Community", id))?;
        community.members.push(user_id);
        Ok(())
    }

    async fn pull_member(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let mut guard = self.communities.lock().unwrap();
        let community = guard
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::not_found("Community", id))?;
        community.members.retain(|m| *m != user_id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut guard = self.communities.lock().unwrap();
        let before = guard.len();
        guard.retain(|c| c.id != id);
        if guard.len() == before {
            return Err(AppError::not_found("Community", id));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationRepo for MemoryStore {
    async fn create(&self, notification: &Notification) -> Result<()> {
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let mut guard = self.notifications.lock().unwrap();
        let notification = guard
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .ok_or_else(|| AppError::not_found("Notification", id))?;
        notification.status = NotificationStatus::Read;
        Ok(())
    }
}
