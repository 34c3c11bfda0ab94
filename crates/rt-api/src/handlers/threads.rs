//! Thread routes: the feed, single threads, the reply subtree, posting,
//! commenting, cascade deletion, and the like toggle.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use rt_core::models::ImageRef;
use rt_core::services::threads::{self, NewThread};

use crate::error::ApiError;
use crate::handlers::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadRequest {
    pub text: String,
    /// The acting (authoring) user.
    pub author_id: Uuid,
    pub community_id: Option<Uuid>,
    /// Pre-uploaded image metadata, if any.
    pub image: Option<ImageRef>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildThreadsQuery {
    pub thread_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentQuery {
    pub thread_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    pub comment_text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActingUser {
    pub user_id: Uuid,
}

/// POST /create-thread
pub async fn create_thread(
    data: web::Data<AppState>,
    body: web::Json<CreateThreadRequest>,
) -> Result<HttpResponse, ApiError> {
    let input = body.into_inner();
    let thread = threads::create_thread(
        &data.stores,
        NewThread {
            text: input.text,
            author: input.author_id,
            community: input.community_id,
            image: input.image,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({ "success": true, "newThread": thread })))
}

/// GET /threads — the paginated top-level feed.
pub async fn get_threads(
    data: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = threads::get_threads(
        data.stores.threads.as_ref(),
        query.page.unwrap_or(1),
        query.limit.unwrap_or(6),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "threads": page.threads,
        "totalPages": page.total_pages,
    })))
}

/// GET /thread/{threadId}
pub async fn get_thread(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let thread = threads::get_thread(data.stores.threads.as_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "thread": thread })))
}

/// GET /child-threads?threadId=... — the full reply subtree.
pub async fn get_child_threads(
    data: web::Data<AppState>,
    query: web::Query<ChildThreadsQuery>,
) -> Result<HttpResponse, ApiError> {
    let subtree =
        threads::get_child_threads(data.stores.threads.as_ref(), query.thread_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "thread": subtree.thread,
        "descendants": subtree.descendants,
        "totalDescendants": subtree.descendants.len(),
    })))
}

/// DELETE /delete-thread/{threadId} — cascade delete of the whole subtree.
pub async fn delete_thread(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    threads::delete_thread(&data.stores, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Thread deleted successfully",
    })))
}

/// POST /comment?threadId=...&userId=...
pub async fn add_comment(
    data: web::Data<AppState>,
    query: web::Query<CommentQuery>,
    body: web::Json<CommentBody>,
) -> Result<HttpResponse, ApiError> {
    let comment = threads::add_comment(
        &data.stores,
        query.thread_id,
        body.into_inner().comment_text,
        query.user_id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "comment": comment })))
}

/// PUT /like-thread/{threadId}?userId=...
pub async fn like_thread(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ActingUser>,
) -> Result<HttpResponse, ApiError> {
    let (thread, action) =
        threads::like_thread(&data.stores, path.into_inner(), query.user_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "thread": thread,
        "action": action,
    })))
}
