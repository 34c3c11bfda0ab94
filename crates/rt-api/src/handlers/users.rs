//! User routes: profiles, search, activity, saved threads, and the follow
//! graph.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use rt_core::models::ImageRef;
use rt_core::services::users::{self, ProfileUpdate, UserQuery};

use crate::error::ApiError;
use crate::handlers::threads::ActingUser;
use crate::handlers::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersQuery {
    pub search_string: Option<String>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
    /// The requesting user, excluded from results.
    pub user_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<ImageRef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowQuery {
    pub follower_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

/// POST /create-user
pub async fn create_user(
    data: web::Data<AppState>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let user = users::register_user(data.stores.users.as_ref(), body.name, body.email).await?;
    Ok(HttpResponse::Created().json(json!({ "success": true, "user": user })))
}

/// GET /user/{userId}
pub async fn get_user(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let user = users::get_user(data.stores.users.as_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "user": user })))
}

/// GET /users — paginated search.
pub async fn get_users(
    data: web::Data<AppState>,
    query: web::Query<UsersQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let page = users::list_users(
        data.stores.users.as_ref(),
        UserQuery {
            search: query.search_string.unwrap_or_default(),
            page: query.page_number.unwrap_or(1),
            page_size: query.page_size.unwrap_or(20),
            exclude: query.user_id,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "users": page.users,
        "isNext": page.is_next,
    })))
}

/// PUT /update-user/{userId}
pub async fn update_user(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let user = users::update_user(
        data.stores.users.as_ref(),
        path.into_inner(),
        ProfileUpdate {
            name: body.name,
            username: body.username,
            bio: body.bio,
            avatar: body.avatar,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "user": user })))
}

/// GET /user-threads/{userId}
pub async fn get_user_threads(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let threads = users::get_user_threads(&data.stores, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "threads": threads })))
}

/// GET /activity/{userId} — replies from other people on the user's threads.
pub async fn get_activity(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let replies = users::get_activity(&data.stores, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "totalReplies": replies.len(),
        "replies": replies,
    })))
}

/// PUT /save-thread/{threadId}?userId=...
pub async fn toggle_save_thread(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ActingUser>,
) -> Result<HttpResponse, ApiError> {
    let saved = users::toggle_save(&data.stores, query.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "saved": saved,
        "message": "Toggle Successful",
    })))
}

/// GET /saved-threads/{userId}
pub async fn get_saved_threads(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let threads = users::get_saved_threads(&data.stores, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "threads": threads })))
}

/// PUT /follow/{userId}?followerId=...
pub async fn follow_user(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<FollowQuery>,
) -> Result<HttpResponse, ApiError> {
    users::follow(&data.stores, query.follower_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "You are now following this user",
    })))
}

/// PUT /unfollow/{userId}?followerId=...
pub async fn unfollow_user(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<FollowQuery>,
) -> Result<HttpResponse, ApiError> {
    users::unfollow(&data.stores, query.follower_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "You have unfollowed this user",
    })))
}

/// GET /followers/{userId}
pub async fn get_followers(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let followers = users::get_followers(&data.stores, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "followers": followers })))
}

/// GET /following/{userId}
pub async fn get_following(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let following = users::get_following(&data.stores, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "following": following })))
}
