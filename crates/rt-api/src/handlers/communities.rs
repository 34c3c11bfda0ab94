//! Community routes: lifecycle, discovery, and membership.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use rt_core::models::ImageRef;
use rt_core::services::communities::{self, NewCommunity};

use crate::error::ApiError;
use crate::handlers::threads::ActingUser;
use crate::handlers::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommunityRequest {
    pub username: String,
    pub name: String,
    pub bio: Option<String>,
    pub image: Option<ImageRef>,
    /// The acting user; becomes the creator and first member.
    pub created_by: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunitiesQuery {
    pub search_string: Option<String>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

/// POST /create-community
pub async fn create_community(
    data: web::Data<AppState>,
    body: web::Json<CreateCommunityRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let community = communities::create_community(
        &data.stores,
        NewCommunity {
            username: body.username,
            name: body.name,
            bio: body.bio,
            image: body.image,
            created_by: body.created_by,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Community created successfully!",
        "community": community,
    })))
}

/// GET /community/{id}
pub async fn get_community(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let community =
        communities::get_community(data.stores.communities.as_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "communityDetails": community })))
}

/// GET /communities — paginated search.
pub async fn get_communities(
    data: web::Data<AppState>,
    query: web::Query<CommunitiesQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let page = communities::list_communities(
        data.stores.communities.as_ref(),
        query.search_string.as_deref().unwrap_or(""),
        query.page_number.unwrap_or(1),
        query.page_size.unwrap_or(20),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "communities": page.communities,
        "isNext": page.is_next,
    })))
}

/// GET /community-posts/{id}
pub async fn get_community_posts(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let threads = communities::get_community_threads(&data.stores, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "communityPosts": threads })))
}

/// PUT /community/join/{communityId}?userId=...
pub async fn join_community(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ActingUser>,
) -> Result<HttpResponse, ApiError> {
    communities::join_community(&data.stores, path.into_inner(), query.user_id).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Successfully joined community!",
    })))
}

/// PUT /community/leave/{communityId}?userId=...
pub async fn leave_community(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ActingUser>,
) -> Result<HttpResponse, ApiError> {
    communities::leave_community(&data.stores, path.into_inner(), query.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Successfully left community",
    })))
}

/// DELETE /delete-community/{communityId}?userId=...
pub async fn delete_community(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ActingUser>,
) -> Result<HttpResponse, ApiError> {
    communities::delete_community(&data.stores, path.into_inner(), query.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Community and all associated data deleted successfully",
    })))
}
