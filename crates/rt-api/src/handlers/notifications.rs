//! Notification routes: the inbox and the read-status update.

use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use rt_core::services::notifications;

use crate::error::ApiError;
use crate::handlers::threads::ActingUser;
use crate::handlers::AppState;

/// GET /notifications/{userId}
pub async fn get_notifications(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let inbox =
        notifications::list_notifications(data.stores.notifications.as_ref(), path.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "notifications": inbox })))
}

/// PUT /notification/{notificationId}?userId=... — mark read, return the
/// refreshed inbox.
pub async fn update_notification(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ActingUser>,
) -> Result<HttpResponse, ApiError> {
    let inbox = notifications::mark_read(
        data.stores.notifications.as_ref(),
        path.into_inner(),
        query.user_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "notifications": inbox })))
}
