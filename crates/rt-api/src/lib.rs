//! # rt-api
//!
//! The web routing and orchestration layer for rusty-threads.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;

/// Configures the routes for the API.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            // Threads
            .route("/create-thread", web::post().to(handlers::threads::create_thread))
            .route("/threads", web::get().to(handlers::threads::get_threads))
            .route("/thread/{threadId}", web::get().to(handlers::threads::get_thread))
            .route("/child-threads", web::get().to(handlers::threads::get_child_threads))
            .route("/delete-thread/{threadId}", web::delete().to(handlers::threads::delete_thread))
            .route("/comment", web::post().to(handlers::threads::add_comment))
            .route("/like-thread/{threadId}", web::put().to(handlers::threads::like_thread))
            // Users
            .route("/create-user", web::post().to(handlers::users::create_user))
            .route("/user/{userId}", web::get().to(handlers::users::get_user))
            .route("/users", web::get().to(handlers::users::get_users))
            .route("/update-user/{userId}", web::put().to(handlers::users::update_user))
            .route("/user-threads/{userId}", web::get().to(handlers::users::get_user_threads))
            .route("/activity/{userId}", web::get().to(handlers::users::get_activity))
            .route("/save-thread/{threadId}", web::put().to(handlers::users::toggle_save_thread))
            .route("/saved-threads/{userId}", web::get().to(handlers::users::get_saved_threads))
            .route("/follow/{userId}", web::put().to(handlers::users::follow_user))
            .route("/unfollow/{userId}", web::put().to(handlers::users::unfollow_user))
            .route("/followers/{userId}", web::get().to(handlers::users::get_followers))
            .route("/following/{userId}", web::get().to(handlers::users::get_following))
            // Communities
            .route("/create-community", web::post().to(handlers::communities::create_community))
            .route("/community/{id}", web::get().to(handlers::communities::get_community))
            .route("/communities", web::get().to(handlers::communities::get_communities))
            .route("/community-posts/{id}", web::get().to(handlers::communities::get_community_posts))
            .route("/community/join/{communityId}", web::put().to(handlers::communities::join_community))
            .route("/community/leave/{communityId}", web::put().to(handlers::communities::leave_community))
            .route("/delete-community/{communityId}", web::delete().to(handlers::communities::delete_community))
            // Notifications
            .route("/notifications/{userId}", web::get().to(handlers::notifications::get_notifications))
            .route("/notification/{notificationId}", web::put().to(handlers::notifications::update_notification)),
    );
}
