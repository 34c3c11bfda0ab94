//! # rt-api Handlers
//!
//! These modules coordinate the flow between HTTP requests and the domain
//! services in `rt-core`. Session issuance is handled upstream, so the
//! acting user id arrives explicitly in the request.

use rt_core::traits::Stores;

pub mod communities;
pub mod notifications;
pub mod threads;
pub mod users;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub stores: Stores,
}
