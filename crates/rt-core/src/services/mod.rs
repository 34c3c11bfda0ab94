//! Domain services: the operations the API layer exposes, written against
//! the repository traits so any store plugin can back them.

pub mod communities;
pub mod notifications;
pub mod threads;
pub mod users;
