pub mod auth;
pub mod categories;
pub mod incidents;
pub mod notifications;
pub mod users;
