pub mod analytics;
pub mod handlers;
