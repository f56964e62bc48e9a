pub mod activity;
pub mod admin;
pub mod plan;
pub mod user;
