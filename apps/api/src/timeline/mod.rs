pub mod generator;
pub mod handlers;
pub mod normalize;
pub mod service;
pub mod store;
