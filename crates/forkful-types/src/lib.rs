pub mod api;
pub mod duration;
pub mod models;
