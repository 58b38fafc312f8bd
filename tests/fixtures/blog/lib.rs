pub mod api;
pub mod auth;
pub mod common;
pub mod net;

pub struct ApiError;
pub struct Health;
pub struct Post;
pub struct Session;
