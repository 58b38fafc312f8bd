use client_from_source::{api_service, delete, get, header, path, query};

use crate::common::BaseApi;
use crate::{ApiError, Post};

#[api_service]
pub trait PostsApi: BaseApi {
    #[get("/posts/{id}")]
    async fn get_post_by_id(&self, #[path] id: i32) -> Result<Post, ApiError>;

    #[get("/posts")]
    async fn list_posts(
        &self,
        #[query] page: Option<u32>,
        #[query("tag")] tags: Vec<String>,
    ) -> Result<Vec<Post>, ApiError>;

    #[delete("/posts/{id}")]
    async fn delete_post(&self, #[path] id: i32, #[header("X-Token")] token: String) -> Result<(), ApiError>;
}

pub trait NotAService {
    #[get("/ignored")]
    async fn ignored(&self) -> Result<Post, ApiError>;
}
