use client_from_source::{api_service, body, get};

use crate::{ApiError, Post};

pub struct Filter;

#[api_service]
pub trait SearchApi {
    #[get("/posts")]
    async fn search(&self, #[body] filter: Filter) -> Result<Vec<Post>, ApiError>;
}
