use client_from_source::get;

use crate::{ApiError, Health};

pub trait Marker {
    fn label(&self) -> &'static str {
        "blog"
    }
}

pub trait BaseApi: Marker {
    #[get("/health")]
    async fn health(&self) -> Result<Health, ApiError>;
}
