use client_from_source::runtime::Part;
use client_from_source::{api_service, multipart, part, post};

use crate::ApiError;

#[api_service]
pub(crate) trait UploadApi {
    #[post("/upload")]
    #[multipart]
    async fn upload(&self, #[part] file: Vec<Part>, #[part] name: Option<String>) -> Result<(), ApiError>;
}
