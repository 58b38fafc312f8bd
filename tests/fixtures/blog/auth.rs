use std::collections::HashMap;

use client_from_source as rest;

use crate::{ApiError, Session};

#[rest::api_service]
pub trait AuthApi {
    #[rest::post("/login")]
    #[rest::form_url_encoded]
    async fn login(
        &self,
        #[rest::field("username")] username: String,
        #[rest::field("password")] password: String,
        #[rest::field_map] extra: HashMap<String, String>,
    ) -> Result<Session, ApiError>;

    #[rest::get("/me")]
    #[rest::text_response]
    #[rest::headers("Accept: text/plain")]
    async fn whoami(&self) -> Result<String, ApiError>;
}
