//! Builds the checked-in output for the blog fixture against the runtime.
//!
//! The traits below mirror `fixtures/blog` without the marker attributes, and each module
//! pulls in its generated implementation the way a consuming crate would.
#![cfg(feature = "runtime")]
#![allow(dead_code, async_fn_in_trait)]

use client_from_source::runtime::{reqwest, ClientContext, ClientError};
use serde::Deserialize;

#[derive(Debug)]
pub struct ApiError(ClientError);

impl From<ClientError> for ApiError {
    fn from(error: ClientError) -> Self {
        Self(error)
    }
}

#[derive(Debug, Deserialize)]
pub struct Health {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct Post {
    pub id: i32,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub token: String,
}

pub mod common {
    use crate::{ApiError, Health};

    pub trait Marker {
        fn label(&self) -> &'static str {
            "blog"
        }
    }

    pub trait BaseApi: Marker {
        async fn health(&self) -> Result<Health, ApiError>;
    }
}

pub mod api {
    use crate::common::BaseApi;
    use crate::{ApiError, Post};

    pub trait PostsApi: BaseApi {
        async fn get_post_by_id(&self, id: i32) -> Result<Post, ApiError>;

        async fn list_posts(&self, page: Option<u32>, tags: Vec<String>) -> Result<Vec<Post>, ApiError>;

        async fn delete_post(&self, id: i32, token: String) -> Result<(), ApiError>;
    }

    include!("fixtures/generated/api/posts_api_impl.rs");
}

pub mod auth {
    use std::collections::HashMap;

    use crate::{ApiError, Session};

    pub trait AuthApi {
        async fn login(
            &self,
            username: String,
            password: String,
            extra: HashMap<String, String>,
        ) -> Result<Session, ApiError>;

        async fn whoami(&self) -> Result<String, ApiError>;
    }

    include!("fixtures/generated/auth/auth_api_impl.rs");
}

pub mod net {
    pub mod upload {
        use client_from_source::runtime::Part;

        use crate::ApiError;

        pub(crate) trait UploadApi {
            async fn upload(&self, file: Vec<Part>, name: Option<String>) -> Result<(), ApiError>;
        }

        include!("fixtures/generated/net/upload/upload_api_impl.rs");
    }
}

#[tokio::test]
async fn test_uninstalled_context_fails_every_call() {
    use api::PostsApi;
    use auth::AuthApi;
    use common::BaseApi;
    use net::upload::UploadApi;

    let context = ClientContext::new();
    let posts = api::create_posts_api(&context);
    let auth = auth::create_auth_api(&context);
    let upload = net::upload::create_upload_api(&context);

    let err = posts.get_post_by_id(1).await.unwrap_err();
    assert!(matches!(err.0, ClientError::Uninitialized));
    let err = posts.health().await.unwrap_err();
    assert!(matches!(err.0, ClientError::Uninitialized));
    let err = auth.whoami().await.unwrap_err();
    assert!(matches!(err.0, ClientError::Uninitialized));
    let err = upload.upload(Vec::new(), None).await.unwrap_err();
    assert!(matches!(err.0, ClientError::Uninitialized));
}

#[test]
fn test_clones_share_the_installed_client() {
    use common::Marker;

    let context = ClientContext::new();
    let posts = api::create_posts_api(&context);

    context.install_with_base_url(reqwest::Client::new(), "http://localhost:8080");

    assert!(posts.context().is_installed());
    assert_eq!(
        posts.context().base_url().as_deref(),
        Some("http://localhost:8080")
    );
    assert_eq!(posts.label(), "blog");
}
