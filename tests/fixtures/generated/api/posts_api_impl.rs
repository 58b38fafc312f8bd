// @generated by client-from-source from src/api.rs. Do not edit.

/// Generated implementation of [`PostsApi`].
pub struct PostsApiImpl {
    context: ::client_from_source::runtime::ClientContext,
}
impl PostsApiImpl {
    pub fn new(context: ::client_from_source::runtime::ClientContext) -> Self {
        Self { context }
    }
    pub fn context(&self) -> &::client_from_source::runtime::ClientContext {
        &self.context
    }
}
impl PostsApi for PostsApiImpl {
    async fn get_post_by_id(&self, id: i32) -> Result<Post, ApiError> {
        let (client, url) = self.context.endpoint(&format!("/posts/{}", id))?;
        let request = client
            .request(::client_from_source::runtime::reqwest::Method::GET, url);
        let response = ::client_from_source::runtime::send(request).await?;
        Ok(::client_from_source::runtime::read_json(response).await?)
    }
    async fn list_posts(
        &self,
        page: ::core::option::Option<u32>,
        tags: Vec<String>,
    ) -> Result<Vec<Post>, ApiError> {
        let (client, url) = self.context.endpoint("/posts")?;
        let mut request = client
            .request(::client_from_source::runtime::reqwest::Method::GET, url);
        if let Some(value) = &page {
            request = request.query(&[("page", value.to_string())]);
        }
        for value in tags.iter() {
            request = request.query(&[("tag", value.to_string())]);
        }
        let response = ::client_from_source::runtime::send(request).await?;
        Ok(::client_from_source::runtime::read_json(response).await?)
    }
    async fn delete_post(&self, id: i32, token: String) -> Result<(), ApiError> {
        let (client, url) = self.context.endpoint(&format!("/posts/{}", id))?;
        let mut request = client
            .request(::client_from_source::runtime::reqwest::Method::DELETE, url);
        request = request.header("X-Token", token.to_string());
        ::client_from_source::runtime::send(request).await?;
        Ok(())
    }
}
impl crate::common::BaseApi for PostsApiImpl {
    async fn health(&self) -> Result<crate::Health, crate::ApiError> {
        let (client, url) = self.context.endpoint("/health")?;
        let request = client
            .request(::client_from_source::runtime::reqwest::Method::GET, url);
        let response = ::client_from_source::runtime::send(request).await?;
        Ok(::client_from_source::runtime::read_json(response).await?)
    }
}
impl crate::common::Marker for PostsApiImpl {}
/// Creates a [`PostsApiImpl`] bound to `context`.
pub fn create_posts_api(
    context: &::client_from_source::runtime::ClientContext,
) -> PostsApiImpl {
    PostsApiImpl::new(context.clone())
}
