// @generated by client-from-source from src/net/upload.rs. Do not edit.

/// Generated implementation of [`UploadApi`].
pub(crate) struct UploadApiImpl {
    context: ::client_from_source::runtime::ClientContext,
}
impl UploadApiImpl {
    pub(crate) fn new(context: ::client_from_source::runtime::ClientContext) -> Self {
        Self { context }
    }
    pub(crate) fn context(&self) -> &::client_from_source::runtime::ClientContext {
        &self.context
    }
}
impl UploadApi for UploadApiImpl {
    async fn upload(
        &self,
        file: Vec<Part>,
        name: ::core::option::Option<String>,
    ) -> Result<(), ApiError> {
        let (client, url) = self.context.endpoint("/upload")?;
        let mut request = client
            .request(::client_from_source::runtime::reqwest::Method::POST, url);
        let mut form = ::client_from_source::runtime::Form::new();
        for part in file {
            form = form.part("file", part);
        }
        if let Some(value) = &name {
            form = form.text("name", value.to_string());
        }
        request = request.multipart(form);
        ::client_from_source::runtime::send(request).await?;
        Ok(())
    }
}
/// Creates a [`UploadApiImpl`] bound to `context`.
pub(crate) fn create_upload_api(
    context: &::client_from_source::runtime::ClientContext,
) -> UploadApiImpl {
    UploadApiImpl::new(context.clone())
}
