// @generated by client-from-source from src/auth.rs. Do not edit.

/// Generated implementation of [`AuthApi`].
pub struct AuthApiImpl {
    context: ::client_from_source::runtime::ClientContext,
}
impl AuthApiImpl {
    pub fn new(context: ::client_from_source::runtime::ClientContext) -> Self {
        Self { context }
    }
    pub fn context(&self) -> &::client_from_source::runtime::ClientContext {
        &self.context
    }
}
impl AuthApi for AuthApiImpl {
    async fn login(
        &self,
        username: String,
        password: String,
        extra: HashMap<String, String>,
    ) -> Result<Session, ApiError> {
        let (client, url) = self.context.endpoint("/login")?;
        let mut request = client
            .request(::client_from_source::runtime::reqwest::Method::POST, url);
        let mut fields = ::client_from_source::runtime::FormFields::new();
        fields.insert("username", &username);
        fields.insert("password", &password);
        fields.extend(extra.iter());
        request = request.form(&fields);
        let response = ::client_from_source::runtime::send(request).await?;
        Ok(::client_from_source::runtime::read_json(response).await?)
    }
    async fn whoami(&self) -> Result<String, ApiError> {
        let (client, url) = self.context.endpoint("/me")?;
        let mut request = client
            .request(::client_from_source::runtime::reqwest::Method::GET, url);
        request = request.header("Accept", "text/plain");
        let response = ::client_from_source::runtime::send(request).await?;
        Ok(::client_from_source::runtime::read_text(response).await?)
    }
}
/// Creates a [`AuthApiImpl`] bound to `context`.
pub fn create_auth_api(
    context: &::client_from_source::runtime::ClientContext,
) -> AuthApiImpl {
    AuthApiImpl::new(context.clone())
}
