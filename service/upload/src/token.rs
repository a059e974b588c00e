use async_trait::async_trait;
use domain_upload::{
    exception::{UploadException, UploadResult},
    service::TokenSource,
};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// OAuth2 client credentials grant against a fixed token endpoint.
#[derive(TypedBuilder)]
pub struct ClientCredentialsGrant {
    #[builder(default)]
    client: Client,
    #[builder(setter(into))]
    token_url: String,
    #[builder(setter(into))]
    client_id: String,
    #[builder(setter(into))]
    client_secret: String,
    #[builder(default, setter(into))]
    scope: String,
}

#[derive(Debug, Deserialize)]
struct GrantInfo {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct GrantParams<'a> {
    grant_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
}

#[async_trait]
impl TokenSource for ClientCredentialsGrant {
    async fn fetch(&self) -> UploadResult<String> {
        let response = self
            .client
            .post(&self.token_url)
            .header(header::ACCEPT, "application/json")
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&GrantParams {
                grant_type: "client_credentials",
                scope: Some(self.scope.as_str()).filter(|scope| !scope.is_empty()),
            })
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(UploadException::RequestFailed {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let grant: GrantInfo = response
            .json()
            .await
            .map_err(|e| UploadException::extraction("access token", e))?;
        Ok(grant.access_token)
    }
}
