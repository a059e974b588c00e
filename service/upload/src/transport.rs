use std::sync::Arc;

use async_trait::async_trait;
use domain_upload::{
    exception::{UploadException, UploadResult},
    model::vo::{Method, TransportRequest, TransportResponse},
    service::PartTransport,
};
use reqwest::{header, Client, Response, StatusCode};
use typed_builder::TypedBuilder;

use crate::credential::CredentialStore;

/// [`PartTransport`] over reqwest.
///
/// Json requests carry the bearer token of the shared [`CredentialStore`]; raw `PUT`
/// uploads go out without it.
#[derive(TypedBuilder)]
pub struct HttpTransport {
    #[builder(default)]
    client: Client,
    credentials: Arc<CredentialStore>,
}

impl HttpTransport {
    /// Send once, return the response and the token generation it was sent with.
    async fn dispatch(&self, request: &TransportRequest) -> UploadResult<(Response, Option<u64>)> {
        let mut builder = self.client.request(reqwest_method(request.method), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        let generation = if request.method.is_raw_upload() {
            None
        } else {
            let credential = self.credentials.get().await?;
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, credential.bearer.as_str());
            Some(credential.generation)
        };
        Ok((builder.send().await?, generation))
    }
}

#[async_trait]
impl PartTransport for HttpTransport {
    #[tracing::instrument(skip_all, fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: TransportRequest) -> UploadResult<TransportResponse> {
        let (response, generation) = self.dispatch(&request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return accept(response).await;
        }

        tracing::warn!("Request was rejected as unauthorized, refreshing the bearer token.");
        self.credentials.refresh_rejected(generation).await?;
        let (response, _) = self.dispatch(&request).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(UploadException::AuthFailed);
        }
        accept(response).await
    }
}

/// Read the response, failing on any status but 200, 201 and 202.
async fn accept(response: Response) -> UploadResult<TransportResponse> {
    let status = response.status().as_u16();
    let etag = response
        .headers()
        .get(header::ETAG)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let body = response.bytes().await?;
    if !matches!(status, 200 | 201 | 202) {
        return Err(UploadException::RequestFailed {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok(TransportResponse { status, etag, body })
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Put => reqwest::Method::PUT,
        Method::Post => reqwest::Method::POST,
        Method::Patch => reqwest::Method::PATCH,
    }
}
