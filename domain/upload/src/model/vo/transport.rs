use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::exception::{UploadException, UploadResult};

/// Query parameters appended to a request url.
pub type QueryParams = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Patch,
}

impl Method {
    /// Raw byte uploads go to pre-authorized urls, they carry neither a json content type
    /// nor the bearer token.
    pub fn is_raw_upload(self) -> bool {
        matches!(self, Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Patch => "PATCH",
        })
    }
}

/// A fully resolved request handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Bytes>,
    pub query: QueryParams,
}

impl TransportRequest {
    pub fn new(method: Method, url: impl Into<String>, body: Option<Bytes>) -> Self {
        Self {
            method,
            url: url.into(),
            body,
            query: QueryParams::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url, None)
    }

    pub fn put(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::new(Method::Put, url, Some(body.into()))
    }

    pub fn post(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::new(Method::Post, url, Some(body.into()))
    }

    pub fn patch(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::new(Method::Patch, url, Some(body.into()))
    }

    pub fn with_query(mut self, query: &QueryParams) -> Self {
        self.query.extend(query.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

/// An accepted response, its status is one of 200, 201 or 202.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Value of the `ETag` header, if any.
    pub etag: Option<String>,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn json<T: DeserializeOwned>(&self) -> UploadResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| UploadException::extraction("response body", e))
    }

    /// Entity tag with surrounding quotes removed.
    pub fn entity_tag(&self) -> UploadResult<String> {
        self.etag
            .as_deref()
            .map(|etag| etag.trim_matches('"').to_string())
            .filter(|etag| !etag.is_empty())
            .ok_or_else(|| UploadException::extraction("entity tag", "no ETag header"))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
