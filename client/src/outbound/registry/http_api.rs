//! Reqwest-backed registry adapter.
//!
//! This adapter owns transport details only: URL joining, body encoding,
//! timeout and transport error mapping. Every HTTP status is handed back to
//! the domain unchanged; classifying failures is not its job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use tracing::debug;

use super::super::http_support::{body_preview, build_client};
use crate::domain::api::{
    ApiRequest, ApiResponse, HttpMethod, MultipartField, MultipartValue, RequestBody,
};
use crate::domain::ports::{RegistryApi, RegistryApiError};

/// Registry client that resolves request paths against one base URL.
#[derive(Debug, Clone)]
pub struct ReqwestRegistryApi {
    client: Client,
    base_url: Url,
}

impl ReqwestRegistryApi {
    /// Build an adapter. `timeout` of `None` waits indefinitely.
    ///
    /// Request paths resolve beneath `base_url`, so a base such as
    /// `https://host/registry` keeps its `/registry` prefix.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout, None)?,
            base_url: as_directory(base_url),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str, query: &[(String, String)]) -> Result<Url, RegistryApiError> {
        let relative = path.trim_start_matches('/');
        let mut url = self.base_url.join(relative).map_err(|error| {
            RegistryApiError::invalid_request(format!("cannot resolve {path}: {error}"))
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

#[async_trait]
impl RegistryApi for ReqwestRegistryApi {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, RegistryApiError> {
        let parts = request.into_parts();
        let url = self.endpoint(&parts.path, &parts.query)?;
        let mut builder = match parts.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };
        for (name, value) in &parts.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let builder = attach_body(builder, parts.body)?;

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            debug!(
                status = status.as_u16(),
                path = %parts.path,
                body = %body_preview(body.as_ref()),
                "registry returned a failure status"
            );
        }
        Ok(ApiResponse::new(status.as_u16(), body.to_vec()))
    }
}

fn attach_body(
    builder: RequestBuilder,
    body: RequestBody,
) -> Result<RequestBuilder, RegistryApiError> {
    Ok(match body {
        RequestBody::Empty => builder,
        RequestBody::Json(value) => builder.json(&value),
        RequestBody::Multipart(fields) => builder.multipart(multipart_form(fields)?),
    })
}

fn multipart_form(fields: Vec<MultipartField>) -> Result<Form, RegistryApiError> {
    fields.into_iter().try_fold(Form::new(), |form, field| {
        let name = field.name().to_owned();
        match field.value() {
            MultipartValue::Text(text) => Ok(form.text(name, text.clone())),
            MultipartValue::File(upload) => {
                let part = Part::bytes(upload.bytes().to_vec())
                    .file_name(upload.file_name().to_owned())
                    .mime_str(upload.content_type())
                    .map_err(|error| {
                        RegistryApiError::invalid_request(format!(
                            "invalid content type for {name}: {error}"
                        ))
                    })?;
                Ok(form.part(name, part))
            }
        }
    })
}

fn map_transport_error(error: reqwest::Error) -> RegistryApiError {
    if error.is_timeout() {
        RegistryApiError::timeout(error.to_string())
    } else if error.is_builder() {
        RegistryApiError::invalid_request(error.to_string())
    } else {
        RegistryApiError::transport(error.to_string())
    }
}

fn as_directory(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
