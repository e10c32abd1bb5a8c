use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::multipart::Form;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};

use super::{ApiError, ApiRequest, Method, Transport};
use crate::config::ClientConfig;

const AUTH_TOKEN_HEADER: &str = "x-auth-token";

pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut token = HeaderValue::from_str(&config.auth_token)
            .context("auth token contains characters not allowed in a header")?;
        token.set_sensitive(true);
        headers.insert(HeaderName::from_static(AUTH_TOKEN_HEADER), token);

        let mut builder = reqwest::blocking::Client::builder().default_headers(headers);
        if !config.http_proxy.is_empty() {
            let proxy = reqwest::Proxy::all(&config.http_proxy)
                .with_context(|| format!("invalid proxy url: {}", config.http_proxy))?;
            builder = builder.proxy(proxy);
        }
        if config.skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().context("failed to build http client")?;

        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(upload) = &request.upload {
            let form = Form::new()
                .file(upload.field.clone(), &upload.path)
                .map_err(|source| ApiError::Upload {
                    path: upload.path.display().to_string(),
                    source,
                })?;
            builder = builder.multipart(form);
        }

        let response = builder
            .send()
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApiError::UnexpectedStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(body.to_vec())
    }
}
