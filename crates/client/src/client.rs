//! reqwest-backed client and upload transport.

use std::future::Future;
use std::pin::Pin;

use airlift_protocol::constants::{FILENAME_HEADER, PASSWORD_HEADER};
use airlift_protocol::encode_filename;
use airlift_transfer::{FileDescriptor, ProgressSink, body_stream};
use airlift_upload::{Origin, TransportResponse, UploadError, UploadTransport};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use crate::config::ClientConfig;

/// Errors raised while building a [`Client`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid server address {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("password contains characters not allowed in a header")]
    InvalidPassword,
}

/// Client for one airlift server.
///
/// Keeps a cookie store so a [`login`](Client::login) session carries over
/// to the session-protected routes. Redirects are not followed: the server
/// answers a missing session with a redirect to the login form, and that
/// redirect is the signal.
pub struct Client {
    pub(crate) http: reqwest::Client,
    base_url: String,
    upload_path: String,
    chunk_size: usize,
    origin: Origin,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let parsed = reqwest::Url::parse(&config.base_url).map_err(|e| ClientError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if parsed.host_str().is_none() {
            return Err(ClientError::InvalidUrl {
                url: config.base_url,
                reason: "missing host".into(),
            });
        }

        let mut headers = HeaderMap::new();
        if let Some(pass) = config.password.as_deref().filter(|p| !p.is_empty()) {
            headers.insert(
                PASSWORD_HEADER,
                HeaderValue::from_str(pass).map_err(|_| ClientError::InvalidPassword)?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            upload_path: config.upload_path,
            chunk_size: config.chunk_size,
            origin: Origin::from_scheme(parsed.scheme()),
        })
    }

    /// Prefix composed with the server's `host/id` answers.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Reads status and body of a response.
pub(crate) async fn read_response(
    resp: reqwest::Response,
) -> Result<TransportResponse, UploadError> {
    let status = resp.status().as_u16();
    let body = resp.bytes().await.map_err(transport_error)?;
    Ok(TransportResponse::new(status, body.to_vec()))
}

pub(crate) fn transport_error(e: reqwest::Error) -> UploadError {
    UploadError::Transport(e.to_string())
}

impl UploadTransport for Client {
    fn send_file<'a>(
        &'a self,
        file: &'a FileDescriptor,
        progress: ProgressSink,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, UploadError>> + Send + 'a>> {
        Box::pin(async move {
            let body = body_stream(file.content(), self.chunk_size, progress).await?;
            let url = self.url(&self.upload_path);
            debug!(url = %url, file = %file.name(), bytes = file.size(), "posting upload");

            let resp = self
                .http
                .post(&url)
                .header(FILENAME_HEADER, encode_filename(file.name()))
                .body(reqwest::Body::wrap_stream(body))
                .send()
                .await
                .map_err(transport_error)?;
            read_response(resp).await
        })
    }
}
