//! Status-code-driven classification of server responses.
//!
//! Every response is reduced to a closed [`Classification`] so callers
//! branch with an exhaustive `match` instead of comparing status codes.

use airlift_protocol::ServerResponse;
use airlift_protocol::constants::{STATUS_CREATED, STATUS_FORBIDDEN, STATUS_NO_CONTENT, STATUS_OK};
use serde::de::DeserializeOwned;

use crate::error::UploadError;

/// Outcome of one server exchange.
#[derive(Debug)]
pub enum Classification<T> {
    Success(T),
    /// The server wants an authenticated session. Never displayed as an error.
    AuthRequired,
    Failure(UploadError),
}

impl<T> Classification<T> {
    /// Converts into a `Result`, mapping `AuthRequired` to
    /// [`UploadError::AuthRequired`].
    pub fn into_result(self) -> Result<T, UploadError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::AuthRequired => Err(UploadError::AuthRequired),
            Self::Failure(err) => Err(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Classifies an upload response. Success carries the locator fragment.
pub fn classify_upload(status: u16, body: &[u8]) -> Classification<String> {
    match status {
        STATUS_CREATED => match ServerResponse::parse(body) {
            Ok(Some(resp)) => match resp.locator() {
                Some(locator) => Classification::Success(locator.to_string()),
                None => Classification::Failure(invalid_response("missing URL")),
            },
            Ok(None) => Classification::Failure(invalid_response("empty body")),
            Err(e) => Classification::Failure(invalid_response(&e.to_string())),
        },
        STATUS_FORBIDDEN => Classification::AuthRequired,
        _ => Classification::Failure(failure(status, body)),
    }
}

/// Classifies the response of an action acknowledged with 204 (purge).
pub fn classify_ack(status: u16, body: &[u8]) -> Classification<()> {
    match status {
        STATUS_NO_CONTENT => Classification::Success(()),
        STATUS_FORBIDDEN => Classification::AuthRequired,
        _ => Classification::Failure(failure(status, body)),
    }
}

/// Classifies a response whose `expected` status carries a JSON body of type `T`.
///
/// These routes sit behind the session check, so a redirect to the login
/// form is auth required as well.
pub fn classify_json<T: DeserializeOwned>(
    expected: u16,
    status: u16,
    body: &[u8],
) -> Classification<T> {
    if status == expected {
        return match serde_json::from_slice(body) {
            Ok(value) => Classification::Success(value),
            Err(e) => Classification::Failure(invalid_response(&e.to_string())),
        };
    }
    match status {
        STATUS_FORBIDDEN | 300..=399 => Classification::AuthRequired,
        _ => Classification::Failure(failure(status, body)),
    }
}

/// Classifies a page or fragment request. Success carries the HTML.
///
/// Session-protected pages answer a missing session with a redirect to the
/// login form, which counts as auth required.
pub fn classify_page(status: u16, body: &[u8]) -> Classification<String> {
    match status {
        STATUS_OK => Classification::Success(String::from_utf8_lossy(body).into_owned()),
        STATUS_FORBIDDEN | 300..=399 => Classification::AuthRequired,
        _ => Classification::Failure(failure(status, body)),
    }
}

/// Classifies a login form submission.
///
/// A redirect means the session cookie was issued. The server re-renders
/// the form with 200 when the password is wrong.
pub fn classify_login(status: u16, body: &[u8]) -> Classification<()> {
    match status {
        300..=399 => Classification::Success(()),
        STATUS_OK | STATUS_FORBIDDEN => Classification::AuthRequired,
        _ => Classification::Failure(failure(status, body)),
    }
}

/// Builds the failure for an unexpected status: the server's message when
/// the body carries one, the bare status otherwise.
fn failure(status: u16, body: &[u8]) -> UploadError {
    match ServerResponse::parse(body) {
        Ok(Some(resp)) => match resp.error_message() {
            Some(message) => UploadError::Validation {
                status,
                message: message.to_string(),
            },
            None => UploadError::Unknown { status },
        },
        _ => UploadError::Unknown { status },
    }
}

fn invalid_response(detail: &str) -> UploadError {
    UploadError::Transport(format!("invalid server response: {detail}"))
}
