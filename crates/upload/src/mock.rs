//! Scripted transport shared by the unit tests.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use airlift_transfer::{FileDescriptor, ProgressSink};
use tokio::sync::Notify;

use crate::error::UploadError;
use crate::task::UploadTransport;
use crate::types::TransportResponse;

/// What the mock does for one upload.
pub(crate) enum Exchange {
    /// Reports each progress value, then answers. With `yields` the mock
    /// yields after every report; without it everything happens in one poll.
    Respond {
        progress: Vec<u64>,
        yields: bool,
        status: u16,
        body: String,
    },
    /// Signals `entered` and never answers.
    Hang,
    /// Fails before any response.
    Error(String),
}

impl Exchange {
    pub(crate) fn created(fragment: &str, progress: Vec<u64>) -> Self {
        Self::Respond {
            progress,
            yields: true,
            status: 201,
            body: format!(r#"{{"URL":"{fragment}"}}"#),
        }
    }

    /// Reports `loaded` and answers 201 within the same poll.
    pub(crate) fn created_at_once(fragment: &str, loaded: u64) -> Self {
        Self::Respond {
            progress: vec![loaded],
            yields: false,
            status: 201,
            body: format!(r#"{{"URL":"{fragment}"}}"#),
        }
    }

    pub(crate) fn status(status: u16, body: &str) -> Self {
        Self::Respond {
            progress: Vec::new(),
            yields: true,
            status,
            body: body.to_string(),
        }
    }
}

/// Mock transport that records the name of every dispatched file.
pub(crate) struct MockTransport {
    script: Mutex<VecDeque<Exchange>>,
    calls: Mutex<Vec<String>>,
    pub(crate) entered: Notify,
}

impl MockTransport {
    pub(crate) fn new(script: Vec<Exchange>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
            entered: Notify::new(),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl UploadTransport for MockTransport {
    fn send_file<'a>(
        &'a self,
        file: &'a FileDescriptor,
        progress: ProgressSink,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, UploadError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(file.name().to_string());
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Exchange::Respond {
                    progress: steps,
                    yields,
                    status,
                    body,
                }) => {
                    for loaded in steps {
                        progress.report(loaded);
                        if yields {
                            tokio::task::yield_now().await;
                        }
                    }
                    Ok(TransportResponse::new(status, body))
                }
                Some(Exchange::Hang) => {
                    self.entered.notify_one();
                    std::future::pending().await
                }
                Some(Exchange::Error(msg)) => Err(UploadError::Transport(msg)),
                None => Err(UploadError::Transport("unscripted upload".into())),
            }
        })
    }
}
