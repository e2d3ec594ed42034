//! Sequential upload pipeline for an airlift server.
//!
//! This crate holds the upload **business logic** only. The HTTP side is
//! abstracted behind [`UploadTransport`], implemented by `airlift-client`
//! and by scripted mocks in tests.
//!
//! # Pipeline
//!
//! 1. **Begin**: claim the orchestrator's single active slot and size the batch
//! 2. **Chain**: one [`TaskChain`](airlift_chain::TaskChain) step per file, in input order
//! 3. **Upload**: each step runs an [`UploadTask`], streaming one file
//! 4. **Classify**: the response status picks success, auth-required or failure
//! 5. **Finish**: ordered locators on success, the first stop reason otherwise

pub mod classifier;
pub mod error;
pub mod orchestrator;
pub mod task;
pub mod types;

#[cfg(test)]
mod mock;

pub use classifier::{
    Classification, classify_ack, classify_json, classify_login, classify_page, classify_upload,
};
pub use error::UploadError;
pub use orchestrator::{Batch, CancelHandle, UploadOrchestrator};
pub use task::{TaskOutcome, UploadTask, UploadTransport};
pub use types::{BatchOutcome, BatchSummary, Locator, Origin, TransportResponse, UploadEvent};
