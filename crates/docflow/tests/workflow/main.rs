//! In-memory integration tests for the document workflow.

mod concurrency;
mod lifecycle;
mod support;
