//! Utility modules for bpa-ai

pub mod retry;

pub use retry::{retry, RetryPolicy};
