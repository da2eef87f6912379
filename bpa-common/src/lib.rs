//! # BPA Common Library
//!
//! Shared code for the business plan analysis services:
//! - Error type shared by every crate in the workspace
//! - Bootstrap configuration (TOML) loading
//! - The Analysis data model exchanged with rendering and storage layers

pub mod analysis;
pub mod config;
pub mod error;

pub use analysis::{Analysis, AnswerSet, Competitor, PremiumAnalysis, SubscriptionLevel};
pub use error::{Error, Result};
