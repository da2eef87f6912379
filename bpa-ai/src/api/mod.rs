//! HTTP API handlers for bpa-ai

pub mod analyses;
pub mod analysis;
pub mod competitors;
pub mod extraction;
pub mod health;
pub mod insights;

pub use analyses::analyses_routes;
pub use analysis::analysis_routes;
pub use competitors::competitor_routes;
pub use extraction::extraction_routes;
pub use health::health_routes;
pub use insights::insight_routes;
