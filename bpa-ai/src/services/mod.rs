//! Pipeline services

pub mod advisor;
pub mod assembler;
pub mod competitor_discovery;
pub mod completion_client;
pub mod estimator;
pub mod http_browser;
pub mod page_extractor;
pub mod page_signals;
pub mod schema_guard;
pub mod web_search;

pub use advisor::Advisor;
pub use assembler::{
    AnalysisAssembler, AssemblerSettings, AssemblerState, AssemblyTrace, StateTransition,
};
pub use competitor_discovery::{CompetitorDiscovery, DiscoverySettings};
pub use completion_client::CompletionClient;
pub use estimator::{ModelEstimator, StaticEstimator};
pub use http_browser::HttpBrowser;
pub use page_extractor::PageExtractor;
pub use schema_guard::Guarded;
pub use web_search::BingSearch;
