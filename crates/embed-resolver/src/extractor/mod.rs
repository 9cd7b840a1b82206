pub mod config;
pub mod diagnostics;
pub mod error;
pub mod factory;
pub mod fetcher;
pub mod headers;
pub mod hosts;
pub mod http;
pub mod metadata;
pub mod orchestrator;
pub mod parser;
pub mod retriever;
pub mod utils;
pub mod validator;

pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use factory::{ExtractorFactory, default_factory};
pub use orchestrator::EmbedExtractor;
