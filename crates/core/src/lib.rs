pub mod config;
pub mod config_loader;
pub mod error;
pub mod traits;

pub use config::{
    AppConfig, CategorizationConfig, CollectionConfig, ContentRule, CorrelationConfig,
    CredentialsConfig, PathsConfig, WindowConfig,
};
pub use config_loader::ConfigLoader;
pub use error::{AnalysisError, Result};
pub use traits::{PolarityScorer, SentimentScore, SourceAdapter, Timestamped};
