// Library exports for drill analytics
// The CLI and integration tests build on these modules

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, AnalysisResult, FrameRejection};
