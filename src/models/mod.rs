// Data models for the landmark pipeline

pub mod landmark;
pub mod metrics;
pub mod video;

pub use landmark::*;
pub use metrics::*;
pub use video::*;
