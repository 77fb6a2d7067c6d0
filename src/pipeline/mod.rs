//! Pipeline module - every stage from raw candidate table to ranked output

pub mod config;
pub mod correlation;
pub mod encoder;
pub mod error;
pub mod loader;
pub mod models;
pub mod ranking;
pub mod run;
pub mod schema;
pub mod selector;
pub mod target;
pub mod window;

pub use config::PipelineConfig;
pub use correlation::*;
pub use encoder::{EncodingScheme, EncodingTable, FeatureEncoder};
pub use error::{FrameContext, PipelineError, PipelineResult, TrainError};
pub use loader::*;
pub use models::{Classifier, ClassWeight, ModelSpec, ModelVariant};
pub use ranking::*;
pub use run::*;
pub use schema::{validate_schema, SchemaReport};
pub use selector::*;
pub use target::*;
pub use window::{build_windows, FeatureMatrix, WindowedDataset};
