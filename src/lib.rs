pub mod config;
pub mod core;
pub mod error;
pub mod host;
pub mod introspection;
pub mod models;
pub mod output;
pub mod prelude;
pub mod utils;

// Re-export types
pub use crate::config::NetworkConfig;
pub use crate::core::{Activation, Dense, ForwardTrace, Gradients, Initializer, LayerTrait};
pub use crate::error::{NNError, Result};
pub use crate::host::{Command, Response, StopReason, TrainingHost};
pub use crate::introspection::{NeuronInfo, ProbeRange};
pub use crate::models::{Network, Parameters, Sample};
