// src/core.rs
pub mod activations;
pub mod cache;
pub mod layers;
pub mod losses;
pub mod optimizers;

// Re-export commonly used items
pub use activations::Activation;
pub use cache::{ForwardTrace, Gradients, LayerCache};
pub use layers::{Dense, Initializer, LayerTrait};
pub use losses::criteria;
pub use optimizers::{apply_optimization, Optimization, OptimizerConfig};
