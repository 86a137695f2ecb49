pub use serde::{Deserialize, Serialize};

pub use ndarray::*;
pub use ndarray_rand::rand_distr::Uniform;
pub use ndarray_rand::RandomExt;
pub use rand::rngs::StdRng;
pub use rand::seq::SliceRandom;
pub use rand::{Rng, SeedableRng};

pub use crate::config::NetworkConfig;
pub use crate::error::*;
pub use crate::introspection::{NeuronInfo, ProbeRange};
pub use crate::models::{Network, Parameters, Sample};

// Internal re-exports
pub use crate::core::{
    apply_optimization,
    criteria,
    Activation,
    Dense,
    ForwardTrace,
    Gradients,
    Initializer,
    LayerCache,
    LayerTrait,
    Optimization,
    OptimizerConfig,
};
