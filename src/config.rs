use crate::core::optimizers::{validate_learning_rate, validate_momentum};
use crate::prelude::*;

/// Architecture, activations and hyperparameters of a network.
///
/// Field names follow camelCase on the wire so that a host on the other side
/// of a message boundary can send `{"layerSizes": [1, 4, 1], ...}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub layer_sizes: Vec<usize>,
    pub hidden_activation: Activation,
    pub output_activation: Activation,
    pub learning_rate: f64,
    pub momentum: f64,
    #[serde(default)]
    pub initializer: Initializer,
    /// Fixed seed for initialization and shuffling; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            layer_sizes: vec![1, 4, 1],
            hidden_activation: Activation::Tanh,
            output_activation: Activation::Linear,
            learning_rate: 0.01,
            momentum: 0.9,
            initializer: Initializer::Xavier,
            seed: None,
        }
    }
}

impl NetworkConfig {
    pub fn new(layer_sizes: &[usize], hidden: Activation, output: Activation) -> Self {
        Self {
            layer_sizes: layer_sizes.to_vec(),
            hidden_activation: hidden,
            output_activation: output,
            ..Self::default()
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = initializer;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parses and validates a JSON config. Unknown activation names and
    /// malformed documents are configuration errors.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| NNError::InvalidConfiguration(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.layer_sizes.len() < 2 {
            return Err(NNError::InvalidConfiguration(format!(
                "need at least an input and an output layer, got {:?}",
                self.layer_sizes
            )));
        }
        if let Some(pos) = self.layer_sizes.iter().position(|&n| n == 0) {
            return Err(NNError::InvalidConfiguration(format!(
                "layer {} has size 0 in {:?}",
                pos, self.layer_sizes
            )));
        }
        validate_learning_rate(self.learning_rate)?;
        validate_momentum(self.momentum)?;
        Ok(())
    }

    pub fn optimizer(&self) -> Result<OptimizerConfig> {
        OptimizerConfig::new(self.learning_rate, self.momentum)
    }

    pub fn input_width(&self) -> usize {
        self.layer_sizes[0]
    }

    pub fn output_width(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    /// Number of computed layers.
    pub fn depth(&self) -> usize {
        self.layer_sizes.len() - 1
    }

    /// Activation of layer `layer` (0 is the input layer).
    pub fn activation_for(&self, layer: usize) -> Activation {
        if layer == 0 {
            Activation::Linear
        } else if layer == self.depth() {
            self.output_activation
        } else {
            self.hidden_activation
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = NetworkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.depth(), 2);
        assert_eq!(config.activation_for(0), Activation::Linear);
        assert_eq!(config.activation_for(1), Activation::Tanh);
        assert_eq!(config.activation_for(2), Activation::Linear);
    }

    #[test]
    fn test_rejects_bad_architectures() {
        for sizes in [vec![], vec![1], vec![1, 0, 1], vec![0, 1]] {
            let config = NetworkConfig::new(&sizes, Activation::Tanh, Activation::Linear);
            assert!(
                matches!(config.validate(), Err(NNError::InvalidConfiguration(_))),
                "{:?} should be rejected",
                sizes
            );
        }
    }

    #[test]
    fn test_rejects_bad_hyperparameters() {
        let base = NetworkConfig::default();
        assert!(base.clone().with_learning_rate(0.0).validate().is_err());
        assert!(base.clone().with_learning_rate(f64::INFINITY).validate().is_err());
        assert!(base.clone().with_momentum(1.0).validate().is_err());
        assert!(base.with_momentum(0.0).validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let config = NetworkConfig::from_json(
            r#"{
                "layerSizes": [2, 8, 1],
                "hiddenActivation": "relu",
                "outputActivation": "identity",
                "learningRate": 0.02,
                "momentum": 0.5,
                "seed": 9
            }"#,
        )
        .unwrap();
        assert_eq!(config.layer_sizes, vec![2, 8, 1]);
        assert_eq!(config.hidden_activation, Activation::Relu);
        assert_eq!(config.output_activation, Activation::Linear);
        assert_eq!(config.initializer, Initializer::Xavier);
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn test_from_json_unknown_activation() {
        let res = NetworkConfig::from_json(
            r#"{"layerSizes": [1, 1], "hiddenActivation": "swish",
                "outputActivation": "linear", "learningRate": 0.1, "momentum": 0.0}"#,
        );
        assert!(matches!(res, Err(NNError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_from_json_validates() {
        let res = NetworkConfig::from_json(
            r#"{"layerSizes": [1], "hiddenActivation": "tanh",
                "outputActivation": "linear", "learningRate": 0.1, "momentum": 0.0}"#,
        );
        assert!(matches!(res, Err(NNError::InvalidConfiguration(_))));
    }
}
