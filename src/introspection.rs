//! Per-neuron views of a network for visualizers.
//!
//! [`Network::neuron_info`] only reads parameters and the cache left by the
//! last forward pass. [`Network::neuron_pattern`] and
//! [`Network::layer_patterns`] sweep the input and therefore overwrite that
//! cache.

use crate::prelude::*;
use crate::utils::linspace;
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NeuronInfo {
    pub layer: usize,
    pub index: usize,
    /// Incoming weights, empty for the input layer.
    pub weights: Vec<f64>,
    pub bias: f64,
    pub activation: Activation,
    /// `z` from the cached forward pass, `None` before any forward.
    pub pre_activation: Option<f64>,
    /// `a` from the cached forward pass, `None` before any forward.
    pub post_activation: Option<f64>,
    /// Index of the incoming weight with the largest magnitude.
    pub dominant_input: Option<usize>,
}

impl NeuronInfo {
    /// One line a visualizer can show next to the neuron.
    pub fn describe(&self) -> String {
        let current = match self.post_activation {
            Some(a) => format!("{:.3}", a),
            None => "n/a".to_string(),
        };
        if self.layer == 0 {
            return format!("input {}: value {}", self.index, current);
        }
        // a deserialized value may carry any index
        let reacts = match self
            .dominant_input
            .and_then(|k| self.weights.get(k).map(|w| (k, w)))
        {
            Some((k, w)) => format!("primarily reacts to input {} (weight {:.3})", k, w),
            None => "has no inputs".to_string(),
        };
        format!(
            "layer {} neuron {} ({}): {}, bias {:.3}, output {}",
            self.layer, self.index, self.activation, reacts, self.bias, current
        )
    }
}

impl fmt::Display for NeuronInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Evenly spaced probe inputs from `start` to `end`, both included.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ProbeRange {
    pub start: f64,
    pub end: f64,
    pub steps: usize,
}

impl ProbeRange {
    pub fn new(start: f64, end: f64, steps: usize) -> Self {
        Self { start, end, steps }
    }

    pub fn points(&self) -> Vec<f64> {
        linspace(self.start, self.end, self.steps)
    }
}

fn dominant_index(weights: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (k, w) in weights.iter().enumerate() {
        let magnitude = w.abs();
        match best {
            Some((_, m)) if m >= magnitude => {}
            _ => best = Some((k, magnitude)),
        }
    }
    best.map(|(k, _)| k)
}

impl Network {
    fn check_neuron(&self, layer: usize, index: usize) -> Result<()> {
        let sizes = self.layer_sizes();
        match sizes.get(layer) {
            None => Err(NNError::InvalidState(format!(
                "layer {} does not exist, network has layers 0..={}",
                layer,
                sizes.len() - 1
            ))),
            Some(&n) if index >= n => Err(NNError::InvalidState(format!(
                "layer {} has {} neurons, no neuron {}",
                layer, n, index
            ))),
            Some(_) => Ok(()),
        }
    }

    pub fn neuron_info(&self, layer: usize, index: usize) -> Result<NeuronInfo> {
        self.check_neuron(layer, index)?;
        let cached = self.last_trace().and_then(|trace| trace.layer(layer));
        let pre_activation = cached.map(|cache| cache.z[index]);
        let post_activation = cached.map(|cache| cache.a[index]);

        if layer == 0 {
            return Ok(NeuronInfo {
                layer,
                index,
                weights: Vec::new(),
                bias: 0.0,
                activation: Activation::Linear,
                pre_activation,
                post_activation,
                dominant_input: None,
            });
        }

        let dense = &self.layers()[layer - 1];
        let weights = dense.w.row(index).to_vec();
        let dominant_input = dominant_index(&weights);
        Ok(NeuronInfo {
            layer,
            index,
            weights,
            bias: dense.b[index],
            activation: dense.activation,
            pre_activation,
            post_activation,
            dominant_input,
        })
    }

    /// Post-activation of one neuron at every probe point.
    ///
    /// Runs one forward pass per point; the cache afterwards holds the last
    /// probe.
    pub fn neuron_pattern(
        &mut self,
        layer: usize,
        index: usize,
        probe: &ProbeRange,
    ) -> Result<Vec<(f64, f64)>> {
        self.check_neuron(layer, index)?;
        let patterns = self.sweep(layer, probe)?;
        Ok(patterns
            .into_iter()
            .map(|(x, activations)| (x, activations[index]))
            .collect())
    }

    /// Post-activations of every neuron in `layer` at every probe point,
    /// one row per neuron.
    pub fn layer_patterns(&mut self, layer: usize, probe: &ProbeRange) -> Result<Vec<Vec<(f64, f64)>>> {
        self.check_neuron(layer, 0)?;
        let width = self.layer_sizes()[layer];
        let patterns = self.sweep(layer, probe)?;
        Ok((0..width)
            .map(|j| patterns.iter().map(|(x, a)| (*x, a[j])).collect())
            .collect())
    }

    fn sweep(&mut self, layer: usize, probe: &ProbeRange) -> Result<Vec<(f64, Array1<f64>)>> {
        if self.config().input_width() != 1 {
            return Err(NNError::ShapeMismatch(format!(
                "probing needs a single input, network takes {}",
                self.config().input_width()
            )));
        }
        let mut out = Vec::with_capacity(probe.steps);
        for x in probe.points() {
            self.forward(&array![x])?;
            let activations = self
                .last_trace()
                .and_then(|trace| trace.layer(layer))
                .map(|cache| cache.a.clone())
                .ok_or_else(|| NNError::InvalidState(format!("no cached layer {}", layer)))?;
            out.push((x, activations));
        }
        Ok(out)
    }
}
