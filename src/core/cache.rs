use crate::prelude::*;

/// Pre- and post-activation values of one layer for one input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LayerCache {
    pub z: Array1<f64>,
    pub a: Array1<f64>,
}

/// Everything one forward pass computed, layer 0 being the raw input.
///
/// A trace is a plain value: it can be handed to
/// [`Network::backward_trace`](crate::models::Network::backward_trace) later
/// and several traces can coexist without touching the network's own cache.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ForwardTrace {
    layers: Vec<LayerCache>,
}

impl ForwardTrace {
    pub(crate) fn start(input: &Array1<f64>, depth: usize) -> Self {
        let mut layers = Vec::with_capacity(depth + 1);
        layers.push(LayerCache {
            z: input.clone(),
            a: input.clone(),
        });
        Self { layers }
    }

    pub(crate) fn push(&mut self, z: Array1<f64>, a: Array1<f64>) {
        self.layers.push(LayerCache { z, a });
    }

    pub fn input(&self) -> &Array1<f64> {
        &self.layers[0].a
    }

    pub fn output(&self) -> &Array1<f64> {
        &self.layers[self.layers.len() - 1].a
    }

    /// Number of computed layers (the input layer is not counted).
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn layer(&self, layer: usize) -> Option<&LayerCache> {
        self.layers.get(layer)
    }

    pub fn layers(&self) -> &[LayerCache] {
        &self.layers
    }

    /// Widths of every cached layer, input first.
    pub fn layer_sizes(&self) -> Vec<usize> {
        self.layers.iter().map(|cache| cache.a.len()).collect()
    }
}

/// Per-parameter gradients of one sample, indexed like the network's layers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Gradients {
    pub dw: Vec<Array2<f64>>,
    pub db: Vec<Array1<f64>>,
}

impl Gradients {
    pub fn is_finite(&self) -> bool {
        self.dw
            .iter()
            .flat_map(|dw| dw.iter())
            .chain(self.db.iter().flat_map(|db| db.iter()))
            .all(|g| g.is_finite())
    }
}
