use crate::prelude::*;
use crate::rand_array;

/// Weight initialization scheme. Biases always start at zero.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Initializer {
    /// Glorot uniform, `sqrt(6 / (fan_in + fan_out))`
    #[default]
    Xavier,
    /// Narrower variant, `sqrt(2 / (fan_in + fan_out))`
    He,
}

impl Initializer {
    pub fn limit(&self, fan_in: usize, fan_out: usize) -> f64 {
        let fan = (fan_in + fan_out) as f64;
        match self {
            Self::Xavier => (6.0 / fan).sqrt(),
            Self::He => (2.0 / fan).sqrt(),
        }
    }
}

pub trait LayerTrait {
    fn new<R: Rng + ?Sized>(
        perceptron: usize,
        prev: usize,
        activation: Activation,
        initializer: Initializer,
        rng: &mut R,
    ) -> Result<Self>
    where
        Self: Sized;

    fn typ(&self) -> String;

    fn param_count(&self) -> usize;
}

/// Fully connected layer. `w` is `[perceptron, prev]`: one row per
/// destination neuron, one column per source neuron.
#[derive(Debug, Clone)]
pub struct Dense {
    pub w: Array2<f64>,
    pub b: Array1<f64>,
    pub activation: Activation,

    // momentum buffers, same shapes as `w` and `b`
    vw: Array2<f64>,
    vb: Array1<f64>,
}

impl LayerTrait for Dense {
    fn new<R: Rng + ?Sized>(
        perceptron: usize,
        prev: usize,
        activation: Activation,
        initializer: Initializer,
        rng: &mut R,
    ) -> Result<Self> {
        if perceptron == 0 || prev == 0 {
            return Err(NNError::InvalidConfiguration(
                "Layer dimensions must be greater than 0".to_string(),
            ));
        }
        let limit = initializer.limit(prev, perceptron);
        Ok(Self {
            w: rand_array!(rng; limit; perceptron, prev),
            b: Array1::zeros(perceptron),
            activation,
            vw: Array2::zeros((perceptron, prev)),
            vb: Array1::zeros(perceptron),
        })
    }

    fn typ(&self) -> String {
        "Dense".into()
    }

    fn param_count(&self) -> usize {
        self.w.len() + self.b.len()
    }
}

impl Dense {
    pub fn inputs(&self) -> usize {
        self.w.ncols()
    }

    pub fn outputs(&self) -> usize {
        self.w.nrows()
    }

    pub fn velocity(&self) -> (&Array2<f64>, &Array1<f64>) {
        (&self.vw, &self.vb)
    }

    pub fn forward(&self, a: &Array1<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
        if a.len() != self.inputs() {
            return Err(NNError::ShapeMismatch(format!(
                "layer expects {} inputs, got {}",
                self.inputs(),
                a.len()
            )));
        }
        if self.b.len() != self.outputs() {
            return Err(NNError::ShapeMismatch(format!(
                "bias length {} does not match {} weight rows",
                self.b.len(),
                self.outputs()
            )));
        }
        let z = self.w.dot(a) + &self.b;
        let a = self.activation.forward(&z);
        Ok((z, a))
    }

    /// Returns `(dw, db, da_prev)` for this layer given `da = dL/da` at its
    /// output, its cached `z` and the previous layer's activation.
    pub fn backward(
        &self,
        z: &Array1<f64>,
        a_prev: &Array1<f64>,
        da: Array1<f64>,
    ) -> Result<(Array2<f64>, Array1<f64>, Array1<f64>)> {
        if z.len() != self.outputs() || da.len() != self.outputs() {
            return Err(NNError::ShapeMismatch(format!(
                "layer has {} outputs, got z of {} and gradient of {}",
                self.outputs(),
                z.len(),
                da.len()
            )));
        }
        if a_prev.len() != self.inputs() {
            return Err(NNError::ShapeMismatch(format!(
                "layer expects {} inputs, cached activation has {}",
                self.inputs(),
                a_prev.len()
            )));
        }
        let dz = self.activation.backward(z, da);
        let dw = dz
            .view()
            .insert_axis(Axis(1))
            .dot(&a_prev.view().insert_axis(Axis(0)));
        let da_prev = self.w.t().dot(&dz);
        Ok((dw, dz, da_prev))
    }

    /// Replaces weights and biases and drops accumulated momentum.
    pub(crate) fn assign(&mut self, w: &Array2<f64>, b: &Array1<f64>) -> Result<()> {
        if w.dim() != self.w.dim() || b.len() != self.b.len() {
            return Err(NNError::ShapeMismatch(format!(
                "expected weights {:?} and {} biases, got {:?} and {}",
                self.w.dim(),
                self.b.len(),
                w.dim(),
                b.len()
            )));
        }
        self.w.assign(w);
        self.b.assign(b);
        self.vw.fill(0.0);
        self.vb.fill(0.0);
        Ok(())
    }
}

impl Optimization for Dense {
    fn optimize(&mut self, dw: &Array2<f64>, db: &Array1<f64>, optimizer: &OptimizerConfig) {
        apply_optimization(
            &mut self.w,
            &mut self.b,
            &mut self.vw,
            &mut self.vb,
            dw,
            db,
            optimizer,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(perceptron: usize, prev: usize, activation: Activation) -> Dense {
        let mut rng = StdRng::seed_from_u64(3);
        Dense::new(perceptron, prev, activation, Initializer::Xavier, &mut rng).unwrap()
    }

    #[test]
    fn test_new_shapes_and_zero_bias() {
        let dense = layer(4, 3, Activation::Tanh);
        assert_eq!(dense.w.dim(), (4, 3));
        assert_eq!(dense.b, Array1::<f64>::zeros(4));
        assert_eq!(dense.param_count(), 16);
        let (vw, vb) = dense.velocity();
        assert!(vw.iter().chain(vb.iter()).all(|v| *v == 0.0));
    }

    #[test]
    fn test_initialization_within_limits() {
        let mut rng = StdRng::seed_from_u64(11);
        for init in [Initializer::Xavier, Initializer::He] {
            let dense = Dense::new(30, 20, Activation::Linear, init, &mut rng).unwrap();
            let limit = init.limit(20, 30);
            assert!(dense.w.iter().all(|w| w.abs() <= limit));
            // a 600-entry uniform sample should reach well past half the limit
            assert!(dense.w.iter().any(|w| w.abs() > limit * 0.5));
        }
        assert!((Initializer::Xavier.limit(1, 5) - 1.0).abs() < 1e-12);
        assert!((Initializer::He.limit(2, 2) - 0.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let res = Dense::new(0, 3, Activation::Relu, Initializer::Xavier, &mut rng);
        assert!(matches!(res, Err(NNError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_forward_linear_combination() {
        let mut dense = layer(2, 3, Activation::Relu);
        dense.w = array![[1.0, -1.0, 0.5], [-2.0, 0.0, 1.0]];
        dense.b = array![0.25, -0.5];
        let (z, a) = dense.forward(&array![1.0, 2.0, 4.0]).unwrap();
        assert_eq!(z, array![1.25, 1.5]);
        assert_eq!(a, array![1.25, 1.5]);

        let (z, a) = dense.forward(&array![0.0, 3.0, 0.0]).unwrap();
        assert_eq!(z, array![-2.75, -0.5]);
        assert_eq!(a, array![0.0, 0.0]);
    }

    #[test]
    fn test_forward_rejects_wrong_width() {
        let dense = layer(2, 3, Activation::Linear);
        assert!(matches!(
            dense.forward(&array![1.0, 2.0]),
            Err(NNError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_backward_outer_product() {
        let mut dense = layer(2, 3, Activation::Linear);
        dense.w = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let a_prev = array![1.0, -1.0, 2.0];
        let (z, _) = dense.forward(&a_prev).unwrap();
        let (dw, db, da_prev) = dense.backward(&z, &a_prev, array![0.5, -1.0]).unwrap();
        assert_eq!(dw, array![[0.5, -0.5, 1.0], [-1.0, 1.0, -2.0]]);
        assert_eq!(db, array![0.5, -1.0]);
        assert_eq!(da_prev, array![-3.5, -4.0, -4.5]);
    }

    #[test]
    fn test_assign_resets_velocity() {
        let mut dense = layer(1, 1, Activation::Linear);
        let config = OptimizerConfig::new(0.1, 0.9).unwrap();
        dense.optimize(&array![[1.0]], &array![1.0], &config);
        assert!(dense.velocity().0[[0, 0]] != 0.0);

        dense.assign(&array![[2.0]], &array![0.5]).unwrap();
        assert_eq!(dense.w, array![[2.0]]);
        assert_eq!(dense.velocity().0[[0, 0]], 0.0);
        assert!(matches!(
            dense.assign(&array![[2.0, 1.0]], &array![0.5]),
            Err(NNError::ShapeMismatch(_))
        ));
    }
}
