use crate::prelude::*;

/// Heavy-ball SGD hyperparameters.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    pub learning_rate: f64,
    pub momentum: f64,
}

impl OptimizerConfig {
    pub fn new(learning_rate: f64, momentum: f64) -> Result<Self> {
        validate_learning_rate(learning_rate)?;
        validate_momentum(momentum)?;
        Ok(Self {
            learning_rate,
            momentum,
        })
    }
}

pub(crate) fn validate_learning_rate(learning_rate: f64) -> Result<()> {
    if !(learning_rate.is_finite() && learning_rate > 0.0) {
        return Err(NNError::InvalidConfiguration(format!(
            "learning rate must be a positive finite number, got {}",
            learning_rate
        )));
    }
    Ok(())
}

pub(crate) fn validate_momentum(momentum: f64) -> Result<()> {
    if !(0.0..1.0).contains(&momentum) {
        return Err(NNError::InvalidConfiguration(format!(
            "momentum must lie in [0, 1), got {}",
            momentum
        )));
    }
    Ok(())
}

pub trait Optimization {
    fn optimize(&mut self, dw: &Array2<f64>, db: &Array1<f64>, optimizer: &OptimizerConfig);
}

/// `v = momentum * v + lr * g; p = p - v`, for weights and biases alike.
///
/// With `momentum == 0` this is exactly `p = p - lr * g`.
pub fn apply_optimization(
    weights: &mut Array2<f64>,
    bias: &mut Array1<f64>,
    w_velocity: &mut Array2<f64>,
    b_velocity: &mut Array1<f64>,
    dw: &Array2<f64>,
    db: &Array1<f64>,
    config: &OptimizerConfig,
) {
    momentum_step(weights, w_velocity, dw, config);
    momentum_step(bias, b_velocity, db, config);
}

fn momentum_step<D: Dimension>(
    param: &mut Array<f64, D>,
    velocity: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    config: &OptimizerConfig,
) {
    let (lr, momentum) = (config.learning_rate, config.momentum);
    velocity.zip_mut_with(grad, |v, &g| *v = momentum * *v + lr * g);
    *param -= &*velocity;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_sgd(weights: &mut Array2<f64>, bias: &mut Array1<f64>, dw: &Array2<f64>, db: &Array1<f64>, lr: f64) {
        for (w, g) in weights.iter_mut().zip(dw.iter()) {
            *w -= lr * g;
        }
        for (b, g) in bias.iter_mut().zip(db.iter()) {
            *b -= lr * g;
        }
    }

    #[test]
    fn test_zero_momentum_is_plain_sgd() {
        let config = OptimizerConfig::new(0.03, 0.0).unwrap();
        let mut w = array![[0.3, -1.2], [2.5, 0.7]];
        let mut b = array![0.1, -0.4];
        let mut vw = Array2::zeros((2, 2));
        let mut vb = Array1::zeros(2);
        let mut w_ref = w.clone();
        let mut b_ref = b.clone();

        let steps = [
            (array![[0.5, -0.25], [1.0, 3.0]], array![0.2, -0.7]),
            (array![[-1.5, 0.125], [0.0, -2.0]], array![1.1, 0.3]),
            (array![[0.75, 0.5], [-0.5, 0.25]], array![-0.9, 0.05]),
        ];
        for (dw, db) in steps.iter() {
            apply_optimization(&mut w, &mut b, &mut vw, &mut vb, dw, db, &config);
            plain_sgd(&mut w_ref, &mut b_ref, dw, db, 0.03);
            assert_eq!(w, w_ref);
            assert_eq!(b, b_ref);
        }
    }

    #[test]
    fn test_velocity_accumulates() {
        let config = OptimizerConfig::new(0.1, 0.5).unwrap();
        let mut w = array![[1.0]];
        let mut b = array![0.0];
        let mut vw = Array2::zeros((1, 1));
        let mut vb = Array1::zeros(1);
        let g = array![[1.0]];
        let gb = array![2.0];

        apply_optimization(&mut w, &mut b, &mut vw, &mut vb, &g, &gb, &config);
        assert!((vw[[0, 0]] - 0.1).abs() < 1e-12);
        assert!((w[[0, 0]] - 0.9).abs() < 1e-12);
        assert!((b[0] + 0.2).abs() < 1e-12);

        apply_optimization(&mut w, &mut b, &mut vw, &mut vb, &g, &gb, &config);
        // v = 0.5 * 0.1 + 0.1 * 1
        assert!((vw[[0, 0]] - 0.15).abs() < 1e-12);
        assert!((w[[0, 0]] - 0.75).abs() < 1e-12);
        assert!((b[0] + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_hyperparameter_validation() {
        assert!(OptimizerConfig::new(0.0, 0.5).is_err());
        assert!(OptimizerConfig::new(-0.1, 0.5).is_err());
        assert!(OptimizerConfig::new(f64::NAN, 0.5).is_err());
        assert!(OptimizerConfig::new(0.1, 1.0).is_err());
        assert!(OptimizerConfig::new(0.1, -0.01).is_err());
        assert!(OptimizerConfig::new(0.1, 0.0).is_ok());
    }
}
