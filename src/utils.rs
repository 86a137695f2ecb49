#[allow(unused)]
use crate::prelude::*;

/// Uniform random matrix in `[-limit, limit)` drawn from `rng`.
#[macro_export]
macro_rules! rand_array {
    ($rng:expr; $limit:expr; $($x:expr),*) => {
        {
            let limit: f64 = $limit;
            Array2::random_using(($($x,)*), Uniform::new(-limit, limit), $rng)
        }
    };
}

/// Builds a `NetworkConfig` from a layer list. Every hidden `dense` entry must
/// name the same activation; the last entry is the output layer.
///
/// # Panics
///
/// When two hidden entries name different activations.
///
/// ```
/// use rfnn::prelude::*;
/// use rfnn::Model;
///
/// let config = Model!(input 1, dense 4 => Activation::Tanh, dense 1 => Activation::Linear);
/// assert_eq!(config.layer_sizes, vec![1, 4, 1]);
/// ```
#[macro_export]
macro_rules! Model {
    (input $i:expr, $(dense $x:expr => $a:expr),+ $(,)?) => {
        {
            let sizes: Vec<usize> = vec![$i, $($x),+];
            let activations: Vec<$crate::Activation> = vec![$($a),+];
            let output = activations[activations.len() - 1];
            let hidden = if activations.len() > 1 { activations[0] } else { output };
            assert!(
                activations[..activations.len() - 1].iter().all(|a| *a == hidden),
                "Model! hidden layers must share one activation, got {:?}",
                &activations[..activations.len() - 1]
            );
            $crate::NetworkConfig::new(&sizes, hidden, output)
        }
    };
}

pub(crate) fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => vec![],
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_includes_both_ends() {
        assert_eq!(linspace(-1.0, 1.0, 3), vec![-1.0, 0.0, 1.0]);
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_rand_array_respects_limit() {
        let mut rng = StdRng::seed_from_u64(7);
        let w: Array2<f64> = crate::rand_array!(&mut rng; 0.5; 8, 3);
        assert_eq!(w.dim(), (8, 3));
        assert!(w.iter().all(|v| v.abs() <= 0.5));
    }

    #[test]
    fn test_model_macro_builds_config() {
        let config = crate::Model!(
            input 2,
            dense 5 => Activation::Relu,
            dense 3 => Activation::Relu,
            dense 1 => Activation::Sigmoid,
        );
        assert_eq!(config.layer_sizes, vec![2, 5, 3, 1]);
        assert_eq!(config.hidden_activation, Activation::Relu);
        assert_eq!(config.output_activation, Activation::Sigmoid);
    }

    #[test]
    #[should_panic(expected = "hidden layers must share one activation")]
    fn test_model_macro_rejects_mixed_hidden_activations() {
        let _ = crate::Model!(
            input 2,
            dense 5 => Activation::Relu,
            dense 3 => Activation::Tanh,
            dense 1 => Activation::Linear,
        );
    }
}
