use crate::prelude::*;
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[serde(alias = "identity")]
    Linear,
    Tanh,
    Relu,
    Sigmoid,
}

impl Activation {
    pub const ALL: [Activation; 4] = [
        Activation::Linear,
        Activation::Tanh,
        Activation::Relu,
        Activation::Sigmoid,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Tanh => "tanh",
            Self::Relu => "relu",
            Self::Sigmoid => "sigmoid",
        }
    }

    pub fn apply(&self, z: f64) -> f64 {
        match self {
            Self::Linear => z,
            Self::Tanh => z.tanh(),
            Self::Relu => relu(z),
            Self::Sigmoid => sigmoid(z),
        }
    }

    /// Derivative with respect to the pre-activation `z`.
    pub fn derivative(&self, z: f64) -> f64 {
        match self {
            Self::Linear => 1.0,
            Self::Tanh => tanh_prime(z),
            Self::Relu => relu_prime(z),
            Self::Sigmoid => sigmoid_prime(z),
        }
    }

    pub fn forward(&self, z: &Array1<f64>) -> Array1<f64> {
        match self {
            Self::Linear => z.clone(),
            _ => z.mapv(|z| self.apply(z)),
        }
    }

    /// Turns `da = dL/da` into `dz = dL/dz` using the cached `z`.
    pub fn backward(&self, z: &Array1<f64>, da: Array1<f64>) -> Array1<f64> {
        match self {
            Self::Linear => da,
            _ => da * z.mapv(|z| self.derivative(z)),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = NNError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" | "identity" => Ok(Self::Linear),
            "tanh" => Ok(Self::Tanh),
            "relu" => Ok(Self::Relu),
            "sigmoid" => Ok(Self::Sigmoid),
            other => Err(NNError::InvalidConfiguration(format!(
                "unknown activation `{}`",
                other
            ))),
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn sigmoid_prime(z: f64) -> f64 {
    let s = sigmoid(z);
    s * (1.0 - s)
}

fn relu(z: f64) -> f64 {
    if z > 0.0 {
        z
    } else {
        0.0
    }
}

// zero at the kink
fn relu_prime(z: f64) -> f64 {
    if z > 0.0 {
        1.0
    } else {
        0.0
    }
}

fn tanh_prime(z: f64) -> f64 {
    let t = z.tanh();
    1.0 - t * t
}
