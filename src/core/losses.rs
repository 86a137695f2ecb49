use crate::prelude::*;

/// Squared error of one sample and its gradient with respect to the output.
///
/// The loss is `sum((y_hat - y)^2)` over the output units and the gradient is
/// `2 * (y_hat - y)` per unit. For the scalar-output case this is the squared
/// error whose mean over a dataset is the reported MSE.
pub fn criteria(y_hat: &Array1<f64>, y: &Array1<f64>) -> Result<(f64, Array1<f64>)> {
    if y_hat.len() != y.len() {
        return Err(NNError::ShapeMismatch(format!(
            "Prediction width {} doesn't match target width {}",
            y_hat.len(),
            y.len()
        )));
    }

    let diff = y_hat - y;
    let loss = diff.mapv(|d| d * d).sum();
    let da = 2.0 * diff;
    Ok((loss, da))
}
