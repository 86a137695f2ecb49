use log::info;
use rfnn::output::{write_loss_history, write_pattern};
use rfnn::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    let samples: Vec<Sample> = (0..20)
        .map(|i| {
            let x = -3.0 + 6.0 * i as f64 / 19.0;
            Sample::scalar(x, x.sin())
        })
        .collect();

    let mut model = Network::new(
        NetworkConfig::new(&[1, 4, 1], Activation::Tanh, Activation::Linear)
            .with_learning_rate(0.01)
            .with_momentum(0.9),
    )?;

    println!("{}", model.summary());

    let untrained = model.evaluate(&samples)?;
    let mut losses = Vec::with_capacity(200);
    for _ in 0..200 {
        let loss = model.train_epoch(&samples)?;
        if !loss.is_finite() {
            println!("training diverged at epoch {}, resetting", model.epoch());
            model.reset()?;
            break;
        }
        losses.push(loss);
    }
    let trained = model.evaluate(&samples)?;
    info!("loss before {:.5}, after {:.5}", untrained, trained);
    println!("MSE untrained: {:.5}\nMSE trained:   {:.5}", untrained, trained);

    // run one clean pass so introspection reads a known input
    let y = model.forward_scalar(1.0)?;
    println!("\nprediction at x = 1: {:.4} (sin = {:.4})", y, 1.0_f64.sin());
    for layer in 0..model.layer_sizes().len() {
        for index in 0..model.layer_sizes()[layer] {
            println!("{}", model.neuron_info(layer, index)?);
        }
    }

    write_loss_history(&losses, "loss_history.csv")?;
    let pattern = model.neuron_pattern(1, 0, &ProbeRange::new(-3.0, 3.0, 61))?;
    write_pattern(&pattern, "neuron_1_0.csv")?;
    println!("\nwrote loss_history.csv and neuron_1_0.csv");

    Ok(())
}
