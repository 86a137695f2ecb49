use crate::error::Result;
use csv::Writer;
use std::path::Path;

/// Writes one `epoch,loss` row per entry, epochs counted from 1.
pub fn write_loss_history<P: AsRef<Path>>(losses: &[f64], path: P) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["epoch", "loss"])?;
    for (i, loss) in losses.iter().enumerate() {
        wtr.write_record(&[(i + 1).to_string(), loss.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes a neuron's `(probe, activation)` pairs as `input,activation` rows.
pub fn write_pattern<P: AsRef<Path>>(pattern: &[(f64, f64)], path: P) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["input", "activation"])?;
    for (x, a) in pattern {
        wtr.write_record(&[x.to_string(), a.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
