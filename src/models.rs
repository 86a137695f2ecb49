use crate::prelude::*;
use log::{debug, info, warn};

/// One `(input, target)` training pair.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Sample {
    pub input: Array1<f64>,
    pub target: Array1<f64>,
}

impl Sample {
    pub fn new(input: Array1<f64>, target: Array1<f64>) -> Self {
        Self { input, target }
    }

    pub fn scalar(x: f64, y: f64) -> Self {
        Self {
            input: array![x],
            target: array![y],
        }
    }
}

/// Read-only copy of every weight matrix and bias vector.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Parameters {
    pub weights: Vec<Array2<f64>>,
    pub biases: Vec<Array1<f64>>,
}

impl Parameters {
    pub fn count(&self) -> usize {
        self.weights.iter().map(|w| w.len()).sum::<usize>()
            + self.biases.iter().map(|b| b.len()).sum::<usize>()
    }

    pub fn is_finite(&self) -> bool {
        self.weights
            .iter()
            .flat_map(|w| w.iter())
            .chain(self.biases.iter().flat_map(|b| b.iter()))
            .all(|p| p.is_finite())
    }
}

/// A feedforward network trained one sample at a time with momentum SGD.
///
/// The network keeps the trace of its latest [`forward`](Network::forward)
/// call so that [`backward`](Network::backward) and the introspection
/// methods can read it. Methods touching that cache take `&mut self`; for
/// concurrent evaluation use [`trace`](Network::trace) and
/// [`gradients`](Network::gradients), which only borrow.
#[derive(Debug, Clone)]
pub struct Network {
    config: NetworkConfig,
    layers: Vec<Dense>,
    optimizer: OptimizerConfig,
    epoch: usize,
    cache: Option<ForwardTrace>,
    // set by `forward`, cleared by `backward`
    pending: bool,
    rng: StdRng,
}

impl Network {
    pub fn new(config: NetworkConfig) -> Result<Self> {
        config.validate()?;
        let optimizer = config.optimizer()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let layers = build_layers(&config, &mut rng)?;
        info!(
            "created network {:?} (hidden {}, output {})",
            config.layer_sizes, config.hidden_activation, config.output_activation
        );
        Ok(Self {
            config,
            layers,
            optimizer,
            epoch: 0,
            cache: None,
            pending: false,
            rng,
        })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.config.layer_sizes
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate
    }

    pub fn momentum(&self) -> f64 {
        self.optimizer.momentum
    }

    /// Trace of the most recent `forward`, if any.
    pub fn last_trace(&self) -> Option<&ForwardTrace> {
        self.cache.as_ref()
    }

    pub fn summary(&self) -> String {
        let mut total_param = 0;
        let mut res = "\nModel Network\n".to_string();
        res.push_str("-------------------------------------------------------------\n");
        res.push_str("Layer (Type)\t\t Output shape\t\t No.of params\t Activation\n");
        for layer in self.layers.iter() {
            let params = layer.param_count();
            total_param += params;
            res.push_str(&format!(
                "{}\t\t\t  (None, {})\t\t  {}\t\t {}\n",
                layer.typ(),
                layer.outputs(),
                params,
                layer.activation
            ));
        }
        res.push_str("-------------------------------------------------------------\n");
        res.push_str(&format!("Total params: {}\n", total_param));
        res.push_str(&format!(
            "Learning rate: {}, momentum: {}, epoch: {}\n",
            self.optimizer.learning_rate, self.optimizer.momentum, self.epoch
        ));
        res
    }

    /// Runs a forward pass without touching the network's cache.
    pub fn trace(&self, input: &Array1<f64>) -> Result<ForwardTrace> {
        if input.len() != self.config.input_width() {
            return Err(NNError::ShapeMismatch(format!(
                "network expects {} inputs, got {}",
                self.config.input_width(),
                input.len()
            )));
        }
        let mut trace = ForwardTrace::start(input, self.layers.len());
        let mut a = input.clone();
        for layer in self.layers.iter() {
            let (z, next) = layer.forward(&a)?;
            trace.push(z, next.clone());
            a = next;
        }
        Ok(trace)
    }

    /// Forward pass that refreshes the cache and returns the output.
    pub fn forward(&mut self, input: &Array1<f64>) -> Result<Array1<f64>> {
        let trace = self.trace(input)?;
        let output = trace.output().clone();
        self.cache = Some(trace);
        self.pending = true;
        Ok(output)
    }

    pub fn forward_scalar(&mut self, x: f64) -> Result<f64> {
        let output = self.forward(&array![x])?;
        scalar_output(&output)
    }

    /// Loss of `trace` against `target` and the gradient of every parameter.
    pub fn gradients(&self, trace: &ForwardTrace, target: &Array1<f64>) -> Result<(f64, Gradients)> {
        self.check_trace(trace)?;
        let (loss, mut da) = criteria(trace.output(), target)?;

        let mut dw_cache = Vec::with_capacity(self.layers.len());
        let mut db_cache = Vec::with_capacity(self.layers.len());
        let caches = trace.layers();
        for (l, layer) in self.layers.iter().enumerate().rev() {
            let (dw, db, da_prev) = layer.backward(&caches[l + 1].z, &caches[l].a, da)?;
            dw_cache.push(dw);
            db_cache.push(db);
            da = da_prev;
        }
        dw_cache.reverse();
        db_cache.reverse();

        Ok((
            loss,
            Gradients {
                dw: dw_cache,
                db: db_cache,
            },
        ))
    }

    /// Applies one momentum step. Shapes are checked for every layer before
    /// any parameter moves.
    pub fn apply_gradients(&mut self, gradients: &Gradients) -> Result<()> {
        if gradients.dw.len() != self.layers.len() || gradients.db.len() != self.layers.len() {
            return Err(NNError::ShapeMismatch(format!(
                "gradients cover {} weight and {} bias layers, network has {}",
                gradients.dw.len(),
                gradients.db.len(),
                self.layers.len()
            )));
        }
        for ((layer, dw), db) in self.layers.iter().zip(&gradients.dw).zip(&gradients.db) {
            if dw.dim() != layer.w.dim() || db.len() != layer.b.len() {
                return Err(NNError::ShapeMismatch(format!(
                    "gradient shapes {:?}/{} do not match layer {:?}/{}",
                    dw.dim(),
                    db.len(),
                    layer.w.dim(),
                    layer.b.len()
                )));
            }
        }
        for ((layer, dw), db) in self.layers.iter_mut().zip(&gradients.dw).zip(&gradients.db) {
            layer.optimize(dw, db, &self.optimizer);
        }
        Ok(())
    }

    /// Backpropagates `trace` against `target` and updates the parameters in
    /// place. Returns the sample's squared error before the update.
    pub fn backward_trace(&mut self, trace: &ForwardTrace, target: &Array1<f64>) -> Result<f64> {
        let (loss, gradients) = self.gradients(trace, target)?;
        self.apply_gradients(&gradients)?;
        Ok(loss)
    }

    /// Backpropagates the cached forward pass.
    pub fn backward(&mut self, target: &Array1<f64>) -> Result<f64> {
        if !self.pending {
            return Err(NNError::InvalidState(
                "backward called without a preceding forward".to_string(),
            ));
        }
        let trace = self.cache.take().ok_or_else(|| {
            NNError::InvalidState("backward called without a preceding forward".to_string())
        })?;
        let res = self.backward_trace(&trace, target);
        self.cache = Some(trace);
        if res.is_ok() {
            self.pending = false;
        }
        res
    }

    /// One shuffled pass of per-sample updates.
    ///
    /// The returned mean loss is accumulated from predictions made before each
    /// sample's own update, so it trails the network's state at the end of the
    /// epoch. Use [`evaluate`](Network::evaluate) for a clean figure.
    pub fn train_epoch(&mut self, samples: &[Sample]) -> Result<f64> {
        for sample in samples {
            self.check_sample(sample)?;
        }

        let mut order: Vec<usize> = (0..samples.len()).collect();
        order.shuffle(&mut self.rng);

        let mut total = 0.0;
        let mut last = None;
        for &i in order.iter() {
            let sample = &samples[i];
            let trace = self.trace(&sample.input)?;
            total += self.backward_trace(&trace, &sample.target)?;
            last = Some(trace);
        }
        if last.is_some() {
            self.cache = last;
            self.pending = false;
        }

        self.epoch += 1;
        let mean = if samples.is_empty() {
            0.0
        } else {
            total / samples.len() as f64
        };
        if mean.is_finite() {
            debug!("epoch {}: mean loss {:.6}", self.epoch, mean);
        } else {
            warn!("epoch {}: loss is not finite ({})", self.epoch, mean);
        }
        Ok(mean)
    }

    /// Mean squared error over `samples` with no update and no cache change.
    pub fn evaluate(&self, samples: &[Sample]) -> Result<f64> {
        if samples.is_empty() {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for sample in samples {
            self.check_sample(sample)?;
            let trace = self.trace(&sample.input)?;
            let (loss, _) = criteria(trace.output(), &sample.target)?;
            total += loss;
        }
        Ok(total / samples.len() as f64)
    }

    /// Forward over every input; the cache ends up holding the last one.
    pub fn predict(&mut self, inputs: &[Array1<f64>]) -> Result<Vec<Array1<f64>>> {
        inputs.iter().map(|x| self.forward(x)).collect()
    }

    pub fn predict_scalar(&mut self, xs: &[f64]) -> Result<Vec<f64>> {
        xs.iter().map(|&x| self.forward_scalar(x)).collect()
    }

    pub fn parameters(&self) -> Parameters {
        Parameters {
            weights: self.layers.iter().map(|layer| layer.w.clone()).collect(),
            biases: self.layers.iter().map(|layer| layer.b.clone()).collect(),
        }
    }

    /// Overwrites every weight and bias. Momentum is zeroed and the cache is
    /// dropped. Nothing changes unless every shape matches.
    pub fn set_parameters(&mut self, parameters: &Parameters) -> Result<()> {
        if parameters.weights.len() != self.layers.len()
            || parameters.biases.len() != self.layers.len()
        {
            return Err(NNError::ShapeMismatch(format!(
                "snapshot has {} weight and {} bias layers, network has {}",
                parameters.weights.len(),
                parameters.biases.len(),
                self.layers.len()
            )));
        }
        let mut layers = self.layers.clone();
        for ((layer, w), b) in layers
            .iter_mut()
            .zip(&parameters.weights)
            .zip(&parameters.biases)
        {
            layer.assign(w, b)?;
        }
        self.layers = layers;
        self.clear_cache();
        Ok(())
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        self.optimizer = OptimizerConfig::new(learning_rate, self.optimizer.momentum)?;
        self.config.learning_rate = learning_rate;
        Ok(())
    }

    pub fn set_momentum(&mut self, momentum: f64) -> Result<()> {
        self.optimizer = OptimizerConfig::new(self.optimizer.learning_rate, momentum)?;
        self.config.momentum = momentum;
        Ok(())
    }

    /// Fresh parameters, zero momentum, epoch 0. The generator keeps
    /// running, so consecutive resets draw independent weights. On error the
    /// network is left exactly as it was.
    pub fn reset(&mut self) -> Result<()> {
        self.layers = build_layers(&self.config, &mut self.rng)?;
        self.epoch = 0;
        self.clear_cache();
        info!("reset network {:?}", self.config.layer_sizes);
        Ok(())
    }

    /// Installs a new configuration and reinitializes. On error the network is
    /// left exactly as it was.
    pub fn reconfigure(&mut self, config: NetworkConfig) -> Result<()> {
        config.validate()?;
        let optimizer = config.optimizer()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => self.rng.clone(),
        };
        let layers = build_layers(&config, &mut rng)?;

        info!(
            "reconfigured network {:?} -> {:?}",
            self.config.layer_sizes, config.layer_sizes
        );
        self.config = config;
        self.layers = layers;
        self.optimizer = optimizer;
        self.rng = rng;
        self.epoch = 0;
        self.clear_cache();
        Ok(())
    }

    fn clear_cache(&mut self) {
        self.cache = None;
        self.pending = false;
    }

    fn check_sample(&self, sample: &Sample) -> Result<()> {
        if sample.input.len() != self.config.input_width() {
            return Err(NNError::ShapeMismatch(format!(
                "sample input has width {}, network expects {}",
                sample.input.len(),
                self.config.input_width()
            )));
        }
        if sample.target.len() != self.config.output_width() {
            return Err(NNError::ShapeMismatch(format!(
                "sample target has width {}, network outputs {}",
                sample.target.len(),
                self.config.output_width()
            )));
        }
        Ok(())
    }

    fn check_trace(&self, trace: &ForwardTrace) -> Result<()> {
        let sizes = trace.layer_sizes();
        if sizes != self.config.layer_sizes {
            return Err(NNError::ShapeMismatch(format!(
                "trace has layer sizes {:?}, network has {:?}",
                sizes, self.config.layer_sizes
            )));
        }
        Ok(())
    }
}

fn build_layers<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Result<Vec<Dense>> {
    let sizes = &config.layer_sizes;
    let mut layers = Vec::with_capacity(config.depth());
    for l in 1..sizes.len() {
        layers.push(Dense::new(
            sizes[l],
            sizes[l - 1],
            config.activation_for(l),
            config.initializer,
            rng,
        )?);
    }
    Ok(layers)
}

fn scalar_output(output: &Array1<f64>) -> Result<f64> {
    match output.as_slice() {
        Some([y]) => Ok(*y),
        _ => Err(NNError::ShapeMismatch(format!(
            "expected a single output, network produces {}",
            output.len()
        ))),
    }
}
