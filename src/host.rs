//! Runs one [`Network`] on a dedicated thread behind a command channel.
//!
//! Commands are processed strictly in arrival order. Every message type is
//! serde-serializable, so a caller can also forward them across a process or
//! language boundary and keep this module as the only engine implementation.

use crate::prelude::*;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Command {
    Init(NetworkConfig),
    /// Runs up to `epochs` epochs, stopping early when the epoch loss is
    /// non-finite or exceeds `stop_above`.
    Train {
        samples: Vec<Sample>,
        epochs: usize,
        stop_above: Option<f64>,
    },
    Predict(Vec<Array1<f64>>),
    Evaluate(Vec<Sample>),
    NeuronInfo {
        layer: usize,
        index: usize,
    },
    NeuronPattern {
        layer: usize,
        index: usize,
        probe: ProbeRange,
    },
    Parameters,
    SetLearningRate(f64),
    SetMomentum(f64),
    Reset,
    Shutdown,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Completed,
    Cancelled,
    Diverged,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Response {
    Ready {
        layer_sizes: Vec<usize>,
    },
    Epoch {
        epoch: usize,
        loss: f64,
    },
    TrainingStopped {
        epoch: usize,
        /// Loss of the last completed epoch, `None` if none ran.
        loss: Option<f64>,
        reason: StopReason,
    },
    Predictions(Vec<Array1<f64>>),
    Loss(f64),
    Neuron(NeuronInfo),
    Pattern(Vec<(f64, f64)>),
    Parameters(Parameters),
    Ack,
    Failed(String),
}

/// Handle to the training thread. Dropping it shuts the thread down.
pub struct TrainingHost {
    commands: Sender<Command>,
    responses: Receiver<Response>,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl TrainingHost {
    pub fn spawn() -> Result<Self> {
        let (commands, command_rx) = mpsc::channel();
        let (response_tx, responses) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            network: None,
            responses: response_tx,
            cancel: Arc::clone(&cancel),
        };
        let handle = thread::Builder::new()
            .name("rfnn-trainer".to_string())
            .spawn(move || worker.run(command_rx))?;
        info!("training host started");

        Ok(Self {
            commands,
            responses,
            cancel,
            worker: Some(handle),
        })
    }

    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| NNError::HostDisconnected)
    }

    pub fn recv(&self) -> Result<Response> {
        self.responses.recv().map_err(|_| NNError::HostDisconnected)
    }

    /// `Ok(None)` when nothing arrived within `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Response>> {
        match self.responses.recv_timeout(timeout) {
            Ok(response) => Ok(Some(response)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(NNError::HostDisconnected),
        }
    }

    pub fn try_recv(&self) -> Result<Option<Response>> {
        match self.responses.try_recv() {
            Ok(response) => Ok(Some(response)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(NNError::HostDisconnected),
        }
    }

    /// Sends a command that produces exactly one response and waits for it.
    /// `Train` streams several responses and must be drained with `recv`.
    pub fn request(&self, command: Command) -> Result<Response> {
        self.send(command)?;
        self.recv()
    }

    /// Stops the running `Train` after its current epoch. With no `Train`
    /// running, the next queued `Train` stops before its first epoch. The
    /// flag is consumed by the `Train` that observes it.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };
        self.cancel();
        // the worker may already be gone
        let _ = self.commands.send(Command::Shutdown);
        handle
            .join()
            .map_err(|_| NNError::InvalidState("training thread panicked".to_string()))?;
        info!("training host stopped");
        Ok(())
    }
}

impl Drop for TrainingHost {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!("{}", err);
        }
    }
}

struct Worker {
    network: Option<Network>,
    responses: Sender<Response>,
    cancel: Arc<AtomicBool>,
}

impl Worker {
    fn run(mut self, commands: Receiver<Command>) {
        for command in commands.iter() {
            if matches!(command, Command::Shutdown) {
                break;
            }
            match self.handle(command) {
                Ok(()) => {}
                Err(NNError::HostDisconnected) => break,
                Err(err) => {
                    if self.reply(Response::Failed(err.to_string())).is_err() {
                        break;
                    }
                }
            }
        }
        debug!("training worker exiting");
    }

    fn network(&mut self) -> Result<&mut Network> {
        self.network
            .as_mut()
            .ok_or_else(|| NNError::InvalidState("network not initialized".to_string()))
    }

    fn reply(&self, response: Response) -> Result<()> {
        self.responses
            .send(response)
            .map_err(|_| NNError::HostDisconnected)
    }

    fn handle(&mut self, command: Command) -> Result<()> {
        let response = match command {
            Command::Init(config) => {
                let network = Network::new(config)?;
                let layer_sizes = network.layer_sizes().to_vec();
                self.network = Some(network);
                Response::Ready { layer_sizes }
            }
            Command::Train {
                samples,
                epochs,
                stop_above,
            } => self.train(&samples, epochs, stop_above)?,
            Command::Predict(inputs) => Response::Predictions(self.network()?.predict(&inputs)?),
            Command::Evaluate(samples) => Response::Loss(self.network()?.evaluate(&samples)?),
            Command::NeuronInfo { layer, index } => {
                Response::Neuron(self.network()?.neuron_info(layer, index)?)
            }
            Command::NeuronPattern {
                layer,
                index,
                probe,
            } => Response::Pattern(self.network()?.neuron_pattern(layer, index, &probe)?),
            Command::Parameters => Response::Parameters(self.network()?.parameters()),
            Command::SetLearningRate(value) => {
                self.network()?.set_learning_rate(value)?;
                Response::Ack
            }
            Command::SetMomentum(value) => {
                self.network()?.set_momentum(value)?;
                Response::Ack
            }
            Command::Reset => {
                self.network()?.reset()?;
                Response::Ack
            }
            Command::Shutdown => return Ok(()),
        };
        self.reply(response)
    }

    fn train(
        &mut self,
        samples: &[Sample],
        epochs: usize,
        stop_above: Option<f64>,
    ) -> Result<Response> {
        self.network()?;

        let mut loss = None;
        let mut reason = StopReason::Completed;
        for _ in 0..epochs {
            if self.cancel.swap(false, Ordering::SeqCst) {
                info!("training cancelled");
                reason = StopReason::Cancelled;
                break;
            }
            let network = self.network()?;
            let epoch_loss = network.train_epoch(samples)?;
            let epoch = network.epoch();
            loss = Some(epoch_loss);
            self.reply(Response::Epoch {
                epoch,
                loss: epoch_loss,
            })?;

            let diverged =
                !epoch_loss.is_finite() || stop_above.is_some_and(|limit| epoch_loss > limit);
            if diverged {
                warn!("training diverged at epoch {}: loss {}", epoch, epoch_loss);
                reason = StopReason::Diverged;
                break;
            }
        }

        Ok(Response::TrainingStopped {
            epoch: self.network()?.epoch(),
            loss,
            reason,
        })
    }
}
