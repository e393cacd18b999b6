use std::sync::Arc;
use std::thread::{self, JoinHandle};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::error::PhonkError;
use crate::graph::{OutputGraph, SharedGraph};

/// Platform audio output. `open` creates a fresh graph wired to the device;
/// only the session calls into this.
pub trait AudioOutput: Send {
    fn open(&mut self) -> Result<SharedGraph, PhonkError>;
    fn suspend(&mut self) -> Result<(), PhonkError>;
    fn resume(&mut self) -> Result<(), PhonkError>;
    fn close(&mut self);
}

enum StreamControl {
    Suspend,
    Resume,
    Close,
}

/// Default cpal output device. `cpal::Stream` is not `Send`, so the stream
/// lives on its own thread and is driven over a channel.
#[derive(Default)]
pub struct CpalOutput {
    control: Option<Sender<StreamControl>>,
    worker: Option<JoinHandle<()>>,
}

impl CpalOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn send(&self, msg: StreamControl) -> Result<(), PhonkError> {
        self.control
            .as_ref()
            .ok_or_else(|| PhonkError::InitializationFailure("output stream is not open".to_string()))?
            .send(msg)
            .map_err(|_| PhonkError::InitializationFailure("audio thread has exited".to_string()))
    }
}

impl AudioOutput for CpalOutput {
    fn open(&mut self) -> Result<SharedGraph, PhonkError> {
        self.close();

        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<SharedGraph, PhonkError>>(1);
        let (control_tx, control_rx) = crossbeam_channel::unbounded::<StreamControl>();

        let worker = thread::Builder::new()
            .name("phonk-audio".to_string())
            .spawn(move || run_stream(ready_tx, control_rx))
            .map_err(|e| PhonkError::InitializationFailure(e.to_string()))?;

        let graph = ready_rx
            .recv()
            .map_err(|_| PhonkError::InitializationFailure("audio thread exited during startup".to_string()))
            .and_then(|res| res);

        match graph {
            Ok(graph) => {
                self.control = Some(control_tx);
                self.worker = Some(worker);
                Ok(graph)
            }
            Err(e) => {
                let _ = worker.join();
                Err(e)
            }
        }
    }

    fn suspend(&mut self) -> Result<(), PhonkError> {
        self.send(StreamControl::Suspend)
    }

    fn resume(&mut self) -> Result<(), PhonkError> {
        self.send(StreamControl::Resume)
    }

    fn close(&mut self) {
        if let Some(control) = self.control.take() {
            let _ = control.send(StreamControl::Close);
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("audio thread panicked");
            }
        }
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        self.close();
    }
}

fn build_stream() -> Result<(cpal::Stream, SharedGraph), PhonkError> {
    let host = cpal::default_host();
    let device = host.default_output_device()
        .ok_or_else(|| PhonkError::InitializationFailure("No output device found".to_string()))?;
    let config = device.default_output_config()
        .map_err(|e| PhonkError::InitializationFailure(e.to_string()))?;

    if config.sample_format() != cpal::SampleFormat::F32 {
        return Err(PhonkError::InitializationFailure(format!(
            "unsupported sample format {:?} (only f32)",
            config.sample_format()
        )));
    }

    let stream_config: cpal::StreamConfig = config.config();
    let channels = stream_config.channels as usize;
    let graph = OutputGraph::shared(stream_config.sample_rate.0 as f32);
    let callback_graph = Arc::clone(&graph);

    let stream = device.build_output_stream(
        &stream_config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            callback_graph.lock().render(data, channels);
        },
        |err| error!("output stream error: {}", err),
        None,
    ).map_err(|e| PhonkError::InitializationFailure(e.to_string()))?;

    stream.play().map_err(|e| PhonkError::InitializationFailure(e.to_string()))?;

    info!(
        "output stream open: {} Hz, {} channel(s)",
        stream_config.sample_rate.0, channels
    );
    Ok((stream, graph))
}

fn run_stream(ready: Sender<Result<SharedGraph, PhonkError>>, control: Receiver<StreamControl>) {
    let stream = match build_stream() {
        Ok((stream, graph)) => {
            if ready.send(Ok(graph)).is_err() {
                return;
            }
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    for msg in control.iter() {
        match msg {
            StreamControl::Suspend => {
                if let Err(e) = stream.pause() {
                    warn!("could not suspend output stream: {}", e);
                }
            }
            StreamControl::Resume => {
                if let Err(e) = stream.play() {
                    warn!("could not resume output stream: {}", e);
                }
            }
            StreamControl::Close => break,
        }
    }

    drop(stream);
    info!("output stream closed");
}

#[derive(Debug, Default)]
struct OfflineState {
    graph: Option<SharedGraph>,
    suspended: bool,
    opens: usize,
    deny: bool,
}

/// Output with no device behind it. Frames are pulled with `render`; clones
/// share state, so a handle kept outside the session can observe it.
#[derive(Debug, Clone)]
pub struct OfflineOutput {
    sample_rate: f32,
    state: Arc<Mutex<OfflineState>>,
}

impl OfflineOutput {
    pub fn new(sample_rate: f32) -> Self {
        OfflineOutput {
            sample_rate,
            state: Arc::new(Mutex::new(OfflineState::default())),
        }
    }

    /// Makes every following `open` fail, as a platform refusing audio would.
    pub fn deny(&self, deny: bool) {
        self.state.lock().deny = deny;
    }

    pub fn opens(&self) -> usize {
        self.state.lock().opens
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().graph.is_some()
    }

    pub fn is_suspended(&self) -> bool {
        self.state.lock().suspended
    }

    /// Renders `frames` mono frames. Closed or suspended outputs yield silence
    /// and do not advance time.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        let graph = {
            let state = self.state.lock();
            if state.suspended {
                return out;
            }
            state.graph.clone()
        };
        if let Some(graph) = graph {
            graph.lock().render(&mut out, 1);
        }
        out
    }
}

impl AudioOutput for OfflineOutput {
    fn open(&mut self) -> Result<SharedGraph, PhonkError> {
        let mut state = self.state.lock();
        if state.deny {
            return Err(PhonkError::InitializationFailure("output denied by platform".to_string()));
        }
        let graph = OutputGraph::shared(self.sample_rate);
        state.graph = Some(Arc::clone(&graph));
        state.suspended = false;
        state.opens += 1;
        Ok(graph)
    }

    fn suspend(&mut self) -> Result<(), PhonkError> {
        self.state.lock().suspended = true;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), PhonkError> {
        self.state.lock().suspended = false;
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.graph = None;
        state.suspended = false;
    }
}
