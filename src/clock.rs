use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::error::PhonkError;
use crate::instrument::Instrument;
use crate::pattern::PatternStore;
use crate::sequencer::{Sequencer, TriggerSink};
use crate::tempo::Tempo;

/// Runs one tick: moves the playhead and fires every instrument active on the
/// new step. All triggers are issued before this returns.
pub fn fire_tick<S: TriggerSink>(
    sequencer: &Mutex<Sequencer>,
    pattern: &RwLock<PatternStore>,
    sink: &Mutex<S>,
) -> Option<usize> {
    let step = sequencer.lock().tick()?;
    let active = pattern.read().active_at(step);
    if !active.is_empty() {
        let mut sink = sink.lock();
        for instrument in &active {
            sink.trigger(*instrument);
        }
    }
    debug!("step {:>2}: {:?}", step, active);
    Some(step)
}

/// Drives a `Sequencer` from a background thread at the tempo's step
/// interval.
pub struct SequencerClock<S: TriggerSink + 'static> {
    sequencer: Arc<Mutex<Sequencer>>,
    pattern: Arc<RwLock<PatternStore>>,
    sink: Arc<Mutex<S>>,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl<S: TriggerSink + 'static> SequencerClock<S> {
    pub fn new(pattern: Arc<RwLock<PatternStore>>, sink: Arc<Mutex<S>>, tempo: Tempo) -> Self {
        SequencerClock {
            sequencer: Arc::new(Mutex::new(Sequencer::new(tempo))),
            pattern,
            sink,
            stop_tx: None,
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.sequencer.lock().is_running()
    }

    pub fn current_step(&self) -> usize {
        self.sequencer.lock().playhead()
    }

    pub fn tempo(&self) -> Tempo {
        self.sequencer.lock().tempo()
    }

    /// Takes effect from the next scheduled tick; the pending one keeps its
    /// time.
    pub fn set_bpm(&self, tempo: Tempo) {
        self.sequencer.lock().set_tempo(tempo);
        debug!("clock tempo set to {}", tempo);
    }

    /// Starts ticking. The current step fires straight away.
    pub fn start(&mut self) -> Result<(), PhonkError> {
        if !self.sequencer.lock().start() {
            return Ok(());
        }

        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let sequencer = Arc::clone(&self.sequencer);
        let pattern = Arc::clone(&self.pattern);
        let sink = Arc::clone(&self.sink);

        let spawned = thread::Builder::new()
            .name("phonk-clock".to_string())
            .spawn(move || run_clock(sequencer, pattern, sink, stop_rx));

        match spawned {
            Ok(worker) => {
                self.stop_tx = Some(stop_tx);
                self.worker = Some(worker);
                info!("sequencer started at {}", self.tempo());
                Ok(())
            }
            Err(e) => {
                self.sequencer.lock().stop();
                Err(PhonkError::ClockError(e.to_string()))
            }
        }
    }

    /// Cancels the timer and waits for it, so nothing fires after this
    /// returns. Resets the playhead. Safe to call when stopped.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("sequencer clock thread panicked");
            }
            info!("sequencer stopped");
        }
        self.sequencer.lock().stop();
    }

    /// Fires `instrument` immediately, running or not.
    pub fn trigger_now(&self, instrument: Instrument) {
        self.sink.lock().trigger(instrument);
    }
}

impl<S: TriggerSink + 'static> Drop for SequencerClock<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_clock<S: TriggerSink>(
    sequencer: Arc<Mutex<Sequencer>>,
    pattern: Arc<RwLock<PatternStore>>,
    sink: Arc<Mutex<S>>,
    stop_rx: Receiver<()>,
) {
    let mut deadline = Instant::now();

    loop {
        let wait = deadline.saturating_duration_since(Instant::now());
        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        if fire_tick(&*sequencer, &*pattern, &*sink).is_none() {
            break;
        }

        // Tempo is sampled here, after the tick, so a change only moves
        // ticks that are not yet scheduled
        let interval = sequencer.lock().tempo().step_interval();
        deadline += interval;

        let now = Instant::now();
        if now > deadline + interval {
            debug!("clock fell behind by {:?}, re-anchoring", now - deadline);
            deadline = now;
        }
    }
}
