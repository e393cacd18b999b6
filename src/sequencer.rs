use crate::instrument::Instrument;
use crate::pattern::STEPS;
use crate::tempo::Tempo;

/// Anything the clock can fire hits into. Triggers are best-effort and never
/// fail from the clock's point of view.
pub trait TriggerSink: Send {
    fn trigger(&mut self, instrument: Instrument);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
}

/// Playhead state machine, free of any timing. The clock calls `tick` once
/// per step interval.
#[derive(Debug, Clone)]
pub struct Sequencer {
    state: TransportState,
    playhead: usize,
    tempo: Tempo,
    downbeat: bool, // next tick fires the current step without advancing
}

impl Sequencer {
    pub fn new(tempo: Tempo) -> Self {
        Sequencer {
            state: TransportState::Stopped,
            playhead: 0,
            tempo,
            downbeat: false,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TransportState::Running
    }

    pub fn playhead(&self) -> usize {
        self.playhead
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Read when the next tick is scheduled, never for the pending one.
    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
    }

    /// Returns false if already running. The playhead is kept.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = TransportState::Running;
        self.downbeat = true;
        true
    }

    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.playhead = 0;
        self.downbeat = false;
    }

    /// The step to fire now, or `None` while stopped.
    pub fn tick(&mut self) -> Option<usize> {
        if !self.is_running() {
            return None;
        }
        if self.downbeat {
            self.downbeat = false;
        } else {
            self.playhead = (self.playhead + 1) % STEPS;
        }
        Some(self.playhead)
    }
}
