use tracing::{debug, info, warn};

use crate::error::PhonkError;
use crate::graph::SharedGraph;
use crate::instrument::{Instrument, SoundRecipe};
use crate::output::AudioOutput;
use crate::sequencer::TriggerSink;
use crate::source::DecodedBuffer;
use crate::waveform::WaveformType;

pub const DEFAULT_VOLUME: f32 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Suspended,
    Closed,
}

/// Owns the output context and master stage. All synthesis and track
/// playback goes through here.
pub struct AudioSession {
    output: Box<dyn AudioOutput>,
    graph: Option<SharedGraph>,
    state: SessionState,
    source: Option<DecodedBuffer>,
    volume: f32, // percent
    muted: bool,
    bass_waveform: WaveformType,
}

impl AudioSession {
    pub fn new(output: Box<dyn AudioOutput>) -> Self {
        AudioSession {
            output,
            graph: None,
            state: SessionState::Uninitialized,
            source: None,
            volume: DEFAULT_VOLUME,
            muted: false,
            bass_waveform: WaveformType::Sine,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Idempotent. Resumes a suspended context; opens a fresh one when there
    /// is none. On failure the state is left as it was.
    pub fn initialize(&mut self) -> Result<(), PhonkError> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Suspended => {
                self.output.resume()?;
                self.state = SessionState::Ready;
                info!("audio session resumed");
                Ok(())
            }
            SessionState::Uninitialized | SessionState::Closed => {
                let graph = self.output.open().map_err(|e| {
                    warn!("audio session failed to initialize: {}", e);
                    if matches!(e, PhonkError::InitializationFailure(_)) {
                        e
                    } else {
                        PhonkError::InitializationFailure(e.to_string())
                    }
                })?;
                graph.lock().set_master_gain(self.effective_gain());
                self.graph = Some(graph);
                self.state = SessionState::Ready;
                info!("audio session ready (gain {:.2})", self.effective_gain());
                Ok(())
            }
        }
    }

    pub fn suspend(&mut self) -> Result<(), PhonkError> {
        if self.state == SessionState::Ready {
            self.output.suspend()?;
            self.state = SessionState::Suspended;
            info!("audio session suspended");
        }
        Ok(())
    }

    /// Stops playback and releases the output. Anything after this starts
    /// again from scratch.
    pub fn close(&mut self) {
        if matches!(self.state, SessionState::Uninitialized | SessionState::Closed) {
            return;
        }
        self.stop();
        self.output.close();
        self.graph = None;
        self.source = None;
        self.volume = DEFAULT_VOLUME;
        self.muted = false;
        self.state = SessionState::Closed;
        info!("audio session closed");
    }

    /// Decodes and keeps `bytes` as the playable source. A failed decode
    /// leaves the previous source in place.
    pub fn load_source(&mut self, bytes: &[u8]) -> Result<DecodedBuffer, PhonkError> {
        self.initialize()?;
        let buffer = DecodedBuffer::decode(bytes).map_err(|e| {
            warn!("failed to load audio file: {}", e);
            e
        })?;
        self.source = Some(buffer.clone());
        Ok(buffer)
    }

    pub fn source(&self) -> Option<&DecodedBuffer> {
        self.source.as_ref()
    }

    /// Plays the loaded source from the top, cutting off any earlier run.
    pub fn play(&mut self) -> Result<(), PhonkError> {
        self.initialize()?;
        let Some(buffer) = self.source.clone() else {
            warn!("play requested with no source loaded");
            return Err(PhonkError::NoSourceLoaded);
        };
        if let Some(graph) = &self.graph {
            let mut graph = graph.lock();
            graph.stop_track();
            graph.start_track(buffer);
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(graph) = &self.graph {
            graph.lock().stop_track();
        }
    }

    pub fn is_track_playing(&self) -> bool {
        self.graph.as_ref().is_some_and(|g| g.lock().is_track_playing())
    }

    /// A non-finite percent keeps the previous volume; mute still applies.
    pub fn set_master_volume(&mut self, volume_percent: f32, muted: bool) {
        if volume_percent.is_finite() {
            self.volume = volume_percent.clamp(0.0, 100.0);
        } else {
            warn!("ignoring non-finite volume {}", volume_percent);
        }
        self.muted = muted;
        if let Some(graph) = &self.graph {
            graph.lock().set_master_gain(self.effective_gain());
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn effective_gain(&self) -> f32 {
        if self.muted { 0.0 } else { (self.volume / 100.0).clamp(0.0, 1.0) }
    }

    pub fn set_bass_waveform(&mut self, waveform: WaveformType) {
        self.bass_waveform = waveform;
    }

    pub fn active_voices(&self) -> usize {
        self.graph.as_ref().map_or(0, |g| g.lock().active_voices())
    }

    /// Fire-and-forget drum hit.
    pub fn trigger(&mut self, instrument: Instrument) {
        debug!("trigger {}", instrument.name());
        self.schedule(instrument.recipe());
    }

    /// Fire-and-forget 808 hit at MIDI `note`.
    pub fn trigger_bass(&mut self, note: u8) {
        debug!("trigger bass note {}", note);
        self.schedule(SoundRecipe::bass(note).with_waveform(self.bass_waveform));
    }

    // Sound is best-effort: one initialize attempt, then the hit is dropped
    fn schedule(&mut self, recipe: SoundRecipe) {
        if let Err(e) = self.ready_graph() {
            debug!("{}: {}", PhonkError::TriggerWithoutSession, e);
            return;
        }
        if let Some(graph) = &self.graph {
            graph.lock().schedule(recipe);
        }
    }

    fn ready_graph(&mut self) -> Result<(), PhonkError> {
        if self.state != SessionState::Ready {
            self.initialize()?;
        }
        Ok(())
    }
}

impl TriggerSink for AudioSession {
    fn trigger(&mut self, instrument: Instrument) {
        AudioSession::trigger(self, instrument);
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OfflineOutput;
    use crate::source::tests::wav_bytes;

    const SR: f32 = 8_000.0;

    fn session() -> (AudioSession, OfflineOutput) {
        let output = OfflineOutput::new(SR);
        (AudioSession::new(Box::new(output.clone())), output)
    }

    #[test]
    fn initialize_is_idempotent() {
        let (mut s, out) = session();
        assert_eq!(s.state(), SessionState::Uninitialized);
        s.initialize().unwrap();
        s.initialize().unwrap();
        assert_eq!(s.state(), SessionState::Ready);
        assert_eq!(out.opens(), 1);
        assert_eq!(s.effective_gain(), 0.75);
    }

    #[test]
    fn suspended_session_resumes_without_reopening() {
        let (mut s, out) = session();
        s.initialize().unwrap();
        s.set_master_volume(40.0, false);
        s.suspend().unwrap();
        assert_eq!(s.state(), SessionState::Suspended);
        assert!(out.is_suspended());

        s.initialize().unwrap();
        assert_eq!(s.state(), SessionState::Ready);
        assert_eq!(out.opens(), 1);
        assert_eq!(s.effective_gain(), 0.4);
    }

    #[test]
    fn denied_output_reports_failure_and_allows_retry() {
        let (mut s, out) = session();
        out.deny(true);
        assert!(matches!(s.initialize(), Err(PhonkError::InitializationFailure(_))));
        assert_eq!(s.state(), SessionState::Uninitialized);

        out.deny(false);
        s.initialize().unwrap();
        assert_eq!(s.state(), SessionState::Ready);
    }

    #[test]
    fn trigger_auto_initializes() {
        let (mut s, out) = session();
        s.trigger(Instrument::Kick);
        assert_eq!(s.state(), SessionState::Ready);
        assert_eq!(s.active_voices(), 1);
        assert!(out.render(400).iter().any(|x| x.abs() > 0.0));
    }

    #[test]
    fn trigger_without_output_is_dropped_silently() {
        let (mut s, out) = session();
        out.deny(true);
        s.trigger(Instrument::Snare);
        s.trigger_bass(40);
        assert_eq!(s.state(), SessionState::Uninitialized);
        assert_eq!(s.active_voices(), 0);
    }

    #[test]
    fn mute_wins_over_volume() {
        let (mut s, _out) = session();
        s.set_master_volume(50.0, false);
        assert_eq!(s.effective_gain(), 0.5);
        s.set_master_volume(90.0, true);
        assert_eq!(s.effective_gain(), 0.0);
        s.set_master_volume(250.0, false);
        assert_eq!(s.effective_gain(), 1.0);
    }

    #[test]
    fn non_finite_volume_keeps_the_previous_gain() {
        let (mut s, out) = session();
        s.set_master_volume(60.0, false);
        s.set_master_volume(f32::NAN, false);
        s.set_master_volume(f32::INFINITY, false);
        assert_eq!(s.volume(), 60.0);
        assert_eq!(s.effective_gain(), 0.6);

        s.trigger(Instrument::Kick);
        let frames = out.render(100);
        assert!(frames.iter().all(|x| x.is_finite()));
        assert!(frames.iter().any(|x| x.abs() > 0.0));
    }

    #[test]
    fn muted_session_renders_silence() {
        let (mut s, out) = session();
        s.set_master_volume(50.0, true);
        s.trigger(Instrument::Cowbell);
        assert!(out.render(800).iter().all(|x| *x == 0.0));
    }

    #[test]
    fn invalid_source_keeps_previous_buffer() {
        let (mut s, _out) = session();
        let first = s.load_source(&wav_bytes(8_000, 1, 800)).unwrap();
        assert!(matches!(s.load_source(b"junk"), Err(PhonkError::DecodeFailure(_))));
        assert_eq!(s.source().map(|b| b.samples.len()), Some(first.samples.len()));
    }

    #[test]
    fn play_without_source_is_reported() {
        let (mut s, _out) = session();
        assert!(s.load_source(b"junk").is_err());
        assert_eq!(s.play(), Err(PhonkError::NoSourceLoaded));
        assert!(!s.is_track_playing());
    }

    #[test]
    fn play_and_stop_track() {
        let (mut s, out) = session();
        s.load_source(&wav_bytes(8_000, 1, 800)).unwrap();
        s.play().unwrap();
        s.play().unwrap();
        assert!(s.is_track_playing());
        assert!(out.render(100).iter().any(|x| x.abs() > 0.0));
        s.stop();
        s.stop();
        assert!(!s.is_track_playing());
    }

    #[test]
    fn close_then_reinitialize_starts_fresh() {
        let (mut s, out) = session();
        s.load_source(&wav_bytes(8_000, 1, 800)).unwrap();
        s.set_master_volume(20.0, true);
        s.play().unwrap();
        s.close();
        assert_eq!(s.state(), SessionState::Closed);
        assert!(!out.is_open());
        assert!(s.source().is_none());

        s.trigger(Instrument::HiHat);
        assert_eq!(s.state(), SessionState::Ready);
        assert_eq!(out.opens(), 2);
        assert_eq!(s.effective_gain(), 0.75);
        assert!(!s.is_track_playing());
    }
}
