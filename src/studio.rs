use std::sync::Arc;
use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::clock::SequencerClock;
use crate::config::StudioConfig;
use crate::error::PhonkError;
use crate::instrument::Instrument;
use crate::output::AudioOutput;
use crate::pattern::PatternStore;
use crate::presets::{drum_preset, tempo_preset};
use crate::session::AudioSession;
use crate::tempo::{BpmDetector, RandomBpm, Tempo};
use crate::utils::parse_note;

/// Assumed tempo of an uploaded track until detection says otherwise.
pub const DEFAULT_SOURCE_BPM: u32 = 120;

/// Owns the session, the pattern and the clock, and tears them down together.
pub struct Studio {
    session: Arc<Mutex<AudioSession>>,
    pattern: Arc<RwLock<PatternStore>>,
    clock: SequencerClock<AudioSession>,
    detector: Box<dyn BpmDetector>,
    source_tempo: Tempo,
}

impl Studio {
    pub fn new(output: Box<dyn AudioOutput>) -> Self {
        let session = Arc::new(Mutex::new(AudioSession::new(output)));
        let pattern = Arc::new(RwLock::new(PatternStore::default()));
        let clock = SequencerClock::new(Arc::clone(&pattern), Arc::clone(&session), Tempo::default());

        Studio {
            session,
            pattern,
            clock,
            detector: Box::new(RandomBpm::new()),
            source_tempo: Tempo::clamped(DEFAULT_SOURCE_BPM),
        }
    }

    /// Applies `config` on top of a fresh studio. A preset sets the grid, a
    /// pattern file then replaces it; the tempo always comes from `bpm`.
    pub fn with_config(output: Box<dyn AudioOutput>, config: &StudioConfig) -> Result<Self, PhonkError> {
        let studio = Studio::new(output);

        {
            let mut session = studio.session.lock();
            session.set_master_volume(config.volume, config.muted);
            session.set_bass_waveform(config.bass_waveform);
        }

        {
            let mut pattern = studio.pattern.write();
            if let Some(preset) = &config.preset {
                pattern.load_preset(preset)?;
            }
            if let Some(path) = &config.pattern {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| PhonkError::FileError(format!("{}: {}", path.display(), e)))?;
                *pattern = PatternStore::from_pat(&content)?;
            }
            pattern.set_density(config.density);
        }

        studio.clock.set_bpm(config.bpm);
        Ok(studio)
    }

    /// Swaps the tempo detector used by `load_file`.
    pub fn set_detector(&mut self, detector: Box<dyn BpmDetector>) {
        self.detector = detector;
    }

    pub fn session(&self) -> &Arc<Mutex<AudioSession>> {
        &self.session
    }

    pub fn initialize(&self) -> Result<(), PhonkError> {
        self.session.lock().initialize()
    }

    /// Decodes an uploaded track and guesses its tempo.
    pub fn load_file(&mut self, bytes: &[u8]) -> Result<Tempo, PhonkError> {
        let buffer = self.session.lock().load_source(bytes)?;
        self.source_tempo = self.detector.detect(&buffer);
        info!("loaded {:.2}s track, detected {}", buffer.duration(), self.source_tempo);
        Ok(self.source_tempo)
    }

    pub fn play_track(&self) -> Result<(), PhonkError> {
        self.session.lock().play()
    }

    pub fn stop_track(&self) {
        self.session.lock().stop();
    }

    pub fn is_track_playing(&self) -> bool {
        self.session.lock().is_track_playing()
    }

    pub fn start(&mut self) -> Result<(), PhonkError> {
        // A failed init is not fatal; each hit retries
        if let Err(e) = self.session.lock().initialize() {
            warn!("starting sequencer without audio: {}", e);
        }
        self.clock.start()
    }

    pub fn stop(&mut self) {
        self.clock.stop();
    }

    /// Returns whether the sequencer is running afterwards.
    pub fn toggle_playback(&mut self) -> Result<bool, PhonkError> {
        if self.clock.is_running() {
            self.stop();
        } else {
            self.start()?;
        }
        Ok(self.clock.is_running())
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn current_step(&self) -> usize {
        self.clock.current_step()
    }

    pub fn target_tempo(&self) -> Tempo {
        self.clock.tempo()
    }

    pub fn source_tempo(&self) -> Tempo {
        self.source_tempo
    }

    pub fn set_target_bpm(&self, bpm: u32) -> Tempo {
        let tempo = Tempo::clamped(bpm);
        self.clock.set_bpm(tempo);
        tempo
    }

    pub fn load_tempo_preset(&self, id: &str) -> Result<Tempo, PhonkError> {
        let bpm = tempo_preset(id).ok_or_else(|| PhonkError::UnknownPreset(id.to_string()))?;
        let tempo = Tempo::new(bpm)?;
        self.clock.set_bpm(tempo);
        Ok(tempo)
    }

    /// Loads a preset's grid and its tempo.
    pub fn apply_preset(&self, id: &str) -> Result<(), PhonkError> {
        self.pattern.write().load_preset(id)?;
        if let Some(preset) = drum_preset(id) {
            self.clock.set_bpm(Tempo::new(preset.bpm)?);
            info!("applied preset '{}' at {} BPM", preset.name, preset.bpm);
        }
        Ok(())
    }

    pub fn pitch_shift_percent(&self) -> f64 {
        Tempo::pitch_shift_percent(self.source_tempo, self.target_tempo())
    }

    pub fn tempo_ratio(&self) -> f64 {
        Tempo::ratio(self.source_tempo, self.target_tempo())
    }

    pub fn toggle_step(&self, instrument: Instrument, step: usize) -> Result<(), PhonkError> {
        self.pattern.write().toggle_step(instrument, step)
    }

    pub fn randomize(&self, instrument: Instrument) {
        self.pattern.write().randomize(instrument);
    }

    pub fn clear(&self, instrument: Instrument) {
        self.pattern.write().clear(instrument);
    }

    pub fn load_preset(&self, id: &str) -> Result<(), PhonkError> {
        self.pattern.write().load_preset(id)
    }

    pub fn set_density(&self, density: f64) {
        self.pattern.write().set_density(density);
    }

    /// Snapshot of the current grids.
    pub fn pattern(&self) -> PatternStore {
        self.pattern.read().clone()
    }

    pub fn set_pattern(&self, pattern: PatternStore) {
        let mut current = self.pattern.write();
        let density = current.density();
        *current = pattern;
        current.set_density(density);
    }

    pub fn set_master_volume(&self, volume_percent: f32, muted: bool) {
        self.session.lock().set_master_volume(volume_percent, muted);
    }

    pub fn trigger_now(&self, instrument: Instrument) {
        self.clock.trigger_now(instrument);
    }

    pub fn trigger_bass(&self, note: u8) {
        self.session.lock().trigger_bass(note);
    }

    /// Bass hit by note name, e.g. `"E2"`.
    pub fn trigger_bass_named(&self, note: &str) -> Result<(), PhonkError> {
        let note = parse_note(note)?;
        self.trigger_bass(note);
        Ok(())
    }
}

impl Drop for Studio {
    fn drop(&mut self) {
        self.clock.stop();
        self.session.lock().close();
    }
}
