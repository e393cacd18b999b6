use std::sync::Arc;
use parking_lot::Mutex;
use crate::instrument::SoundRecipe;
use crate::source::{DecodedBuffer, TrackPlayer};
use crate::voice::Voice;

pub const DEFAULT_MASTER_GAIN: f32 = 0.75;
const MAX_VOICES: usize = 64; // oldest hit is dropped past this

pub type SharedGraph = Arc<Mutex<OutputGraph>>;

/// The master stage every sound routes through. The output device pulls
/// frames from it; the session schedules into it.
#[derive(Debug)]
pub struct OutputGraph {
    sample_rate: f32,
    frame: u64, // frames rendered so far, the graph's notion of "now"
    master_gain: f32,
    voices: Vec<Voice>,
    track: Option<TrackPlayer>,
}

impl OutputGraph {
    pub fn new(sample_rate: f32) -> Self {
        OutputGraph {
            sample_rate,
            frame: 0,
            master_gain: DEFAULT_MASTER_GAIN,
            voices: Vec::with_capacity(MAX_VOICES),
            track: None,
        }
    }

    pub fn shared(sample_rate: f32) -> SharedGraph {
        Arc::new(Mutex::new(Self::new(sample_rate)))
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn current_time(&self) -> f32 {
        self.frame as f32 / self.sample_rate
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Non-finite gains are ignored.
    pub fn set_master_gain(&mut self, gain: f32) {
        if gain.is_finite() {
            self.master_gain = gain.clamp(0.0, 1.0);
        }
    }

    /// Schedules `recipe` to start at the current frame.
    pub fn schedule(&mut self, recipe: SoundRecipe) {
        if self.voices.len() >= MAX_VOICES {
            self.voices.remove(0);
        }
        self.voices.push(Voice::new(recipe, self.frame, self.sample_rate));
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Starts `buffer` from the top, replacing whatever track was playing.
    pub fn start_track(&mut self, buffer: DecodedBuffer) {
        self.track = Some(TrackPlayer::new(buffer, self.sample_rate));
    }

    pub fn stop_track(&mut self) {
        self.track = None;
    }

    pub fn is_track_playing(&self) -> bool {
        self.track.is_some()
    }

    /// Fills an interleaved buffer; every channel gets the same mono mix.
    pub fn render(&mut self, data: &mut [f32], channels: usize) {
        for frame in data.chunks_mut(channels.max(1)) {
            let now = self.frame;
            let mut mix = 0.0;

            for voice in self.voices.iter_mut() {
                mix += voice.next_sample(now);
            }

            if let Some(track) = self.track.as_mut() {
                mix += track.next_sample();
            }

            let out = mix * self.master_gain;
            for sample in frame.iter_mut() {
                *sample = out;
            }

            self.frame += 1;
        }

        let now = self.frame;
        self.voices.retain(|v| !v.is_finished(now));
        if self.track.as_ref().is_some_and(|t| t.is_finished()) {
            self.track = None;
        }
    }
}
