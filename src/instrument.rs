use std::fmt;
use crate::envelope::Ramp;
use crate::utils::midi_to_freq;
use crate::waveform::WaveformType;

pub const DEFAULT_BASS_NOTE: u8 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Kick,
    Snare,
    HiHat,
    Cowbell,
}

impl Instrument {
    pub const COUNT: usize = 4;
    pub const ALL: [Instrument; Instrument::COUNT] = [
        Instrument::Kick,
        Instrument::Snare,
        Instrument::HiHat,
        Instrument::Cowbell,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Short name used by pattern and config files.
    pub fn name(self) -> &'static str {
        match self {
            Instrument::Kick => "kick",
            Instrument::Snare => "snare",
            Instrument::HiHat => "hihat",
            Instrument::Cowbell => "cowbell",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "kick" => Some(Instrument::Kick),
            "snare" | "clap" => Some(Instrument::Snare),
            "hihat" | "hi-hat" | "hat" => Some(Instrument::HiHat),
            "cowbell" => Some(Instrument::Cowbell),
            _ => None,
        }
    }

    pub fn recipe(self) -> SoundRecipe {
        match self {
            Instrument::Kick => SoundRecipe {
                waveform: WaveformType::Sine,
                frequency: Ramp::exponential(60.0, 30.0, 0.3),
                gain: Ramp::exponential(0.8, 0.01, 0.3),
                cutoff: 100.0,
                duration: 0.5,
            },
            Instrument::Snare => SoundRecipe::percussive(200.0, 0.5, 0.2, 1_000.0),
            Instrument::HiHat => SoundRecipe::percussive(8_000.0, 0.3, 0.1, 10_000.0),
            Instrument::Cowbell => SoundRecipe::percussive(800.0, 0.6, 0.4, 2_000.0),
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Instrument::Kick => "Kick",
            Instrument::Snare => "Snare/Clap",
            Instrument::HiHat => "Hi-Hat",
            Instrument::Cowbell => "Cowbell",
        };
        f.write_str(label)
    }
}

/// Everything a voice needs to render one hit. Times are seconds from the
/// trigger instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundRecipe {
    pub waveform: WaveformType,
    pub frequency: Ramp,
    pub gain: Ramp,
    pub cutoff: f32, // low-pass, Hz
    pub duration: f32, // oscillator stop time
}

impl SoundRecipe {
    // Constant pitch, gain decaying to 0.01, stopped at 0.5s
    fn percussive(freq: f32, peak: f32, decay: f32, cutoff: f32) -> Self {
        SoundRecipe {
            waveform: WaveformType::Sine,
            frequency: Ramp::constant(freq),
            gain: Ramp::exponential(peak, 0.01, decay),
            cutoff,
            duration: 0.5,
        }
    }

    /// 808 hit: pitch falls an octave and the gain dies out over 0.8s.
    pub fn bass(note: u8) -> Self {
        let freq = midi_to_freq(note as f32);
        SoundRecipe {
            waveform: WaveformType::Sine,
            frequency: Ramp::exponential(freq, freq * 0.5, 0.8),
            gain: Ramp::exponential(0.7, 0.01, 0.8),
            cutoff: 200.0,
            duration: 0.8,
        }
    }

    pub fn with_waveform(mut self, waveform: WaveformType) -> Self {
        self.waveform = waveform;
        self
    }
}
