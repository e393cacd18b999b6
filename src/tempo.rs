use std::fmt;
use std::time::Duration;
use crate::error::PhonkError;
use crate::source::DecodedBuffer;

pub const MIN_BPM: u32 = 60;
pub const MAX_BPM: u32 = 180;
pub const STEPS_PER_BEAT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tempo(u32);

impl Tempo {
    pub fn new(bpm: u32) -> Result<Self, PhonkError> {
        if (MIN_BPM..=MAX_BPM).contains(&bpm) {
            Ok(Tempo(bpm))
        } else {
            Err(PhonkError::InvalidTempo(bpm))
        }
    }

    /// Slider semantics: out-of-range values pin to the nearest bound.
    pub fn clamped(bpm: u32) -> Self {
        Tempo(bpm.clamp(MIN_BPM, MAX_BPM))
    }

    pub fn bpm(self) -> u32 {
        self.0
    }

    /// Length of one sixteenth-note step: `60000 / bpm / 4` ms.
    pub fn step_interval(self) -> Duration {
        Duration::from_secs_f64(self.step_interval_ms() / 1000.0)
    }

    pub fn step_interval_ms(self) -> f64 {
        60_000.0 / self.0 as f64 / STEPS_PER_BEAT as f64
    }

    /// How far the target tempo is from the source, in percent.
    pub fn pitch_shift_percent(source: Tempo, target: Tempo) -> f64 {
        (target.0 as f64 / source.0 as f64 - 1.0) * 100.0
    }

    pub fn ratio(source: Tempo, target: Tempo) -> f64 {
        source.0 as f64 / target.0 as f64
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Tempo(85)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}

/// Placeholder for tempo detection on an uploaded track. Nothing here
/// analyses audio; results are not authoritative.
pub trait BpmDetector: Send {
    fn detect(&mut self, source: &DecodedBuffer) -> Tempo;
}

/// Picks 120..=179 BPM at random, whatever the input.
#[derive(Debug, Default)]
pub struct RandomBpm {
    rng: fastrand::Rng,
}

impl RandomBpm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        RandomBpm { rng: fastrand::Rng::with_seed(seed) }
    }
}

impl BpmDetector for RandomBpm {
    fn detect(&mut self, _source: &DecodedBuffer) -> Tempo {
        Tempo::clamped(self.rng.u32(120..180))
    }
}

/// Always reports the tempo it was built with.
#[derive(Debug, Clone, Copy)]
pub struct FixedBpm(pub Tempo);

impl BpmDetector for FixedBpm {
    fn detect(&mut self, _source: &DecodedBuffer) -> Tempo {
        self.0
    }
}
