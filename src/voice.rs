use crate::effects::LowPass;
use crate::instrument::SoundRecipe;

/// One scheduled hit: oscillator into low-pass into gain envelope.
#[derive(Debug, Clone)]
pub struct Voice {
    recipe: SoundRecipe,
    filter: LowPass,
    start_frame: u64,
    stop_frame: u64,
    phase: f32,
    sample_rate: f32,
}

impl Voice {
    pub fn new(recipe: SoundRecipe, start_frame: u64, sample_rate: f32) -> Self {
        let stop_frame = start_frame + (recipe.duration * sample_rate).round() as u64;
        Voice {
            filter: LowPass::new(recipe.cutoff, sample_rate),
            recipe,
            start_frame,
            stop_frame,
            phase: 0.0,
            sample_rate,
        }
    }

    pub fn recipe(&self) -> &SoundRecipe {
        &self.recipe
    }

    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    pub fn is_finished(&self, frame: u64) -> bool {
        frame >= self.stop_frame
    }

    /// Sample for absolute graph frame `frame`; silent before the start and
    /// after the stop time.
    #[inline]
    pub fn next_sample(&mut self, frame: u64) -> f32 {
        if frame < self.start_frame || frame >= self.stop_frame {
            return 0.0;
        }

        let elapsed = (frame - self.start_frame) as f32 / self.sample_rate;
        let freq = self.recipe.frequency.value_at(elapsed);
        let raw = self.recipe.waveform.generate_sample(self.phase);

        self.phase += freq / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        self.filter.process(raw) * self.recipe.gain.value_at(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Instrument;

    const SR: f32 = 44_100.0;

    #[test]
    fn silent_before_start_and_after_stop() {
        let mut v = Voice::new(Instrument::Cowbell.recipe(), 100, SR);
        assert_eq!(v.next_sample(50), 0.0);
        let stop = 100 + (0.5 * SR) as u64;
        assert!(v.is_finished(stop));
        assert!(!v.is_finished(stop - 1));
        assert_eq!(v.next_sample(stop), 0.0);
    }

    #[test]
    fn hit_is_loud_early_and_quiet_late() {
        let mut v = Voice::new(Instrument::Cowbell.recipe(), 0, SR);
        let early: f32 = (0..2_205).map(|f| v.next_sample(f).abs()).fold(0.0, f32::max);
        let late_start = (0.45 * SR) as u64;
        for f in 2_205..late_start {
            v.next_sample(f);
        }
        let tail: f32 = (late_start..late_start + 1_000).map(|f| v.next_sample(f).abs()).fold(0.0, f32::max);
        assert!(early > 0.3, "early peak {}", early);
        assert!(tail < 0.02, "tail peak {}", tail);
    }
}
