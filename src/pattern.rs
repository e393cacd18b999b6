use std::fmt;
use tracing::{debug, warn};

use crate::error::PhonkError;
use crate::instrument::Instrument;
use crate::presets::{drum_preset, DRUM_PRESETS};

pub const STEPS: usize = 16;
pub const DEFAULT_DENSITY: f64 = 0.3;

pub type Steps = [bool; STEPS];

/// One 16-step grid per instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternStore {
    grids: [Steps; Instrument::COUNT],
    density: f64, // chance a randomized step is on
}

impl Default for PatternStore {
    /// The Classic Morro groove.
    fn default() -> Self {
        let preset = &DRUM_PRESETS[0];
        PatternStore {
            grids: Instrument::ALL.map(|i| preset.steps(i)),
            density: DEFAULT_DENSITY,
        }
    }
}

impl PatternStore {
    pub fn empty() -> Self {
        PatternStore {
            grids: [[false; STEPS]; Instrument::COUNT],
            density: DEFAULT_DENSITY,
        }
    }

    pub fn steps(&self, instrument: Instrument) -> &Steps {
        &self.grids[instrument.index()]
    }

    pub fn is_active(&self, instrument: Instrument, step: usize) -> Result<bool, PhonkError> {
        check_step(step)?;
        Ok(self.grids[instrument.index()][step])
    }

    /// Instruments to fire at `step`. Out-of-range steps fire nothing.
    pub fn active_at(&self, step: usize) -> Vec<Instrument> {
        if step >= STEPS {
            return Vec::new();
        }
        Instrument::ALL
            .into_iter()
            .filter(|i| self.grids[i.index()][step])
            .collect()
    }

    pub fn toggle_step(&mut self, instrument: Instrument, step: usize) -> Result<(), PhonkError> {
        check_step(step)?;
        let cell = &mut self.grids[instrument.index()][step];
        *cell = !*cell;
        Ok(())
    }

    pub fn set_step(&mut self, instrument: Instrument, step: usize, active: bool) -> Result<(), PhonkError> {
        check_step(step)?;
        self.grids[instrument.index()][step] = active;
        Ok(())
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn set_density(&mut self, density: f64) {
        if density.is_finite() {
            self.density = density.clamp(0.0, 1.0);
        }
    }

    pub fn randomize(&mut self, instrument: Instrument) {
        self.randomize_with(instrument, &mut fastrand::Rng::new());
    }

    pub fn randomize_with(&mut self, instrument: Instrument, rng: &mut fastrand::Rng) {
        let density = self.density;
        self.grids[instrument.index()] = std::array::from_fn(|_| rng.f64() < density);
        debug!("randomized {}", instrument.name());
    }

    pub fn clear(&mut self, instrument: Instrument) {
        self.grids[instrument.index()] = [false; STEPS];
    }

    /// Replaces every grid from the named preset. Unknown names change nothing.
    pub fn load_preset(&mut self, id: &str) -> Result<(), PhonkError> {
        let Some(preset) = drum_preset(id) else {
            warn!("unknown drum preset '{}'", id);
            return Err(PhonkError::UnknownPreset(id.to_string()));
        };
        self.grids = Instrument::ALL.map(|i| preset.steps(i));
        debug!("loaded drum preset '{}'", preset.name);
        Ok(())
    }

    /// Parses the text pattern format:
    ///
    /// ```text
    /// // comments and blank lines are skipped
    /// kick:    x.......x.......
    /// cowbell: x...x...x...x...
    /// ```
    ///
    /// `x` is an active step, `.` or `-` a rest; `|` and spaces are ignored.
    /// Instruments not listed stay empty.
    pub fn from_pat(content: &str) -> Result<Self, PhonkError> {
        let mut store = PatternStore::empty();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") { continue; }

            let (name, row) = line.split_once(':')
                .ok_or_else(|| PhonkError::ParseError(format!("Expected 'instrument: steps', got '{}'", line)))?;
            let instrument = Instrument::from_name(name)
                .ok_or_else(|| PhonkError::ParseError(format!("Unknown instrument '{}'", name.trim())))?;

            let row = row.split("//").next().unwrap_or("");
            let mut steps = [false; STEPS];
            let mut count = 0;
            for c in row.chars().filter(|c| !c.is_whitespace() && *c != '|') {
                let active = match c {
                    'x' | 'X' => true,
                    '.' | '-' => false,
                    other => return Err(PhonkError::ParseError(format!("Unexpected step '{}' for {}", other, instrument.name()))),
                };
                if count >= STEPS {
                    return Err(PhonkError::ParseError(format!("More than {} steps for {}", STEPS, instrument.name())));
                }
                steps[count] = active;
                count += 1;
            }
            if count != STEPS {
                return Err(PhonkError::ParseError(format!("Expected {} steps for {}, got {}", STEPS, instrument.name(), count)));
            }

            store.grids[instrument.index()] = steps;
        }

        Ok(store)
    }
}

impl fmt::Display for PatternStore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for instrument in Instrument::ALL {
            let row: String = self.steps(instrument).iter().map(|on| if *on { 'x' } else { '.' }).collect();
            writeln!(f, "{:<8} {}", format!("{}:", instrument.name()), row)?;
        }
        Ok(())
    }
}

fn check_step(step: usize) -> Result<(), PhonkError> {
    if step < STEPS { Ok(()) } else { Err(PhonkError::InvalidStepIndex(step)) }
}
