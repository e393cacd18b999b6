#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaveformType {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl WaveformType {
    pub fn generate_sample(&self, phase: f32) -> f32 { // Phase should be in the range [0.0, 1.0)
        match self {
            WaveformType::Sine => (phase * std::f32::consts::TAU).sin(),
            WaveformType::Square => if phase < 0.5 { 1.0 } else { -1.0 },
            WaveformType::Sawtooth => phase * 2.0 - 1.0,
            WaveformType::Triangle => {
                if phase < 0.5 { phase * 4.0 - 1.0 } else { 3.0 - phase * 4.0 }
            }
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "sine" => Some(WaveformType::Sine),
            "square" => Some(WaveformType::Square),
            "triangle" => Some(WaveformType::Triangle),
            "sawtooth" | "saw" => Some(WaveformType::Sawtooth),
            _ => None,
        }
    }
}
