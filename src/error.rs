use std::fmt;

impl std::error::Error for PhonkError {}

#[derive(Debug, Clone, PartialEq)]
pub enum PhonkError {
    InitializationFailure(String),
    DecodeFailure(String),
    InvalidStepIndex(usize),
    UnknownPreset(String),
    TriggerWithoutSession,
    NoSourceLoaded,
    InvalidTempo(u32),
    ParseError(String),
    FileError(String),
    ClockError(String),
}

impl fmt::Display for PhonkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PhonkError::InitializationFailure(msg) => write!(f, "Audio Initialization Error: {}", msg),
            PhonkError::DecodeFailure(msg) => write!(f, "Decode Error: {}", msg),
            PhonkError::InvalidStepIndex(step) => write!(f, "Invalid Step Index: {} (expected 0..=15)", step),
            PhonkError::UnknownPreset(name) => write!(f, "Unknown Preset: {}", name),
            PhonkError::TriggerWithoutSession => write!(f, "Trigger dropped: audio session unavailable"),
            PhonkError::NoSourceLoaded => write!(f, "No audio source loaded"),
            PhonkError::InvalidTempo(bpm) => write!(f, "Invalid Tempo: {} BPM (expected 60..=180)", bpm),
            PhonkError::ParseError(msg) => write!(f, "Parsing Error: {}", msg),
            PhonkError::FileError(msg) => write!(f, "File Error: {}", msg),
            PhonkError::ClockError(msg) => write!(f, "Clock Error: {}", msg),
        }
    }
}
