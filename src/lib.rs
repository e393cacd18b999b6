//   _______             _______   _          _
//  (  ____ ) |\     /| (  ___  ) ( (    /|  | \    /\
//  | (    )| | )   ( | | (   ) | |  \  ( |  |  \  / /
//  | (____)| | (___) | | |   | | |   \ | |  |  (_/ /
//  |  _____) |  ___  | | |   | | | (\ \) |  |   _ (
//  | (       | (   ) | | |   | | | | \   |  |  ( \ \
//  | )       | )   ( | | (___) | | )  \  |  |  /  \ \
//  |/        |/     \| (_______) |/    )_)  |_/    \/

pub mod error;
pub mod waveform;
pub mod envelope;
pub mod effects;
pub mod instrument;
pub mod voice;
pub mod source;
pub mod graph;
pub mod output;
pub mod session;
pub mod presets;
pub mod pattern;
pub mod tempo;
pub mod sequencer;
pub mod clock;
pub mod config;
pub mod studio;
pub mod utils;

pub use error::PhonkError;
pub use waveform::WaveformType;
pub use envelope::Ramp;
pub use effects::LowPass;
pub use instrument::{Instrument, SoundRecipe, DEFAULT_BASS_NOTE};
pub use voice::Voice;
pub use source::{DecodedBuffer, TrackPlayer};
pub use graph::{OutputGraph, SharedGraph};
pub use output::{AudioOutput, CpalOutput, OfflineOutput};
pub use session::{AudioSession, SessionState};
pub use presets::{DrumPreset, DRUM_PRESETS, BASS_NOTES};
pub use pattern::{PatternStore, Steps, STEPS};
pub use tempo::{Tempo, BpmDetector, RandomBpm, FixedBpm};
pub use sequencer::{Sequencer, TransportState, TriggerSink};
pub use clock::SequencerClock;
pub use config::StudioConfig;
pub use studio::Studio;