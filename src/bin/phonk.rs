//! `phonk`: plays a drum grid (and optionally a track) on the default output.

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, Level};

use phonkmachine::{CpalOutput, Instrument, Studio, StudioConfig, Tempo};

#[derive(Parser)]
#[command(name = "phonk")]
#[command(about = "Brazilian phonk step sequencer", long_about = None)]
struct Cli {
    /// Studio config file (.cfg)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sequencer tempo, 60-180
    #[arg(short, long)]
    bpm: Option<u32>,

    /// Drum preset, e.g. "Classic Morro" or sao-paulo
    #[arg(short, long)]
    preset: Option<String>,

    /// Pattern file (.pat)
    #[arg(long)]
    pattern: Option<PathBuf>,

    /// WAV track to play alongside the drums
    #[arg(short, long)]
    track: Option<PathBuf>,

    /// How long to play, in seconds
    #[arg(short, long, default_value = "8.0")]
    seconds: f32,

    /// Master volume in percent
    #[arg(long)]
    volume: Option<f32>,

    /// Start muted
    #[arg(long)]
    mute: bool,

    /// Instruments to randomize before playing (kick, snare, hihat, cowbell)
    #[arg(short, long, value_delimiter = ',')]
    randomize: Vec<String>,

    /// Log triggers and ticks
    #[arg(short, long)]
    verbose: bool,
}

/// `--seconds` as a sleep length; negative, NaN or overflowing values are
/// rejected.
fn run_duration(seconds: f32) -> Result<Duration, String> {
    Duration::try_from_secs_f32(seconds).map_err(|e| format!("invalid --seconds {}: {}", seconds, e))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let run_for = run_duration(cli.seconds)?;

    let mut config = match &cli.config {
        Some(path) => StudioConfig::load(path)?,
        None => StudioConfig::default(),
    };
    if let Some(bpm) = cli.bpm {
        config.bpm = Tempo::new(bpm)?;
    }
    if let Some(volume) = cli.volume {
        config.volume = volume.clamp(0.0, 100.0);
    }
    if cli.mute {
        config.muted = true;
    }
    if cli.preset.is_some() {
        config.preset = cli.preset.clone();
    }
    if cli.pattern.is_some() {
        config.pattern = cli.pattern.clone();
    }

    let mut studio = Studio::with_config(Box::new(CpalOutput::new()), &config)?;

    for name in &cli.randomize {
        let instrument = Instrument::from_name(name)
            .ok_or_else(|| format!("unknown instrument '{}'", name))?;
        studio.randomize(instrument);
    }

    if let Some(path) = &cli.track {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        let detected = studio.load_file(&bytes)?;
        info!(
            "track tempo ~{}, target {} ({:+.1}%)",
            detected,
            studio.target_tempo(),
            studio.pitch_shift_percent()
        );
        studio.play_track()?;
    }

    print!("{}", studio.pattern());
    println!("{}", studio.target_tempo());

    studio.start()?;
    std::thread::sleep(run_for);
    studio.stop();
    studio.stop_track();

    Ok(())
}
