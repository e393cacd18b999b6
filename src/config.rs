use std::path::{Path, PathBuf};
use crate::error::PhonkError;
use crate::pattern::DEFAULT_DENSITY;
use crate::session::DEFAULT_VOLUME;
use crate::tempo::Tempo;
use crate::waveform::WaveformType;

/// Studio settings, usually read from a `.cfg` file:
///
/// ```text
/// // Baile night
/// bpm: 90
/// volume: 80
/// muted: false
/// preset: Rio Bounce
/// density: 0.35
/// pattern: grooves/rio.pat
/// bass_waveform: sine
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StudioConfig {
    pub bpm: Tempo,
    pub volume: f32,
    pub muted: bool,
    pub preset: Option<String>,
    pub density: f64,
    pub pattern: Option<PathBuf>,
    pub bass_waveform: WaveformType,
}

impl Default for StudioConfig {
    fn default() -> Self {
        StudioConfig {
            bpm: Tempo::default(),
            volume: DEFAULT_VOLUME,
            muted: false,
            preset: None,
            density: DEFAULT_DENSITY,
            pattern: None,
            bass_waveform: WaveformType::Sine,
        }
    }
}

impl StudioConfig {
    pub fn load(path: &Path) -> Result<Self, PhonkError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PhonkError::FileError(format!("{}: {}", path.display(), e)))?;
        let mut config = Self::from_cfg(&content)?;

        // Pattern paths are relative to the config file
        if let (Some(pattern), Some(dir)) = (config.pattern.as_mut(), path.parent()) {
            if pattern.is_relative() {
                *pattern = dir.join(&*pattern);
            }
        }
        Ok(config)
    }

    pub fn from_cfg(content: &str) -> Result<Self, PhonkError> {
        let mut config = StudioConfig::default();

        macro_rules! parse_field {
            ($line:expr, $prefix:expr, $field:expr) => {
                if let Some(v) = $line.strip_prefix($prefix) {
                    $field = v.trim().parse()
                        .map_err(|_| PhonkError::ParseError(format!("Invalid {} '{}'", $prefix, v.trim())))?;
                    continue;
                }
            };
        }

        for line in content.lines() {
            let line = line.split("//").next().unwrap_or("").trim();
            if line.is_empty() { continue; }

            if let Some(v) = line.strip_prefix("bpm:") {
                let bpm: u32 = v.trim().parse()
                    .map_err(|_| PhonkError::ParseError(format!("Invalid bpm: '{}'", v.trim())))?;
                config.bpm = Tempo::new(bpm)?;
            } else if let Some(v) = line.strip_prefix("preset:") {
                let v = v.trim();
                config.preset = (!v.is_empty()).then(|| v.to_string());
            } else if let Some(v) = line.strip_prefix("pattern:") {
                let v = v.trim();
                config.pattern = (!v.is_empty()).then(|| PathBuf::from(v));
            } else if let Some(v) = line.strip_prefix("bass_waveform:") {
                config.bass_waveform = WaveformType::from_name(v)
                    .ok_or_else(|| PhonkError::ParseError(format!("Unknown waveform '{}'", v.trim())))?;
            } else {
                parse_field!(line, "volume:", config.volume);
                parse_field!(line, "muted:", config.muted);
                parse_field!(line, "density:", config.density);
            }
        }

        if !config.volume.is_finite() || !config.density.is_finite() {
            return Err(PhonkError::ParseError("volume and density must be finite numbers".to_string()));
        }
        config.volume = config.volume.clamp(0.0, 100.0);
        config.density = config.density.clamp(0.0, 1.0);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        assert_eq!(StudioConfig::from_cfg("").unwrap(), StudioConfig::default());
        let d = StudioConfig::default();
        assert_eq!(d.bpm.bpm(), 85);
        assert_eq!(d.volume, 75.0);
        assert_eq!(d.density, 0.3);
    }

    #[test]
    fn parses_every_key() {
        let cfg = StudioConfig::from_cfg(
            "// night set\n\
             bpm: 95\n\
             volume: 60 // a bit quieter\n\
             muted: true\n\
             preset: São Paulo\n\
             density: 0.35\n\
             pattern: rio.pat\n\
             bass_waveform: square\n\
             unknown_key: whatever\n",
        ).unwrap();
        assert_eq!(cfg.bpm.bpm(), 95);
        assert_eq!(cfg.volume, 60.0);
        assert!(cfg.muted);
        assert_eq!(cfg.preset.as_deref(), Some("São Paulo"));
        assert_eq!(cfg.density, 0.35);
        assert_eq!(cfg.pattern, Some(PathBuf::from("rio.pat")));
        assert_eq!(cfg.bass_waveform, WaveformType::Square);
    }

    #[test]
    fn bad_values_are_parse_errors() {
        assert!(matches!(StudioConfig::from_cfg("volume: loud"), Err(PhonkError::ParseError(_))));
        assert!(matches!(StudioConfig::from_cfg("muted: maybe"), Err(PhonkError::ParseError(_))));
        assert!(matches!(StudioConfig::from_cfg("bass_waveform: noise"), Err(PhonkError::ParseError(_))));
        assert_eq!(StudioConfig::from_cfg("bpm: 300"), Err(PhonkError::InvalidTempo(300)));
        assert!(matches!(StudioConfig::from_cfg("volume: NaN"), Err(PhonkError::ParseError(_))));
        assert!(matches!(StudioConfig::from_cfg("density: inf"), Err(PhonkError::ParseError(_))));
    }

    #[test]
    fn out_of_range_numbers_are_clamped() {
        let cfg = StudioConfig::from_cfg("volume: 140\ndensity: 2").unwrap();
        assert_eq!(cfg.volume, 100.0);
        assert_eq!(cfg.density, 1.0);
    }

    #[test]
    fn load_resolves_pattern_next_to_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studio.cfg");
        std::fs::write(&path, "bpm: 80\npattern: groove.pat\n").unwrap();

        let cfg = StudioConfig::load(&path).unwrap();
        assert_eq!(cfg.bpm.bpm(), 80);
        assert_eq!(cfg.pattern, Some(dir.path().join("groove.pat")));
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StudioConfig::load(&dir.path().join("nope.cfg")).unwrap_err();
        assert!(matches!(err, PhonkError::FileError(_)));
    }
}
