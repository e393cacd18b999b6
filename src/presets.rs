//! Static preset catalogs: drum grids, tempos and 808 notes.
//!
//! Earlier versions of the sequencer shipped several conflicting grids under
//! the same names. This table is the one the engine uses.

use crate::instrument::Instrument;
use crate::pattern::{Steps, STEPS};

/// `x` marks an active step; anything else is a rest.
const fn grid(row: &str) -> Steps {
    let bytes = row.as_bytes();
    let mut out = [false; STEPS];
    let mut i = 0;
    while i < STEPS {
        out[i] = bytes[i] == b'x';
        i += 1;
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrumPreset {
    pub name: &'static str,
    pub bpm: u32,
    pub kick: Steps,
    pub snare: Steps,
    pub hihat: Steps,
    pub cowbell: Steps,
}

impl DrumPreset {
    pub fn steps(&self, instrument: Instrument) -> Steps {
        match instrument {
            Instrument::Kick => self.kick,
            Instrument::Snare => self.snare,
            Instrument::HiHat => self.hihat,
            Instrument::Cowbell => self.cowbell,
        }
    }

    /// Name with spaces and accents folded, e.g. `sao-paulo`.
    pub fn slug(&self) -> String {
        slugify(self.name)
    }
}

pub const DRUM_PRESETS: [DrumPreset; 4] = [
    DrumPreset {
        name: "Classic Morro",
        bpm: 80,
        cowbell: grid("x...x...x...x..."),
        kick:    grid("x.......x......."),
        snare:   grid("....x.......x..."),
        hihat:   grid(".x.x.x.x.x.x.x.x"),
    },
    DrumPreset {
        name: "Rio Bounce",
        bpm: 85,
        cowbell: grid("x..x..x...x..x.."),
        kick:    grid("x......x..x....."),
        snare:   grid("....x.......x..."),
        hihat:   grid("x.x.x.x.x.x.x.x."),
    },
    DrumPreset {
        name: "São Paulo",
        bpm: 90,
        cowbell: grid("x.x...x.x.x...x."),
        kick:    grid("x..x......x....."),
        snare:   grid("....x..x....x..."),
        hihat:   grid("xxxxxxxxxxxxxxxx"),
    },
    DrumPreset {
        name: "Aggressive",
        bpm: 95,
        cowbell: grid("xxx.x.xxx.x.x.x."),
        kick:    grid("x..x..x...x..x.."),
        snare:   grid("....x.......x.xx"),
        hihat:   grid(".xxx.xxx.xxx.xxx"),
    },
];

/// Looks a preset up by display name or slug, case-insensitively.
pub fn drum_preset(id: &str) -> Option<&'static DrumPreset> {
    let wanted = slugify(id);
    DRUM_PRESETS.iter().find(|p| p.slug() == wanted)
}

/// Tempo presets share the drum preset names.
pub fn tempo_preset(id: &str) -> Option<u32> {
    drum_preset(id).map(|p| p.bpm)
}

/// 808 trigger pads: (label, MIDI note).
pub const BASS_NOTES: [(&str, u8); 4] = [
    ("E1", 28),
    ("A1", 33),
    ("E2", 40),
    ("A2", 45),
];

fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        let c = match c {
            'á' | 'à' | 'â' | 'ã' | 'Á' | 'À' | 'Â' | 'Ã' => 'a',
            'é' | 'ê' | 'É' | 'Ê' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'ô' | 'õ' | 'Ó' | 'Ô' | 'Õ' => 'o',
            'ú' | 'Ú' => 'u',
            'ç' | 'Ç' => 'c',
            ' ' | '_' => '-',
            c => c.to_ascii_lowercase(),
        };
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parse_note;

    #[test]
    fn classic_morro_cowbell_is_on_the_quarters() {
        let p = drum_preset("Classic Morro").unwrap();
        let expected: Steps = std::array::from_fn(|i| i % 4 == 0);
        assert_eq!(p.cowbell, expected);
        assert_eq!(p.bpm, 80);
    }

    #[test]
    fn lookup_by_slug_and_accents() {
        assert_eq!(drum_preset("sao-paulo").map(|p| p.name), Some("São Paulo"));
        assert_eq!(drum_preset("SÃO PAULO").map(|p| p.bpm), Some(90));
        assert_eq!(drum_preset("rio_bounce").map(|p| p.bpm), Some(85));
        assert!(drum_preset("baile funk").is_none());
    }

    #[test]
    fn tempo_presets() {
        assert_eq!(tempo_preset("Aggressive"), Some(95));
        assert_eq!(tempo_preset("nope"), None);
    }

    #[test]
    fn bass_labels_match_their_notes() {
        for (label, note) in BASS_NOTES {
            assert_eq!(parse_note(label).unwrap(), note);
        }
    }
}
