use crate::error::PhonkError;

/// 12-TET, A4 (note 69) = 440 Hz.
pub fn midi_to_freq(note: f32) -> f32 {
    440.0 * 2.0_f32.powf((note - 69.0) / 12.0)
}

/// Parses a note name such as `E2`, `F#1` or `Bb0` into a MIDI note number
/// (C-1 = 0).
pub fn parse_note(note_str: &str) -> Result<u8, PhonkError> {
    let note_str = note_str.trim();
    let mut chars = note_str.chars();
    let mut semitone: i32 = match chars.next().map(|c| c.to_ascii_uppercase()) {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => return Err(PhonkError::ParseError(format!("Invalid note: {}", note_str))),
    };

    let rest = chars.as_str();
    let octave_str = if let Some(r) = rest.strip_prefix('#') {
        semitone += 1;
        r
    } else if let Some(r) = rest.strip_prefix('b') {
        semitone -= 1;
        r
    } else {
        rest
    };

    let octave: i32 = octave_str.trim().parse()
        .map_err(|_| PhonkError::ParseError(format!("Invalid octave in note: {}", note_str)))?;

    let midi = (octave + 1) * 12 + semitone;
    u8::try_from(midi)
        .ok()
        .filter(|m| *m <= 127)
        .ok_or_else(|| PhonkError::ParseError(format!("Note out of MIDI range: {}", note_str)))
}
