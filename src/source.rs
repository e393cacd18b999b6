use std::io::Cursor;
use std::sync::Arc;
use tracing::info;
use crate::error::PhonkError;

/// A decoded upload, mixed down to mono.
#[derive(Debug, Clone)]
pub struct DecodedBuffer {
    pub samples: Arc<Vec<f32>>,
    pub sample_rate: u32,
    pub channels: u16, // as stored in the file
}

impl DecodedBuffer {
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Decodes WAV bytes. Any failure leaves nothing behind.
    pub fn decode(bytes: &[u8]) -> Result<Self, PhonkError> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes))
            .map_err(|e| PhonkError::DecodeFailure(e.to_string()))?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(PhonkError::DecodeFailure("header declares a 0 Hz sample rate".to_string()));
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| PhonkError::DecodeFailure(e.to_string()))?,
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| PhonkError::DecodeFailure(e.to_string()))?
            }
        };

        let channels = spec.channels.max(1) as usize;
        let samples: Vec<f32> = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        if samples.is_empty() {
            return Err(PhonkError::DecodeFailure("file contains no audio frames".to_string()));
        }

        info!(
            "decoded source: {} Hz, {} channel(s), {:.2}s",
            spec.sample_rate,
            spec.channels,
            samples.len() as f32 / spec.sample_rate as f32
        );

        Ok(DecodedBuffer {
            samples: Arc::new(samples),
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }
}

/// Plays a `DecodedBuffer` once at the output rate.
#[derive(Debug, Clone)]
pub struct TrackPlayer {
    buffer: DecodedBuffer,
    position: f64, // in source samples
    step: f64,
}

impl TrackPlayer {
    pub fn new(buffer: DecodedBuffer, output_rate: f32) -> Self {
        let step = buffer.sample_rate as f64 / output_rate as f64;
        TrackPlayer { buffer, position: 0.0, step }
    }

    pub fn is_finished(&self) -> bool {
        self.position as usize >= self.buffer.samples.len()
    }

    // Linear interpolation between neighbouring source samples
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let samples = &self.buffer.samples;
        let idx = self.position as usize;
        if idx >= samples.len() {
            return 0.0;
        }

        let out = if idx + 1 < samples.len() {
            let frac = (self.position - idx as f64) as f32;
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else {
            samples[idx]
        };

        self.position += self.step;
        out
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn wav_bytes(sample_rate: u32, channels: u16, frames: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..frames {
                let s = ((i as f32 / 20.0).sin() * 16_000.0) as i16;
                for _ in 0..channels {
                    writer.write_sample(s).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_stereo_to_mono() {
        let buf = DecodedBuffer::decode(&wav_bytes(22_050, 2, 2_205)).unwrap();
        assert_eq!(buf.channels, 2);
        assert_eq!(buf.sample_rate, 22_050);
        assert_eq!(buf.samples.len(), 2_205);
        assert!((buf.duration() - 0.1).abs() < 1e-4);
        assert!(buf.samples.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn garbage_is_a_decode_failure() {
        let err = DecodedBuffer::decode(b"definitely not a riff header").unwrap_err();
        assert!(matches!(err, PhonkError::DecodeFailure(_)));
    }

    #[test]
    fn empty_wav_is_a_decode_failure() {
        let err = DecodedBuffer::decode(&wav_bytes(44_100, 1, 0)).unwrap_err();
        assert!(matches!(err, PhonkError::DecodeFailure(_)));
    }

    #[test]
    fn zero_sample_rate_is_a_decode_failure() {
        let data: Vec<u8> = (0..100i16).flat_map(|s| (s * 100).to_le_bytes()).collect();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
        bytes.extend_from_slice(&0u32.to_le_bytes()); // sample rate
        bytes.extend_from_slice(&0u32.to_le_bytes()); // byte rate
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&data);

        let err = DecodedBuffer::decode(&bytes).unwrap_err();
        assert!(matches!(err, PhonkError::DecodeFailure(_)));
    }

    #[test]
    fn player_resamples_and_finishes() {
        let buf = DecodedBuffer::decode(&wav_bytes(22_050, 1, 100)).unwrap();
        let mut player = TrackPlayer::new(buf, 44_100.0);
        let mut rendered = 0;
        while !player.is_finished() {
            player.next_sample();
            rendered += 1;
        }
        assert_eq!(rendered, 200);
        assert_eq!(player.next_sample(), 0.0);
    }
}
