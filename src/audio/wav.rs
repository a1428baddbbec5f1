//! Canonical WAV container encoding and decoding.
//!
//! Utterance audio is handed to the transcription service as a standard
//! 44-byte-header RIFF/WAVE file. The header is produced byte-for-byte so any
//! WAV consumer accepts it, and `decode(encode(pcm))` reconstructs the exact
//! payload and format parameters.

use crate::error::{AssistError, Result};

/// WAV format parameters carried in the `fmt ` sub-chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            sample_rate: crate::defaults::SAMPLE_RATE,
            bits_per_sample: crate::defaults::BITS_PER_SAMPLE,
            channels: crate::defaults::CHANNELS,
        }
    }
}

/// Size of the canonical header: RIFF descriptor + `fmt ` + `data` prelude.
pub const HEADER_LEN: usize = 44;

/// Encode raw PCM bytes as a self-contained WAV file.
///
/// Produces a canonical 44-byte header followed by the payload unchanged.
/// An empty payload yields a valid 44-byte file with data size 0.
pub fn encode(pcm: &[u8], spec: WavSpec) -> Vec<u8> {
    let byte_rate =
        spec.sample_rate * u32::from(spec.channels) * u32::from(spec.bits_per_sample) / 8;
    let block_align = spec.channels * spec.bits_per_sample / 8;
    let data_size = pcm.len() as u32;

    let mut out = Vec::with_capacity(HEADER_LEN + pcm.len());

    // RIFF chunk descriptor
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt sub-chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM format tag
    out.extend_from_slice(&spec.channels.to_le_bytes());
    out.extend_from_slice(&spec.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&spec.bits_per_sample.to_le_bytes());

    // data sub-chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    out.extend_from_slice(pcm);

    out
}

/// Encode 16-bit samples directly, little-endian.
pub fn encode_samples(samples: &[i16], spec: WavSpec) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        pcm.extend_from_slice(&s.to_le_bytes());
    }
    encode(&pcm, spec)
}

/// Decode a canonical WAV file back into format parameters and PCM payload.
///
/// Only the canonical layout produced by [`encode`] is accepted: PCM format
/// tag, 16-byte `fmt ` chunk, `data` chunk immediately following.
pub fn decode(bytes: &[u8]) -> Result<(WavSpec, Vec<u8>)> {
    if bytes.len() < HEADER_LEN {
        return Err(AssistError::WavDecode {
            message: format!("file too short: {} bytes", bytes.len()),
        });
    }

    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(AssistError::WavDecode {
            message: "missing RIFF/WAVE magic".to_string(),
        });
    }
    if &bytes[12..16] != b"fmt " {
        return Err(AssistError::WavDecode {
            message: "missing fmt sub-chunk".to_string(),
        });
    }

    let fmt_size = read_u32(bytes, 16);
    if fmt_size != 16 {
        return Err(AssistError::WavDecode {
            message: format!("unsupported fmt chunk size {}", fmt_size),
        });
    }
    let format_tag = read_u16(bytes, 20);
    if format_tag != 1 {
        return Err(AssistError::WavDecode {
            message: format!("unsupported audio format tag {}", format_tag),
        });
    }

    let channels = read_u16(bytes, 22);
    let sample_rate = read_u32(bytes, 24);
    let byte_rate = read_u32(bytes, 28);
    let block_align = read_u16(bytes, 32);
    let bits_per_sample = read_u16(bytes, 34);

    if channels == 0 || bits_per_sample == 0 {
        return Err(AssistError::WavDecode {
            message: "zero channels or bit depth".to_string(),
        });
    }

    let expected_byte_rate =
        sample_rate * u32::from(channels) * u32::from(bits_per_sample) / 8;
    let expected_block_align = channels * bits_per_sample / 8;
    if byte_rate != expected_byte_rate || block_align != expected_block_align {
        return Err(AssistError::WavDecode {
            message: "inconsistent byte rate or block align".to_string(),
        });
    }

    if &bytes[36..40] != b"data" {
        return Err(AssistError::WavDecode {
            message: "missing data sub-chunk".to_string(),
        });
    }
    let data_size = read_u32(bytes, 40) as usize;
    if bytes.len() < HEADER_LEN + data_size {
        return Err(AssistError::WavDecode {
            message: format!(
                "data chunk declares {} bytes but only {} present",
                data_size,
                bytes.len() - HEADER_LEN
            ),
        });
    }

    let spec = WavSpec {
        sample_rate,
        bits_per_sample,
        channels,
    };
    Ok((spec, bytes[HEADER_LEN..HEADER_LEN + data_size].to_vec()))
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_empty_payload_is_44_bytes() {
        let wav = encode(&[], WavSpec::default());
        assert_eq!(wav.len(), HEADER_LEN);

        let (spec, pcm) = decode(&wav).unwrap();
        assert_eq!(spec, WavSpec::default());
        assert!(pcm.is_empty());
        // data sub-chunk size field
        assert_eq!(&wav[40..44], &0u32.to_le_bytes());
    }

    #[test]
    fn test_round_trip_is_byte_exact() {
        for len in [1usize, 2, 3, 100, 4097] {
            let pcm: Vec<u8> = (0..len).map(|i| (i * 31 % 256) as u8).collect();
            let wav = encode(&pcm, WavSpec::default());
            let (spec, decoded) = decode(&wav).unwrap();
            assert_eq!(decoded, pcm, "payload mismatch at len {}", len);
            assert_eq!(spec.sample_rate, 16000);
            assert_eq!(spec.bits_per_sample, 16);
            assert_eq!(spec.channels, 1);
        }
    }

    #[test]
    fn test_header_fields_exact() {
        let pcm = vec![0u8; 3200]; // 100ms at 16kHz mono 16-bit
        let wav = encode(&pcm, WavSpec::default());

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[4..8], &(36u32 + 3200).to_le_bytes());
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[16..20], &16u32.to_le_bytes());
        assert_eq!(&wav[20..22], &1u16.to_le_bytes());
        assert_eq!(&wav[22..24], &1u16.to_le_bytes());
        assert_eq!(&wav[24..28], &16000u32.to_le_bytes());
        assert_eq!(&wav[28..32], &32000u32.to_le_bytes()); // byte rate
        assert_eq!(&wav[32..34], &2u16.to_le_bytes()); // block align
        assert_eq!(&wav[34..36], &16u16.to_le_bytes());
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(&wav[40..44], &3200u32.to_le_bytes());
        assert_eq!(wav.len(), HEADER_LEN + 3200);
    }

    #[test]
    fn test_encode_samples_little_endian() {
        let wav = encode_samples(&[0x0102i16, -2], WavSpec::default());
        let (_, pcm) = decode(&wav).unwrap();
        assert_eq!(pcm, vec![0x02, 0x01, 0xFE, 0xFF]);
    }

    #[test]
    fn test_hound_accepts_our_encoding() {
        // Cross-check against an independent WAV implementation.
        let samples: Vec<i16> = (0..320).map(|i| (i * 7 - 500) as i16).collect();
        let wav = encode_samples(&samples, WavSpec::default());

        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let decoded: Vec<i16> = reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_decode_rejects_short_input() {
        let result = decode(&[0u8; 10]);
        assert!(result.is_err());
        match result {
            Err(AssistError::WavDecode { message }) => {
                assert!(message.contains("too short"));
            }
            _ => panic!("Expected WavDecode error"),
        }
    }

    #[test]
    fn test_decode_rejects_missing_riff() {
        let mut wav = encode(&[1, 2, 3, 4], WavSpec::default());
        wav[0] = b'X';
        assert!(decode(&wav).is_err());
    }

    #[test]
    fn test_decode_rejects_non_pcm_format_tag() {
        let mut wav = encode(&[1, 2, 3, 4], WavSpec::default());
        wav[20] = 3; // IEEE float tag
        assert!(decode(&wav).is_err());
    }

    #[test]
    fn test_decode_rejects_truncated_data() {
        let mut wav = encode(&vec![9u8; 100], WavSpec::default());
        wav.truncate(wav.len() - 10);
        let result = decode(&wav);
        assert!(result.is_err());
        match result {
            Err(AssistError::WavDecode { message }) => {
                assert!(message.contains("declares"));
            }
            _ => panic!("Expected WavDecode error"),
        }
    }

    #[test]
    fn test_decode_rejects_inconsistent_byte_rate() {
        let mut wav = encode(&[1, 2], WavSpec::default());
        wav[28..32].copy_from_slice(&999u32.to_le_bytes());
        assert!(decode(&wav).is_err());
    }

    #[test]
    fn test_decode_rejects_zero_channels() {
        let mut wav = encode(&[1, 2], WavSpec::default());
        wav[22..24].copy_from_slice(&0u16.to_le_bytes());
        assert!(decode(&wav).is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let garbage: Vec<u8> = (0..500).map(|i| ((i * 17 + 42) % 256) as u8).collect();
        assert!(decode(&garbage).is_err());
    }

    #[test]
    fn test_non_default_spec_round_trip() {
        let spec = WavSpec {
            sample_rate: 8000,
            bits_per_sample: 16,
            channels: 2,
        };
        let pcm = vec![7u8; 64];
        let (decoded_spec, decoded_pcm) = decode(&encode(&pcm, spec)).unwrap();
        assert_eq!(decoded_spec, spec);
        assert_eq!(decoded_pcm, pcm);
    }
}
