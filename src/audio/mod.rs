//! Audio input, voice activity segmentation and WAV encoding.

pub mod segmenter;
pub mod source;
pub mod wav;
