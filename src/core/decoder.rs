// src/core/decoder.rs
//
// File decoding into stereo frames for playback through the scope.
// Uses Symphonia for format-agnostic decoding.

use anyhow::{bail, Context, Result};
use log::debug;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use std::fs::File;
use std::path::Path;

use super::frame::{frames_from_interleaved, StereoSample};

/// A decoded file reduced to stereo
#[derive(Debug, Clone)]
pub struct DecodedClip {
    pub frames: Vec<StereoSample>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the source file (before reduction to stereo)
    pub channels: usize,
    pub duration_secs: f64,
    pub codec_name: String,
}

/// Decode an audio file to stereo frames.
///
/// Mono files are duplicated to both channels; channels beyond the first
/// two are ignored.
pub fn decode_stereo(path: &Path) -> Result<DecodedClip> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe file format - may be corrupted or unsupported")?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No supported audio track found in file")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("File does not specify sample rate")?;
    let codec_name = format!("{:?}", track.codec_params.codec);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder for audio codec")?;

    let mut frames: Vec<StereoSample> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut channels = 0usize;

    loop {
        let packet = match probed.format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(buf) => buf,
            Err(SymphoniaError::DecodeError(msg)) => {
                debug!("skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            channels = spec.channels.count();
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            frames.extend(frames_from_interleaved(buf.samples(), channels));
        }
    }

    if channels == 0 {
        bail!("File reports 0 audio channels");
    }
    if frames.is_empty() {
        bail!("No audio samples decoded from file");
    }

    let duration_secs = frames.len() as f64 / sample_rate as f64;
    debug!(
        "decoded {}: {} frames, {} Hz, {} ch, {}",
        path.display(),
        frames.len(),
        sample_rate,
        channels,
        codec_name
    );

    Ok(DecodedClip {
        frames,
        sample_rate,
        channels,
        duration_secs,
        codec_name,
    })
}
