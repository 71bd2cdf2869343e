//! Local audio device I/O — microphone capture and playback.
//!
//! Capture is fixed-format: mono 44.1 kHz signed 16-bit, matching what
//! the recognition endpoint expects in the uploaded WAV. A recording
//! runs to completion once started; there is no cancellation.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;
use tracing::warn;

/// Capture sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;
/// Mono capture.
pub const CHANNELS: u16 = 1;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no default input device available")]
    NoInputDevice,

    #[error("failed to build input stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("failed to start input stream: {0}")]
    Record(#[from] cpal::PlayStreamError),

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("audio I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open output stream: {0}")]
    Output(#[from] rodio::StreamError),

    #[error("failed to create playback sink: {0}")]
    Playback(#[from] rodio::PlayError),

    #[error("failed to decode audio: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}

/// Records `duration` of audio from the default input device and returns
/// the captured samples encoded as WAV bytes.
pub fn record_wav(duration: Duration) -> Result<Vec<u8>, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(AudioError::NoInputDevice)?;

    let config = cpal::StreamConfig {
        channels: CHANNELS,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    };

    let samples: Arc<Mutex<Vec<i16>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&samples);

    let stream = device.build_input_stream(
        &config,
        move |data: &[i16], _: &cpal::InputCallbackInfo| {
            if let Ok(mut buf) = sink.lock() {
                buf.extend_from_slice(data);
            }
        },
        |err| warn!("Input stream error: {err}"),
        None,
    )?;

    stream.play()?;
    std::thread::sleep(duration);
    drop(stream);

    let captured = samples.lock().map(|buf| buf.clone()).unwrap_or_default();
    encode_wav(&captured)
}

/// Stages `samples` in a named temporary WAV file and reads the encoded
/// bytes back. The file is deleted when the handle drops, on every exit
/// path including errors.
fn encode_wav(samples: &[i16]) -> Result<Vec<u8>, AudioError> {
    let spec = hound::WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let tmp = tempfile::Builder::new().suffix(".wav").tempfile()?;
    let mut writer = hound::WavWriter::create(tmp.path(), spec)?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;

    Ok(std::fs::read(tmp.path())?)
}

/// Decodes compressed audio (MP3 from the synthesis endpoint) and plays
/// it on the default output device, returning once playback completes.
pub fn play_encoded(data: Bytes) -> Result<(), AudioError> {
    let (_stream, handle) = rodio::OutputStream::try_default()?;
    let sink = rodio::Sink::try_new(&handle)?;
    let source = rodio::Decoder::new(Cursor::new(data))?;
    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}
