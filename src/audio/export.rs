//! Recording export.
//!
//! Writes a recorded timeline to a FLAC (default) or 16-bit PCM WAV file.
//! Audio is encoded to a hidden temporary file next to the target and
//! renamed into place only after the encoder has finished, so a failed
//! export never leaves a truncated file under the requested name.

use crate::config::ExportFormat;
use crate::error::{InstrumentError, Result};
use crate::recording::Timeline;
use flacenc::component::BitRepr;
use flacenc::error::Verify;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix of exported file names.
pub const EXPORT_PREFIX: &str = "elemental_recording";

/// Bits per exported sample.
const BITS_PER_SAMPLE: u16 = 16;

/// Builds a unique timestamped export path inside `dir`.
///
/// Names carry the time in milliseconds plus a short random tag, so two
/// saves in quick succession never share a file.
pub fn timestamped_path(dir: &Path, format: ExportFormat) -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let tag = uuid::Uuid::new_v4().simple().to_string();
    dir.join(format!(
        "{EXPORT_PREFIX}_{millis}_{}.{}",
        &tag[..8],
        format.extension()
    ))
}

/// Exports a timeline to `output_path` in the given format.
///
/// # Returns
///
/// The number of frames written.
///
/// # Errors
///
/// Returns `EmptyTimeline` (without touching the filesystem) if the timeline
/// holds no audio frames, and `EncodingFailure` if the file cannot be
/// written. On failure no file exists at `output_path` and the temporary
/// file is removed.
pub fn export_recording(
    timeline: &Timeline,
    output_path: &Path,
    format: ExportFormat,
) -> Result<usize> {
    if timeline.total_frames() == 0 {
        return Err(InstrumentError::EmptyTimeline);
    }
    let Some(first) = timeline.segments().next() else {
        return Err(InstrumentError::EmptyTimeline);
    };
    let channels = first.buffer.channels();
    let sample_rate = first.buffer.sample_rate();

    let temp_path = temp_path_for(output_path);
    let encoded = match format {
        ExportFormat::Flac => write_flac(timeline, &temp_path, channels, sample_rate),
        ExportFormat::Wav => {
            write_wav(timeline, &temp_path, channels, sample_rate).map_err(|e| e.to_string())
        }
    };
    let result = encoded.and_then(|()| fs::rename(&temp_path, output_path).map_err(|e| e.to_string()));

    match result {
        Ok(()) => {
            tracing::info!(
                "Exported {} segments ({} frames) to {}",
                timeline.len(),
                timeline.total_frames(),
                output_path.display()
            );
            Ok(timeline.total_frames())
        }
        Err(reason) => {
            // The temporary file may not exist if creation itself failed.
            let _ = fs::remove_file(&temp_path);
            Err(InstrumentError::EncodingFailure {
                path: output_path.to_path_buf(),
                reason,
            })
        }
    }
}

/// Exports a timeline as lossless FLAC.
pub fn export_to_flac(timeline: &Timeline, output_path: &Path) -> Result<usize> {
    export_recording(timeline, output_path, ExportFormat::Flac)
}

/// Exports a timeline as 16-bit PCM WAV.
pub fn export_to_wav(timeline: &Timeline, output_path: &Path) -> Result<usize> {
    export_recording(timeline, output_path, ExportFormat::Wav)
}

fn write_flac(
    timeline: &Timeline,
    path: &Path,
    channels: u16,
    sample_rate: u32,
) -> std::result::Result<(), String> {
    let samples: Vec<i32> = timeline
        .segments()
        .flat_map(|segment| segment.buffer.samples().iter().map(|&s| i32::from(s)))
        .collect();

    let config = flacenc::config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| format!("encoder configuration: {:?}", e))?;
    let source = flacenc::source::MemSource::from_samples(
        &samples,
        channels as usize,
        BITS_PER_SAMPLE as usize,
        sample_rate as usize,
    );
    let stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| format!("FLAC encoding: {:?}", e))?;

    let mut sink = flacenc::bitsink::ByteSink::new();
    stream
        .write(&mut sink)
        .map_err(|e| format!("FLAC serialization: {:?}", e))?;
    fs::write(path, sink.as_slice()).map_err(|e| e.to_string())
}

fn write_wav(timeline: &Timeline, path: &Path, channels: u16, sample_rate: u32) -> hound::Result<()> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for segment in timeline.segments() {
        for &sample in segment.buffer.samples() {
            writer.write_sample(sample)?;
        }
    }
    writer.finalize()
}

/// Hidden sibling path used while encoding.
fn temp_path_for(output_path: &Path) -> PathBuf {
    let name = output_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(EXPORT_PREFIX);
    output_path.with_file_name(format!(".{}.{}.part", name, uuid::Uuid::new_v4()))
}
