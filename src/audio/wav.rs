// WAV file I/O via hound
//
// Readers accept any channel count and the common sample encodings, and hand
// back mono f32 in [-1, 1]. Multi-channel files are downmixed by averaging.

use std::path::Path;

use crate::error::AudioError;

/// Read a WAV file as mono f32 samples plus its sample rate.
pub fn read_mono(path: &Path) -> Result<(Vec<f32>, u32), AudioError> {
    let mut reader = hound::WavReader::open(path).map_err(|e| wav_err(path, e))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AudioError::Wav {
            path: path.display().to_string(),
            reason: "zero channels".into(),
        });
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| wav_err(path, e))?,
        (hound::SampleFormat::Int, bits) => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| wav_err(path, e))?
        }
        (format, bits) => {
            return Err(AudioError::Wav {
                path: path.display().to_string(),
                reason: format!("unsupported encoding: {:?} {} bit", format, bits),
            });
        }
    };

    if channels == 1 {
        return Ok((interleaved, spec.sample_rate));
    }
    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

/// Write mono samples as a 16-bit PCM WAV file.
pub fn write_mono(path: &Path, samples: &[f32], fs: u32) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: fs,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| wav_err(path, e))?;
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * i16::MAX as f32) as i16)
            .map_err(|e| wav_err(path, e))?;
    }
    writer.finalize().map_err(|e| wav_err(path, e))?;
    Ok(())
}

fn wav_err(path: &Path, err: hound::Error) -> AudioError {
    AudioError::Wav {
        path: path.display().to_string(),
        reason: format!("{}", err),
    }
}
