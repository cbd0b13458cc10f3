use crate::infrastructure::audio::AudioError;
use std::fs::File;
use std::path::Path;
use symphonia::{
    core::{
        audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
        io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
    },
    default::{get_codecs, get_probe},
};

/// A fully decoded, mono f32 loop ready for the output stream.
#[derive(Debug, Clone)]
pub struct DecodedLoop {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedLoop {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file into a mono f32 buffer.
///
/// Any container/codec symphonia can probe is accepted. Multi-channel
/// content is downmixed to mono; the pan stage re-spreads it to stereo.
pub fn load_loop(path: &Path) -> Result<DecodedLoop, AudioError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(format!("failed to probe audio format: {e:?}")))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| AudioError::Decode("no default audio track found".to_string()))?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioError::Decode("sample rate not found".to_string()))?;
    let channels = track
        .codec_params
        .channels
        .ok_or_else(|| AudioError::Decode("channel count not found".to_string()))?
        .count();
    let track_id = track.id;

    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(format!("failed to create decoder: {e:?}")))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(_)) => break, // end-of-file
            Err(e) => {
                return Err(AudioError::Decode(format!("error reading packet: {e:?}")));
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(Error::IoError(_)) => break, // also EOF in some formats
            Err(Error::DecodeError(_)) => continue, // recoverable corruption
            Err(e) => {
                return Err(AudioError::Decode(format!("error decoding packet: {e:?}")));
            }
        };

        let spec = *decoded.spec();
        let capacity = decoded.capacity();
        let mut tmp = SampleBuffer::<f32>::new(capacity as u64, spec);
        tmp.copy_interleaved_ref(decoded);

        if channels <= 1 {
            samples.extend_from_slice(tmp.samples());
        } else {
            samples.extend(tmp.samples().chunks(channels).map(|frame| {
                let sum: f32 = frame.iter().sum();
                sum / channels as f32
            }));
        }
    }

    if samples.is_empty() {
        return Err(AudioError::Decode(format!(
            "no audio frames decoded from {}",
            path.display()
        )));
    }

    Ok(DecodedLoop {
        samples,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_loop(Path::new("does/not/exist.wav")).unwrap_err();
        assert!(matches!(err, AudioError::Io(_)));
    }

    #[test]
    fn decoded_loop_duration() {
        let decoded = DecodedLoop {
            samples: vec![0.0; 48_000],
            sample_rate: 48_000,
        };
        assert!((decoded.duration_secs() - 1.0).abs() < 1e-9);
    }
}
