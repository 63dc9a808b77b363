//! Synthesized speech: base64 little-endian 16-bit PCM, mono, 24 kHz.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::info;

use crate::error::AudioError;

pub const SAMPLE_RATE: u32 = 24_000;
pub const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const WAV_HEADER_LEN: usize = 44;

#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Decode the payload the speech model returns.
pub fn decode_pcm_base64(payload: &str) -> Result<PcmAudio, AudioError> {
    let bytes = STANDARD.decode(payload.trim())?;
    if bytes.is_empty() {
        return Err(AudioError::Empty);
    }
    if bytes.len() % 2 != 0 {
        return Err(AudioError::OddByteLength(bytes.len()));
    }
    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Ok(PcmAudio {
        samples,
        sample_rate: SAMPLE_RATE,
        channels: CHANNELS,
    })
}

impl PcmAudio {
    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() as u64 / u64::from(self.channels.max(1));
        Duration::from_millis(frames * 1000 / u64::from(self.sample_rate.max(1)))
    }

    /// Samples scaled into `[-1.0, 1.0)`.
    pub fn to_f32_frames(&self) -> Vec<f32> {
        self.samples
            .iter()
            .map(|&sample| f32::from(sample) / 32768.0)
            .collect()
    }

    /// Canonical 44-byte RIFF header followed by the raw samples.
    pub fn to_wav_bytes(&self) -> Vec<u8> {
        let data_len = (self.samples.len() * 2) as u32;
        let block_align = self.channels * (BITS_PER_SAMPLE / 8);
        let byte_rate = self.sample_rate * u32::from(block_align);

        let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for sample in &self.samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    /// Write the audio as `<dir>/<name>.wav`.
    pub fn write_wav(&self, dir: &Path, name: &str) -> Result<PathBuf, AudioError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{name}.wav"));
        std::fs::write(&path, self.to_wav_bytes())?;
        Ok(path)
    }
}

/// Speech handed to an output. Dropping the handle stops audio that this
/// process is playing itself.
#[derive(Debug)]
pub struct Playback {
    label: String,
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Playback {
    /// Audio owned by another program; there is nothing to stop.
    #[cfg_attr(feature = "playback", allow(dead_code))]
    fn detached(label: String) -> Self {
        Self {
            label,
            stop: None,
            worker: None,
        }
    }

    /// Run `work` on the playback thread. It must return once the receiver
    /// yields a message or disconnects.
    #[cfg(any(feature = "playback", test))]
    pub(crate) fn spawn<F>(label: String, work: F) -> Result<Self, AudioError>
    where
        F: FnOnce(std::sync::mpsc::Receiver<()>) + Send + 'static,
    {
        let (stop, stopped) = std::sync::mpsc::channel();
        let worker = std::thread::Builder::new()
            .name("speech-playback".to_string())
            .spawn(move || work(stopped))?;
        Ok(Self {
            label,
            stop: Some(stop),
            worker: Some(worker),
        })
    }

    /// Status line describing where the audio went.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// True while the playback thread is still running.
    pub fn is_playing(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
            info!("speech playback stopped");
        }
    }
}

/// Play through the default output device on a dedicated thread.
#[cfg(feature = "playback")]
pub fn play(audio: PcmAudio, _scratch_dir: &Path) -> Result<Playback, AudioError> {
    use std::sync::mpsc::RecvTimeoutError;

    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, Sink};

    const POLL: Duration = Duration::from_millis(100);

    let duration = audio.duration();
    let label = format!("Playing ({}s)", duration.as_secs());
    let playback = Playback::spawn(label, move |stopped| {
        let Ok((_stream, handle)) = OutputStream::try_default() else {
            tracing::warn!("no audio output device available");
            return;
        };
        let Ok(sink) = Sink::try_new(&handle) else {
            tracing::warn!("failed to create audio sink");
            return;
        };
        sink.append(SamplesBuffer::new(
            audio.channels,
            audio.sample_rate,
            audio.to_f32_frames(),
        ));
        while !sink.empty() {
            match stopped.recv_timeout(POLL) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    sink.stop();
                    break;
                }
            }
        }
    })?;
    info!(seconds = duration.as_secs(), "speech playback started");
    Ok(playback)
}

/// Hand the audio to the system player as a WAV file. The player runs on its
/// own, so the returned handle cannot stop it.
#[cfg(not(feature = "playback"))]
pub fn play(audio: PcmAudio, scratch_dir: &Path) -> Result<Playback, AudioError> {
    let path = audio.write_wav(scratch_dir, "speech")?;
    open::that_detached(&path)?;
    info!(path = %path.display(), "speech handed to system player");
    Ok(Playback::detached(format!("Opened {}", path.display())))
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;

    fn encode(samples: &[i16]) -> String {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        STANDARD.encode(bytes)
    }

    #[test]
    fn decodes_little_endian_samples() {
        let audio = decode_pcm_base64(&encode(&[0, 1, -1, i16::MAX, i16::MIN])).unwrap();
        assert_eq!(audio.samples, vec![0, 1, -1, i16::MAX, i16::MIN]);
        assert_eq!(audio.sample_rate, 24_000);
        assert_eq!(audio.channels, 1);
    }

    #[test]
    fn rejects_bad_payloads() {
        assert!(matches!(decode_pcm_base64("@@@"), Err(AudioError::Base64(_))));
        assert!(matches!(decode_pcm_base64(""), Err(AudioError::Empty)));
        let odd = STANDARD.encode([1u8, 2, 3]);
        assert!(matches!(decode_pcm_base64(&odd), Err(AudioError::OddByteLength(3))));
    }

    #[test]
    fn float_frames_are_scaled() {
        let audio = decode_pcm_base64(&encode(&[i16::MIN, 0, 16384])).unwrap();
        assert_eq!(audio.to_f32_frames(), vec![-1.0, 0.0, 0.5]);
    }

    #[test]
    fn duration_follows_sample_rate() {
        let audio = PcmAudio {
            samples: vec![0; 36_000],
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
        };
        assert_eq!(audio.duration(), Duration::from_millis(1500));
    }

    #[test]
    fn wav_header_describes_payload() {
        let audio = decode_pcm_base64(&encode(&[1, 2, 3])).unwrap();
        let wav = audio.to_wav_bytes();
        assert_eq!(wav.len(), 44 + 6);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 24_000);
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
        assert_eq!(&wav[44..], &[1, 0, 2, 0, 3, 0]);
    }

    #[test]
    fn writes_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let audio = decode_pcm_base64(&encode(&[5, 6])).unwrap();
        let path = audio.write_wav(dir.path(), "speech").unwrap();
        assert_eq!(std::fs::read(path).unwrap().len(), 48);
    }

    #[test]
    fn stop_ends_the_playback_thread() {
        let mut playback = Playback::spawn("Playing (3s)".into(), |stopped| {
            let _ = stopped.recv();
        })
        .unwrap();
        assert!(playback.is_playing());
        assert_eq!(playback.label(), "Playing (3s)");

        playback.stop();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while playback.is_playing() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!playback.is_playing());
    }

    #[test]
    fn dropping_the_handle_stops_audio() {
        let (done, finished) = mpsc::channel();
        let playback = Playback::spawn("Playing (3s)".into(), move |stopped| {
            let _ = stopped.recv();
            let _ = done.send(());
        })
        .unwrap();

        drop(playback);

        assert!(finished.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn detached_audio_is_not_tracked() {
        let mut playback = Playback::detached("Opened speech.wav".into());
        assert!(!playback.is_playing());
        playback.stop();
    }
}
