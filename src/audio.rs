//! Alarm playback for session completion.

use rodio::source::{SineWave, Source};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Frequencies of the three chime notes (C5, E5, G5).
const CHIME_NOTES: [f32; 3] = [523.25, 659.25, 783.99];

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to initialize audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("Failed to play audio: {0}")]
    Play(#[from] rodio::PlayError),
}

pub struct AudioPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    volume: f32,
}

impl AudioPlayer {
    /// Opens the default output device. `volume` is clamped to 0.0..=1.0.
    pub fn new(volume: f32) -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
            volume: clamp_volume(volume),
        })
    }

    /// Plays the completion alarm without blocking.
    pub fn play_alarm(&self) {
        if let Err(e) = self.play_chime() {
            warn!("Failed to play alarm: {}", e);
        }
    }

    /// A rising three-note chime, played twice.
    fn play_chime(&self) -> Result<(), AudioError> {
        let sink = Sink::try_new(&self.handle)?;
        let gain = 0.3 * self.volume;

        for _ in 0..2 {
            for freq in CHIME_NOTES {
                let note = SineWave::new(freq)
                    .take_duration(Duration::from_millis(180))
                    .amplify(gain);
                sink.append(note);
            }
            let silence =
                rodio::source::Zero::<f32>::new(1, 44100).take_duration(Duration::from_millis(250));
            sink.append(silence);
        }
        sink.detach();

        Ok(())
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return 0.0;
    }
    volume.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_volume() {
        assert_eq!(clamp_volume(0.7), 0.7);
        assert_eq!(clamp_volume(-1.0), 0.0);
        assert_eq!(clamp_volume(3.0), 1.0);
        assert_eq!(clamp_volume(f32::NAN), 0.0);
    }

    #[test]
    #[ignore = "Requires an audio output device"]
    fn test_audio_player_plays_alarm() {
        let player = AudioPlayer::new(0.5).unwrap();
        player.play_alarm();
    }
}
