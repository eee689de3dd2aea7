//! Audio effect executor backed by rodio
//!
//! The output stream handle is obtained from a dedicated thread that owns the
//! device stream for the process lifetime; sinks created from the handle are
//! freely shareable across the tokio runtime. Seeking is implemented by
//! rebuilding the countdown sink with the in-memory track sliced at the
//! requested offset, so any decodable asset (or the synthesized fallback)
//! supports play/pause/seek uniformly.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::Context;
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, info, warn};

use crate::config::Config;
use super::cues::{swallow_playback_error, CueSink, SilentCueSink, CUE_WINDOW_SECS};

const SYNTH_SAMPLE_RATE: u32 = 44_100;
const COUNTDOWN_VOLUME: f32 = 0.5;
const END_VOLUME: f32 = 0.3;

/// A decoded cue track held in memory so playback can start at any offset
#[derive(Clone)]
pub struct CueTrack {
    samples: Arc<Vec<f32>>,
    channels: u16,
    sample_rate: u32,
}

impl CueTrack {
    /// Decode an audio file into memory
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open cue track {}", path.display()))?;
        let decoder = Decoder::new(BufReader::new(file))
            .with_context(|| format!("Failed to decode cue track {}", path.display()))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.convert_samples().collect();
        Ok(Self {
            samples: Arc::new(samples),
            channels,
            sample_rate,
        })
    }

    /// Synthesized countdown track: one short beep at each second of the cue
    /// window
    pub fn synth_countdown() -> Self {
        let mut samples = Vec::with_capacity((CUE_WINDOW_SECS as usize) * SYNTH_SAMPLE_RATE as usize);
        for _ in 0..CUE_WINDOW_SECS {
            append_tone(&mut samples, 880.0, 0.15);
            append_silence(&mut samples, 0.85);
        }
        Self::mono(samples)
    }

    /// Synthesized end alert: a two-tone buzzer
    pub fn synth_end_alert() -> Self {
        let mut samples = Vec::new();
        for _ in 0..3 {
            append_tone(&mut samples, 660.0, 0.25);
            append_tone(&mut samples, 880.0, 0.25);
        }
        Self::mono(samples)
    }

    fn mono(samples: Vec<f32>) -> Self {
        Self {
            samples: Arc::new(samples),
            channels: 1,
            sample_rate: SYNTH_SAMPLE_RATE,
        }
    }

    /// Build a playable source starting `offset_seconds` into the track
    fn source_from(&self, offset_seconds: u64) -> SamplesBuffer<f32> {
        let skip = (offset_seconds * self.sample_rate as u64 * self.channels as u64) as usize;
        let tail = self.samples.get(skip..).unwrap_or(&[]).to_vec();
        SamplesBuffer::new(self.channels, self.sample_rate, tail)
    }

    pub fn duration_seconds(&self) -> u64 {
        let frames = self.samples.len() as u64 / self.channels.max(1) as u64;
        frames / self.sample_rate.max(1) as u64
    }
}

fn sample_count(seconds: f32) -> usize {
    (SYNTH_SAMPLE_RATE as f64 * seconds as f64).round() as usize
}

fn append_tone(samples: &mut Vec<f32>, frequency: f32, seconds: f32) {
    for i in 0..sample_count(seconds) {
        let t = i as f32 / SYNTH_SAMPLE_RATE as f32;
        // short linear attack/release envelope to avoid clicks
        let envelope = if t < 0.01 {
            t / 0.01
        } else if t > seconds - 0.01 {
            (seconds - t).max(0.0) / 0.01
        } else {
            1.0
        };
        samples.push((t * frequency * 2.0 * std::f32::consts::PI).sin() * 0.4 * envelope);
    }
}

fn append_silence(samples: &mut Vec<f32>, seconds: f32) {
    samples.extend(std::iter::repeat(0.0).take(sample_count(seconds)));
}

/// Cue sink playing through the system audio device
pub struct RodioCuePlayer {
    handle: OutputStreamHandle,
    countdown: CueTrack,
    end_alert: CueTrack,
    countdown_sink: Option<Sink>,
}

impl RodioCuePlayer {
    /// Open the default audio device and prepare both cue tracks
    ///
    /// Returns `None` when no output device is available.
    pub fn start(countdown: CueTrack, end_alert: CueTrack) -> Option<Self> {
        let handle = spawn_output_thread()?;
        Some(Self {
            handle,
            countdown,
            end_alert,
            countdown_sink: None,
        })
    }
}

/// The cpal stream inside `OutputStream` is not `Send`, so a dedicated thread
/// owns it for the process lifetime and hands back the shareable handle.
fn spawn_output_thread() -> Option<OutputStreamHandle> {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("audio-output".to_string())
        .spawn(move || {
            let _stream = match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    let _ = tx.send(Some(handle));
                    stream
                }
                Err(e) => {
                    swallow_playback_error("Opening audio output device", e);
                    let _ = tx.send(None);
                    return;
                }
            };
            loop {
                thread::park();
            }
        });
    if let Err(e) = spawned {
        swallow_playback_error("Spawning audio output thread", e);
        return None;
    }
    rx.recv().ok().flatten()
}

impl CueSink for RodioCuePlayer {
    fn play_countdown_from(&mut self, offset_seconds: u64) {
        // dropping the previous sink stops whatever it was playing
        self.countdown_sink = None;
        match Sink::try_new(&self.handle) {
            Ok(sink) => {
                sink.set_volume(COUNTDOWN_VOLUME);
                sink.append(self.countdown.source_from(offset_seconds));
                self.countdown_sink = Some(sink);
            }
            Err(e) => swallow_playback_error("Countdown cue playback", e),
        }
    }

    fn pause_countdown(&mut self) {
        if let Some(sink) = &self.countdown_sink {
            sink.pause();
        }
    }

    fn resume_countdown(&mut self) {
        if let Some(sink) = &self.countdown_sink {
            sink.play();
        }
    }

    fn play_end_cue(&mut self) {
        match Sink::try_new(&self.handle) {
            Ok(sink) => {
                sink.set_volume(END_VOLUME);
                sink.append(self.end_alert.source_from(0));
                // one-shot, runs to completion on its own
                sink.detach();
            }
            Err(e) => swallow_playback_error("End cue playback", e),
        }
    }

    fn stop_and_rewind(&mut self) {
        self.countdown_sink = None;
    }
}

/// Load a cue track, falling back to a synthesized one when the asset is
/// missing or undecodable
fn load_or_synth(path: &Path, what: &str, fallback: fn() -> CueTrack) -> CueTrack {
    match CueTrack::load(path) {
        Ok(track) => {
            debug!("Loaded {} track from {}", what, path.display());
            track
        }
        Err(e) => {
            warn!("Using synthesized {} track: {:#}", what, e);
            fallback()
        }
    }
}

/// Build the cue sink for the configured audio setup
///
/// Muted configs and missing devices both degrade to the silent sink; the
/// countdown itself never depends on audio being available.
pub fn build_cue_sink(config: &Config) -> Box<dyn CueSink> {
    if config.muted {
        info!("Audio muted by configuration");
        return Box::new(SilentCueSink);
    }
    let countdown = load_or_synth(&config.countdown_cue, "countdown cue", CueTrack::synth_countdown);
    let end_alert = load_or_synth(&config.end_cue, "end alert", CueTrack::synth_end_alert);
    match RodioCuePlayer::start(countdown, end_alert) {
        Some(player) => Box::new(player),
        None => {
            warn!("Audio device unavailable, countdown will run silently");
            Box::new(SilentCueSink)
        }
    }
}
