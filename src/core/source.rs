// src/core/source.rs
//
// Audio sources feeding the engine: the pull capability, a lock-free block
// hand-off for threaded drivers, and the built-in sources (silence, in-memory
// clip, real-time playback, synthetic tones).

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::config::ScopeConfig;
use crate::core::frame::StereoSample;
use crate::error::{Result, ScopeError};

/// Anything the engine can pull stereo frames from.
///
/// `pull` appends between 0 and `max_frames` frames to `out` and must not
/// block. An error means "nothing this tick"; the engine carries on.
pub trait AudioSource {
    fn pull(&mut self, max_frames: usize, out: &mut Vec<StereoSample>) -> Result<()>;

    fn name(&self) -> &str;

    /// Frames lost because the consumer fell behind
    fn overruns(&self) -> u64 {
        0
    }

    /// True once the source will never yield another frame
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// The "<Not active>" device: always empty
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSource;

impl AudioSource for NullSource {
    fn pull(&mut self, _max_frames: usize, _out: &mut Vec<StereoSample>) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "<Not active>"
    }
}

/// In-memory frames pulled synchronously, for offline runs and tests
#[derive(Debug, Clone)]
pub struct ClipSource {
    name: String,
    frames: Vec<StereoSample>,
    cursor: usize,
    looping: bool,
}

impl ClipSource {
    pub fn new(name: impl Into<String>, frames: Vec<StereoSample>) -> Self {
        Self {
            name: name.into(),
            frames,
            cursor: 0,
            looping: false,
        }
    }

    /// Restart from the beginning instead of running dry
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len() - self.cursor
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl AudioSource for ClipSource {
    fn pull(&mut self, max_frames: usize, out: &mut Vec<StereoSample>) -> Result<()> {
        let mut wanted = max_frames;
        while wanted > 0 && !self.frames.is_empty() {
            if self.cursor == self.frames.len() {
                if !self.looping {
                    break;
                }
                self.cursor = 0;
            }
            let end = (self.cursor + wanted).min(self.frames.len());
            out.extend_from_slice(&self.frames[self.cursor..end]);
            wanted -= end - self.cursor;
            self.cursor = end;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_exhausted(&self) -> bool {
        !self.looping && self.cursor == self.frames.len()
    }
}

/// Frames produced on demand from an iterator, one block per pull.
/// Nothing beyond the requested block is ever buffered.
#[derive(Debug, Clone)]
pub struct StreamSource<I> {
    name: String,
    stream: I,
    exhausted: bool,
}

impl<I> StreamSource<I>
where
    I: Iterator<Item = StereoSample>,
{
    pub fn new(name: impl Into<String>, stream: I) -> Self {
        Self {
            name: name.into(),
            stream,
            exhausted: false,
        }
    }
}

impl<I> AudioSource for StreamSource<I>
where
    I: Iterator<Item = StereoSample>,
{
    fn pull(&mut self, max_frames: usize, out: &mut Vec<StereoSample>) -> Result<()> {
        if self.exhausted {
            return Ok(());
        }
        let before = out.len();
        out.extend(self.stream.by_ref().take(max_frames));
        if out.len() - before < max_frames {
            self.exhausted = true;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Producer half of the bounded single-producer/single-consumer frame queue.
///
/// Pushing never blocks. Frames that do not fit are dropped and counted.
pub struct BlockHandoff {
    producer: HeapProd<StereoSample>,
    overruns: Arc<AtomicU64>,
}

/// Consumer half of [`BlockHandoff`], owned by the engine side
pub struct HandoffReceiver {
    consumer: HeapCons<StereoSample>,
    overruns: Arc<AtomicU64>,
}

impl BlockHandoff {
    /// Create a queue holding at most `capacity` frames
    pub fn new(capacity: usize) -> (BlockHandoff, HandoffReceiver) {
        let (producer, consumer) = HeapRb::<StereoSample>::new(capacity.max(1)).split();
        let overruns = Arc::new(AtomicU64::new(0));
        (
            BlockHandoff {
                producer,
                overruns: overruns.clone(),
            },
            HandoffReceiver { consumer, overruns },
        )
    }

    /// Push a block, returning how many frames were accepted
    pub fn push(&mut self, block: &[StereoSample]) -> usize {
        let pushed = self.producer.push_slice(block);
        let dropped = block.len() - pushed;
        if dropped > 0 {
            self.overruns.fetch_add(dropped as u64, Ordering::Relaxed);
        }
        pushed
    }
}

impl HandoffReceiver {
    /// Move up to `max_frames` queued frames into `out`
    pub fn pop_into(&mut self, max_frames: usize, out: &mut Vec<StereoSample>) -> usize {
        let before = out.len();
        out.extend(self.consumer.pop_iter().take(max_frames));
        out.len() - before
    }

    pub fn available(&self) -> usize {
        self.consumer.occupied_len()
    }

    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }
}

/// Background thread pushing a frame stream into a [`BlockHandoff`] at
/// real-time pace. Dropping the driver stops and joins the thread.
pub struct PlaybackDriver {
    stop: Arc<AtomicBool>,
    completed: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PlaybackDriver {
    pub fn spawn<I>(
        stream: I,
        mut handoff: BlockHandoff,
        block_frames: usize,
        sample_rate: u32,
    ) -> Result<Self>
    where
        I: Iterator<Item = StereoSample> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let completed = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let thread_completed = completed.clone();
        let block_frames = block_frames.max(1);
        let rate = sample_rate.max(1) as f64;

        let handle = thread::Builder::new()
            .name("phasescope-playback".to_string())
            .spawn(move || {
                let mut stream = stream;
                let mut block = Vec::with_capacity(block_frames);
                let start = Instant::now();
                let mut sent: u64 = 0;

                debug!("playback thread started ({} frames per block)", block_frames);
                while !thread_stop.load(Ordering::SeqCst) {
                    block.clear();
                    block.extend(stream.by_ref().take(block_frames));
                    if block.is_empty() {
                        thread_completed.store(true, Ordering::SeqCst);
                        break;
                    }

                    let accepted = handoff.push(&block);
                    if accepted < block.len() {
                        warn!("hand-off full, dropped {} frames", block.len() - accepted);
                    }

                    sent += block.len() as u64;
                    let due = start + Duration::from_secs_f64(sent as f64 / rate);
                    let now = Instant::now();
                    if due > now {
                        thread::sleep(due - now);
                    }
                }
                debug!("playback thread stopped after {} frames", sent);
            })?;

        Ok(Self {
            stop,
            completed,
            handle: Some(handle),
        })
    }

    /// The stream ran dry
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread and wait for it. Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("playback thread panicked");
            }
        }
    }
}

impl Drop for PlaybackDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A playback driver and the engine end of its hand-off
pub struct LiveSource {
    name: String,
    driver: PlaybackDriver,
    receiver: HandoffReceiver,
}

impl LiveSource {
    /// Start real-time playback of `stream`. The hand-off holds one second of audio.
    pub fn spawn<I>(name: impl Into<String>, stream: I, config: &ScopeConfig) -> Result<Self>
    where
        I: Iterator<Item = StereoSample> + Send + 'static,
    {
        let (handoff, receiver) = BlockHandoff::new(config.sample_rate as usize);
        let driver =
            PlaybackDriver::spawn(stream, handoff, config.block_frames, config.sample_rate)?;
        let name = name.into();
        debug!("live source '{}' started", name);
        Ok(Self {
            name,
            driver,
            receiver,
        })
    }

    /// Stop the driver thread now rather than on drop
    pub fn close(&mut self) {
        self.driver.stop();
    }
}

impl AudioSource for LiveSource {
    fn pull(&mut self, max_frames: usize, out: &mut Vec<StereoSample>) -> Result<()> {
        let got = self.receiver.pop_into(max_frames, out);
        if got == 0 && !self.driver.is_running() && !self.driver.is_completed() {
            return Err(ScopeError::SourceUnavailable(format!(
                "{}: playback thread is not running",
                self.name
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn overruns(&self) -> u64 {
        self.receiver.overruns()
    }

    fn is_exhausted(&self) -> bool {
        self.driver.is_completed() && self.receiver.available() == 0
    }
}

/// Shape of a synthetic test signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneKind {
    /// Same sine on both channels
    #[default]
    InPhase,
    /// Right channel inverted
    AntiPhase,
    HardLeft,
    HardRight,
    /// Constant-power pan by [`ToneSpec::pan`]
    Panned,
    /// Independent white noise per channel
    Noise,
}

impl ToneKind {
    pub fn all() -> [ToneKind; 6] {
        [
            ToneKind::InPhase,
            ToneKind::AntiPhase,
            ToneKind::HardLeft,
            ToneKind::HardRight,
            ToneKind::Panned,
            ToneKind::Noise,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToneKind::InPhase => "in-phase",
            ToneKind::AntiPhase => "anti-phase",
            ToneKind::HardLeft => "hard-left",
            ToneKind::HardRight => "hard-right",
            ToneKind::Panned => "panned",
            ToneKind::Noise => "noise",
        }
    }
}

impl fmt::Display for ToneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ToneKind {
    type Err = ScopeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Self::all()
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| {
                ScopeError::InvalidConfig(format!(
                    "unknown tone '{}' (expected one of: {})",
                    s,
                    Self::all().map(|k| k.name()).join(", ")
                ))
            })
    }
}

/// Parameters of a synthetic stereo signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub kind: ToneKind,
    pub frequency: f32,
    pub amplitude: f32,
    /// -1 = left .. +1 = right, used by [`ToneKind::Panned`]
    pub pan: f32,
    pub sample_rate: u32,
}

impl Default for ToneSpec {
    fn default() -> Self {
        Self {
            kind: ToneKind::InPhase,
            frequency: 440.0,
            amplitude: 0.5,
            pan: 0.5,
            sample_rate: 48_000,
        }
    }
}

impl ToneSpec {
    pub fn new(kind: ToneKind, sample_rate: u32) -> Self {
        Self {
            kind,
            sample_rate,
            ..Self::default()
        }
    }

    pub fn frequency(mut self, hz: f32) -> Self {
        self.frequency = hz;
        self
    }

    pub fn amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn pan(mut self, pan: f32) -> Self {
        self.pan = pan.clamp(-1.0, 1.0);
        self
    }

    /// Endless frame stream
    pub fn stream(&self) -> ToneStream {
        ToneStream {
            spec: *self,
            index: 0,
            rng: 0x2545_F491_4F6C_DD1D,
        }
    }

    /// First `frames` frames of the stream
    pub fn generate(&self, frames: usize) -> Vec<StereoSample> {
        self.stream().take(frames).collect()
    }
}

/// Iterator over the frames of a [`ToneSpec`]
#[derive(Debug, Clone)]
pub struct ToneStream {
    spec: ToneSpec,
    index: u64,
    rng: u64,
}

impl ToneStream {
    // xorshift64*, mapped to [-1, 1)
    fn noise(&mut self) -> f32 {
        self.rng ^= self.rng >> 12;
        self.rng ^= self.rng << 25;
        self.rng ^= self.rng >> 27;
        let bits = self.rng.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 40;
        bits as f32 / (1u64 << 23) as f32 - 1.0
    }
}

impl Iterator for ToneStream {
    type Item = StereoSample;

    fn next(&mut self) -> Option<StereoSample> {
        let spec = self.spec;
        let t = self.index as f64 / spec.sample_rate.max(1) as f64;
        self.index += 1;

        let phase = (2.0 * std::f64::consts::PI * spec.frequency as f64 * t) as f32;
        let s = spec.amplitude * phase.sin();

        let sample = match spec.kind {
            ToneKind::InPhase => StereoSample::mono(s),
            ToneKind::AntiPhase => StereoSample::new(s, -s),
            ToneKind::HardLeft => StereoSample::new(s, 0.0),
            ToneKind::HardRight => StereoSample::new(0.0, s),
            ToneKind::Panned => {
                let angle = (spec.pan + 1.0) * PI / 4.0;
                StereoSample::new(s * angle.cos(), s * angle.sin())
            }
            ToneKind::Noise => {
                let left = self.noise();
                let right = self.noise();
                StereoSample::new(spec.amplitude * left, spec.amplitude * right)
            }
        };
        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_source_is_empty() {
        let mut source = NullSource;
        let mut out = Vec::new();
        source.pull(128, &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(source.name(), "<Not active>");
    }

    #[test]
    fn test_clip_source_short_reads() {
        let frames = ToneSpec::default().generate(300);
        let mut source = ClipSource::new("clip", frames.clone());
        let mut out = Vec::new();

        source.pull(128, &mut out).unwrap();
        source.pull(128, &mut out).unwrap();
        assert_eq!(out.len(), 256);
        assert!(!source.is_exhausted());

        out.clear();
        source.pull(128, &mut out).unwrap();
        assert_eq!(out.len(), 44);
        assert_eq!(out[..], frames[256..]);
        assert!(source.is_exhausted());

        out.clear();
        source.pull(128, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_clip_source_looping() {
        let frames = vec![StereoSample::mono(0.1), StereoSample::mono(0.2)];
        let mut source = ClipSource::new("loop", frames).looping(true);
        let mut out = Vec::new();
        source.pull(5, &mut out).unwrap();
        let lefts: Vec<f32> = out.iter().map(|s| s.left).collect();
        assert_eq!(lefts, vec![0.1, 0.2, 0.1, 0.2, 0.1]);
        assert!(!source.is_exhausted());
    }

    #[test]
    fn test_stream_source_pulls_lazily() {
        let spec = ToneSpec::default();
        let mut source = StreamSource::new("tone", spec.stream().take(300));
        let mut out = Vec::new();

        source.pull(128, &mut out).unwrap();
        assert_eq!(out[..], spec.generate(128)[..]);
        source.pull(128, &mut out).unwrap();
        assert!(!source.is_exhausted());

        out.clear();
        source.pull(128, &mut out).unwrap();
        assert_eq!(out.len(), 44);
        assert!(source.is_exhausted());

        out.clear();
        source.pull(128, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_endless_stream_source_never_exhausts() {
        let mut source = StreamSource::new("noise", ToneSpec::new(ToneKind::Noise, 48_000).stream());
        let mut out = Vec::new();
        for _ in 0..100 {
            out.clear();
            source.pull(128, &mut out).unwrap();
            assert_eq!(out.len(), 128);
        }
        assert!(!source.is_exhausted());
    }

    #[test]
    fn test_handoff_counts_overruns() {
        let (mut handoff, mut receiver) = BlockHandoff::new(4);
        let block = vec![StereoSample::mono(0.5); 6];
        assert_eq!(handoff.push(&block), 4);
        assert_eq!(receiver.overruns(), 2);
        assert_eq!(receiver.available(), 4);

        let mut out = Vec::new();
        assert_eq!(receiver.pop_into(3, &mut out), 3);
        assert_eq!(receiver.pop_into(3, &mut out), 1);
        assert_eq!(receiver.pop_into(3, &mut out), 0);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_tone_shapes() {
        let quarter = 48_000 / 440 / 4;
        let peak = |kind| ToneSpec::new(kind, 48_000).generate(quarter + 1)[quarter];

        let s = peak(ToneKind::InPhase);
        assert_eq!(s.left, s.right);
        assert!(s.left > 0.45);

        let s = peak(ToneKind::AntiPhase);
        assert_eq!(s.left, -s.right);

        assert_eq!(peak(ToneKind::HardLeft).right, 0.0);
        assert_eq!(peak(ToneKind::HardRight).left, 0.0);

        let s = peak(ToneKind::Panned);
        assert!(s.right > s.left);
    }

    #[test]
    fn test_noise_is_bounded_and_decorrelated() {
        let frames = ToneSpec::new(ToneKind::Noise, 48_000).generate(4096);
        assert!(frames.iter().all(|s| s.peak() <= 0.5));
        let same = frames.iter().filter(|s| s.left == s.right).count();
        assert!(same < 10);
    }

    #[test]
    fn test_tone_kind_parsing() {
        assert_eq!("in-phase".parse::<ToneKind>().unwrap(), ToneKind::InPhase);
        assert_eq!("Hard_Left".parse::<ToneKind>().unwrap(), ToneKind::HardLeft);
        assert!("sawtooth".parse::<ToneKind>().is_err());
        for kind in ToneKind::all() {
            assert_eq!(kind.to_string().parse::<ToneKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_playback_driver_delivers_and_joins() {
        let config = ScopeConfig::default();
        let stream = ToneSpec::default().generate(512).into_iter();
        let mut source = LiveSource::spawn("tone", stream, &config).unwrap();

        let mut out = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(2);
        while !source.is_exhausted() && Instant::now() < deadline {
            source.pull(128, &mut out).unwrap();
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(out.len(), 512);
        source.close();
        assert!(!source.driver.is_running());
    }
}
