//! Core scope pipeline: frames, analysis, gain, rendering and sources

pub mod analysis;
pub mod decoder;
pub mod dsp;
pub mod engine;
pub mod frame;
pub mod gain;
pub mod scheduler;
pub mod source;
pub mod visualization;
pub mod window;

pub use analysis::{FieldPoint, PeakTracker};
pub use decoder::{decode_stereo, DecodedClip};
pub use engine::{ScopeFrame, VisualizationEngine};
pub use frame::{Frame, StereoSample};
pub use gain::GainController;
pub use scheduler::{TickStats, Ticker};
pub use source::{
    AudioSource, BlockHandoff, ClipSource, HandoffReceiver, LiveSource, NullSource,
    PlaybackDriver, StreamSource, ToneKind, ToneSpec, ToneStream,
};
pub use visualization::{render_overlay, DensityAccumulator};
pub use window::SampleWindow;
