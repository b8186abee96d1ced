//! # interview-recorder-synthetic
//!
//! Deterministic in-process host for `interview-recorder-core`.
//!
//! Plugs tone-generator capture devices, an audio graph that really renders
//! a 2-input channel merger, a chunked PCM16 WAV encoder and an in-memory
//! object URL table into `RecorderSession`. Audio only moves when the caller
//! calls [`SyntheticHost::advance`], unless realtime encoding is enabled.
//!
//! ```text
//! SyntheticHost (CapturePlatform)
//! ├── SyntheticDevices              ← microphone + display share (tones)
//! ├── SyntheticAudioContextFactory  ← source / merger / destination nodes
//! ├── SyntheticEncoderFactory       ← streamed WAV chunks
//! └── InMemoryObjectUrls            ← blob: URLs
//! ```

mod devices;
mod encoder;
mod graph;
mod host;
mod object_urls;
mod registry;
mod signal;
mod track;
pub mod wav;

pub use devices::{DeviceSettings, SyntheticDevices};
pub use encoder::{EncoderSettings, SyntheticEncoder, SyntheticEncoderFactory, WAV_MIME_TYPE};
pub use graph::{SyntheticAudioContext, SyntheticAudioContextFactory, SUPPORTED_MERGER_INPUTS};
pub use host::{HostSettings, SyntheticHost};
pub use object_urls::InMemoryObjectUrls;
pub use registry::ToneDevice;
pub use signal::Signal;
pub use track::SyntheticTrack;
