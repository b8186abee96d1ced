//! # interview-recorder-core
//!
//! Platform-agnostic interview recorder engine.
//!
//! Acquires microphone and/or tab-share audio, mixes them into a stereo
//! stream (microphone left, tab right), negotiates an encoding and drives
//! a chunked encoder until the caller stops it. Host capabilities (capture
//! devices, audio graph, encoder, object URLs) are injected through the
//! `CapturePlatform` trait and plug into the generic `RecorderSession`.
//!
//! ## Architecture
//!
//! ```text
//! interview-recorder-core (this crate)
//! ├── traits/       ← CapturePlatform, MediaDevices, AudioContext, MediaEncoder, ObjectUrlRegistry, RecorderDelegate
//! ├── models/       ← CaptureMode, MediaStream, CaptureError, CaptureState, RecorderConfiguration, RecordingArtifact
//! ├── processing/   ← format negotiation, ChunkBuffer, ChannelMerger
//! ├── session/      ← source acquisition, stream mixer, resource registry, RecorderSession
//! └── storage/      ← artifact + metadata sidecar persistence
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::artifact::{Blob, RecordingArtifact, RecordingMetadata};
pub use models::config::RecorderConfiguration;
pub use models::encoding::{EncodingChoice, MimeType};
pub use models::error::{CaptureDevice, CaptureError};
pub use models::media_stream::MediaStream;
pub use models::mode::CaptureMode;
pub use models::state::CaptureState;
pub use processing::channel_merger::ChannelMerger;
pub use processing::chunk_buffer::ChunkBuffer;
pub use processing::format_negotiator::pick_encoding;
pub use session::acquisition::AcquiredSource;
pub use session::recorder::RecorderSession;
pub use session::resources::{SessionResources, TeardownReport};
pub use session::stream_mixer::MixedGraph;
pub use traits::audio_graph::{AudioContext, AudioContextFactory, AudioNode, AudioNodeKind};
pub use traits::media_devices::{DisplayMediaOptions, MediaDevices};
pub use traits::media_encoder::{EncoderEvent, EncoderEventSink, EncoderOptions, MediaEncoder, MediaEncoderFactory};
pub use traits::media_track::{MediaTrack, TrackKind};
pub use traits::object_urls::ObjectUrlRegistry;
pub use traits::platform::CapturePlatform;
pub use traits::recorder_delegate::RecorderDelegate;
