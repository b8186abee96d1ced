pub mod audio_graph;
pub mod media_devices;
pub mod media_encoder;
pub mod media_track;
pub mod object_urls;
pub mod platform;
pub mod recorder_delegate;
