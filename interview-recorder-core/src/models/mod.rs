pub mod artifact;
pub mod config;
pub mod encoding;
pub mod error;
pub mod media_stream;
pub mod mode;
pub mod state;
