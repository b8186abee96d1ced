pub mod channel_merger;
pub mod chunk_buffer;
pub mod format_negotiator;
