pub mod acquisition;
pub mod recorder;
pub mod resources;
pub mod stream_mixer;

#[cfg(test)]
mod fakes;
