use super::audio_graph::AudioContextFactory;
use super::media_devices::MediaDevices;
use super::media_encoder::MediaEncoderFactory;
use super::object_urls::ObjectUrlRegistry;

/// Everything the recorder needs from the host, bundled.
///
/// Implemented once per host (browser bindings, the synthetic backend,
/// test fakes) and handed to `RecorderSession::new`.
pub trait CapturePlatform: Send + Sync {
    fn media_devices(&self) -> &dyn MediaDevices;

    fn audio_contexts(&self) -> &dyn AudioContextFactory;

    fn encoders(&self) -> &dyn MediaEncoderFactory;

    fn object_urls(&self) -> &dyn ObjectUrlRegistry;
}
