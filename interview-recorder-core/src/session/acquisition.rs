use crate::models::error::CaptureError;
use crate::models::media_stream::MediaStream;
use crate::models::mode::CaptureMode;
use crate::traits::media_devices::DisplayMediaOptions;
use crate::traits::platform::CapturePlatform;

use super::resources::SessionResources;
use super::stream_mixer;

/// Streams resolved for one capture mode.
#[derive(Debug, Clone)]
pub enum AcquiredSource {
    Microphone(MediaStream),
    SharedTab(MediaStream),
    /// Raw inputs plus the graph's stereo output. The graph itself is
    /// owned by the session's resource registry.
    Mixed {
        microphone: MediaStream,
        shared_tab: MediaStream,
        output: MediaStream,
    },
}

impl AcquiredSource {
    pub fn mode(&self) -> CaptureMode {
        match self {
            Self::Microphone(_) => CaptureMode::Microphone,
            Self::SharedTab(_) => CaptureMode::SharedTab,
            Self::Mixed { .. } => CaptureMode::Mixed,
        }
    }

    /// The stream handed to the encoder.
    pub fn recording_stream(&self) -> &MediaStream {
        match self {
            Self::Microphone(stream) | Self::SharedTab(stream) => stream,
            Self::Mixed { output, .. } => output,
        }
    }
}

/// Resolve `mode` to a recordable stream.
///
/// Every raw stream is registered in `resources` as soon as it is obtained,
/// so a later failure in the same attempt still gets it closed at teardown.
/// A tab share without audio is stopped on the spot and never registered.
pub fn acquire(
    mode: CaptureMode,
    platform: &dyn CapturePlatform,
    resources: &mut SessionResources,
) -> Result<AcquiredSource, CaptureError> {
    let devices = platform.media_devices();

    match mode {
        CaptureMode::Microphone => {
            let stream = devices.request_microphone()?;
            resources.register_stream(stream.clone());
            Ok(AcquiredSource::Microphone(stream))
        }
        CaptureMode::SharedTab => {
            let stream = devices.request_display(DisplayMediaOptions::default())?;
            resources.register_stream(stream.clone());
            if !stream.has_audio() {
                log::warn!("Shared tab {} carries no audio track; recording video only", stream.id());
            }
            Ok(AcquiredSource::SharedTab(stream))
        }
        CaptureMode::Mixed => {
            let microphone = devices.request_microphone()?;
            resources.register_stream(microphone.clone());

            let shared_tab = devices.request_display(DisplayMediaOptions::default())?;
            if !shared_tab.has_audio() {
                let stopped = shared_tab.stop_all_tracks();
                log::warn!(
                    "Shared tab {} has no audio track; stopped {} track(s)",
                    shared_tab.id(),
                    stopped
                );
                return Err(CaptureError::SharedAudioNotEnabled);
            }
            resources.register_stream(shared_tab.clone());

            let graph = stream_mixer::mix(platform.audio_contexts(), &microphone, &shared_tab)?;
            let output = graph.output_stream().clone();
            resources.attach_graph(graph);

            Ok(AcquiredSource::Mixed {
                microphone,
                shared_tab,
                output,
            })
        }
    }
}
