/// Sample-level 2-input channel merger, for hosts that render their own
/// audio graph.
///
/// Each input is downmixed to mono and brought to the merger's rate by its
/// own [`InputResampler`]; input 0 becomes the left channel and input 1 the
/// right channel. Inputs are never summed across channels.
#[derive(Debug, Clone)]
pub struct ChannelMerger {
    pub target_sample_rate: f64,
}

impl ChannelMerger {
    pub fn new(target_sample_rate: f64) -> Self {
        Self { target_sample_rate }
    }

    /// Interleave `left` and `right` mono buffers into `[L0, R0, L1, R1, ...]`.
    ///
    /// A shorter input is padded with silence.
    pub fn merge(&self, left: &[f32], right: &[f32]) -> Vec<f32> {
        let frame_count = left.len().max(right.len());
        let at = |input: &[f32], i: usize| input.get(i).copied().unwrap_or(0.0);
        (0..frame_count).flat_map(|i| [at(left, i), at(right, i)]).collect()
    }

    /// Resampler feeding one merger input from a source at `source_sample_rate`.
    pub fn resampler(&self, source_sample_rate: f64) -> InputResampler {
        InputResampler::new(source_sample_rate, self.target_sample_rate)
    }
}

/// Streaming linear-interpolation resampler for one mono input.
///
/// Output frame `n` is read at source position `n * source_rate / target_rate`,
/// computed from the total output count so repeated small renders neither
/// drift nor restart interpolation at chunk boundaries. Source samples are
/// kept until no future output frame can read them.
#[derive(Debug, Clone)]
pub struct InputResampler {
    step: f64,
    frames_out: u64,
    history: Vec<f32>,
    history_start: u64,
}

impl InputResampler {
    pub fn new(source_sample_rate: f64, target_sample_rate: f64) -> Self {
        Self {
            step: source_sample_rate / target_sample_rate,
            frames_out: 0,
            history: Vec::new(),
            history_start: 0,
        }
    }

    fn position(&self, frame: u64) -> f64 {
        frame as f64 * self.step
    }

    /// Source frames that must be pushed before `frames` more output frames
    /// can be produced.
    pub fn source_frames_needed(&self, frames: usize) -> usize {
        if frames == 0 {
            return 0;
        }
        let last = self.position(self.frames_out + frames as u64 - 1);
        let needed_end = last.floor() as u64 + 2;
        let have_end = self.history_start + self.history.len() as u64;
        needed_end.saturating_sub(have_end) as usize
    }

    /// Append mono source samples in arrival order.
    pub fn push(&mut self, samples: &[f32]) {
        self.history.extend_from_slice(samples);
    }

    /// Produce `frames` output frames. Missing source samples read as silence.
    pub fn produce(&mut self, frames: usize) -> Vec<f32> {
        let sample = |history: &[f32], index: i64| {
            usize::try_from(index)
                .ok()
                .and_then(|i| history.get(i).copied())
                .unwrap_or(0.0)
        };

        let output = (0..frames as u64)
            .map(|n| {
                let position = self.position(self.frames_out + n);
                let base = position.floor();
                let fraction = (position - base) as f32;
                let index = base as i64 - self.history_start as i64;
                let a = sample(&self.history, index);
                if fraction == 0.0 {
                    a
                } else {
                    a + (sample(&self.history, index + 1) - a) * fraction
                }
            })
            .collect();

        self.frames_out += frames as u64;
        let keep_from = self.position(self.frames_out).floor() as u64;
        let consumed = (keep_from.saturating_sub(self.history_start) as usize).min(self.history.len());
        self.history.drain(..consumed);
        self.history_start += consumed as u64;
        output
    }
}

/// Downmix interleaved multi-channel audio to mono by averaging channels per frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

/// Quantize `[-1.0, 1.0]` samples to 16-bit little-endian PCM, rounding to
/// the nearest step. Out-of-range input saturates.
pub fn convert_to_int16_pcm(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)
        .flat_map(i16::to_le_bytes)
        .collect()
}
