//! WAV container written by the synthetic encoder.
//!
//! A recording delivered in several chunks sends its header before the
//! length is known, so the size fields carry [`STREAMING_SIZE`]. A recording
//! delivered as a single chunk gets its real sizes via [`finalize_sizes`].

/// Size of the canonical PCM header: RIFF descriptor, `fmt ` and `data` chunk headers.
pub const WAV_HEADER_SIZE: usize = 44;

/// Size value used while the length is unknown.
pub const STREAMING_SIZE: u32 = u32::MAX;

const RIFF_SIZE_OFFSET: usize = 4;
const DATA_SIZE_OFFSET: usize = 40;

/// PCM layout written into the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl PcmFormat {
    pub fn pcm16(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample: 16,
        }
    }

    pub fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

/// Header for `data_len` bytes of samples, or for a stream of unknown
/// length when `data_len` is `None`.
pub fn wav_header(format: PcmFormat, data_len: Option<u32>) -> [u8; WAV_HEADER_SIZE] {
    let mut header = [0u8; WAV_HEADER_SIZE];
    let fields: [(usize, &[u8]); 11] = [
        (0, b"RIFF"),
        (8, b"WAVE"),
        (12, b"fmt "),
        (16, &16u32.to_le_bytes()),
        (20, &1u16.to_le_bytes()),
        (22, &format.channels.to_le_bytes()),
        (24, &format.sample_rate.to_le_bytes()),
        (28, &format.byte_rate().to_le_bytes()),
        (32, &format.block_align().to_le_bytes()),
        (34, &format.bits_per_sample.to_le_bytes()),
        (36, b"data"),
    ];
    for (offset, bytes) in fields {
        header[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
    write_sizes(&mut header, data_len);
    header
}

/// Rewrite the size fields of a complete in-memory file from its length.
///
/// Does nothing if `file` is shorter than a header.
pub fn finalize_sizes(file: &mut [u8]) {
    if file.len() < WAV_HEADER_SIZE {
        return;
    }
    let data_len = u32::try_from(file.len() - WAV_HEADER_SIZE).ok();
    write_sizes(file, data_len);
}

fn write_sizes(header: &mut [u8], data_len: Option<u32>) {
    let (riff, data) = match data_len.and_then(|len| len.checked_add(36).map(|riff| (riff, len))) {
        Some(sizes) => sizes,
        None => (STREAMING_SIZE, STREAMING_SIZE),
    };
    header[RIFF_SIZE_OFFSET..RIFF_SIZE_OFFSET + 4].copy_from_slice(&riff.to_le_bytes());
    header[DATA_SIZE_OFFSET..DATA_SIZE_OFFSET + 4].copy_from_slice(&data.to_le_bytes());
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

/// 16-bit PCM audio read back from a streamed WAV payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedWav {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved samples scaled to `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
}

impl DecodedWav {
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// De-interleave one channel.
    pub fn channel(&self, index: u16) -> Vec<f32> {
        self.samples
            .iter()
            .skip(index as usize)
            .step_by(self.channels.max(1) as usize)
            .copied()
            .collect()
    }
}

/// Parse a payload produced by the synthetic encoder. Declared sizes are
/// honoured; streamed payloads run to the end.
pub fn decode_pcm16(payload: &[u8]) -> Result<DecodedWav, String> {
    if payload.len() < WAV_HEADER_SIZE {
        return Err(format!("payload too short for a WAV header: {} bytes", payload.len()));
    }
    if &payload[0..4] != b"RIFF" || &payload[8..12] != b"WAVE" || &payload[36..40] != b"data" {
        return Err("not a RIFF/WAVE payload".into());
    }
    let format = u16::from_le_bytes([payload[20], payload[21]]);
    let bit_depth = u16::from_le_bytes([payload[34], payload[35]]);
    if format != 1 || bit_depth != 16 {
        return Err(format!("unsupported format {} at {} bits", format, bit_depth));
    }

    let channels = u16::from_le_bytes([payload[22], payload[23]]);
    let sample_rate = read_u32(payload, 24);
    let body = &payload[WAV_HEADER_SIZE..];
    let body = match read_u32(payload, DATA_SIZE_OFFSET) {
        STREAMING_SIZE => body,
        declared => body.get(..declared as usize).unwrap_or(body),
    };
    let samples = body
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / i16::MAX as f32)
        .collect();

    Ok(DecodedWav {
        sample_rate,
        channels,
        samples,
    })
}
