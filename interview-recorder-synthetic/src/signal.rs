use std::f64::consts::TAU;

/// Deterministic test signal produced by a synthetic device.
///
/// Samples depend only on the absolute frame index, so rendering in
/// chunks of any size yields the same waveform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    Silence,
    Constant(f32),
    Sine { frequency: f64, amplitude: f32 },
}

impl Signal {
    pub fn sine(frequency: f64, amplitude: f32) -> Self {
        Self::Sine { frequency, amplitude }
    }

    pub fn sample_at(&self, frame: u64, sample_rate: f64) -> f32 {
        match *self {
            Self::Silence => 0.0,
            Self::Constant(value) => value,
            Self::Sine { frequency, amplitude } => {
                let t = frame as f64 / sample_rate;
                amplitude * (TAU * frequency * t).sin() as f32
            }
        }
    }

    /// Render `frames` mono samples starting at `start`.
    pub fn render(&self, start: u64, frames: usize, sample_rate: f64) -> Vec<f32> {
        (0..frames as u64)
            .map(|i| self.sample_at(start + i, sample_rate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn chunked_render_matches_whole_render() {
        let signal = Signal::sine(440.0, 0.5);
        let whole = signal.render(0, 300, 48000.0);

        let mut chunked = signal.render(0, 100, 48000.0);
        chunked.extend(signal.render(100, 200, 48000.0));

        assert_eq!(whole, chunked);
    }

    #[test]
    fn sine_quarter_period_peaks() {
        let signal = Signal::sine(1000.0, 0.8);
        // 48 samples per period at 48 kHz; quarter period is frame 12.
        assert_abs_diff_eq!(signal.sample_at(12, 48000.0), 0.8, epsilon = 1e-6);
        assert_abs_diff_eq!(signal.sample_at(0, 48000.0), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn constant_and_silence() {
        assert_eq!(Signal::Constant(0.25).render(7, 3, 8000.0), vec![0.25; 3]);
        assert_eq!(Signal::Silence.render(0, 2, 8000.0), vec![0.0; 2]);
    }
}
