use va_core::frame::LumaFrame;

use crate::blur::gaussian_blur;

/// Pseudo-profondeur par netteté locale.
///
/// Approximate: sharp regions read as nearer and brighten, smooth regions
/// recede. There is no real depth estimation behind it.
///
/// # Example
/// ```
/// use va_ascii::depth::DepthCompositor;
/// use va_core::frame::LumaFrame;
/// let flat = LumaFrame::filled(16, 16, 0.5);
/// let out = DepthCompositor::default().apply(&flat);
/// assert!((out.get(3, 3) - 0.35).abs() < 1e-5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthCompositor {
    /// Gaussian window used as the smooth reference (odd).
    pub window: usize,
    /// Share of the depth map in the output.
    pub weight: f32,
}

impl Default for DepthCompositor {
    fn default() -> Self {
        Self {
            window: 15,
            weight: 0.3,
        }
    }
}

impl DepthCompositor {
    /// Local sharpness `|f − gauss(f)|`, min-max normalized to [0, 1].
    ///
    /// A frame with no local contrast maps to all zeros.
    #[must_use]
    pub fn sharpness_map(&self, frame: &LumaFrame) -> LumaFrame {
        let smooth = gaussian_blur(frame, self.window);
        let diff: Vec<f32> = frame
            .data
            .iter()
            .zip(&smooth.data)
            .map(|(a, b)| (a - b).abs())
            .collect();

        let (min, max) = diff
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = max - min;
        let data = if diff.is_empty() || range <= f32::EPSILON {
            vec![0.0; diff.len()]
        } else {
            diff.into_iter().map(|v| (v - min) / range).collect()
        };
        LumaFrame::from_vec(frame.width, frame.height, data)
    }

    /// Blend: `v' = (1 − weight)·v + weight·depth`.
    #[must_use]
    pub fn apply(&self, frame: &LumaFrame) -> LumaFrame {
        let depth = self.sharpness_map(frame);
        let keep = 1.0 - self.weight;
        let data = frame
            .data
            .iter()
            .zip(&depth.data)
            .map(|(v, d)| (keep * v + self.weight * d).clamp(0.0, 1.0))
            .collect();
        LumaFrame::from_vec(frame.width, frame.height, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_frame_has_zero_sharpness() {
        let map = DepthCompositor::default().sharpness_map(&LumaFrame::filled(20, 10, 0.8));
        assert!(map.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn sharpness_is_normalized() {
        let mut data = vec![0.2f32; 24 * 24];
        data[12 * 24 + 12] = 1.0;
        let map = DepthCompositor::default().sharpness_map(&LumaFrame::from_vec(24, 24, data));
        let max = map.data.iter().copied().fold(0.0f32, f32::max);
        let min = map.data.iter().copied().fold(1.0f32, f32::min);
        assert!((max - 1.0).abs() < 1e-6);
        assert!(min.abs() < 1e-6);
        // La pointe est le point le plus net.
        assert!((map.get(12, 12) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sharp_detail_is_brightened_relative_to_flat_area() {
        let mut data = vec![0.5f32; 32 * 32];
        data[16 * 32 + 16] = 0.6;
        let frame = LumaFrame::from_vec(32, 32, data);
        let out = DepthCompositor::default().apply(&frame);
        let detail_gain = out.get(16, 16) - 0.7 * 0.6;
        let corner_gain = out.get(0, 0) - 0.7 * 0.5;
        assert!(detail_gain > corner_gain);
        assert!(out.data.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
