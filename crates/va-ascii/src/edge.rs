use std::collections::VecDeque;

use va_core::frame::LumaFrame;

/// Détecteur de contours à double seuil (Sobel + suppression des non-maxima
/// + hystérésis).
///
/// Thresholds apply to the L1 Sobel magnitude of normalized luminance. The
/// defaults (50/255 and 150/255) match the classic 50/150 pair on 8-bit input.
///
/// # Example
/// ```
/// use va_ascii::edge::EdgeDetector;
/// use va_core::frame::LumaFrame;
/// let flat = LumaFrame::filled(8, 8, 0.5);
/// let edges = EdgeDetector::default().detect(&flat);
/// assert!(edges.data.iter().all(|&v| v == 0.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeDetector {
    /// Weak threshold: candidates kept only when connected to a strong edge.
    pub low: f32,
    /// Strong threshold.
    pub high: f32,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self {
            low: 50.0 / 255.0,
            high: 150.0 / 255.0,
        }
    }
}

/// Compute gradient components at pixel (x, y), bord répliqué.
///
/// Returns (gx, gy).
#[must_use]
pub fn gradient(frame: &LumaFrame, x: u32, y: u32) -> (f32, f32) {
    let (x, y) = (i64::from(x), i64::from(y));
    let p = |dx: i64, dy: i64| frame.get_clamped(x + dx, y + dy);

    let tl = p(-1, -1);
    let tc = p(0, -1);
    let tr = p(1, -1);
    let ml = p(-1, 0);
    let mr = p(1, 0);
    let bl = p(-1, 1);
    let bc = p(0, 1);
    let br = p(1, 1);

    let gx = -tl + tr - 2.0 * ml + 2.0 * mr - bl + br;
    let gy = -tl - 2.0 * tc - tr + bl + 2.0 * bc + br;
    (gx, gy)
}

/// Neighbour offsets along the gradient direction, quantized to 4 bins.
fn direction_offsets(gx: f32, gy: f32) -> [(i64, i64); 2] {
    let angle = gy.atan2(gx).to_degrees();
    let angle = if angle < 0.0 { angle + 180.0 } else { angle };

    if !(22.5..157.5).contains(&angle) {
        [(-1, 0), (1, 0)]
    } else if angle < 67.5 {
        [(-1, -1), (1, 1)]
    } else if angle < 112.5 {
        [(0, -1), (0, 1)]
    } else {
        [(1, -1), (-1, 1)]
    }
}

impl EdgeDetector {
    /// Binary edge map: 1.0 on edges, 0.0 elsewhere.
    #[must_use]
    pub fn detect(&self, frame: &LumaFrame) -> LumaFrame {
        let (w, h) = (frame.width, frame.height);
        let idx = |x: u32, y: u32| y as usize * w as usize + x as usize;

        // 1. Sobel
        let mut magnitude = vec![0.0f32; frame.data.len()];
        let mut offsets = vec![[(0i64, 0i64); 2]; frame.data.len()];
        for y in 0..h {
            for x in 0..w {
                let (gx, gy) = gradient(frame, x, y);
                magnitude[idx(x, y)] = gx.abs() + gy.abs();
                offsets[idx(x, y)] = direction_offsets(gx, gy);
            }
        }

        // 2. Suppression des non-maxima + classement fort/faible
        let mag_at = |x: i64, y: i64| -> f32 {
            if x < 0 || y < 0 || x >= i64::from(w) || y >= i64::from(h) {
                0.0
            } else {
                magnitude[y as usize * w as usize + x as usize]
            }
        };
        // 0 = none, 1 = weak, 2 = strong
        let mut class = vec![0u8; frame.data.len()];
        let mut queue = VecDeque::new();
        for y in 0..h {
            for x in 0..w {
                let i = idx(x, y);
                let m = magnitude[i];
                if m <= self.low {
                    continue;
                }
                let [(ax, ay), (bx, by)] = offsets[i];
                let (xi, yi) = (i64::from(x), i64::from(y));
                let a = mag_at(xi + ax, yi + ay);
                let b = mag_at(xi + bx, yi + by);
                if m < a || m <= b {
                    continue;
                }
                if m > self.high {
                    class[i] = 2;
                    queue.push_back((x, y));
                } else {
                    class[i] = 1;
                }
            }
        }

        // 3. Hystérésis : les faibles connectés (8-voisinage) à un fort deviennent forts
        while let Some((x, y)) = queue.pop_front() {
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let nx = i64::from(x) + dx;
                    let ny = i64::from(y) + dy;
                    if nx < 0 || ny < 0 || nx >= i64::from(w) || ny >= i64::from(h) {
                        continue;
                    }
                    let ni = idx(nx as u32, ny as u32);
                    if class[ni] == 1 {
                        class[ni] = 2;
                        queue.push_back((nx as u32, ny as u32));
                    }
                }
            }
        }

        let data = class
            .into_iter()
            .map(|c| if c == 2 { 1.0 } else { 0.0 })
            .collect();
        LumaFrame::from_vec(w, h, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical_step(w: u32, h: u32, split: u32) -> LumaFrame {
        let mut data = Vec::with_capacity((w * h) as usize);
        for _ in 0..h {
            for x in 0..w {
                data.push(if x < split { 0.0 } else { 1.0 });
            }
        }
        LumaFrame::from_vec(w, h, data)
    }

    #[test]
    fn output_is_binary() {
        let edges = EdgeDetector::default().detect(&vertical_step(12, 6, 6));
        assert!(edges.data.iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn step_produces_a_thin_vertical_line() {
        let edges = EdgeDetector::default().detect(&vertical_step(12, 6, 6));
        for y in 0..6 {
            let lit: Vec<u32> = (0..12).filter(|&x| edges.get(x, y) == 1.0).collect();
            assert_eq!(lit.len(), 1, "row {y}: {lit:?}");
            assert!(lit[0] == 5 || lit[0] == 6);
        }
    }

    #[test]
    fn weak_isolated_gradient_is_dropped() {
        // 0.05 step: L1 magnitude 0.2, above low but no strong neighbour.
        let mut data = vec![0.0f32; 12 * 4];
        for y in 0..4 {
            for x in 6..12 {
                data[y * 12 + x] = 0.05;
            }
        }
        let faint = LumaFrame::from_vec(12, 4, data);
        let edges = EdgeDetector::default().detect(&faint);
        assert!(edges.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn gradient_sign_follows_brightness() {
        let frame = vertical_step(5, 5, 2);
        let (gx, gy) = gradient(&frame, 2, 2);
        assert!(gx > 0.0);
        assert!(gy.abs() < 1e-6);
    }
}
