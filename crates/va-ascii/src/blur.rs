use rayon::prelude::*;
use va_core::frame::LumaFrame;

/// Sigma for an odd kernel size, same rule as OpenCV's `getGaussianKernel`.
#[must_use]
pub fn sigma_for(ksize: usize) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian kernel of odd length `ksize`.
///
/// # Example
/// ```
/// use va_ascii::blur::gaussian_kernel;
/// let k = gaussian_kernel(5);
/// assert_eq!(k.len(), 5);
/// assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
/// ```
#[must_use]
pub fn gaussian_kernel(ksize: usize) -> Vec<f32> {
    let ksize = ksize.max(1) | 1;
    let sigma = sigma_for(ksize);
    let radius = (ksize / 2) as f32;
    let weights: Vec<f32> = (0..ksize)
        .map(|i| {
            let x = i as f32 - radius;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Blur gaussien séparable, bord répliqué.
///
/// Two passes (horizontal then vertical), rows processed in parallel.
/// `ksize` is forced odd; `ksize == 1` returns an exact copy.
#[must_use]
pub fn gaussian_blur(frame: &LumaFrame, ksize: usize) -> LumaFrame {
    let kernel = gaussian_kernel(ksize);
    if kernel.len() == 1 {
        return frame.clone();
    }
    let radius = (kernel.len() / 2) as i64;
    let w = frame.width as usize;

    let mut horizontal = vec![0.0f32; frame.data.len()];
    horizontal
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = x as i64 + k as i64 - radius;
                    acc += weight * frame.get_clamped(sx, y as i64);
                }
                *out = acc;
            }
        });
    let horizontal = LumaFrame::from_vec(frame.width, frame.height, horizontal);

    let mut out = vec![0.0f32; frame.data.len()];
    out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = y as i64 + k as i64 - radius;
                acc += weight * horizontal.get_clamped(x as i64, sy);
            }
            *out = acc.clamp(0.0, 1.0);
        }
    });
    LumaFrame::from_vec(frame.width, frame.height, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_symmetric_and_peaked() {
        let k = gaussian_kernel(7);
        for i in 0..3 {
            assert!((k[i] - k[6 - i]).abs() < 1e-6);
            assert!(k[i] < k[i + 1]);
        }
    }

    #[test]
    fn even_size_is_rounded_up() {
        assert_eq!(gaussian_kernel(4).len(), 5);
        assert_eq!(gaussian_kernel(0).len(), 1);
    }

    #[test]
    fn flat_frame_stays_flat() {
        let frame = LumaFrame::filled(9, 5, 0.4);
        let out = gaussian_blur(&frame, 5);
        assert!(out.data.iter().all(|v| (v - 0.4).abs() < 1e-5));
    }

    #[test]
    fn blur_softens_a_step() {
        let mut data = vec![0.0f32; 16];
        for v in &mut data[8..] {
            *v = 1.0;
        }
        let frame = LumaFrame::from_vec(16, 1, data);
        let out = gaussian_blur(&frame, 5);
        assert!(out.get(7, 0) > 0.0);
        assert!(out.get(8, 0) < 1.0);
        assert!(out.get(0, 0).abs() < 1e-6);
        assert!((out.get(15, 0) - 1.0).abs() < 1e-6);
    }
}
