/// Rééchantillonnage temporel par plus proche voisin.
///
/// Decides, frame by frame and in decode order, whether a decoded frame is
/// kept. Target ticks fall every `1 / target_fps` seconds; each tick keeps the
/// decoded frame nearest to it, the earlier one on an exact tie. Never invents
/// frames: when `target_fps >= nominal_fps` every frame is kept.
///
/// # Example
/// ```
/// use va_source::resample::RateResampler;
/// let mut r = RateResampler::new(30.0, 15.0);
/// let kept: Vec<bool> = (0..6).map(|_| r.keep()).collect();
/// assert_eq!(kept, [true, false, true, false, true, false]);
/// ```
#[derive(Clone, Debug)]
pub struct RateResampler {
    source_period: f64,
    target_period: f64,
    passthrough: bool,
    /// Index of the next decoded frame.
    index: u64,
    /// Target ticks already consumed.
    ticks: u64,
}

/// Absorbs float noise when a tick lands on a half-period boundary.
const TIE_EPS: f64 = 1e-9;

impl RateResampler {
    /// Resampler from `nominal_fps` (decoded) to `target_fps` (output).
    #[must_use]
    pub fn new(nominal_fps: f64, target_fps: f64) -> Self {
        let valid = nominal_fps.is_finite()
            && nominal_fps > 0.0
            && target_fps.is_finite()
            && target_fps > 0.0;
        if !valid {
            log::warn!(
                "RateResampler: fps invalides ({nominal_fps} → {target_fps}), toutes les frames sont gardées"
            );
        }
        let passthrough = !valid || target_fps >= nominal_fps;
        Self {
            source_period: if valid { 1.0 / nominal_fps } else { 0.0 },
            target_period: if valid { 1.0 / target_fps } else { 0.0 },
            passthrough,
            index: 0,
            ticks: 0,
        }
    }

    /// True when every frame is kept.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    /// Decide for the next decoded frame. Call exactly once per frame.
    pub fn keep(&mut self) -> bool {
        let i = self.index;
        self.index += 1;
        if self.passthrough {
            return true;
        }

        let t = i as f64 * self.source_period;
        // Ticks in (t - p/2, t + p/2] are nearest to this frame.
        let upper = t + self.source_period / 2.0 + TIE_EPS;
        let mut kept = false;
        while self.ticks as f64 * self.target_period <= upper {
            self.ticks += 1;
            kept = true;
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kept_count(nominal: f64, target: f64, decoded: u64) -> u64 {
        let mut r = RateResampler::new(nominal, target);
        (0..decoded).filter(|_| r.keep()).count() as u64
    }

    #[test]
    fn equal_rates_keep_everything() {
        assert_eq!(kept_count(10.0, 10.0, 10), 10);
        assert_eq!(kept_count(29.97, 29.97, 300), 300);
    }

    #[test]
    fn higher_target_never_upsamples() {
        assert!(RateResampler::new(24.0, 60.0).is_passthrough());
        assert_eq!(kept_count(24.0, 60.0, 48), 48);
    }

    #[test]
    fn half_rate_keeps_about_half() {
        for decoded in [10u64, 11, 99, 100, 301] {
            let kept = kept_count(30.0, 15.0, decoded) as i64;
            let expected = (decoded / 2) as i64;
            assert!((kept - expected).abs() <= 1, "{decoded}: {kept}");
        }
    }

    #[test]
    fn kept_count_tracks_duration_times_target() {
        for (nominal, target) in [(30.0, 12.0), (29.97, 10.0), (60.0, 7.0), (25.0, 24.0)] {
            let decoded = 600u64;
            let kept = kept_count(nominal, target, decoded) as f64;
            let expected = decoded as f64 / nominal * target;
            assert!(
                (kept - expected).abs() <= 1.0,
                "{nominal}->{target}: {kept} vs {expected}"
            );
        }
    }

    #[test]
    fn tie_keeps_earlier_frame() {
        // 30 → 12 fps: the tick at 2.5 source frames sits between frames 2 and 3.
        let mut r = RateResampler::new(30.0, 12.0);
        let kept: Vec<bool> = (0..6).map(|_| r.keep()).collect();
        assert_eq!(kept, [true, false, true, false, false, true]);
    }

    #[test]
    fn first_frame_is_always_kept() {
        for target in [0.5, 1.0, 7.0, 23.976] {
            assert!(RateResampler::new(30.0, target).keep());
        }
    }

    #[test]
    fn invalid_rates_fall_back_to_passthrough() {
        assert!(RateResampler::new(0.0, 10.0).is_passthrough());
        assert!(RateResampler::new(f64::NAN, 10.0).is_passthrough());
    }
}
