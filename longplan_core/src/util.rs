//! Numeric helpers shared by the planner stages.

/// Planning loop period in seconds (20 Hz).
pub const DT_MDL: f32 = 0.05;
/// Highest cruise set-speed honoured (km/h).
pub const V_CRUISE_MAX_KPH: f32 = 145.0;
pub const KPH_TO_MS: f32 = 1.0 / 3.6;
pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Loop period in microseconds for a period given in seconds.
/// Non-finite or non-positive periods map to 1 µs.
#[inline]
pub fn period_us(dt_s: f32) -> u64 {
    if !(dt_s.is_finite() && dt_s > 0.0) {
        return 1;
    }
    ((f64::from(dt_s) * MICROS_PER_SEC as f64).round() as u64).max(1)
}

/// Piecewise-linear interpolation with flat extrapolation.
///
/// `xp` must be increasing. Only the common prefix of `xp`/`fp` is used; an
/// empty table yields 0. NaN queries map to the first value.
pub fn interp(x: f32, xp: &[f32], fp: &[f32]) -> f32 {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return 0.0;
    }
    let (xp, fp) = (&xp[..n], &fp[..n]);
    if !(x > xp[0]) {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    // xp[0] < x < xp[n-1], so 1 <= i <= n-1
    let i = xp.partition_point(|&p| p <= x);
    let (x0, x1) = (xp[i - 1], xp[i]);
    let (y0, y1) = (fp[i - 1], fp[i]);
    let span = x1 - x0;
    if span <= 0.0 {
        return y1;
    }
    y0 + (y1 - y0) * ((x - x0) / span)
}

/// Interpolate every point of `xs` into `out` (lengths must match).
pub fn interp_into(xs: &[f32], xp: &[f32], fp: &[f32], out: &mut [f32]) {
    debug_assert_eq!(xs.len(), out.len());
    for (o, &x) in out.iter_mut().zip(xs) {
        *o = interp(x, xp, fp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XP: [f32; 3] = [0.0, 10.0, 20.0];
    const FP: [f32; 3] = [1.0, 3.0, 2.0];

    #[test]
    fn interp_hits_breakpoints_exactly() {
        for (x, y) in XP.iter().zip(FP.iter()) {
            assert_eq!(interp(*x, &XP, &FP), *y);
        }
    }

    #[test]
    fn interp_is_linear_between_breakpoints() {
        assert!((interp(5.0, &XP, &FP) - 2.0).abs() < 1e-6);
        assert!((interp(15.0, &XP, &FP) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn interp_extrapolates_flat() {
        assert_eq!(interp(-3.0, &XP, &FP), 1.0);
        assert_eq!(interp(99.0, &XP, &FP), 2.0);
    }

    #[test]
    fn interp_degenerate_tables() {
        assert_eq!(interp(1.0, &[], &[]), 0.0);
        assert_eq!(interp(1.0, &[4.0], &[7.0]), 7.0);
        assert_eq!(interp(f32::NAN, &XP, &FP), 1.0);
    }

    #[test]
    fn period_us_rounds_and_floors() {
        assert_eq!(period_us(0.05), 50_000);
        assert_eq!(period_us(1.0), 1_000_000);
        assert_eq!(period_us(0.0), 1);
        assert_eq!(period_us(f32::NAN), 1);
    }
}
