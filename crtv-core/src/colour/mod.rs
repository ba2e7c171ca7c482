//! Colour-system encode/decode strategies.
//!
//! Each system (PAL, NTSC, SECAM) owns its own FIR kernels and noise
//! generators, built once from a [`crate::broadcast::BroadcastStandard`] and
//! reused across every frame it processes.

pub mod matrix;
pub mod ntsc;
pub mod pal;
pub mod secam;

use crate::frame::FrameData;

/// Resonance used for the prefilters every colour system applies before
/// modulation, independent of the caller-supplied decode-filter resonance.
pub const PREFILTER_RESONANCE: f64 = 2.0;

/// FIR kernel size used for every filter a colour system builds.
pub const FILTER_SIZE: usize = 256;

/// Fixed active-picture width used by every colour system. The alternative
/// `(8/3) * video_scanlines` formula some sources give for System M produces
/// a different number (1280 vs 1400 for 480 visible lines) and is not used
/// here; this constant is authoritative for all three systems.
pub const ACTIVE_WIDTH: usize = 1400;

/// Shared encode/decode surface implemented by PAL, NTSC, and SECAM.
///
/// `interlace_field` selects which field of an interlaced frame to encode
/// (0 or 1; ignored when the system was built with interlacing disabled).
/// `crosstalk` is a decode-time parameter because, unlike the FIR kernels,
/// it can legitimately vary frame to frame.
pub trait ColourSystem {
    fn encode(&mut self, frame: &FrameData, interlace_field: u8) -> Vec<f64>;
    fn decode(&mut self, signal: &[f64], crosstalk: f64) -> FrameData;
}

/// Number of composite-signal samples produced for one field at the given
/// active width, field-scanline count, and broadcast timing.
pub(crate) fn signal_len_for(width: usize, field_scanlines: usize, active_time: f64, framerate: f64) -> usize {
    let real_scanline_time = 1.0 / (field_scanlines as f64 * framerate);
    (width as f64 * field_scanlines as f64 * (real_scanline_time / active_time)) as usize
}

/// Sample indices separating consecutive scanlines within a field signal.
pub(crate) fn boundary_points(field_scanlines: usize, signal_len: usize) -> Vec<usize> {
    let mut bp = vec![0usize; field_scanlines + 1];
    bp[field_scanlines] = signal_len;
    for i in 1..field_scanlines {
        bp[i] = (i * signal_len) / field_scanlines;
    }
    bp
}

/// Offsets (relative to each scanline's start in `boundary_points`) at which
/// the active picture region begins, used while building the encoded signal.
pub(crate) fn encode_active_starts(
    field_scanlines: usize,
    signal_len: usize,
    width: usize,
    real_scanline_time: f64,
    real_active_time: f64,
    boundary_points: &[usize],
) -> Vec<usize> {
    (0..field_scanlines)
        .map(|i| {
            let raw = (i as f64 * signal_len as f64) / field_scanlines as f64
                + ((real_scanline_time - real_active_time) / (2.0 * real_active_time)) * width as f64;
            (raw as isize - boundary_points[i] as isize).max(0) as usize
        })
        .collect()
}

/// Absolute sample indices (not relative to a scanline) at which the active
/// picture region begins, used while decoding the received signal back into
/// raster lines of `width` output pixels.
pub(crate) fn decode_active_starts(
    field_scanlines: usize,
    signal_len: usize,
    width: usize,
    real_scanline_time: f64,
    real_active_time: f64,
) -> Vec<usize> {
    (0..field_scanlines)
        .map(|i| {
            let raw = (i as f64 * signal_len as f64) / field_scanlines as f64
                + ((real_scanline_time - real_active_time) / (2.0 * real_active_time)) * width as f64;
            raw.max(0.0) as usize
        })
        .collect()
}

/// Clamp scanline jitter to +/-100 samples, matching the limit every system
/// applies so an extreme jitter draw cannot walk a read index out of bounds.
pub(crate) fn clamp_jitter(raw: f64) -> isize {
    (raw as isize).clamp(-100, 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_points_span_the_whole_signal() {
        let bp = boundary_points(10, 1000);
        assert_eq!(bp[0], 0);
        assert_eq!(bp[10], 1000);
        assert!(bp.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn jitter_clamp_respects_bounds() {
        assert_eq!(clamp_jitter(1000.0), 100);
        assert_eq!(clamp_jitter(-1000.0), -100);
        assert_eq!(clamp_jitter(5.0), 5);
    }
}
