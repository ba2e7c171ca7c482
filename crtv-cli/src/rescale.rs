//! Horizontal rescale to the core's fixed active width.
//!
//! `crtv-core`'s colour systems encode at a fixed active width (see
//! `crtv_core::ACTIVE_WIDTH`) and expect their input frame to already be
//! that wide; this is the media-IO collaborator's job, the same way the
//! original analoguiser rescales every input frame before handing it to its
//! encoder rather than making the encoder cope with arbitrary widths.

use crtv_core::FrameData;

/// Rescales `frame` horizontally to `target_width` columns with bilinear
/// sampling, leaving the row count untouched. A no-op clone when the frame
/// is already the right width.
pub fn rescale_width(frame: &FrameData, target_width: usize) -> FrameData {
    if frame.width == target_width {
        return frame.clone();
    }

    let mut out = FrameData::new(target_width, frame.height);
    if frame.width == 0 || target_width == 0 {
        return out;
    }

    let x_scale = frame.width as f64 / target_width as f64;
    for row in 0..frame.height {
        for col in 0..target_width {
            let src_x = (col as f64 + 0.5) * x_scale - 0.5;
            let x0 = src_x.floor().clamp(0.0, (frame.width - 1) as f64) as usize;
            let x1 = (x0 + 1).min(frame.width - 1);
            let frac = (src_x - x0 as f64).clamp(0.0, 1.0);

            let (r0, g0, b0) = frame.get_rgb(x0, row);
            let (r1, g1, b1) = frame.get_rgb(x1, row);
            let r = r0 + (r1 - r0) * frac;
            let g = g0 + (g1 - g0) * frac;
            let b = b0 + (b1 - b0) * frac;
            out.set_rgb(col, row, (r * 255.0).round() as u8, (g * 255.0).round() as u8, (b * 255.0).round() as u8);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_target_width_is_a_plain_clone() {
        let frame = FrameData::new(1400, 10);
        let out = rescale_width(&frame, 1400);
        assert_eq!(out.pixels, frame.pixels);
    }

    #[test]
    fn output_has_requested_width_and_unchanged_height() {
        let frame = FrameData::new(64, 576);
        let out = rescale_width(&frame, 1400);
        assert_eq!(out.width, 1400);
        assert_eq!(out.height, 576);
    }

    #[test]
    fn flat_colour_survives_rescale() {
        let mut frame = FrameData::new(4, 2);
        for p in frame.pixels.iter_mut() {
            *p = 0xFF80_8080;
        }
        let out = rescale_width(&frame, 1400);
        for col in [0usize, 700, 1399] {
            let (r, g, b) = out.get_rgb(col, 0);
            assert!((r - 0.5).abs() < 0.01);
            assert!((g - 0.5).abs() < 0.01);
            assert!((b - 0.5).abs() < 0.01);
        }
    }

    #[test]
    fn upscaling_a_single_column_holds_its_colour() {
        let mut frame = FrameData::new(1, 3);
        frame.set_rgb(0, 1, 200, 50, 10);
        let out = rescale_width(&frame, 1400);
        let (r, g, b) = out.get_rgb(700, 1);
        assert_eq!((r * 255.0).round() as u8, 200);
        assert_eq!((g * 255.0).round() as u8, 50);
        assert_eq!((b * 255.0).round() as u8, 10);
    }
}
