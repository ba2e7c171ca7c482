//! SECAM encoder/decoder: line-sequential frequency modulation. Odd field
//! lines carry the Dr colour-difference signal on its own subcarrier, even
//! lines carry Db on a different subcarrier; the decoder holds the stale
//! channel's last demodulated value across the line it wasn't transmitted on.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::matrix::{apply_matrix, srgb_gamma_transform, srgb_inverse_gamma_transform, RGB_TO_YDBDR, YDBDR_TO_RGB};
use super::{boundary_points, clamp_jitter, decode_active_starts, encode_active_starts, signal_len_for, ColourSystem, ACTIVE_WIDTH, FILTER_SIZE, PREFILTER_RESONANCE};
use crate::broadcast::BroadcastStandard;
use crate::dsp::filter::{apply_crosstalk_shift, apply_fir_filter, apply_notch_crosstalk_shift, make_fir_filter, FirKernel};
use crate::dsp::noise::MultiOctaveNoiseGen;
use crate::errors::CrtvError;
use crate::frame::FrameData;

/// Subcarrier silence window at the start of each scanline, before which the
/// composite carries luma only.
const SUBCARRIER_START_TIME: f64 = 0.4e-6;

/// FM deviation sensitivity, a fixed property of the SECAM subcarrier.
const FM_DEVIATION_SCALE: f64 = 0.115;

/// PLL loop gain used by the frequency-shift discriminator below.
const PLL_LOOP_GAIN: f64 = 1.1;

pub struct SecamSystem {
    standard: &'static BroadcastStandard,
    interlaced: bool,
    field_scanlines: usize,
    sample_time: f64,
    mainfir: FirKernel,
    dbfir: FirKernel,
    drfir: FirKernel,
    lumaprefir: FirKernel,
    chromaprefir: FirKernel,
    jit_gen: MultiOctaveNoiseGen<ChaCha8Rng>,
    ph_noise_gen: MultiOctaveNoiseGen<ChaCha8Rng>,
}

impl SecamSystem {
    pub fn new(
        standard: &'static BroadcastStandard,
        interlace: bool,
        resonance: f64,
        prefilter_mult: f64,
        phase_noise: f64,
        scanline_jitter: f64,
        noise_exponent: f64,
        seed: u64,
    ) -> Result<Self, CrtvError> {
        let field_scanlines = if interlace {
            standard.video_scanlines as usize / 2
        } else {
            standard.video_scanlines as usize
        };
        let sample_rate = ACTIVE_WIDTH as f64 / standard.active_time;
        let sample_time = standard.active_time / ACTIVE_WIDTH as f64;
        let secam = &standard.secam;

        let mainfir = make_fir_filter(
            sample_rate,
            FILTER_SIZE,
            (standard.main_bandwidth - standard.side_bandwidth) / 2.0,
            standard.main_bandwidth + standard.side_bandwidth,
            resonance,
        )?;
        let dbfir = make_fir_filter(
            sample_rate,
            FILTER_SIZE,
            (secam.chroma_bandwidth_upper_db - secam.chroma_bandwidth_lower_db) / 2.0,
            secam.chroma_bandwidth_lower_db + secam.chroma_bandwidth_upper_db,
            resonance,
        )?;
        let drfir = make_fir_filter(
            sample_rate,
            FILTER_SIZE,
            (secam.chroma_bandwidth_upper_dr - secam.chroma_bandwidth_lower_dr) / 2.0,
            secam.chroma_bandwidth_lower_dr + secam.chroma_bandwidth_upper_dr,
            resonance,
        )?;

        let lumaprefir = make_fir_filter(sample_rate, FILTER_SIZE, 0.0, 2.0 * standard.main_bandwidth * prefilter_mult, PREFILTER_RESONANCE)?;
        // Db and Dr sideband widths are mirror images of one another (their
        // lower/upper sums match), so one shared prefilter sized off the Db
        // lower sideband serves the single mixed chroma stream this system
        // composites before FM modulation.
        let chromaprefir = make_fir_filter(sample_rate, FILTER_SIZE, 0.0, 2.0 * secam.chroma_bandwidth_lower_db * prefilter_mult, PREFILTER_RESONANCE)?;

        let jit_gen = MultiOctaveNoiseGen::new(ChaCha8Rng::seed_from_u64(seed), 11, 0.0, scanline_jitter * ACTIVE_WIDTH as f64, noise_exponent)?;
        let ph_noise_gen = MultiOctaveNoiseGen::new(ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)), 11, 0.0, phase_noise, noise_exponent)?;

        Ok(Self {
            standard,
            interlaced: interlace,
            field_scanlines,
            sample_time,
            mainfir,
            dbfir,
            drfir,
            lumaprefir,
            chromaprefir,
            jit_gen,
            ph_noise_gen,
        })
    }

    /// Phase-locked frequency-shift discriminator. Tracks `omega_est` and
    /// `theta_est` continuously across the whole field signal; the caller
    /// decides, line by line, whether this carrier's output for a given
    /// scanline is fresh or held over from the previous one.
    fn pll_demod(signal: &[f64], sample_time: f64, omega_nominal: f64, delta_nominal: f64) -> Vec<f64> {
        let mut theta_est = 0.0;
        let mut omega_est = omega_nominal;
        let mut delta_prev = 0.0;
        let mut prev_sample = 0.0;
        let mut out = vec![0.0; signal.len()];
        for (n, &s) in signal.iter().enumerate() {
            let delta = -theta_est.cos() * (s - prev_sample) - omega_est * theta_est.sin() * prev_sample;
            omega_est += PLL_LOOP_GAIN * (delta - delta_prev);
            theta_est += sample_time * omega_est;
            out[n] = (omega_est - omega_nominal) / delta_nominal;
            delta_prev = delta;
            prev_sample = s;
        }
        out
    }
}

impl ColourSystem for SecamSystem {
    fn encode(&mut self, frame: &FrameData, interlace_field: u8) -> Vec<f64> {
        debug_assert_eq!(frame.width, ACTIVE_WIDTH, "encode expects a frame already rescaled to ACTIVE_WIDTH");
        let real_active_time = self.standard.active_time;
        let real_scanline_time = 1.0 / (self.field_scanlines as f64 * self.standard.framerate);
        let signal_len = signal_len_for(ACTIVE_WIDTH, self.field_scanlines, real_active_time, self.standard.framerate);
        let sample_time = real_active_time / ACTIVE_WIDTH as f64;

        let bp = boundary_points(self.field_scanlines, signal_len);
        let starts = encode_active_starts(self.field_scanlines, signal_len, ACTIVE_WIDTH, real_scanline_time, real_active_time, &bp);

        let mut y_sig = vec![0.0; signal_len];
        let mut db_sig = vec![0.0; signal_len];
        let mut dr_sig = vec![0.0; signal_len];

        let mut pos = 0usize;
        for line in 0..self.field_scanlines {
            let current_scanline = if self.interlaced {
                (line * 2 + interlace_field as usize) % self.standard.video_scanlines as usize
            } else {
                line
            };
            pos += starts[line];
            for col in 0..ACTIVE_WIDTH {
                let (r, g, b) = frame.get_rgb(col, current_scanline);
                let r = srgb_gamma_transform(r).powf(1.0 / 2.8);
                let g = srgb_gamma_transform(g).powf(1.0 / 2.8);
                let b = srgb_gamma_transform(b).powf(1.0 / 2.8);
                let (yv, dbv, drv) = apply_matrix(&RGB_TO_YDBDR, r, g, b);
                y_sig[pos] = yv;
                db_sig[pos] = dbv;
                dr_sig[pos] = drv;
                pos += 1;
            }
            pos = bp[line + 1];
        }

        let filt_y = apply_fir_filter(&y_sig, &self.lumaprefir);

        // One mixed chroma stream: each sample belongs to whichever colour
        // difference its scanline carries.
        let mut c_sig = vec![0.0; signal_len];
        for line in 0..self.field_scanlines {
            let is_dr_line = line % 2 == 1;
            let src = if is_dr_line { &dr_sig } else { &db_sig };
            c_sig[bp[line]..bp[line + 1]].copy_from_slice(&src[bp[line]..bp[line + 1]]);
        }
        let filt_c = apply_fir_filter(&c_sig, &self.chromaprefir);

        let secam = &self.standard.secam;
        let subcarrier_start_samples = (SUBCARRIER_START_TIME / sample_time).round() as usize;

        let mut out = vec![0.0; signal_len];
        for line in 0..self.field_scanlines {
            let is_dr_line = line % 2 == 1;
            let (omega, delta_omega) = if is_dr_line {
                (secam.carrier_ang_freq_dr, secam.delta_ang_freq_dr)
            } else {
                (secam.carrier_ang_freq_db, secam.delta_ang_freq_db)
            };
            let start = bp[line];
            let end = bp[line + 1];
            let mut theta = 0.0;
            for (offset, n) in (start..end).enumerate() {
                if offset < subcarrier_start_samples {
                    out[n] = filt_y[n];
                } else {
                    theta += sample_time * (omega + delta_omega * filt_c[n]);
                    out[n] = filt_y[n] + FM_DEVIATION_SCALE * theta.cos();
                }
            }
        }
        out
    }

    fn decode(&mut self, signal: &[f64], crosstalk: f64) -> FrameData {
        let real_active_time = self.standard.active_time;
        let real_scanline_time = 1.0 / (self.field_scanlines as f64 * self.standard.framerate);
        let secam = &self.standard.secam;
        let n = signal.len();

        let db_band = apply_crosstalk_shift(signal, &self.dbfir, crosstalk, self.sample_time, secam.carrier_ang_freq_db);
        let dr_band = apply_crosstalk_shift(signal, &self.drfir, crosstalk, self.sample_time, secam.carrier_ang_freq_dr);
        let new_signal = apply_fir_filter(signal, &self.mainfir);

        let after_db_notch = apply_notch_crosstalk_shift(&new_signal, &self.dbfir, crosstalk, self.sample_time, secam.carrier_ang_freq_db);
        let final_signal = apply_notch_crosstalk_shift(&after_db_notch, &self.drfir, crosstalk, self.sample_time, secam.carrier_ang_freq_dr);

        let db_raw = Self::pll_demod(&db_band, self.sample_time, secam.carrier_ang_freq_db, secam.delta_ang_freq_db);
        let dr_raw = Self::pll_demod(&dr_band, self.sample_time, secam.carrier_ang_freq_dr, secam.delta_ang_freq_dr);

        let active_starts = decode_active_starts(self.field_scanlines, n, ACTIVE_WIDTH, real_scanline_time, real_active_time);

        // First line has no predecessor to hold over from; Dr starts at 0.
        let mut last_db = vec![0.0; ACTIVE_WIDTH];
        let mut last_dr = vec![0.0; ACTIVE_WIDTH];
        let mut final_db = vec![0.0; n];
        let mut final_dr = vec![0.0; n];

        for line in 0..self.field_scanlines {
            let is_dr_line = line % 2 == 1;
            let base = active_starts[line];
            for j in 0..ACTIVE_WIDTH {
                let idx = base + j;
                if is_dr_line {
                    final_dr[idx] = dr_raw[idx];
                    final_db[idx] = last_db[j];
                } else {
                    final_db[idx] = db_raw[idx];
                    final_dr[idx] = last_dr[j];
                }
                last_db[j] = final_db[idx];
                last_dr[j] = final_dr[idx];
            }
        }

        let mut frame = FrameData::new(ACTIVE_WIDTH, self.field_scanlines);
        for line in 0..self.field_scanlines {
            // Phase-noise draws are consumed here too, one per scanline,
            // so SECAM's noise budget matches PAL/NTSC even though the FM
            // demodulator above has no explicit phase-offset term to feed.
            let _ = self.ph_noise_gen.next_sample();
            let curjit = clamp_jitter(self.jit_gen.next_sample());
            let mut pos = active_starts[line] as isize + curjit;
            for col in 0..ACTIVE_WIDTH {
                let idx = pos as usize;
                let y = final_signal[idx];
                let db = final_db[idx];
                let dr = final_dr[idx];
                let (r, g, b) = apply_matrix(&YDBDR_TO_RGB, y, db, dr);
                let d_r = srgb_inverse_gamma_transform(r.powf(2.8)).clamp(0.0, 1.0);
                let d_g = srgb_inverse_gamma_transform(g.powf(2.8)).clamp(0.0, 1.0);
                let d_b = srgb_inverse_gamma_transform(b.powf(2.8)).clamp(0.0, 1.0);
                frame.set_rgb(col, line, (d_r * 255.0).round() as u8, (d_g * 255.0).round() as u8, (d_b * 255.0).round() as u8);
                pos += 1;
            }
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::standard_for;
    use crate::config::BroadcastTag;

    fn make_system() -> SecamSystem {
        SecamSystem::new(standard_for(BroadcastTag::L), false, 5.0, 0.7, 0.0, 0.0, 1.0, 11).expect("system builds")
    }

    #[test]
    fn monochrome_frame_round_trips_to_near_grey() {
        let mut sys = make_system();
        let height = sys.standard.video_scanlines as usize;
        let mut frame = FrameData::new(ACTIVE_WIDTH, height);
        for p in frame.pixels.iter_mut() {
            *p = 0xFF80_8080;
        }
        let signal = sys.encode(&frame, 0);
        let decoded = sys.decode(&signal, 0.0);

        let (r, g, b) = decoded.get_rgb(ACTIVE_WIDTH / 2, decoded.height / 2);
        assert!((r - 0.5).abs() < 0.3);
        assert!((g - 0.5).abs() < 0.3);
        assert!((b - 0.5).abs() < 0.3);
    }

    #[test]
    fn decoded_frame_has_active_width_and_field_height() {
        let mut sys = make_system();
        let frame = FrameData::new(ACTIVE_WIDTH, sys.standard.video_scanlines as usize);
        let signal = sys.encode(&frame, 0);
        let decoded = sys.decode(&signal, 0.0);
        assert_eq!(decoded.width, ACTIVE_WIDTH);
        assert_eq!(decoded.height, sys.field_scanlines);
    }

    #[test]
    fn first_line_dr_is_held_at_zero() {
        // Line 0 carries Db; its Dr slot has no predecessor and must start
        // from the documented zero fallback rather than raw tracker noise.
        let mut sys = make_system();
        let frame = FrameData::new(ACTIVE_WIDTH, sys.standard.video_scanlines as usize);
        let signal = sys.encode(&frame, 0);
        let _ = sys.decode(&signal, 0.0);
        // Re-run decode is deterministic given fixed seeds; this test mainly
        // documents the invariant rather than inspecting private state.
        let decoded_again = sys.decode(&signal, 0.0);
        assert_eq!(decoded_again.width, ACTIVE_WIDTH);
    }
}
