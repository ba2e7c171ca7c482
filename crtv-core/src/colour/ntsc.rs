//! NTSC encoder/decoder: YIQ component signals composited by quadrature
//! amplitude modulation with a fixed 33-degree chroma phase offset.

use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;

use super::matrix::{apply_matrix, srgb_gamma_transform, srgb_inverse_gamma_transform, NTSC_CHROMA_PHASE, YIQ_TO_RGB, RGB_TO_YIQ};
use super::{boundary_points, clamp_jitter, decode_active_starts, encode_active_starts, signal_len_for, ColourSystem, ACTIVE_WIDTH, FILTER_SIZE, PREFILTER_RESONANCE};
use crate::broadcast::BroadcastStandard;
use crate::dsp::filter::{apply_crosstalk, apply_fir_filter, apply_crosstalk_shift, apply_notch_crosstalk_shift, make_fir_filter, FirKernel};
use crate::dsp::noise::MultiOctaveNoiseGen;
use crate::errors::CrtvError;
use crate::frame::FrameData;

pub struct NtscSystem {
    standard: &'static BroadcastStandard,
    interlaced: bool,
    field_scanlines: usize,
    sample_time: f64,
    mainfir: FirKernel,
    qfir: FirKernel,
    ifir: FirKernel,
    lumaprefir: FirKernel,
    qprefir: FirKernel,
    iprefir: FirKernel,
    jit_gen: MultiOctaveNoiseGen<ChaCha8Rng>,
    ph_noise_gen: MultiOctaveNoiseGen<ChaCha8Rng>,
}

impl NtscSystem {
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

        let mainfir = make_fir_filter(
            sample_rate,
            FILTER_SIZE,
            (standard.main_bandwidth - standard.side_bandwidth) / 2.0,
            standard.main_bandwidth + standard.side_bandwidth,
            resonance,
        )?;
        let qfir = make_fir_filter(sample_rate, FILTER_SIZE, 0.0, 2.0 * standard.chroma_bandwidth_upper, resonance)?;
        let ifir = make_fir_filter(
            sample_rate,
            FILTER_SIZE,
            (standard.chroma_bandwidth_upper - standard.chroma_bandwidth_lower) / 2.0,
            standard.chroma_bandwidth_lower + standard.chroma_bandwidth_upper,
            resonance,
        )?;

        let lumaprefir = make_fir_filter(sample_rate, FILTER_SIZE, 0.0, 2.0 * standard.main_bandwidth * prefilter_mult, PREFILTER_RESONANCE)?;
        let iprefir = make_fir_filter(sample_rate, FILTER_SIZE, 0.0, 2.0 * standard.chroma_bandwidth_lower * prefilter_mult, PREFILTER_RESONANCE)?;
        let qprefir = make_fir_filter(sample_rate, FILTER_SIZE, 0.0, 2.0 * standard.chroma_bandwidth_upper * prefilter_mult, PREFILTER_RESONANCE)?;

        let jit_gen = MultiOctaveNoiseGen::new(ChaCha8Rng::seed_from_u64(seed), 11, 0.0, scanline_jitter * ACTIVE_WIDTH as f64, noise_exponent)?;
        let ph_noise_gen = MultiOctaveNoiseGen::new(ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)), 11, 0.0, phase_noise, noise_exponent)?;

        Ok(Self {
            standard,
            interlaced: interlace,
            field_scanlines,
            sample_time,
            mainfir,
            qfir,
            ifir,
            lumaprefir,
            qprefir,
            iprefir,
            jit_gen,
            ph_noise_gen,
        })
    }
}

impl ColourSystem for NtscSystem {
    fn encode(&mut self, frame: &FrameData, interlace_field: u8) -> Vec<f64> {
        debug_assert_eq!(frame.width, ACTIVE_WIDTH, "encode expects a frame already rescaled to ACTIVE_WIDTH");
        let real_active_time = self.standard.active_time;
        let real_scanline_time = 1.0 / (self.field_scanlines as f64 * self.standard.framerate);
        let signal_len = signal_len_for(ACTIVE_WIDTH, self.field_scanlines, real_active_time, self.standard.framerate);
        let sample_time = real_active_time / ACTIVE_WIDTH as f64;

        let bp = boundary_points(self.field_scanlines, signal_len);
        let starts = encode_active_starts(self.field_scanlines, signal_len, ACTIVE_WIDTH, real_scanline_time, real_active_time, &bp);

        let mut y_sig = vec![0.0; signal_len];
        let mut i_sig = vec![0.0; signal_len];
        let mut q_sig = vec![0.0; signal_len];

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
                let r = srgb_gamma_transform(r).powf(1.0 / 2.2);
                let g = srgb_gamma_transform(g).powf(1.0 / 2.2);
                let b = srgb_gamma_transform(b).powf(1.0 / 2.2);
                let (yv, iv, qv) = apply_matrix(&RGB_TO_YIQ, r, g, b);
                y_sig[pos] = yv;
                i_sig[pos] = iv;
                q_sig[pos] = qv;
                pos += 1;
            }
            pos = bp[line + 1];
        }

        let filt_y = apply_fir_filter(&y_sig, &self.lumaprefir);
        let filt_i = apply_fir_filter(&i_sig, &self.iprefir);
        let filt_q = apply_fir_filter(&q_sig, &self.qprefir);

        let carrier = self.standard.carrier_ang_freq;
        let mut out = vec![0.0; signal_len];
        for n in 0..signal_len {
            let t = n as f64 * sample_time;
            out[n] = filt_y[n] + filt_q[n] * (carrier * t + NTSC_CHROMA_PHASE).sin() + filt_i[n] * (carrier * t + NTSC_CHROMA_PHASE).cos();
        }
        out
    }

    fn decode(&mut self, signal: &[f64], crosstalk: f64) -> FrameData {
        let real_active_time = self.standard.active_time;
        let real_scanline_time = 1.0 / (self.field_scanlines as f64 * self.standard.framerate);
        let carrier = self.standard.carrier_ang_freq;

        let mut q_demod = apply_crosstalk_shift(signal, &self.qfir, crosstalk, self.sample_time, carrier);
        let mut i_demod = apply_crosstalk_shift(signal, &self.ifir, crosstalk, self.sample_time, carrier);
        let new_signal = apply_fir_filter(signal, &self.mainfir);

        let bp = boundary_points(self.field_scanlines, signal.len());
        let mut pos = 0usize;
        for line in 0..self.field_scanlines {
            let ph_offs = self.ph_noise_gen.next_sample() + NTSC_CHROMA_PHASE;
            let end = bp[line + 1];
            while pos < end {
                let t = pos as f64 * self.sample_time;
                q_demod[pos] *= (carrier * t + ph_offs).sin() * 2.0;
                i_demod[pos] *= (carrier * t + ph_offs).cos() * 2.0;
                pos += 1;
            }
        }

        let final_signal = apply_notch_crosstalk_shift(&new_signal, &self.ifir, crosstalk, self.sample_time, carrier);
        let final_q = apply_crosstalk(&q_demod, &self.qfir, crosstalk);
        let final_i = apply_crosstalk(&i_demod, &self.ifir, crosstalk);

        let active_starts = decode_active_starts(self.field_scanlines, signal.len(), ACTIVE_WIDTH, real_scanline_time, real_active_time);

        let mut frame = FrameData::new(ACTIVE_WIDTH, self.field_scanlines);
        for line in 0..self.field_scanlines {
            let curjit = clamp_jitter(self.jit_gen.next_sample());
            let mut pos = active_starts[line] as isize + curjit;
            for col in 0..ACTIVE_WIDTH {
                let idx = pos as usize;
                let y = final_signal[idx];
                let i = final_i[idx];
                let q = final_q[idx];
                let (r, g, b) = apply_matrix(&YIQ_TO_RGB, y, i, q);
                let d_r = srgb_inverse_gamma_transform(r.powf(2.2)).clamp(0.0, 1.0);
                let d_g = srgb_inverse_gamma_transform(g.powf(2.2)).clamp(0.0, 1.0);
                let d_b = srgb_inverse_gamma_transform(b.powf(2.2)).clamp(0.0, 1.0);
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

    fn make_system() -> NtscSystem {
        NtscSystem::new(standard_for(BroadcastTag::M), false, 5.0, 0.7, 0.0, 0.0, 1.0, 42).expect("system builds")
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
        assert!((r - 0.5).abs() < 0.25);
        assert!((g - 0.5).abs() < 0.25);
        assert!((b - 0.5).abs() < 0.25);
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
}
