//! Multi-octave noise generator.
//!
//! A bank of one-pole low-pass filtered white-noise streams summed with
//! power-law weights, used for scanline jitter, subcarrier phase noise, and
//! (at the orchestrator level) additive composite noise. Deterministic
//! given a seed, including the mandatory burn-in.

use rand::distributions::Uniform;
use rand::Rng;

use crate::errors::DspError;

/// Burn-in call count so the low-octave IIR channels reach steady state
/// before the generator's first real sample. Reproducible fixtures depend
/// on this exact value.
const BURN_IN_CALLS: usize = 69420;
const MAX_OCTAVES: usize = 32;

/// Stateful multi-octave noise source. Owned exclusively by one
/// colour-system instance; never shared across threads.
pub struct MultiOctaveNoiseGen<R: Rng> {
    rng: R,
    dist: Uniform<f64>,
    filter: Vec<f64>,
    amplitude: Vec<f64>,
    channel: Vec<f64>,
}

impl<R: Rng> MultiOctaveNoiseGen<R> {
    pub fn new(
        mut rng: R,
        num_oct: usize,
        dist_center: f64,
        dist_width: f64,
        exponent: f64,
    ) -> Result<Self, DspError> {
        if num_oct == 0 {
            return Err(DspError::NoiseOctaveCountZero);
        }
        if num_oct > MAX_OCTAVES {
            return Err(DspError::NoiseOctaveCountExceeded { requested: num_oct });
        }

        let exponent = exponent - 1.0;
        let amp_corr = if exponent == 0.0 {
            1.0 / num_oct as f64
        } else {
            (1.0 - 2f64.powf(exponent)) / (1.0 - 2f64.powf(exponent * num_oct as f64))
        };

        let filter: Vec<f64> = (0..num_oct).map(|i| 1.0 - 2f64.powi(-(i as i32))).collect();
        let amplitude: Vec<f64> = (0..num_oct)
            .map(|i| 2f64.powf(exponent * i as f64) * amp_corr)
            .collect();

        let dist = Uniform::new(dist_center - dist_width, dist_center + dist_width);

        let mut gen = Self {
            rng,
            dist,
            filter,
            amplitude,
            channel: vec![0.0; num_oct],
        };
        for _ in 0..BURN_IN_CALLS {
            gen.next_sample();
        }
        Ok(gen)
    }

    /// Draw the next correlated noise sample.
    pub fn next_sample(&mut self) -> f64 {
        let mut output = 0.0;
        for i in 0..self.channel.len() {
            let u: f64 = self.rng.sample(self.dist);
            let noise_component = u + self.channel[i] * self.filter[i];
            output += noise_component * self.amplitude[i];
            self.channel[i] = noise_component;
        }
        output
    }

    pub fn num_octaves(&self) -> usize {
        self.channel.len()
    }

    pub fn amplitude_sum(&self) -> f64 {
        self.amplitude.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn same_seed_same_parameters_are_deterministic() {
        let mut a = MultiOctaveNoiseGen::new(ChaCha8Rng::seed_from_u64(7), 8, 0.0, 1.0, 1.3).unwrap();
        let mut b = MultiOctaveNoiseGen::new(ChaCha8Rng::seed_from_u64(7), 8, 0.0, 1.0, 1.3).unwrap();

        for _ in 0..256 {
            assert_eq!(a.next_sample(), b.next_sample());
        }
    }

    #[test]
    fn exponent_one_gives_uniform_amplitude_correction() {
        let gen = MultiOctaveNoiseGen::new(ChaCha8Rng::seed_from_u64(1), 11, 0.0, 1.0, 1.0).unwrap();
        let expected = 1.0 / 11.0;
        for &amp in &gen.amplitude {
            // amplitude[i] = 2^(0*i) * ampCorr = ampCorr for every octave when exponent==1
            assert_relative_eq!(amp, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn bounded_mean_near_distribution_center() {
        let mut gen = MultiOctaveNoiseGen::new(ChaCha8Rng::seed_from_u64(99), 4, 0.25, 0.5, 1.6).unwrap();
        let n = 200_000;
        let sum: f64 = (0..n).map(|_| gen.next_sample()).sum();
        let mean = sum / n as f64;
        let expected = 0.25 * gen.amplitude_sum();
        // Loose bound: this is a statistical property test, not exact.
        assert!((mean - expected).abs() < 0.2, "mean {mean} too far from expected {expected}");
    }

    #[test]
    fn zero_octaves_is_rejected() {
        assert!(MultiOctaveNoiseGen::new(ChaCha8Rng::seed_from_u64(0), 0, 0.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn too_many_octaves_is_rejected() {
        assert!(MultiOctaveNoiseGen::new(ChaCha8Rng::seed_from_u64(0), 33, 0.0, 1.0, 1.0).is_err());
    }
}
