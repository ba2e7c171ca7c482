//! crtv-core error types with granular categories

use thiserror::Error;

/// Top-level error type for all crtv-core operations
#[derive(Debug, Error)]
pub enum CrtvError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("DSP processing error: {0}")]
    Dsp(#[from] DspError),
}

/// Configuration errors raised while building an `Engine`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unrecognised broadcast standard tag: {tag}")]
    UnknownBroadcastTag { tag: String },

    #[error("unrecognised colour system tag: {tag}")]
    UnknownColourTag { tag: String },

    #[error("resonance must be positive, got {resonance}")]
    InvalidResonance { resonance: f64 },

    #[error("prefilter multiplier must be positive, got {value}")]
    InvalidPrefilterMult { value: f64 },
}

/// DSP processing errors
#[derive(Debug, Error)]
pub enum DspError {
    #[error("filter design failed: {reason}")]
    FilterDesignFailed { reason: String },

    #[error("degenerate filter parameters: {detail}")]
    DegenerateFilterParameters { detail: String },

    #[error("noise octave count {requested} exceeds the maximum of 32")]
    NoiseOctaveCountExceeded { requested: usize },

    #[error("noise octave count must be at least 1")]
    NoiseOctaveCountZero,
}

/// Result type alias for crtv-core operations
pub type Result<T> = std::result::Result<T, CrtvError>;
