//! Configuration types for the analogue broadcast pipeline.
use serde::{Deserialize, Serialize};

use crate::broadcast::BroadcastStandard;
use crate::errors::ConfigError;

/// Colour encoding system selectable at engine construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColourTag {
    Pal,
    Ntsc,
    Secam,
}

impl ColourTag {
    /// The broadcast standard each colour system defaults to when the
    /// caller does not pick one explicitly (mirrors the CLI's `-bsys`
    /// default selection table).
    pub fn default_broadcast_tag(self) -> BroadcastTag {
        match self {
            ColourTag::Pal => BroadcastTag::I,
            ColourTag::Ntsc => BroadcastTag::M,
            ColourTag::Secam => BroadcastTag::L,
        }
    }

    /// Display gamma exponent used by this colour system's encode/decode path.
    pub fn display_gamma(self) -> f64 {
        match self {
            ColourTag::Ntsc => 2.2,
            ColourTag::Pal | ColourTag::Secam => 2.8,
        }
    }

    pub fn parse(s: &str) -> std::result::Result<Self, ConfigError> {
        match s.to_ascii_lowercase().as_str() {
            "pal" => Ok(ColourTag::Pal),
            "ntsc" => Ok(ColourTag::Ntsc),
            "secam" => Ok(ColourTag::Secam),
            other => Err(ConfigError::UnknownColourTag {
                tag: other.to_string(),
            }),
        }
    }
}

/// CCIR broadcast standard tag, keying rows of the broadcast standard table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastTag {
    M,
    N,
    B,
    G,
    H,
    I,
    D,
    K,
    L,
    Vhs525,
    Vhs625,
}

impl BroadcastTag {
    pub fn parse(s: &str) -> std::result::Result<Self, ConfigError> {
        use BroadcastTag::*;
        Ok(match s.to_ascii_lowercase().as_str() {
            "m" => M,
            "n" => N,
            "b" => B,
            "g" => G,
            "h" => H,
            "i" => I,
            "d" => D,
            "k" => K,
            "l" => L,
            "vhs525" => Vhs525,
            "vhs625" => Vhs625,
            other => {
                return Err(ConfigError::UnknownBroadcastTag {
                    tag: other.to_string(),
                })
            }
        })
    }

    pub fn standard(self) -> &'static BroadcastStandard {
        crate::broadcast::standard_for(self)
    }
}

/// Parameters accepted by `make_engine`, serializable so a run can be
/// captured to and replayed from a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub broadcast: BroadcastTag,
    pub colour: ColourTag,
    pub resonance: f64,
    pub prefilter_mult: f64,
    pub phase_noise: f64,
    pub scanline_jitter: f64,
    pub noise_exponent: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            broadcast: BroadcastTag::I,
            colour: ColourTag::Pal,
            resonance: 5.0,
            prefilter_mult: 0.7,
            phase_noise: 0.0,
            scanline_jitter: 0.0,
            noise_exponent: 1.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.resonance <= 0.0 {
            return Err(ConfigError::InvalidResonance {
                resonance: self.resonance,
            });
        }
        if self.prefilter_mult <= 0.0 {
            return Err(ConfigError::InvalidPrefilterMult {
                value: self.prefilter_mult,
            });
        }
        Ok(())
    }
}

/// Wraps `EngineConfig` with the per-frame orchestrator knobs (`-noise`,
/// `-crosstalk`) so a whole invocation can round-trip through one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub engine: EngineConfig,
    pub additive_noise: f64,
    pub crosstalk: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            additive_noise: 0.0,
            crosstalk: 0.0,
        }
    }
}
