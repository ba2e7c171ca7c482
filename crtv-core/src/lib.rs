//! Analogue television broadcast degradation core.
//!
//! Given one RGB raster this crate produces the raster that would result
//! from encoding it into a PAL, NTSC, or SECAM composite signal under a
//! chosen CCIR broadcast standard's bandwidth limits, corrupting it with
//! noise and jitter, and decoding it back with an imperfect receiver. It
//! consumes and produces single frames; demuxing/muxing a real video
//! container is the job of a media-IO collaborator (the `crtv-cli` crate
//! in this workspace).

pub mod broadcast;
pub mod colour;
pub mod config;
pub mod dsp;
pub mod errors;
pub mod frame;
pub mod logging;
pub mod orchestrator;

pub use colour::ACTIVE_WIDTH;
pub use config::{BroadcastTag, ColourTag, EngineConfig, RunConfig};
pub use errors::{ConfigError, CrtvError, DspError, Result};
pub use frame::FrameData;
pub use orchestrator::{make_engine, make_engine_from_config, make_engine_with_seed, Engine, NoiseInjector, UniformAdditiveNoise};
