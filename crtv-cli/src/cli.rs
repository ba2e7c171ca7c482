//! Command-line argument definitions and resolution into `crtv-core`
//! configuration types.
//!
//! The flag surface uses single-dash long flags (`-csys`, `-bsys`, ...)
//! rather than clap's usual `--long` convention. clap's derive macros can
//! only bind multi-character flags to `--long`, so [`normalize_argv`]
//! rewrites recognized single-dash long flags to double-dash form before
//! `Cli::parse_from` ever sees them; everything else (including the
//! automatic `-h`/`--help`) passes through untouched.

use std::path::PathBuf;

use clap::Parser;

use crtv_core::{BroadcastTag, ColourTag, ConfigError, EngineConfig, RunConfig};

/// Long-flag names that may appear with either one or two leading dashes.
const LONG_FLAGS: &[&str] = &[
    "csys", "bsys", "vhs", "br", "preview", "noise", "jitter", "reso", "prefreq", "psnoise", "crosstalk", "bsyshelp",
];

/// Rewrites single-dash long flags (`-csys`) to clap's double-dash form
/// (`--csys`) before parsing. Already-double-dash flags, single-character
/// flags like `-h`, and bare positional arguments pass through unchanged.
pub fn normalize_argv(args: impl IntoIterator<Item = String>) -> Vec<String> {
    args.into_iter()
        .map(|arg| match arg.strip_prefix('-') {
            Some(rest) if !rest.starts_with('-') && LONG_FLAGS.contains(&rest) => format!("--{rest}"),
            _ => arg,
        })
        .collect()
}

#[derive(Parser, Debug)]
#[command(
    name = "crtv",
    author,
    version,
    about = "Analogue television broadcast degradation simulator",
    long_about = None
)]
pub struct Cli {
    /// Input raw frame container.
    pub input: Option<PathBuf>,

    /// Output raw frame container.
    pub output: Option<PathBuf>,

    /// Colour encoding system: pal, ntsc, or secam.
    #[arg(long = "csys", value_name = "SYSTEM", default_value = "pal")]
    pub csys: String,

    /// CCIR broadcast standard tag; defaults to the colour system's own
    /// standard (pal -> i, ntsc -> m, secam -> l) when omitted.
    #[arg(long = "bsys", value_name = "SYSTEM")]
    pub bsys: Option<String>,

    /// Force the VHS tape-recording standard matching --csys, overriding --bsys.
    #[arg(long = "vhs")]
    pub vhs: bool,

    /// Target bitrate in kb/s. Informational only; the raw container is uncompressed.
    #[arg(long = "br", value_name = "KBPS", default_value_t = 10_000.0)]
    pub bitrate_kbps: f64,

    /// Process only the first 300 frames of the input.
    #[arg(long = "preview")]
    pub preview: bool,

    /// Composite additive noise amplitude.
    #[arg(long = "noise", value_name = "AMPLITUDE", default_value_t = 0.0)]
    pub noise: f64,

    /// Scanline horizontal jitter amplitude, in samples.
    #[arg(long = "jitter", value_name = "SAMPLES", default_value_t = 0.0)]
    pub jitter: f64,

    /// Prefilter resonance (Q).
    #[arg(long = "reso", value_name = "Q", default_value_t = 5.0)]
    pub reso: f64,

    /// Prefilter cutoff multiplier.
    #[arg(long = "prefreq", value_name = "MULT", default_value_t = 0.7)]
    pub prefreq: f64,

    /// Chroma phase noise amplitude, in radians.
    #[arg(long = "psnoise", value_name = "RADIANS", default_value_t = 0.0)]
    pub psnoise: f64,

    /// Luma/chroma crosstalk coefficient.
    #[arg(long = "crosstalk", value_name = "ALPHA", default_value_t = 0.0)]
    pub crosstalk: f64,

    /// Print the broadcast-standard descriptor for SYSTEM and exit.
    #[arg(long = "bsyshelp", value_name = "SYSTEM")]
    pub bsyshelp: Option<String>,
}

/// A fully resolved, validated invocation ready to drive the frame loop.
pub struct ResolvedRun {
    pub input: PathBuf,
    pub output: PathBuf,
    pub run_config: RunConfig,
    pub preview_limit: Option<usize>,
}

impl Cli {
    /// Resolves the parsed flags into a validated [`RunConfig`], applying
    /// the `-vhs` override (which takes precedence over an explicit
    /// `-bsys`) and the per-colour-system default broadcast tag.
    pub fn resolve(&self, input: PathBuf, output: PathBuf) -> Result<ResolvedRun, ConfigError> {
        let colour = ColourTag::parse(&self.csys)?;

        let mut broadcast = match &self.bsys {
            Some(tag) => BroadcastTag::parse(tag)?,
            None => colour.default_broadcast_tag(),
        };
        if self.vhs {
            broadcast = match colour {
                ColourTag::Ntsc => BroadcastTag::Vhs525,
                ColourTag::Pal | ColourTag::Secam => BroadcastTag::Vhs625,
            };
        }

        let engine = EngineConfig {
            broadcast,
            colour,
            resonance: self.reso,
            prefilter_mult: self.prefreq,
            phase_noise: self.psnoise,
            scanline_jitter: self.jitter,
            noise_exponent: 1.0,
        };
        engine.validate()?;

        Ok(ResolvedRun {
            input,
            output,
            run_config: RunConfig {
                engine,
                additive_noise: self.noise,
                crosstalk: self.crosstalk,
            },
            preview_limit: self.preview.then_some(300),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let argv = normalize_argv(std::iter::once("crtv".to_string()).chain(args.iter().map(|s| s.to_string())));
        Cli::parse_from(argv)
    }

    #[test]
    fn normalize_rewrites_single_dash_long_flags() {
        let argv = normalize_argv(vec!["crtv".into(), "-csys".into(), "ntsc".into(), "-h".into()]);
        assert_eq!(argv, vec!["crtv", "--csys", "ntsc", "-h"]);
    }

    #[test]
    fn normalize_leaves_double_dash_and_positionals_alone() {
        let argv = normalize_argv(vec!["crtv".into(), "--csys".into(), "pal".into(), "in.bin".into()]);
        assert_eq!(argv, vec!["crtv", "--csys", "pal", "in.bin"]);
    }

    #[test]
    fn default_broadcast_tag_follows_colour_system() {
        let cli = parse(&["-csys", "ntsc"]);
        let resolved = cli.resolve("in.bin".into(), "out.bin".into()).unwrap();
        assert_eq!(resolved.run_config.engine.broadcast, BroadcastTag::M);
    }

    #[test]
    fn vhs_override_takes_precedence_over_explicit_bsys() {
        let cli = parse(&["-csys", "pal", "-bsys", "i", "-vhs"]);
        let resolved = cli.resolve("in.bin".into(), "out.bin".into()).unwrap();
        assert_eq!(resolved.run_config.engine.broadcast, BroadcastTag::Vhs625);
    }

    #[test]
    fn preview_flag_caps_frame_count_at_300() {
        let cli = parse(&["-preview"]);
        let resolved = cli.resolve("in.bin".into(), "out.bin".into()).unwrap();
        assert_eq!(resolved.preview_limit, Some(300));
    }

    #[test]
    fn bsyshelp_without_a_value_fails_with_clap_exit_code_2() {
        let argv = normalize_argv(vec!["crtv".into(), "-bsyshelp".into()]);
        let err = Cli::try_parse_from(argv).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn bsyshelp_with_a_value_parses() {
        let cli = parse(&["-bsyshelp", "i"]);
        assert_eq!(cli.bsyshelp.as_deref(), Some("i"));
    }

    #[test]
    fn invalid_colour_system_is_rejected() {
        let cli = parse(&["-csys", "bogus"]);
        assert!(cli.resolve("in.bin".into(), "out.bin".into()).is_err());
    }
}
