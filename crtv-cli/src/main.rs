//! Command-line driver: the media-IO collaborator around `crtv-core`.
//!
//! Demuxing/muxing a real video container and codec decode/encode are
//! explicitly out of the core's scope (see `crtv-core`'s crate docs); this
//! binary's job is exactly that collaborator, wired to a minimal raw frame
//! container (see [`frame_container`]) so the pipeline can be exercised end
//! to end without a full media stack. It also rescales every input frame to
//! the core's fixed active width (see [`rescale`]) before handing it to the
//! engine, since the colour systems encode at that fixed width rather than
//! the input's own.

mod cli;
mod errors;
mod frame_container;
mod rescale;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crtv_core::{logging::LogConfig, make_engine_from_config};

use cli::{normalize_argv, Cli};
use frame_container::{FrameContainerReader, FrameContainerWriter};
use rescale::rescale_width;

fn main() -> Result<()> {
    color_eyre::install()?;

    let argv = normalize_argv(std::env::args());
    let cli = Cli::parse_from(argv);

    if let Some(tag) = &cli.bsyshelp {
        let broadcast = crtv_core::BroadcastTag::parse(tag).map_err(|e| eyre!(e))?;
        println!("{}", crtv_core::broadcast::describe(broadcast));
        return Ok(());
    }

    let (Some(input), Some(output)) = (cli.input.clone(), cli.output.clone()) else {
        eprintln!("usage: crtv <input> <output> [options]");
        std::process::exit(1);
    };

    let resolved = cli.resolve(input, output)?;

    let mut reader = FrameContainerReader::open(&resolved.input)?;
    let total_frames = match resolved.preview_limit {
        Some(limit) => reader.frame_count().min(limit as u32),
        None => reader.frame_count(),
    };

    let mut engine = make_engine_from_config(&resolved.run_config.engine).map_err(|e| eyre!(e))?;

    let mut writer = FrameContainerWriter::create(
        &resolved.output,
        engine.output_width() as u32,
        engine.output_height() as u32,
        total_frames,
    )?;

    let progress = ProgressBar::new(total_frames as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} frames ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut logger = crtv_core::logging::SignalLogger::new(LogConfig::default());
    logger.info("ORCHESTRATOR", format_args!("processing {total_frames} frames from {}", resolved.input.display()));

    let mut processed = 0u32;
    while processed < total_frames {
        let Some(frame) = reader.next_frame() else { break };
        let frame = frame?;
        let frame = rescale_width(&frame, engine.output_width());

        let out_frame = engine.process_frame(&frame, resolved.run_config.additive_noise, resolved.run_config.crosstalk);
        writer.write_frame(&out_frame)?;

        processed += 1;
        progress.inc(1);
    }
    progress.finish_and_clear();

    writer.finish()?;

    logger.info("ORCHESTRATOR", format_args!("wrote {processed} frames to {}", resolved.output.display()));
    for entry in logger.entries() {
        eprintln!("{entry}", entry = format_args!("[{}] {}: {}", entry.level, entry.subsystem, entry.message));
    }

    Ok(())
}
