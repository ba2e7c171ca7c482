//! Static broadcast-standard parameter table.
//!
//! Each record is an immutable, process-lifetime constant describing the
//! bandwidth, subcarrier, and scanline geometry of one CCIR broadcast
//! system (or a VHS tape recording standard, which reuses the same shape).

use std::f64::consts::TAU;

use crate::config::BroadcastTag;

/// SECAM-only subcarrier parameters, present on every record but only
/// meaningful when the colour system in use is SECAM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecamParams {
    pub chroma_carrier_frequency_db: f64,
    pub chroma_carrier_frequency_dr: f64,
    pub chroma_bandwidth_lower_db: f64,
    pub chroma_bandwidth_upper_db: f64,
    pub chroma_bandwidth_lower_dr: f64,
    pub chroma_bandwidth_upper_dr: f64,
    pub delta_ang_freq_db: f64,
    pub delta_ang_freq_dr: f64,
    pub carrier_ang_freq_db: f64,
    pub carrier_ang_freq_dr: f64,
}

/// One row of the broadcast standard table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BroadcastStandard {
    pub main_bandwidth: f64,
    pub side_bandwidth: f64,
    pub chroma_bandwidth_lower: f64,
    pub chroma_bandwidth_upper: f64,
    pub chroma_carrier_frequency: f64,
    pub carrier_ang_freq: f64,
    pub scanlines: u32,
    pub video_scanlines: u32,
    pub framerate: f64,
    pub frame_time: f64,
    pub scanline_time: f64,
    pub active_time: f64,
    /// Rational (num, den) form of the frame period, consumed only by the
    /// media-IO collaborator.
    pub rat_frametime: (u32, u32),
    pub secam: SecamParams,
}

const fn secam(
    db_freq: f64,
    dr_freq: f64,
    db_lower: f64,
    db_upper: f64,
    dr_lower: f64,
    dr_upper: f64,
) -> SecamParams {
    SecamParams {
        chroma_carrier_frequency_db: db_freq,
        chroma_carrier_frequency_dr: dr_freq,
        chroma_bandwidth_lower_db: db_lower,
        chroma_bandwidth_upper_db: db_upper,
        chroma_bandwidth_lower_dr: dr_lower,
        chroma_bandwidth_upper_dr: dr_upper,
        delta_ang_freq_db: 230_000.0 * TAU,
        delta_ang_freq_dr: 280_000.0 * TAU,
        carrier_ang_freq_db: db_freq * TAU,
        carrier_ang_freq_dr: dr_freq * TAU,
    }
}

const SECAM_525: SecamParams = secam(3_501_420.0, 3_657_670.0, 1_012_000.0, 700_000.0, 700_000.0, 1_012_000.0);
const SECAM_625: SecamParams = secam(4_250_000.0, 4_406_250.0, 1_012_000.0, 700_000.0, 700_000.0, 1_012_000.0);

fn build(
    main_bandwidth: f64,
    side_bandwidth: f64,
    chroma_bandwidth_lower: f64,
    chroma_bandwidth_upper: f64,
    chroma_carrier_frequency: f64,
    scanlines: u32,
    video_scanlines: u32,
    framerate: f64,
    rat_frametime: (u32, u32),
    active_time: f64,
    secam: SecamParams,
) -> BroadcastStandard {
    BroadcastStandard {
        main_bandwidth,
        side_bandwidth,
        chroma_bandwidth_lower,
        chroma_bandwidth_upper,
        chroma_carrier_frequency,
        carrier_ang_freq: chroma_carrier_frequency * TAU,
        scanlines,
        video_scanlines,
        framerate,
        frame_time: 1.0 / framerate,
        scanline_time: 1.0 / (framerate * scanlines as f64),
        active_time,
        rat_frametime,
        secam,
    }
}

/// Look up the static record for a broadcast tag. The table is built lazily
/// on first use and then shared for the lifetime of the process.
pub fn standard_for(tag: BroadcastTag) -> &'static BroadcastStandard {
    use std::sync::OnceLock;
    use BroadcastTag::*;

    static TABLE: OnceLock<[BroadcastStandard; 11]> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        let ntsc_framerate = 60_000.0 / 1001.0;
        [
            build(4.2e6, 0.75e6, 1.3e6, 0.62e6, 3_579_545.0, 525, 480, ntsc_framerate, (1001, 60_000), 5.26555e-5, SECAM_525),
            build(4.2e6, 0.75e6, 1.3e6, 0.57e6, 4_433_618.75, 625, 576, 50.0, (1, 50), 5.2e-5, SECAM_625),
            build(5.0e6, 0.75e6, 1.3e6, 0.57e6, 4_433_618.75, 625, 576, 50.0, (1, 50), 5.2e-5, SECAM_625),
            build(5.0e6, 0.75e6, 1.3e6, 0.57e6, 4_433_618.75, 625, 576, 50.0, (1, 50), 5.2e-5, SECAM_625),
            build(5.0e6, 1.25e6, 1.3e6, 0.57e6, 4_433_618.75, 625, 576, 50.0, (1, 50), 5.2e-5, SECAM_625),
            build(5.5e6, 1.25e6, 1.3e6, 1.066e6, 4_433_618.75, 625, 576, 50.0, (1, 50), 5.2e-5, SECAM_625),
            build(6.0e6, 0.75e6, 1.3e6, 0.57e6, 4_433_618.75, 625, 576, 50.0, (1, 50), 5.2e-5, SECAM_625),
            build(6.0e6, 0.75e6, 1.3e6, 0.57e6, 4_433_618.75, 625, 576, 50.0, (1, 50), 5.2e-5, SECAM_625),
            build(6.0e6, 1.25e6, 1.3e6, 1.066e6, 4_433_618.75, 625, 576, 50.0, (1, 50), 5.2e-5, SECAM_625),
            build(3.4e6, 0.1e6, 0.629e6, 0.629e6, 3_579_545.0, 525, 480, ntsc_framerate, (1001, 60_000), 5.26555e-5, SECAM_525),
            build(3.4e6, 0.1e6, 0.629e6, 0.629e6, 4_433_618.75, 625, 576, 50.0, (1, 50), 5.2e-5, SECAM_625),
        ]
    });

    let index = match tag {
        M => 0,
        N => 1,
        B => 2,
        G => 3,
        H => 4,
        I => 5,
        D => 6,
        K => 7,
        L => 8,
        Vhs525 => 9,
        Vhs625 => 10,
    };
    &table[index]
}

/// Human-readable descriptor for `-bsyshelp`, sourced directly from the
/// table so it can never drift from the values actually in use.
pub fn describe(tag: BroadcastTag) -> String {
    let s = standard_for(tag);
    format!(
        "Broadcast standard {tag:?}\n\
         main bandwidth:      {main_bw:.3} MHz\n\
         side bandwidth:      {side_bw:.3} MHz\n\
         chroma sidebands:    {ch_lo:.3} MHz lower / {ch_hi:.3} MHz upper\n\
         chroma subcarrier:   {carrier:.2} Hz\n\
         scanlines:           {lines} total, {vis} visible\n\
         framerate:           {fps:.4} Hz\n\
         active line time:    {active:.3} us",
        tag = tag,
        main_bw = s.main_bandwidth / 1e6,
        side_bw = s.side_bandwidth / 1e6,
        ch_lo = s.chroma_bandwidth_lower / 1e6,
        ch_hi = s.chroma_bandwidth_upper / 1e6,
        carrier = s.chroma_carrier_frequency,
        lines = s.scanlines,
        vis = s.video_scanlines,
        fps = s.framerate,
        active = s.active_time * 1e6,
    )
}
