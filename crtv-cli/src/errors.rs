//! CLI-local I/O error types for the raw frame container.
//!
//! `crtv-core` never depends on this type; the media-IO collaborator (this
//! crate) owns every I/O-related failure per the core's error-handling
//! contract.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: not a CRTV frame container (bad magic bytes)")]
    BadMagic { path: PathBuf },

    #[error("{path}: truncated frame container, expected {expected} bytes for this frame but only found {found}")]
    Truncated {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("{path}: header declares {header} frames but {actual} were written")]
    FrameCountMismatch {
        path: PathBuf,
        header: u32,
        actual: u32,
    },

    #[error("frame {index} has size {actual_w}x{actual_h}, container header declares {expected_w}x{expected_h}")]
    FrameSizeMismatch {
        index: usize,
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },
}
