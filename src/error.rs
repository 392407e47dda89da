// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

use thiserror::Error;

/// Errors surfaced at the boundaries of the log engine: configuration,
/// I/O, and revision mismatches.
///
/// Capacity rejection (`put` returning `false`) and torn-write detection
/// are deliberately NOT represented here — both are normal control flow,
/// not error conditions, per the engine's failure semantics.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported format revision: header has {found}, library understands {supported:?}")]
    Revision { found: u32, supported: &'static [u32] },

    #[error("file too small: {what}")]
    TooSmall { what: String },

    #[error("logical log name could not be resolved to a path: {0}")]
    UnresolvedName(String),
}

pub type Result<T> = std::result::Result<T, Error>;
