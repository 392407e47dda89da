// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! A binary, memory-mapped, multi-partition, lock-free ring-buffer log
//! engine: a writer that publishes variable-length records into a shared
//! mapped file without locks, and a reader that merges partitions by
//! timestamp and sequence.

pub mod container;
pub mod error;
pub mod partition;
pub mod path;
pub mod reader;
pub mod record;
pub mod ring;
pub mod writer;

pub use error::{Error, Result};
pub use reader::{Reader, RecordInfo};
pub use writer::Writer;
