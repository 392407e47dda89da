// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Revision 12 (current): the format this crate writes. 64-bit
//! microsecond `log_beg`, 8 fixed partitions, 16-byte-aligned header.

use byteorder::{ByteOrder, LittleEndian};

use crate::container::{PartitionDesc, RawHeader, HEADER_SIZE, NPART};
use crate::error::{Error, Result};

use super::{LoadedLog, PartitionRef};

pub struct Log12 {
    user_hdr_size: u32,
    hint: String,
    log_beg_us: i64,
    parts: [(u32, u32); NPART], // (next_addr, size_b)
}

pub fn load(buf: &[u8]) -> Result<Log12> {
    if buf.len() < HEADER_SIZE {
        return Err(Error::TooSmall { what: "rev 12 header".into() });
    }
    let user_hdr_size = LittleEndian::read_u32(&buf[8..12]);
    let hint_off = std::mem::offset_of!(RawHeader, hint);
    let hint_bytes = &buf[hint_off..hint_off + 64];
    let end = hint_bytes.iter().position(|&b| b == 0).unwrap_or(hint_bytes.len());
    let hint = String::from_utf8_lossy(&hint_bytes[..end]).into_owned();

    let part_off = std::mem::offset_of!(RawHeader, part);
    let desc_size = std::mem::size_of::<PartitionDesc>();
    let size_b_off = std::mem::offset_of!(PartitionDesc, size_b);
    let mut parts = [(0u32, 0u32); NPART];
    for (i, slot) in parts.iter_mut().enumerate() {
        let base = part_off + i * desc_size;
        let next_addr = LittleEndian::read_u32(&buf[base..base + 4]);
        let size_b = LittleEndian::read_u32(&buf[base + size_b_off..base + size_b_off + 4]);
        *slot = (next_addr, size_b);
    }

    let log_beg_off = std::mem::offset_of!(RawHeader, log_beg);
    let log_beg_us = LittleEndian::read_u64(&buf[log_beg_off..log_beg_off + 8]) as i64;

    Ok(Log12 { user_hdr_size, hint, log_beg_us, parts })
}

impl LoadedLog for Log12 {
    fn partitions(&self) -> Vec<PartitionRef> {
        let mut offset = HEADER_SIZE + self.user_hdr_size as usize;
        self.parts
            .iter()
            .map(|&(next_addr, size_b)| {
                let p = PartitionRef { payload_offset: offset, size_b, next_addr };
                offset += size_b as usize;
                p
            })
            .collect()
    }

    fn log_beg_us(&self) -> i64 {
        self.log_beg_us
    }

    fn hint(&self) -> String {
        self.hint.clone()
    }

    fn rev(&self) -> u32 {
        12
    }
}
