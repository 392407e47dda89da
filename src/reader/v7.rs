// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Revision 7 (legacy, read-only): multi-partition layout with `log_beg`
//! stored as 32-bit seconds rather than 64-bit microseconds, 8 fixed
//! partitions, no header alignment padding.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

use super::{LoadedLog, PartitionRef};

const NPART: usize = 8;
const HEADER_SIZE: usize = 4 + 4 + 4 + 4 + 64 + NPART * 8; // rev,cnt,hdrsize_b,log_beg,hint,part[]

pub struct Log7 {
    hdrsize_b: u32,
    hint: String,
    log_beg_us: i64,
    parts: [(u32, u32); NPART],
}

pub fn load(buf: &[u8]) -> Result<Log7> {
    if buf.len() < HEADER_SIZE {
        return Err(Error::TooSmall { what: "rev 7 header".into() });
    }
    let hdrsize_b = LittleEndian::read_u32(&buf[8..12]);
    let log_beg_sec = LittleEndian::read_u32(&buf[12..16]);

    let hint_off = 16;
    let hint_bytes = &buf[hint_off..hint_off + 64];
    let end = hint_bytes.iter().position(|&b| b == 0).unwrap_or(hint_bytes.len());
    let hint = String::from_utf8_lossy(&hint_bytes[..end]).into_owned();

    let part_off = hint_off + 64;
    let mut parts = [(0u32, 0u32); NPART];
    for (i, slot) in parts.iter_mut().enumerate() {
        let base = part_off + i * 8;
        let next_addr = LittleEndian::read_u32(&buf[base..base + 4]);
        let size_b = LittleEndian::read_u32(&buf[base + 4..base + 8]);
        *slot = (next_addr, size_b);
    }

    Ok(Log7 { hdrsize_b, hint, log_beg_us: log_beg_sec as i64 * 1_000_000, parts })
}

impl LoadedLog for Log7 {
    fn partitions(&self) -> Vec<PartitionRef> {
        let mut offset = HEADER_SIZE + self.hdrsize_b as usize;
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
        7
    }
}
