// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Revision ≤ 6 (legacy, read-only): single implicit partition spanning
//! the whole ring, no partition array, no `log_beg` floor.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

use super::{LoadedLog, PartitionRef};

const HEADER_SIZE: usize = 4 + 4 + 4 + 4 + 4 + 64; // rev,nextaddr,cnt,logsize_b,hdrsize_b,hint

pub struct Log6 {
    rev: u32,
    next_addr: u32,
    logsize_b: u32,
    hdrsize_b: u32,
    hint: String,
}

pub fn load(buf: &[u8]) -> Result<Log6> {
    if buf.len() < HEADER_SIZE {
        return Err(Error::TooSmall { what: "rev <= 6 header".into() });
    }
    let rev = LittleEndian::read_u32(&buf[0..4]);
    let next_addr = LittleEndian::read_u32(&buf[4..8]);
    let logsize_b = LittleEndian::read_u32(&buf[12..16]);
    let hdrsize_b = LittleEndian::read_u32(&buf[16..20]);
    let hint_bytes = &buf[20..84];
    let end = hint_bytes.iter().position(|&b| b == 0).unwrap_or(hint_bytes.len());
    let hint = String::from_utf8_lossy(&hint_bytes[..end]).into_owned();

    Ok(Log6 { rev, next_addr, logsize_b, hdrsize_b, hint })
}

impl LoadedLog for Log6 {
    fn partitions(&self) -> Vec<PartitionRef> {
        vec![PartitionRef {
            payload_offset: HEADER_SIZE + self.hdrsize_b as usize,
            size_b: self.logsize_b,
            next_addr: self.next_addr,
        }]
    }

    fn log_beg_us(&self) -> i64 {
        0
    }

    fn hint(&self) -> String {
        self.hint.clone()
    }

    fn rev(&self) -> u32 {
        self.rev
    }
}
