// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! The reader: loads a whole log file into a heap buffer, dispatches on
//! its format revision, and runs a tail-anchored backward scan merged
//! across partitions by `(time_us, order)`.

mod v12;
mod v6;
mod v7;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::path;
use crate::record::{RecordHeader, HEADER_SIZE};
use crate::ring;

/// Per-record metadata handed to the `choice` and `access` callbacks.
#[derive(Debug, Clone)]
pub struct RecordInfo {
    pub part: usize,
    pub order: u32,
    pub time_us: i64,
    pub mini: u64,
    pub level: u8,
    pub category: u8,
    pub src_line: u32,
    pub pid: u32,
    pub th_id: u32,
    pub thread_name: String,
    pub source_name: String,
}

/// Revision-specific view over the loaded buffer: where the partitions
/// and their payload regions are, and the two header fields (hint,
/// log_beg) whose shape differs across revisions.
trait LoadedLog {
    fn partitions(&self) -> Vec<PartitionRef>;
    fn log_beg_us(&self) -> i64;
    fn hint(&self) -> String;
    fn rev(&self) -> u32;
}

struct PartitionRef {
    payload_offset: usize,
    size_b: u32,
    next_addr: u32,
}

/// A loaded log file, ready to scan.
pub struct Reader {
    buf: Vec<u8>,
    log: Box<dyn LoadedLog>,
}

const SUPPORTED_REVS: &[u32] = &[6, 7, 12];

impl Reader {
    /// Resolve `name`, read the whole file, and dispatch on its revision.
    pub fn load(name: &str) -> Result<Self> {
        let resolved = path::resolve(name, path::DEFAULT_SUFFIX, path::DEFAULT_DIR_ENV);
        let buf = std::fs::read(&resolved)?;
        Self::load_buf(buf)
    }

    fn load_buf(buf: Vec<u8>) -> Result<Self> {
        if buf.len() < 4 {
            return Err(Error::TooSmall { what: "file shorter than the revision field".into() });
        }
        let rev = LittleEndian::read_u32(&buf[0..4]);
        let log: Box<dyn LoadedLog> = if rev == 12 {
            Box::new(v12::load(&buf)?)
        } else if rev == 7 {
            Box::new(v7::load(&buf)?)
        } else if (1..=6).contains(&rev) {
            Box::new(v6::load(&buf)?)
        } else {
            return Err(Error::Revision { found: rev, supported: SUPPORTED_REVS });
        };
        tracing::debug!(rev = log.rev(), "loaded log container");
        Ok(Reader { buf, log })
    }

    pub fn rev(&self) -> u32 {
        self.log.rev()
    }

    pub fn hint(&self) -> String {
        self.log.hint()
    }

    /// Scan every partition, filter with `choice`, merge by
    /// `(time_us, order)` ascending, and deliver up to `max_count`
    /// (0 = unbounded) of the most recent matching records to `access`.
    /// Stops early if `access` returns `false`.
    pub fn scan(
        &self,
        max_count: usize,
        order_min: u32,
        time_us_min: i64,
        choice: impl Fn(&RecordInfo) -> bool,
        mut access: impl FnMut(&RecordInfo, &[u8]) -> bool,
    ) {
        let time_min = time_us_min.max(self.log.log_beg_us());
        let mut all: Vec<(RecordInfo, Vec<u8>)> = Vec::new();
        for (idx, p) in self.log.partitions().into_iter().enumerate() {
            let mut matches = scan_partition(&self.buf, idx, &p, order_min, time_min, &choice);
            all.append(&mut matches);
        }

        // Newest-first per partition already; a full sort gives a stable
        // global ordering. Ties break by `order` (ascending: tuple compare).
        all.sort_by_key(|(info, _)| std::cmp::Reverse((info.time_us, info.order)));

        if max_count > 0 && all.len() > max_count {
            all.truncate(max_count);
        }
        all.reverse(); // ascending (time_us, order)

        for (info, payload) in &all {
            if !access(info, payload) {
                break;
            }
        }
    }
}

fn scan_partition(
    buf: &[u8],
    part_idx: usize,
    p: &PartitionRef,
    order_min: u32,
    time_min: i64,
    choice: &impl Fn(&RecordInfo) -> bool,
) -> Vec<(RecordInfo, Vec<u8>)> {
    let mut out = Vec::new();
    if p.size_b == 0 {
        return out;
    }
    let payload = &buf[p.payload_offset..p.payload_offset + p.size_b as usize];
    let size_b = p.size_b;

    let start: i64 = p.next_addr as i64 + 2 * size_b as i64;
    let addr_floor: i64 = start - size_b as i64;
    let mut addr = start;

    loop {
        let trailer_addr = addr - 4;
        if trailer_addr < addr_floor {
            break;
        }
        let mut tb = [0u8; 4];
        ring::get(payload, size_b, wrap(trailer_addr, size_b), &mut tb);
        let rec_size = LittleEndian::read_u32(&tb);
        if rec_size == 0 {
            break;
        }
        if (rec_size as usize) < HEADER_SIZE + 4 {
            break; // malformed: cannot even hold a header plus trailer
        }
        let rec_start = addr - rec_size as i64;
        if rec_start < addr_floor {
            break;
        }

        let mut hb = [0u8; HEADER_SIZE];
        ring::get(payload, size_b, wrap(rec_start, size_b), &mut hb);
        let header = RecordHeader::decode(&hb);
        if header.size != rec_size || !header.is_committed() {
            break;
        }
        if header.order < order_min || header.time_us < time_min {
            break;
        }

        let body_len = rec_size as usize - HEADER_SIZE - 4;
        let tn_inline = if header.tn_size > 0 { header.tn_size as usize + 1 } else { 0 };
        let sn_inline = if header.sn_size > 0 { header.sn_size as usize + 1 } else { 0 };
        if tn_inline + sn_inline > body_len {
            break; // malformed
        }
        let payload_len = body_len - tn_inline - sn_inline;

        let mut body = vec![0u8; body_len];
        ring::get(payload, size_b, wrap(rec_start + HEADER_SIZE as i64, size_b), &mut body);

        let rec_payload = body[..payload_len].to_vec();
        let thread_name = if tn_inline > 0 {
            decode_inline_name(&body[payload_len..payload_len + header.tn_size as usize])
        } else {
            String::new()
        };
        let source_name = if sn_inline > 0 {
            let sn_start = payload_len + tn_inline;
            decode_inline_name(&body[sn_start..sn_start + header.sn_size as usize])
        } else {
            String::new()
        };

        let info = RecordInfo {
            part: part_idx,
            order: header.order,
            time_us: header.time_us,
            mini: header.mini,
            level: header.level,
            category: header.category,
            src_line: header.src_line,
            pid: header.pid,
            th_id: header.th_id,
            thread_name,
            source_name,
        };

        if choice(&info) {
            out.push((info, rec_payload));
        }

        addr = rec_start;
    }

    out
}

fn decode_inline_name(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn wrap(addr: i64, size_b: u32) -> u32 {
    addr.rem_euclid(size_b as i64) as u32
}
