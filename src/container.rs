// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! The on-disk/mmap'd container: fixed header, per-partition descriptors,
//! opaque caller header, and the concatenated partition payloads.
//!
//! The header is laid directly over the mapped bytes via a `#[repr(C)]`
//! struct whose atomic fields (`AtomicU32`/`AtomicU64`) share layout with
//! their plain integer counterparts, the same technique used for
//! cache-line-aligned ring headers over `memmap2::MmapMut` elsewhere in
//! this codebase's ancestry.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use memmap2::MmapMut;

use crate::error::{Error, Result};

/// Number of severity-indexed partitions. Fixed by the wire format.
pub const NPART: usize = 8;

/// Revision this crate writes. Older revisions are read-only (see `reader`).
pub const CURRENT_REV: u32 = 12;

const HINT_LEN: usize = 64;

#[repr(C)]
pub struct PartitionDesc {
    pub next_addr: AtomicU32,
    pub size_b: u32,
}

/// The fixed container header, revision 12 shape. Overlaid directly on the
/// first `size_of::<RawHeader>()` bytes of the mapping.
#[repr(C, align(16))]
pub struct RawHeader {
    pub rev: u32,
    pub cnt: AtomicU32,
    pub user_hdr_size: u32,
    _unused: u32,
    pub hint: [u8; HINT_LEN],
    pub part: [PartitionDesc; NPART],
    pub log_beg: AtomicU64,
}

/// Size of the header, already rounded up to 16 bytes by `repr(align(16))`.
pub const HEADER_SIZE: usize = std::mem::size_of::<RawHeader>();

fn total_size(user_hdr_size: u32, sizes: &[u32; NPART]) -> u64 {
    HEADER_SIZE as u64 + user_hdr_size as u64 + sizes.iter().map(|&s| s as u64).sum::<u64>()
}

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// An open, memory-mapped log container.
pub struct Container {
    mmap: MmapMut,
    user_hdr_size: u32,
    sizes: [u32; NPART],
}

impl Container {
    /// Open `path`, creating it if absent and growing/reinitializing it if
    /// its existing shape (revision, user header size, partition sizes)
    /// disagrees with the requested one.
    pub fn create_or_open(path: &Path, user_hdr_size: u32, sizes: [u32; NPART]) -> Result<Self> {
        let total = total_size(user_hdr_size, &sizes);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let existing_len = file.metadata()?.len();
        if existing_len < total {
            file.set_len(total)?;
        }

        let mut mmap = unsafe { MmapMut::map_mut(&file)? };
        if (mmap.len() as u64) < total {
            return Err(Error::TooSmall {
                what: format!("mapped region {} shorter than required {}", mmap.len(), total),
            });
        }

        let needs_init = {
            let hdr = header_ref(&mmap);
            hdr.rev != CURRENT_REV
                || hdr.user_hdr_size != user_hdr_size
                || (0..NPART).any(|i| hdr.part[i].size_b != sizes[i])
        };

        if needs_init {
            tracing::info!(
                path = %path.display(),
                "reinitializing log container: shape mismatch or fresh file"
            );
            reinit(&mut mmap, user_hdr_size, &sizes);
        }

        Ok(Container { mmap, user_hdr_size, sizes })
    }

    pub fn header(&self) -> &RawHeader {
        header_ref(&self.mmap)
    }

    pub fn sizes(&self) -> &[u32; NPART] {
        &self.sizes
    }

    pub fn user_hdr_size(&self) -> u32 {
        self.user_hdr_size
    }

    /// Mutable view over the opaque caller header area.
    pub fn user_header_mut(&mut self) -> &mut [u8] {
        let start = HEADER_SIZE;
        let end = start + self.user_hdr_size as usize;
        &mut self.mmap[start..end]
    }

    /// Byte offset of partition `i`'s payload within the file.
    fn partition_offset(&self, i: usize) -> usize {
        let mut off = HEADER_SIZE + self.user_hdr_size as usize;
        for s in &self.sizes[..i] {
            off += *s as usize;
        }
        off
    }

    /// Raw pointer to the start of partition `i`'s payload, and its size.
    /// `size_b == 0` means the partition is disabled.
    pub fn partition_payload_mut(&mut self, i: usize) -> (*mut u8, u32) {
        let off = self.partition_offset(i);
        let size = self.sizes[i];
        (unsafe { self.mmap.as_mut_ptr().add(off) }, size)
    }

    pub fn partition_payload(&self, i: usize) -> (*const u8, u32) {
        let off = self.partition_offset(i);
        let size = self.sizes[i];
        (unsafe { self.mmap.as_ptr().add(off) }, size)
    }

    pub fn cnt(&self) -> u32 {
        self.header().cnt.load(Ordering::Acquire)
    }

    pub fn next_cnt(&self) -> u32 {
        self.header().cnt.fetch_add(1, Ordering::AcqRel)
    }

    pub fn log_beg(&self) -> u64 {
        self.header().log_beg.load(Ordering::Relaxed)
    }

    pub fn partition_desc(&self, i: usize) -> &PartitionDesc {
        &self.header().part[i]
    }

    pub fn hint(&self) -> String {
        let raw = &self.header().hint;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..end]).into_owned()
    }

    pub fn set_hint(&mut self, hint: &str) {
        let bytes = hint.as_bytes();
        let n = bytes.len().min(HINT_LEN - 1);
        let hint_off = std::mem::offset_of!(RawHeader, hint);
        self.mmap[hint_off..hint_off + n].copy_from_slice(&bytes[..n]);
        self.mmap[hint_off + n] = 0;
    }

    /// Reset the global counter and every partition's cursor to the
    /// sentinel (empty) state. Payload bytes are left as-is; stale records
    /// become unreachable because no live cursor references them anymore.
    pub fn clear(&self) {
        let hdr = self.header();
        hdr.cnt.store(0, Ordering::Release);
        for p in &hdr.part {
            p.next_addr.store(0, Ordering::Release);
        }
    }
}

fn header_ref(mmap: &MmapMut) -> &RawHeader {
    unsafe { &*(mmap.as_ptr() as *const RawHeader) }
}

fn reinit(mmap: &mut MmapMut, user_hdr_size: u32, sizes: &[u32; NPART]) {
    for b in mmap.iter_mut() {
        *b = 0;
    }
    let hdr = unsafe { &mut *(mmap.as_mut_ptr() as *mut RawHeader) };
    hdr.rev = CURRENT_REV;
    hdr.cnt = AtomicU32::new(0);
    hdr.user_hdr_size = user_hdr_size;
    for (i, desc) in hdr.part.iter_mut().enumerate() {
        desc.next_addr = AtomicU32::new(0);
        desc.size_b = sizes[i];
    }
    hdr.log_beg = AtomicU64::new(now_micros());
}

/// Reset the counter and cursor fields of an on-disk log file in place,
/// regardless of its revision, without needing to know its partition
/// shape up front (unlike [`Container::create_or_open`]). Used by the
/// operator tool's `--clear` flag.
pub fn clear_by_path(path: &Path) -> Result<()> {
    use byteorder::{ByteOrder, LittleEndian};

    let file = OpenOptions::new().read(true).write(true).open(path)?;
    let mut mmap = unsafe { MmapMut::map_mut(&file)? };
    if mmap.len() < 4 {
        return Err(Error::TooSmall { what: "file shorter than the revision field".into() });
    }
    let rev = LittleEndian::read_u32(&mmap[0..4]);

    if rev == CURRENT_REV {
        let hdr = unsafe { &*(mmap.as_ptr() as *const RawHeader) };
        hdr.cnt.store(0, Ordering::Release);
        for p in &hdr.part {
            p.next_addr.store(0, Ordering::Release);
        }
    } else if rev == 7 {
        LittleEndian::write_u32(&mut mmap[4..8], 0); // cnt
        let part_off = 16 + 64;
        for i in 0..NPART {
            let base = part_off + i * 8;
            LittleEndian::write_u32(&mut mmap[base..base + 4], 0); // next_addr
        }
    } else if (1..=6).contains(&rev) {
        LittleEndian::write_u32(&mut mmap[4..8], 0); // nextaddr
        LittleEndian::write_u32(&mut mmap[8..12], 0); // cnt
    } else {
        return Err(Error::Revision { found: rev, supported: &[6, 7, 12] });
    }

    Ok(())
}
