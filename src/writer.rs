// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! The writer: lock-free record append into a shared memory-mapped ring.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use byteorder::{ByteOrder, LittleEndian};

use crate::container::{Container, NPART};
use crate::error::Result;
use crate::partition;
use crate::path;
use crate::record::{RecordHeader, HEADER_SIZE, SN_MAX, TN_MAX};
use crate::ring;

/// Enables inline capture of the calling thread's name on every `put`.
pub const THREAD_NAME: u32 = 1 << 0;
/// Enables inline capture of the caller-provided source file's base name.
pub const SOURCE_NAME: u32 = 1 << 1;

type Callback = dyn Fn(i64, &str, u32, u8, u8, u64, &[u8]) + Send + Sync;

/// Lock-free, multi-process-safe log writer.
///
/// If the mapped container cannot be opened (bad path, mmap failure), the
/// writer falls back to a process-local dummy ring sized for the minimum
/// record so that every subsequent `put` remains a safe no-op instead of
/// aborting the caller.
pub struct Writer {
    inner: WriterState,
    flags: u32,
    pid: AtomicU32,
    stdout: bool,
    callback: Option<Box<Callback>>,
}

enum WriterState {
    Mapped(Container),
    /// `init` failed; every `put` is a no-op that still invokes the
    /// caller's callback and optional stdout echo.
    Dummy,
}

impl Writer {
    /// Resolve `name` to a path, map it, and validate/reinitialize its
    /// shape. `sizes[i]` is the payload size in bytes for partition `i`
    /// (0 disables it). On failure the writer is left in the safe dummy
    /// state and the error is returned for the caller to log/ignore.
    pub fn init(
        name: &str,
        user_hdr_size: u32,
        sizes: [u32; NPART],
        flags: u32,
        hint: &str,
    ) -> (Self, Result<()>) {
        let resolved = path::resolve(name, path::DEFAULT_SUFFIX, path::DEFAULT_DIR_ENV);
        match Container::create_or_open(&resolved, user_hdr_size, sizes) {
            Ok(mut container) => {
                if !hint.is_empty() {
                    container.set_hint(hint);
                }
                let w = Writer {
                    inner: WriterState::Mapped(container),
                    flags,
                    pid: AtomicU32::new(std::process::id()),
                    stdout: false,
                    callback: None,
                };
                (w, Ok(()))
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "log container init failed, falling back to dummy writer");
                let w = Writer {
                    inner: WriterState::Dummy,
                    flags,
                    pid: AtomicU32::new(std::process::id()),
                    stdout: false,
                    callback: None,
                };
                (w, Err(e))
            }
        }
    }

    pub fn set_callback<F>(&mut self, f: F)
    where
        F: Fn(i64, &str, u32, u8, u8, u64, &[u8]) + Send + Sync + 'static,
    {
        self.callback = Some(Box::new(f));
    }

    pub fn enable_stdout(&mut self) {
        self.stdout = true;
    }

    /// Refresh the cached pid after `fork()`.
    pub fn post_forked(&self) {
        self.pid.store(std::process::id(), Ordering::Relaxed);
    }

    /// Reset the global counter and every partition cursor to empty.
    pub fn clear(&self) {
        if let WriterState::Mapped(c) = &self.inner {
            c.clear();
        }
    }

    /// Base pointer and size of the caller's opaque header area.
    pub fn hdraddr(&mut self) -> Option<(*mut u8, u32)> {
        match &mut self.inner {
            WriterState::Mapped(c) => {
                let n = c.user_hdr_size();
                Some((c.user_header_mut().as_mut_ptr(), n))
            }
            WriterState::Dummy => None,
        }
    }

    /// Convenience form: fills `time_us` from the wall clock and treats
    /// `payload` as the record's full byte body.
    pub fn put_str(
        &self,
        src_name: &str,
        src_line: u32,
        level: u8,
        category: u8,
        mini: u64,
        payload: &str,
    ) -> bool {
        let time_us = now_micros();
        self.put(time_us, src_name, src_line, level, category, mini, payload.as_bytes())
    }

    /// Compose and publish a record. Returns `false` iff the record cannot
    /// fit in its partition (too large, or no partition enabled at or
    /// below `level`); `cnt`/`next_addr` are left unchanged in that case.
    #[allow(clippy::too_many_arguments)]
    pub fn put(
        &self,
        time_us: i64,
        src_name: &str,
        src_line: u32,
        level: u8,
        category: u8,
        mini: u64,
        payload: &[u8],
    ) -> bool {
        if self.stdout || self.callback.is_some() {
            if let Some(cb) = &self.callback {
                cb(time_us, src_name, src_line, level, category, mini, payload);
            }
            if self.stdout {
                println!(
                    "{time_us} lv={level} cat={category} {src_name}:{src_line} {}",
                    String::from_utf8_lossy(payload)
                );
            }
        }

        let container = match &self.inner {
            WriterState::Mapped(c) => c,
            WriterState::Dummy => return false,
        };

        let part_idx = match partition::select(&container.header().part, level) {
            Some(i) => i,
            None => return false,
        };

        let tn = if self.flags & THREAD_NAME != 0 { capture_thread_name() } else { String::new() };
        let sn = if self.flags & SOURCE_NAME != 0 { capture_source_name(src_name) } else { String::new() };

        let tn_size = tn.len().min(TN_MAX) as u8;
        let sn_size = sn.len().min(SN_MAX) as u8;
        let tn_inline = if tn_size > 0 { tn_size as usize + 1 } else { 0 };
        let sn_inline = if sn_size > 0 { sn_size as usize + 1 } else { 0 };

        let size = HEADER_SIZE + payload.len() + tn_inline + sn_inline + 4;

        let (base, size_b) = container.partition_payload(part_idx);
        let next_addr_desc = &container.header().part[part_idx];
        let addr = ring::reserve(&next_addr_desc.next_addr, size_b, size as u32);
        if addr == ring::TOO_LARGE {
            return false;
        }

        let order = container.next_cnt();
        let header = RecordHeader {
            size: size as u32,
            order,
            time_us,
            mini,
            level,
            category,
            tn_size,
            sn_size,
            src_line,
            control: 0,
            pid: self.pid.load(Ordering::Relaxed),
            th_id: os_thread_id(),
            br_order: !order,
        };

        let base_mut = base as *mut u8;
        let mut cur = addr;
        let mut hdr_buf = [0u8; HEADER_SIZE];
        header.encode(&mut hdr_buf);
        unsafe {
            cur = ring::put(base_mut, size_b, cur, &hdr_buf);
            cur = ring::put(base_mut, size_b, cur, payload);
            if tn_size > 0 {
                cur = ring::put(base_mut, size_b, cur, &tn.as_bytes()[..tn_size as usize]);
                cur = ring::put(base_mut, size_b, cur, &[0u8]);
            }
            if sn_size > 0 {
                cur = ring::put(base_mut, size_b, cur, &sn.as_bytes()[..sn_size as usize]);
                cur = ring::put(base_mut, size_b, cur, &[0u8]);
            }
            let mut trailer = [0u8; 4];
            LittleEndian::write_u32(&mut trailer, size as u32);
            ring::put(base_mut, size_b, cur, &trailer);
        }

        true
    }
}

/// Resets an existing log file's counter/cursors by logical name, without
/// requiring the caller to know its partition shape. Used by the operator
/// tool's `--clear` flag, which only loads a [`crate::reader::Reader`] and
/// has no [`Writer`] instance of its own.
pub fn clear_by_name(name: &str) -> Result<()> {
    let resolved = path::resolve(name, path::DEFAULT_SUFFIX, path::DEFAULT_DIR_ENV);
    crate::container::clear_by_path(&resolved)
}

fn now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}

/// Keep the trailing [`TN_MAX`] bytes of the current thread's name, cut on
/// a UTF-8 char boundary so a multibyte name never panics on slicing.
fn capture_thread_name() -> String {
    let name = std::thread::current().name().unwrap_or("").to_string();
    truncate_suffix(&name, TN_MAX)
}

/// Strip a leading path and trailing suffix from `src_name`, then cap to
/// the leading [`SN_MAX`] bytes (cut on a UTF-8 char boundary), matching
/// the reader-friendly "file stem" rendering the operator tool prints.
fn capture_source_name(src_name: &str) -> String {
    let stem = std::path::Path::new(src_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(src_name);
    truncate_prefix(stem, SN_MAX)
}

/// Keep the last `max` bytes of `s`, walking forward from that cut point
/// to the next char boundary if it lands inside a multibyte sequence.
fn truncate_suffix(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    s[start..].to_string()
}

/// Keep the first `max` bytes of `s`, walking backward from that cut point
/// to the previous char boundary if it lands inside a multibyte sequence.
fn truncate_prefix(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(target_os = "linux")]
fn os_thread_id() -> u32 {
    unsafe { libc::syscall(libc::SYS_gettid) as u32 }
}

#[cfg(not(target_os = "linux"))]
fn os_thread_id() -> u32 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut h = DefaultHasher::new();
    std::thread::current().id().hash(&mut h);
    h.finish() as u32
}
