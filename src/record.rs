// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Record framing: the fixed header that precedes every record's payload,
//! and the trailing size word that lets the reader walk the ring backward.
//!
//! Record layout in the ring (logical addresses, may wrap):
//! `[header][payload][thread_name + NUL?][source_name + NUL?][trailing u32 = size]`

use byteorder::{ByteOrder, LittleEndian};

/// Maximum length (excluding NUL) of an inline thread name.
pub const TN_MAX: usize = 63;
/// Maximum length (excluding NUL) of an inline source name.
pub const SN_MAX: usize = 63;

/// On-wire size of [`RecordHeader`], serialized field-by-field with no
/// compiler padding (see DESIGN.md for the field-by-field accounting).
pub const HEADER_SIZE: usize = 44;

/// Fixed record header. Every record in the ring begins with one of these,
/// followed by the payload, optional inline names, and a trailing `u32`
/// holding the same value as `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Total bytes occupied by this record, header through trailer.
    pub size: u32,
    /// Value of the global record counter at publish time.
    pub order: u32,
    /// Microseconds since epoch at the `put` call.
    pub time_us: i64,
    /// Opaque caller-provided value.
    pub mini: u64,
    pub level: u8,
    pub category: u8,
    pub tn_size: u8,
    pub sn_size: u8,
    pub src_line: u32,
    /// Reader-side scratch bits; writers must always set this to 0.
    pub control: u8,
    pub pid: u32,
    pub th_id: u32,
    /// Bitwise NOT of `order`; the torn-write canary.
    pub br_order: u32,
}

impl RecordHeader {
    /// Pack the level/category/tn_size/sn_size/src_line/control bitfield
    /// into its 64-bit on-wire form. Bit offsets, LSB first:
    /// level:3 category:5 tn_size:6 sn_size:6 src_line:14 control:6 reserved:24
    fn pack_bits(&self) -> u64 {
        let mut bits: u64 = self.level as u64 & 0x7;
        bits |= (self.category as u64 & 0x1F) << 3;
        bits |= (self.tn_size as u64 & 0x3F) << 8;
        bits |= (self.sn_size as u64 & 0x3F) << 14;
        bits |= (self.src_line as u64 & 0x3FFF) << 20;
        bits |= (self.control as u64 & 0x3F) << 34;
        bits
    }

    fn unpack_bits(bits: u64) -> (u8, u8, u8, u8, u32, u8) {
        let level = (bits & 0x7) as u8;
        let category = ((bits >> 3) & 0x1F) as u8;
        let tn_size = ((bits >> 8) & 0x3F) as u8;
        let sn_size = ((bits >> 14) & 0x3F) as u8;
        let src_line = ((bits >> 20) & 0x3FFF) as u32;
        let control = ((bits >> 34) & 0x3F) as u8;
        (level, category, tn_size, sn_size, src_line, control)
    }

    /// Serialize into `buf`, which must be at least [`HEADER_SIZE`] bytes.
    pub fn encode(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_SIZE);
        LittleEndian::write_u32(&mut buf[0..4], self.size);
        LittleEndian::write_u32(&mut buf[4..8], self.order);
        LittleEndian::write_i64(&mut buf[8..16], self.time_us);
        LittleEndian::write_u64(&mut buf[16..24], self.mini);
        LittleEndian::write_u64(&mut buf[24..32], self.pack_bits());
        LittleEndian::write_u32(&mut buf[32..36], self.pid);
        LittleEndian::write_u32(&mut buf[36..40], self.th_id);
        LittleEndian::write_u32(&mut buf[40..44], self.br_order);
    }

    /// Deserialize from `buf`, which must be at least [`HEADER_SIZE`] bytes.
    pub fn decode(buf: &[u8]) -> Self {
        debug_assert!(buf.len() >= HEADER_SIZE);
        let size = LittleEndian::read_u32(&buf[0..4]);
        let order = LittleEndian::read_u32(&buf[4..8]);
        let time_us = LittleEndian::read_i64(&buf[8..16]);
        let mini = LittleEndian::read_u64(&buf[16..24]);
        let bits = LittleEndian::read_u64(&buf[24..32]);
        let (level, category, tn_size, sn_size, src_line, control) = Self::unpack_bits(bits);
        let pid = LittleEndian::read_u32(&buf[32..36]);
        let th_id = LittleEndian::read_u32(&buf[36..40]);
        let br_order = LittleEndian::read_u32(&buf[40..44]);
        RecordHeader {
            size,
            order,
            time_us,
            mini,
            level,
            category,
            tn_size,
            sn_size,
            src_line,
            control,
            pid,
            th_id,
            br_order,
        }
    }

    /// `order == ~br_order`: the commit canary. A record failing this check
    /// is either reserved-but-unwritten (fresh ring bytes) or a concurrent
    /// writer still in flight.
    pub fn is_committed(&self) -> bool {
        self.order == !self.br_order
    }
}
