// Fixed-layout kernel record decoding.
//
// Kernel-exposed process records (Solaris psinfo_t, macOS proc_bsdinfo) are
// C structs written out as raw bytes. Fields are pulled out at documented
// offsets with explicit widths and byte order; integers are assembled by
// shift-and-or, never by casting a pointer into the buffer.

pub mod bsdinfo;
pub mod psinfo;

/// Byte order of the integers in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Order of the host this crate was compiled for. Records produced by the
    /// running kernel for a local reader are always in this order.
    pub const NATIVE: ByteOrder = if cfg!(target_endian = "big") {
        ByteOrder::Big
    } else {
        ByteOrder::Little
    };
}

/// A field lies (partly) outside the record buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field of {width} bytes at offset {offset} overruns a {len}-byte record")]
pub struct DecodeError {
    pub offset: usize,
    pub width: usize,
    pub len: usize,
}

fn field(buf: &[u8], offset: usize, width: usize) -> Result<&[u8], DecodeError> {
    offset
        .checked_add(width)
        .and_then(|end| buf.get(offset..end))
        .ok_or(DecodeError {
            offset,
            width,
            len: buf.len(),
        })
}

fn fold(bytes: &[u8], order: ByteOrder) -> u64 {
    match order {
        ByteOrder::Little => bytes
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
        ByteOrder::Big => bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
    }
}

pub fn read_u16(buf: &[u8], offset: usize, order: ByteOrder) -> Result<u16, DecodeError> {
    Ok(fold(field(buf, offset, 2)?, order) as u16)
}

pub fn read_u32(buf: &[u8], offset: usize, order: ByteOrder) -> Result<u32, DecodeError> {
    Ok(fold(field(buf, offset, 4)?, order) as u32)
}

/// Interpret the 4 bytes at `offset` as a signed 32-bit integer.
pub fn read_i32(buf: &[u8], offset: usize, order: ByteOrder) -> Result<i32, DecodeError> {
    read_u32(buf, offset, order).map(|v| v as i32)
}

pub fn read_u64(buf: &[u8], offset: usize, order: ByteOrder) -> Result<u64, DecodeError> {
    Ok(fold(field(buf, offset, 8)?, order))
}

pub fn read_i64(buf: &[u8], offset: usize, order: ByteOrder) -> Result<i64, DecodeError> {
    read_u64(buf, offset, order).map(|v| v as i64)
}

/// Unsigned machine word (`size_t`, `uintptr_t`) of 4 or 8 bytes.
pub fn read_word(
    buf: &[u8],
    offset: usize,
    width: usize,
    order: ByteOrder,
) -> Result<u64, DecodeError> {
    match width {
        4 => read_u32(buf, offset, order).map(u64::from),
        _ => read_u64(buf, offset, order),
    }
}

/// Signed machine word (`long`, `time_t`) of 4 or 8 bytes, sign-extended.
pub fn read_sword(
    buf: &[u8],
    offset: usize,
    width: usize,
    order: ByteOrder,
) -> Result<i64, DecodeError> {
    match width {
        4 => read_i32(buf, offset, order).map(i64::from),
        _ => read_i64(buf, offset, order),
    }
}

/// Fixed-size, NUL-padded C char array. Bytes after the first NUL are ignored.
pub fn read_cstr(buf: &[u8], offset: usize, len: usize) -> Result<String, DecodeError> {
    let bytes = field(buf, offset, len)?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

/// A record buffer paired with the byte order its integers use.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    bytes: &'a [u8],
    order: ByteOrder,
}

impl<'a> Record<'a> {
    pub fn new(bytes: &'a [u8], order: ByteOrder) -> Self {
        Self { bytes, order }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Fails unless the record holds at least `len` bytes.
    pub fn require(&self, len: usize) -> Result<(), DecodeError> {
        field(self.bytes, 0, len).map(|_| ())
    }

    pub fn u16(&self, offset: usize) -> Result<u16, DecodeError> {
        read_u16(self.bytes, offset, self.order)
    }

    pub fn u32(&self, offset: usize) -> Result<u32, DecodeError> {
        read_u32(self.bytes, offset, self.order)
    }

    pub fn i32(&self, offset: usize) -> Result<i32, DecodeError> {
        read_i32(self.bytes, offset, self.order)
    }

    pub fn u64(&self, offset: usize) -> Result<u64, DecodeError> {
        read_u64(self.bytes, offset, self.order)
    }

    pub fn word(&self, offset: usize, width: usize) -> Result<u64, DecodeError> {
        read_word(self.bytes, offset, width, self.order)
    }

    pub fn sword(&self, offset: usize, width: usize) -> Result<i64, DecodeError> {
        read_sword(self.bytes, offset, width, self.order)
    }

    pub fn cstr(&self, offset: usize, len: usize) -> Result<String, DecodeError> {
        read_cstr(self.bytes, offset, len)
    }
}

/// Little helper for building synthetic records in tests.
#[cfg(test)]
pub(crate) fn put(buf: &mut [u8], offset: usize, bytes: &[u8]) {
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
}
