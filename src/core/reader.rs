//! # Byte Reader
//!
//! Forward-only cursor over a borrowed datagram.
//!
//! Every read is bounds-checked and returns `None` when the buffer is too short,
//! leaving the position untouched. Callers decide whether a short read is a silent
//! drop (packet and command framing) or a decode error (Protocol16 values).
//!
//! All multi-byte integers on the wire are big-endian.

/// Cursor with an interior position over a byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the end of the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Borrow the next `len` bytes and advance past them.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let bytes = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    /// Advance past `len` bytes without looking at them.
    #[inline]
    pub fn skip(&mut self, len: usize) -> Option<()> {
        self.read_bytes(len).map(|_| ())
    }

    #[inline]
    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Some(out)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        let byte = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    #[inline]
    pub fn read_u16_be(&mut self) -> Option<u16> {
        self.read_array().map(u16::from_be_bytes)
    }

    #[inline]
    pub fn read_u32_be(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_be_bytes)
    }

    #[inline]
    pub fn read_i16_be(&mut self) -> Option<i16> {
        self.read_array().map(i16::from_be_bytes)
    }

    #[inline]
    pub fn read_i32_be(&mut self) -> Option<i32> {
        self.read_array().map(i32::from_be_bytes)
    }

    #[inline]
    pub fn read_i64_be(&mut self) -> Option<i64> {
        self.read_array().map(i64::from_be_bytes)
    }

    #[inline]
    pub fn read_f32_be(&mut self) -> Option<f32> {
        self.read_array().map(f32::from_be_bytes)
    }

    #[inline]
    pub fn read_f64_be(&mut self) -> Option<f64> {
        self.read_array().map(f64::from_be_bytes)
    }
}
