//! Growable big-endian buffer writer.

use crate::NULL_LENGTH;

/// A binary buffer writer that grows as needed.
///
/// Bytes written since the last [`Writer::flush`] or [`Writer::reset`] form
/// the pending frame. Resetting drops it, so a failed encode leaves nothing
/// behind for the next one.
///
/// # Example
///
/// ```
/// use kvpack_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.u16(0x0203);
/// assert_eq!(writer.flush(), [0x01, 0x02, 0x03]);
/// ```
pub struct Writer {
    /// The underlying byte buffer.
    pub uint8: Vec<u8>,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Creates a new writer with the default capacity (64KB).
    pub fn new() -> Self {
        Self::with_alloc_size(64 * 1024)
    }

    /// Creates a new writer that preallocates `alloc_size` bytes.
    pub fn with_alloc_size(alloc_size: usize) -> Self {
        Self {
            uint8: Vec::with_capacity(alloc_size),
        }
    }

    /// Current cursor position.
    #[inline]
    pub fn x(&self) -> usize {
        self.uint8.len()
    }

    /// Drops the pending frame, keeping the allocation.
    pub fn reset(&mut self) {
        self.uint8.clear();
    }

    /// Returns the pending frame and starts a new one.
    pub fn flush(&mut self) -> Vec<u8> {
        let result = self.uint8.clone();
        self.reset();
        result
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.uint8.push(val);
    }

    #[inline]
    pub fn i8(&mut self, val: i8) {
        self.uint8.push(val as u8);
    }

    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn f32(&mut self, val: f32) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a byte slice.
    pub fn buf(&mut self, buf: &[u8]) {
        self.uint8.extend_from_slice(buf);
    }

    /// Writes raw UTF-8 with no framing. Returns the number of bytes written.
    pub fn utf8(&mut self, s: &str) -> usize {
        self.uint8.extend_from_slice(s.as_bytes());
        s.len()
    }

    /// Writes a length-prefixed string, or the null marker for `None`.
    pub fn str(&mut self, s: Option<&str>) {
        match s {
            Some(s) => {
                self.u32(s.len() as u32);
                self.utf8(s);
            }
            None => self.u32(NULL_LENGTH),
        }
    }

    /// Writes an array element count.
    pub fn count(&mut self, len: usize) {
        self.u32(len as u32);
    }
}
