//! Read cursor over an immutable byte buffer

/// Read position within a fixed buffer
///
/// Reads return `None` when the buffer is exhausted; each caller maps that to
/// the error appropriate for the field being read.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn at(buffer: &'a [u8], position: usize) -> Self {
        Self {
            buffer,
            position: position.min(buffer.len()),
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    /// Bytes from the current position to the end of the buffer
    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.buffer[self.position..]
    }

    pub(crate) fn read_u8(&mut self) -> Option<u8> {
        let byte = *self.buffer.get(self.position)?;
        self.position += 1;
        Some(byte)
    }

    pub(crate) fn read_bytes(&mut self, count: usize) -> Option<&'a [u8]> {
        let end = self.position.checked_add(count)?;
        let bytes = self.buffer.get(self.position..end)?;
        self.position = end;
        Some(bytes)
    }

    /// Bytes consumed since `start`
    pub(crate) fn consumed_since(&self, start: usize) -> &'a [u8] {
        &self.buffer[start..self.position]
    }
}
