// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-capacity storage of a single PDU

use std::fmt;

use byteorder::{BigEndian, ByteOrder as _};

use crate::{Error, Result};

use super::MAX_PDU_SIZE;

/// A _Modbus_ Protocol Data Unit, i.e. the function code
/// followed by the function specific data.
///
/// The buffer has a fixed capacity of [`MAX_PDU_SIZE`] bytes and
/// a logical size that bounds all field accessors. All 16-bit
/// fields are big-endian.
///
/// # Panics
///
/// The `read_*` and `write_*` accessors panic if the field is not
/// within the logical size.
#[derive(Clone)]
pub struct PduBuffer {
    data: [u8; MAX_PDU_SIZE],
    size: usize,
}

impl PduBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: [0; MAX_PDU_SIZE],
            size: 0,
        }
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Sets the logical size.
    ///
    /// The contents are preserved; bytes that become visible keep
    /// their previous value.
    pub fn set_size(&mut self, size: usize) -> Result<()> {
        if size > MAX_PDU_SIZE {
            return Err(Error::InvalidArgument(format!(
                "PDU size {size} exceeds {MAX_PDU_SIZE}"
            )));
        }
        self.size = size;
        Ok(())
    }

    /// The function code, i.e. the first byte.
    ///
    /// Returns `0` for an empty buffer, which is not a valid function code.
    #[must_use]
    pub fn function_code(&self) -> u8 {
        self.as_bytes().first().copied().unwrap_or_default()
    }

    pub fn write_u8(&mut self, offset: usize, value: u8) {
        self.as_bytes_mut()[offset] = value;
    }

    pub fn write_u16(&mut self, offset: usize, value: u16) {
        BigEndian::write_u16(&mut self.as_bytes_mut()[offset..offset + 2], value);
    }

    #[must_use]
    pub fn read_u8(&self, offset: usize) -> u8 {
        self.as_bytes()[offset]
    }

    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_i8(&self, offset: usize) -> i8 {
        self.read_u8(offset) as i8
    }

    #[must_use]
    pub fn read_u16(&self, offset: usize) -> u16 {
        BigEndian::read_u16(&self.as_bytes()[offset..offset + 2])
    }

    #[must_use]
    pub fn read_i16(&self, offset: usize) -> i16 {
        BigEndian::read_i16(&self.as_bytes()[offset..offset + 2])
    }

    /// Replaces the whole contents.
    pub fn copy_from(&mut self, src: &[u8]) -> Result<()> {
        self.set_size(src.len())?;
        self.as_bytes_mut().copy_from_slice(src);
        Ok(())
    }

    /// The logical contents.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.size]
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data[..self.size]
    }

    /// Renders the logical contents as hex dump, e.g. `03 00 6B 00 03`.
    #[must_use]
    pub fn hex(&self) -> HexDump<'_> {
        HexDump(self.as_bytes())
    }
}

impl Default for PduBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PduBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PduBuffer")
            .field("size", &self.size)
            .field("data", &format_args!("[{}]", self.hex()))
            .finish()
    }
}

impl PartialEq for PduBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for PduBuffer {}

/// Hex dump of a byte slice with space separated upper case octets.
#[derive(Debug, Clone, Copy)]
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = self.0.iter();
        if let Some(first) = bytes.next() {
            write!(f, "{first:0>2X}")?;
        }
        for byte in bytes {
            write!(f, " {byte:0>2X}")?;
        }
        Ok(())
    }
}
