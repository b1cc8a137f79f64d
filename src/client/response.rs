// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decoding of validated responses

use crate::{
    codec::unpack_coil,
    frame::{rtu::RequestContext, EXCEPTION_FLAG},
    Address, Coil, Error, FunctionCode, Quantity, Result, Word,
};

use super::Client;

/// Offset of the first data byte of a read response.
const DATA_OFFSET: usize = 2;

impl<T> Client<T> {
    /// The exception code of the last response.
    ///
    /// Returns `0` unless the server has answered with an exception.
    #[must_use]
    pub fn exception_code(&self) -> u8 {
        let pdu = self.pdu.as_bytes();
        if pdu.len() < 2 || pdu[0] & EXCEPTION_FLAG == 0 {
            return 0;
        }
        pdu[1]
    }

    /// Start address of the values in the response.
    pub fn response_address(&self) -> Result<Address> {
        self.response_range().map(|(address, _)| address)
    }

    /// Number of values in the response.
    pub fn response_count(&self) -> Result<Quantity> {
        self.response_range().map(|(_, count)| count)
    }

    /// The coil or discrete input at `address`.
    pub fn response_bit(&self, address: Address) -> Result<Coil> {
        let offset = self.response_offset(address, FunctionCode::is_bit_read, "bit")?;
        Ok(unpack_coil(&self.pdu.as_bytes()[DATA_OFFSET..], offset))
    }

    /// The holding or input register at `address`.
    pub fn response_register(&self, address: Address) -> Result<Word> {
        let offset = self.response_offset(address, FunctionCode::is_register_read, "register")?;
        Ok(self.pdu.read_u16(DATA_OFFSET + offset * 2))
    }

    /// The holding or input register at `address`, interpreted as
    /// two's complement.
    pub fn response_register_signed(&self, address: Address) -> Result<i16> {
        let offset = self.response_offset(address, FunctionCode::is_register_read, "register")?;
        Ok(self.pdu.read_i16(DATA_OFFSET + offset * 2))
    }

    /// All coils or discrete inputs of the response.
    pub fn response_bits(&self) -> Result<Vec<Coil>> {
        let (address, count) = self.response_range()?;
        (0..count)
            .map(|offset| self.response_bit(address + offset))
            .collect()
    }

    /// All registers of the response.
    pub fn response_registers(&self) -> Result<Vec<Word>> {
        let (address, count) = self.response_range()?;
        (0..count)
            .map(|offset| self.response_register(address + offset))
            .collect()
    }

    fn ready_context(&self) -> Result<&RequestContext> {
        match &self.context {
            Some(context) if context.response_ready => Ok(context),
            _ => Err(Error::InvalidState("no valid response available".to_owned())),
        }
    }

    fn response_range(&self) -> Result<(Address, Quantity)> {
        let context = self.ready_context()?;
        context.expected_range.ok_or_else(|| {
            Error::InvalidState(format!(
                "function 0x{:0>2X} has no address range",
                context.function_code.value()
            ))
        })
    }

    fn response_offset(
        &self,
        address: Address,
        supports: fn(FunctionCode) -> bool,
        what: &str,
    ) -> Result<usize> {
        let context = self.ready_context()?;
        if !supports(FunctionCode::new(self.pdu.function_code())) {
            return Err(Error::InvalidState(format!(
                "function 0x{:0>2X} has no {what} values",
                context.function_code.value()
            )));
        }
        let (start, count) = self.response_range()?;
        if address < start || address - start >= count {
            return Err(Error::OutOfBounds {
                address,
                start,
                count,
            });
        }
        Ok(usize::from(address - start))
    }
}
