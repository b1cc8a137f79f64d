// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

pub(crate) mod pdu;
pub(crate) mod rtu;

use std::{
    borrow::Cow,
    error,
    fmt::{self, Display},
};

use crate::{Error, Result, SlaveId};

/// Maximum request/response PDU size.
///
/// Modbus over serial line: 256 bytes per frame minus
/// server address (1) and CRC (2).
pub const MAX_PDU_SIZE: usize = 253;

/// Maximum number of coils or discrete inputs per read request.
pub(crate) const MAX_READ_COILS: Quantity = 2000;

/// Maximum number of registers per read request.
pub(crate) const MAX_READ_REGISTERS: Quantity = 125;

/// Maximum number of coils per write request.
pub(crate) const MAX_WRITE_COILS: usize = 1968;

/// Maximum number of registers per write request.
pub(crate) const MAX_WRITE_REGISTERS: usize = 123;

/// Bit 7 of the function byte flags an exception response.
pub(crate) const EXCEPTION_FLAG: u8 = 0x80;

/// A Modbus function code.
///
/// Only the function codes of the data access functions are
/// handled explicitly, everything else is [`FunctionCode::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCode {
    /// 01 (0x01) Read Coils.
    ReadCoils,

    /// 02 (0x02) Read Discrete Inputs
    ReadDiscreteInputs,

    /// 03 (0x03) Read Holding Registers
    ReadHoldingRegisters,

    /// 04 (0x04) Read Input Registers
    ReadInputRegisters,

    /// 05 (0x05) Write Single Coil
    WriteSingleCoil,

    /// 06 (0x06) Write Single Register
    WriteSingleRegister,

    /// 15 (0x0F) Write Multiple Coils
    WriteMultipleCoils,

    /// 16 (0x10) Write Multiple Registers
    WriteMultipleRegisters,

    /// Custom Modbus Function Code.
    Custom(u8),
}

impl FunctionCode {
    /// Create a new [`FunctionCode`] with `value`.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        match value {
            0x01 => Self::ReadCoils,
            0x02 => Self::ReadDiscreteInputs,
            0x03 => Self::ReadHoldingRegisters,
            0x04 => Self::ReadInputRegisters,
            0x05 => Self::WriteSingleCoil,
            0x06 => Self::WriteSingleRegister,
            0x0F => Self::WriteMultipleCoils,
            0x10 => Self::WriteMultipleRegisters,
            code => Self::Custom(code),
        }
    }

    /// Gets the [`u8`] value of the current [`FunctionCode`].
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::ReadCoils => 0x01,
            Self::ReadDiscreteInputs => 0x02,
            Self::ReadHoldingRegisters => 0x03,
            Self::ReadInputRegisters => 0x04,
            Self::WriteSingleCoil => 0x05,
            Self::WriteSingleRegister => 0x06,
            Self::WriteMultipleCoils => 0x0F,
            Self::WriteMultipleRegisters => 0x10,
            Self::Custom(code) => code,
        }
    }

    /// Bit-valued reads, i.e. coils and discrete inputs.
    #[must_use]
    pub const fn is_bit_read(self) -> bool {
        matches!(self, Self::ReadCoils | Self::ReadDiscreteInputs)
    }

    /// Register-valued reads, i.e. holding and input registers.
    #[must_use]
    pub const fn is_register_read(self) -> bool {
        matches!(self, Self::ReadHoldingRegisters | Self::ReadInputRegisters)
    }
}

impl Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value().fmt(f)
    }
}

/// A Modbus protocol address is represented by 16 bit from `0` to `65535`.
///
/// This *protocol address* uses 0-based indexing, while the *coil address* or
/// *register address* is often specified as a number with 1-based indexing.
/// Please consult the specification of your devices if 1-based coil/register
/// addresses need to be converted to 0-based protocol addresses by subtracting 1.
pub type Address = u16;

/// A Coil represents a single bit.
///
/// - `true` is equivalent to `ON`, `1` and `0xFF00`.
/// - `false` is equivalent to `OFF`, `0` and `0x0000`.
pub type Coil = bool;

/// Modbus uses 16 bit for its data items.
///
/// Transmitted using a big-endian representation.
pub type Word = u16;

/// Number of items to process.
pub type Quantity = u16;

/// A request represents a message from the client (master) to the server (slave).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request<'a> {
    /// A request to read multiple coils.
    /// The first parameter is the address of the first coil to read.
    /// The second parameter is the number of coils to read.
    ReadCoils(Address, Quantity),

    /// A request to read multiple discrete inputs
    /// The first parameter is the address of the first discrete input to read.
    /// The second parameter is the number of discrete inputs to read.
    ReadDiscreteInputs(Address, Quantity),

    /// A request to read multiple holding registers.
    /// The first parameter is the address of the first holding register to read.
    /// The second parameter is the number of holding registers to read.
    ReadHoldingRegisters(Address, Quantity),

    /// A request to read multiple input registers.
    /// The first parameter is the address of the first input register to read.
    /// The second parameter is the number of input registers to read.
    ReadInputRegisters(Address, Quantity),

    /// A request to write a single coil.
    /// The first parameter is the address of the coil.
    /// The second parameter is the value to write to the coil.
    WriteSingleCoil(Address, Coil),

    /// A request to write a single register.
    /// The first parameter is the address of the register to write.
    /// The second parameter is the value to write to the register.
    WriteSingleRegister(Address, Word),

    /// A request to write multiple coils.
    /// The first parameter is the address of the first coil to write.
    /// The second parameter is the vector of values to write to the coils.
    WriteMultipleCoils(Address, Cow<'a, [Coil]>),

    /// A request to write to multiple registers.
    /// The first parameter is the address of the first register to write.
    /// The second parameter is the vector of values to write to the registers.
    WriteMultipleRegisters(Address, Cow<'a, [Word]>),

    /// A raw Modbus request.
    /// The first parameter is the Modbus function code.
    /// The second parameter is the raw bytes of the request following the function code.
    /// The third parameter is the expected size of the response PDU,
    /// including the function code.
    Custom(u8, Cow<'a, [u8]>, usize),
}

impl Request<'_> {
    /// Converts the request into an owned instance with `'static'` lifetime.
    #[must_use]
    pub fn into_owned(self) -> Request<'static> {
        use Request::*;

        match self {
            ReadCoils(addr, qty) => ReadCoils(addr, qty),
            ReadDiscreteInputs(addr, qty) => ReadDiscreteInputs(addr, qty),
            ReadHoldingRegisters(addr, qty) => ReadHoldingRegisters(addr, qty),
            ReadInputRegisters(addr, qty) => ReadInputRegisters(addr, qty),
            WriteSingleCoil(addr, coil) => WriteSingleCoil(addr, coil),
            WriteSingleRegister(addr, word) => WriteSingleRegister(addr, word),
            WriteMultipleCoils(addr, coils) => {
                WriteMultipleCoils(addr, Cow::Owned(coils.into_owned()))
            }
            WriteMultipleRegisters(addr, words) => {
                WriteMultipleRegisters(addr, Cow::Owned(words.into_owned()))
            }
            Custom(func, bytes, rsp_len) => Custom(func, Cow::Owned(bytes.into_owned()), rsp_len),
        }
    }

    /// Get the [`FunctionCode`] of the [`Request`].
    #[must_use]
    pub const fn function_code(&self) -> FunctionCode {
        use Request::*;

        match self {
            ReadCoils(_, _) => FunctionCode::ReadCoils,
            ReadDiscreteInputs(_, _) => FunctionCode::ReadDiscreteInputs,

            ReadHoldingRegisters(_, _) => FunctionCode::ReadHoldingRegisters,
            ReadInputRegisters(_, _) => FunctionCode::ReadInputRegisters,

            WriteSingleCoil(_, _) => FunctionCode::WriteSingleCoil,
            WriteSingleRegister(_, _) => FunctionCode::WriteSingleRegister,

            WriteMultipleCoils(_, _) => FunctionCode::WriteMultipleCoils,
            WriteMultipleRegisters(_, _) => FunctionCode::WriteMultipleRegisters,

            Custom(code, _, _) => FunctionCode::Custom(*code),
        }
    }

    /// Checks the request against the protocol limits.
    pub fn validate(&self) -> Result<()> {
        use Request::*;

        match self {
            ReadCoils(addr, cnt) | ReadDiscreteInputs(addr, cnt) => {
                check_quantity(*cnt, MAX_READ_COILS, "coils")?;
                check_range(*addr, usize::from(*cnt))
            }
            ReadHoldingRegisters(addr, cnt) | ReadInputRegisters(addr, cnt) => {
                check_quantity(*cnt, MAX_READ_REGISTERS, "registers")?;
                check_range(*addr, usize::from(*cnt))
            }
            WriteSingleCoil(_, _) | WriteSingleRegister(_, _) => Ok(()),
            WriteMultipleCoils(addr, coils) => {
                check_len(coils.len(), MAX_WRITE_COILS, "coils")?;
                check_range(*addr, coils.len())
            }
            WriteMultipleRegisters(addr, words) => {
                check_len(words.len(), MAX_WRITE_REGISTERS, "registers")?;
                check_range(*addr, words.len())
            }
            Custom(code, data, rsp_len) => {
                if *code == 0 || *code & EXCEPTION_FLAG != 0 {
                    return Err(Error::InvalidArgument(format!(
                        "invalid function code 0x{code:0>2X}"
                    )));
                }
                if 1 + data.len() > MAX_PDU_SIZE {
                    return Err(Error::InvalidArgument(format!(
                        "request PDU size {} exceeds {MAX_PDU_SIZE}",
                        1 + data.len()
                    )));
                }
                if *rsp_len == 0 || *rsp_len > MAX_PDU_SIZE {
                    return Err(Error::InvalidArgument(format!(
                        "expected response PDU size {rsp_len} not in 1..={MAX_PDU_SIZE}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// The size of the request PDU, including the function code.
    pub(crate) fn pdu_size(&self) -> usize {
        use Request::*;

        match self {
            ReadCoils(_, _)
            | ReadDiscreteInputs(_, _)
            | ReadHoldingRegisters(_, _)
            | ReadInputRegisters(_, _)
            | WriteSingleCoil(_, _)
            | WriteSingleRegister(_, _) => 5,
            WriteMultipleCoils(_, coils) => 6 + packed_coils_len(coils.len()),
            WriteMultipleRegisters(_, words) => 6 + words.len() * 2,
            Custom(_, data, _) => 1 + data.len(),
        }
    }

    /// The size of a regular (non-exception) response PDU,
    /// including the function code.
    pub(crate) fn expected_response_pdu_size(&self) -> usize {
        use Request::*;

        match self {
            ReadCoils(_, cnt) | ReadDiscreteInputs(_, cnt) => {
                2 + packed_coils_len(usize::from(*cnt))
            }
            ReadHoldingRegisters(_, cnt) | ReadInputRegisters(_, cnt) => {
                2 + 2 * usize::from(*cnt)
            }
            WriteSingleCoil(_, _)
            | WriteSingleRegister(_, _)
            | WriteMultipleCoils(_, _)
            | WriteMultipleRegisters(_, _) => 5,
            Custom(_, _, rsp_len) => *rsp_len,
        }
    }

    /// Start address and quantity of the data returned by read requests.
    pub(crate) const fn expected_range(&self) -> Option<(Address, Quantity)> {
        use Request::*;

        match self {
            ReadCoils(addr, cnt)
            | ReadDiscreteInputs(addr, cnt)
            | ReadHoldingRegisters(addr, cnt)
            | ReadInputRegisters(addr, cnt) => Some((*addr, *cnt)),
            _ => None,
        }
    }
}

fn check_quantity(cnt: Quantity, max: Quantity, what: &str) -> Result<()> {
    if cnt < 1 || cnt > max {
        return Err(Error::InvalidArgument(format!(
            "number of {what} {cnt} not in 1..={max}"
        )));
    }
    Ok(())
}

fn check_range(addr: Address, cnt: usize) -> Result<()> {
    if usize::from(addr) + cnt > usize::from(Address::MAX) + 1 {
        return Err(Error::InvalidArgument(format!(
            "range of {cnt} items at address {addr} exceeds the address space"
        )));
    }
    Ok(())
}

fn check_len(len: usize, max: usize, what: &str) -> Result<()> {
    if len > max {
        return Err(Error::InvalidArgument(format!(
            "number of {what} {len} exceeds {max}"
        )));
    }
    Ok(())
}

/// Calculate the number of bytes required for a given number of coils.
pub(crate) const fn packed_coils_len(bitcount: usize) -> usize {
    (bitcount + 7) / 8
}

/// A server (slave) exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionCode {
    /// 0x01
    IllegalFunction,
    /// 0x02
    IllegalDataAddress,
    /// 0x03
    IllegalDataValue,
    /// 0x04
    ServerDeviceFailure,
    /// 0x05
    Acknowledge,
    /// 0x06
    ServerDeviceBusy,
    /// 0x08
    MemoryParityError,
    /// 0x0A
    GatewayPathUnavailable,
    /// 0x0B
    GatewayTargetDevice,
    /// None of the above.
    ///
    /// Although encoding one of the predefined values as this is possible, it is not recommended.
    /// Instead, prefer to use [`Self::new()`] to prevent such ambiguities.
    Custom(u8),
}

impl From<ExceptionCode> for u8 {
    fn from(from: ExceptionCode) -> Self {
        use crate::frame::ExceptionCode::*;
        match from {
            IllegalFunction => 0x01,
            IllegalDataAddress => 0x02,
            IllegalDataValue => 0x03,
            ServerDeviceFailure => 0x04,
            Acknowledge => 0x05,
            ServerDeviceBusy => 0x06,
            MemoryParityError => 0x08,
            GatewayPathUnavailable => 0x0A,
            GatewayTargetDevice => 0x0B,
            Custom(code) => code,
        }
    }
}

impl ExceptionCode {
    /// Create a new [`ExceptionCode`] with `value`.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        use crate::frame::ExceptionCode::*;

        match value {
            0x01 => IllegalFunction,
            0x02 => IllegalDataAddress,
            0x03 => IllegalDataValue,
            0x04 => ServerDeviceFailure,
            0x05 => Acknowledge,
            0x06 => ServerDeviceBusy,
            0x08 => MemoryParityError,
            0x0A => GatewayPathUnavailable,
            0x0B => GatewayTargetDevice,
            other => Custom(other),
        }
    }

    pub(crate) fn description(&self) -> &str {
        use crate::frame::ExceptionCode::*;

        match *self {
            IllegalFunction => "Illegal function",
            IllegalDataAddress => "Illegal data address",
            IllegalDataValue => "Illegal data value",
            ServerDeviceFailure => "Server device failure",
            Acknowledge => "Acknowledge",
            ServerDeviceBusy => "Server device busy",
            MemoryParityError => "Memory parity error",
            GatewayPathUnavailable => "Gateway path unavailable",
            GatewayTargetDevice => "Gateway target device failed to respond",
            Custom(_) => "Custom",
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl error::Error for ExceptionCode {}

/// The reason why a received frame has been rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadResponse {
    /// The frame has been sent by another server.
    ServerMismatch { expected: SlaveId, actual: SlaveId },

    /// The function code of the frame doesn't match the request.
    FunctionMismatch { expected: u8, actual: u8 },

    /// The checksum of the frame is not correct.
    Crc { expected: u16, actual: u16 },
}

impl fmt::Display for BadResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerMismatch { expected, actual } => {
                write!(f, "invalid server id {actual}, expected {expected}")
            }
            Self::FunctionMismatch { expected, actual } => write!(
                f,
                "invalid function 0x{actual:0>2X}, expected 0x{expected:0>2X}"
            ),
            Self::Crc { expected, actual } => write!(
                f,
                "invalid CRC 0x{actual:0>4X}, expected 0x{expected:0>4X}"
            ),
        }
    }
}

/// The result of a request/response exchange.
///
/// Only [`Outcome::Ok`] enables the response accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A valid response has been received.
    Ok,

    /// The response did not arrive (completely) in time.
    Timeout,

    /// The server answered with a valid exception frame.
    Exception(ExceptionCode),

    /// The received frame is malformed or doesn't belong to the request.
    BadResponse(BadResponse),
}

impl Outcome {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::Timeout => f.write_str("Timeout"),
            Self::Exception(exception) => write!(
                f,
                "Exception 0x{:0>2X}: {exception}",
                u8::from(*exception)
            ),
            Self::BadResponse(reason) => write!(f, "Bad response: {reason}"),
        }
    }
}
