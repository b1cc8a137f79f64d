// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types.

use std::io;

use thiserror::Error;

use crate::Address;

/// Errors raised synchronously by the client.
///
/// Timeouts, mismatching frames and _Modbus_ exceptions are not errors
/// but regular [`Outcome`](crate::Outcome)s of an exchange.
#[derive(Debug, Error)]
pub enum Error {
    /// A request parameter violates a protocol ceiling.
    ///
    /// Nothing has been modified or transmitted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not possible in the current state of the session.
    ///
    /// This happens if a response accessor is used without a successful
    /// response or for a function that does not support it.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The address is not within the range of the request.
    #[error("address {address} out of bounds (start = {start}, count = {count})")]
    OutOfBounds {
        address: Address,
        start: Address,
        count: u16,
    },

    /// The underlying transport failed.
    #[error(transparent)]
    Transport(#[from] io::Error),
}

/// Specialized [`std::result::Result`] type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_out_of_bounds() {
        let err = Error::OutOfBounds {
            address: 12,
            start: 0,
            count: 10,
        };
        assert_eq!(
            err.to_string(),
            "address 12 out of bounds (start = 0, count = 10)"
        );
    }

    #[test]
    fn transport_error_is_transparent() {
        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "line down").into();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(err.to_string(), "line down");
    }
}
