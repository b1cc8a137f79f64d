// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A [Modbus](https://en.wikipedia.org/wiki/Modbus) RTU master
//! based on [tokio](https://tokio.rs).
//!
//! Modbus is based on a [master/slave](https://en.wikipedia.org/wiki/Master/slave_(technology))
//! model.
//! To avoid confusions with the tokio terminology the master is called *client*
//! and the slave is called *server* in this library.
//!
//! The client owns a single PDU buffer per session. Each exchange follows
//! the same cycle:
//!
//! 1. initialize a request with one of the `init_*` builders,
//! 2. [`execute`](client::Client::execute) it, which sends the RTU frame and
//!    waits for the answer within the configured timeout,
//! 3. inspect the [`Outcome`] and, if it is [`Outcome::Ok`], read the
//!    values through the response accessors.
//!
//! ## Installation
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! modbus-rtu-master = "*"
//! ```
//!
//! Enable the `sync` feature for a blocking client and the `serial`
//! feature (default) for opening serial ports through `tokio-serial`.

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]
#![warn(unsafe_code)]

pub mod prelude;

pub mod client;
pub mod transport;

mod codec;
pub use codec::rtu::{crc16, crc_valid};

mod error;
pub use self::error::{Error, Result};

mod frame;
pub use self::frame::{
    pdu::{HexDump, PduBuffer},
    rtu::RequestContext,
    Address, BadResponse, Coil, ExceptionCode, FunctionCode, Outcome, Quantity, Request, Word,
    MAX_PDU_SIZE,
};

mod slave;
pub use self::slave::{Slave, SlaveId};
