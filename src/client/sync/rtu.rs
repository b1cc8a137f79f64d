// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blocking client on a serial port

use std::io;

use crate::{
    client::ClientConfig,
    transport::{SerialConfig, SerialTransport},
};

use super::{new_runtime, Client};

/// Opens the serial port at `path` and creates a blocking client for it.
pub fn connect(
    path: &str,
    serial: &SerialConfig,
    config: ClientConfig,
) -> io::Result<Client<SerialTransport>> {
    let runtime = new_runtime()?;
    // The serial stream registers itself with the reactor of the runtime.
    let transport = {
        let _guard = runtime.enter();
        SerialTransport::open(path, serial)?
    };
    Ok(Client::with_runtime(runtime, transport, config))
}
