// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronous RTU client

#[cfg(feature = "serial")]
pub mod rtu;

use std::{
    io,
    ops::{Deref, DerefMut},
};

use crate::{transport::Transport, Outcome, Result};

use super::{Client as AsyncClient, ClientConfig};

fn new_runtime() -> io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// A blocking _Modbus_ RTU client.
///
/// Drives an asynchronous [`Client`](AsyncClient) on a private
/// single-threaded runtime. Request builders and response accessors
/// are available through [`Deref`].
#[derive(Debug)]
pub struct Client<T> {
    runtime: tokio::runtime::Runtime,
    async_client: AsyncClient<T>,
}

impl<T> Client<T> {
    pub fn new(transport: T, config: ClientConfig) -> io::Result<Self> {
        let runtime = new_runtime()?;
        Ok(Self::with_runtime(runtime, transport, config))
    }

    pub(crate) fn with_runtime(
        runtime: tokio::runtime::Runtime,
        transport: T,
        config: ClientConfig,
    ) -> Self {
        Self {
            runtime,
            async_client: AsyncClient::new(transport, config),
        }
    }
}

impl<T> Client<T>
where
    T: Transport,
{
    /// Sends the prepared request and blocks until the response has
    /// been received or the timeout has elapsed.
    pub fn execute(&mut self) -> Result<Outcome> {
        self.runtime.block_on(self.async_client.execute())
    }

    pub fn close(&mut self) -> io::Result<()> {
        self.runtime.block_on(self.async_client.close())
    }
}

impl<T> Deref for Client<T> {
    type Target = AsyncClient<T>;

    fn deref(&self) -> &Self::Target {
        &self.async_client
    }
}

impl<T> DerefMut for Client<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.async_client
    }
}
