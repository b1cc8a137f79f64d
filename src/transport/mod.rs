// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Byte transports for the RTU client
//!
//! The client only needs to write whole frames and to read an exact
//! number of bytes within a deadline. Anything that can do that, i.e.
//! a serial port, an RS485 line with direction control or an in-memory
//! stream, implements [`Transport`].

use std::{fmt, io, time::Duration};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt as _, AsyncWrite, AsyncWriteExt as _};

mod rs485;
pub use self::rs485::{Direction, DirectionControl, Rs485};

#[cfg(feature = "serial")]
mod serial;
#[cfg(feature = "serial")]
pub use self::serial::{SerialConfig, SerialTransport};

/// Half-duplex byte channel used by the client.
#[async_trait]
pub trait Transport: Send + fmt::Debug {
    /// Transmits the complete frame.
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Fills `buf` completely or gives up after `timeout`.
    ///
    /// Returns `Ok(false)` if not all bytes have been received in time.
    /// Errors are reserved for failures of the transport itself.
    async fn read_into(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<bool>;

    /// Discards all bytes that have been received but not yet read.
    async fn clear_input(&mut self) -> io::Result<()>;

    /// Releases the underlying resources.
    async fn close(&mut self) -> io::Result<()>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).write_frame(frame).await
    }

    async fn read_into(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<bool> {
        (**self).read_into(buf, timeout).await
    }

    async fn clear_input(&mut self) -> io::Result<()> {
        (**self).clear_input().await
    }

    async fn close(&mut self) -> io::Result<()> {
        (**self).close().await
    }
}

/// [`Transport`] on top of an arbitrary asynchronous byte stream.
#[derive(Debug)]
pub struct StreamTransport<T> {
    stream: T,
}

impl<T> StreamTransport<T> {
    pub const fn new(stream: T) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl<T> Transport for StreamTransport<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug,
{
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        write_frame(&mut self.stream, frame).await
    }

    async fn read_into(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<bool> {
        read_into(&mut self.stream, buf, timeout).await
    }

    async fn clear_input(&mut self) -> io::Result<()> {
        drain_input(&mut self.stream).await
    }

    async fn close(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }
}

pub(crate) async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await
}

pub(crate) async fn read_into<R>(reader: &mut R, buf: &mut [u8], timeout: Duration) -> io::Result<bool>
where
    R: AsyncRead + Unpin,
{
    match tokio::time::timeout(timeout, reader.read_exact(buf)).await {
        Ok(Ok(_)) => Ok(true),
        // The peer has stopped sending before the frame was complete.
        Ok(Err(err)) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Ok(Err(err)) => Err(err),
        Err(_elapsed) => {
            log::debug!("Read timeout after {timeout:?}");
            Ok(false)
        }
    }
}

/// Reads and discards everything that is immediately available.
async fn drain_input<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut scratch = [0; 64];
    let mut discarded = 0;
    // A zero timeout still polls the read once before expiring.
    while let Ok(res) = tokio::time::timeout(Duration::ZERO, reader.read(&mut scratch)).await {
        match res? {
            0 => break,
            n => discarded += n,
        }
    }
    if discarded > 0 {
        log::debug!("Discarded {discarded} stale byte(s)");
    }
    Ok(())
}
