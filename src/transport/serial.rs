// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serial port transport based on `tokio-serial`

use std::{io, time::Duration};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt as _;
use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort as _, SerialPortBuilder, SerialStream,
    StopBits,
};

use super::{read_into, write_frame, Transport};

/// Communication parameters of a serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
}

impl Default for SerialConfig {
    /// 9600 baud, 8N1
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
        }
    }
}

impl SerialConfig {
    #[must_use]
    pub fn builder(&self, path: &str) -> SerialPortBuilder {
        tokio_serial::new(path, self.baud_rate)
            .data_bits(self.data_bits)
            .stop_bits(self.stop_bits)
            .parity(self.parity)
            .flow_control(FlowControl::None)
    }
}

/// [`Transport`] on a serial port.
///
/// Must be opened from within a Tokio runtime.
#[derive(Debug)]
pub struct SerialTransport {
    stream: SerialStream,
}

impl SerialTransport {
    pub fn open(path: &str, config: &SerialConfig) -> io::Result<Self> {
        log::debug!("Opening {path} with {config:?}");
        let stream = SerialStream::open(&config.builder(path))?;
        Ok(Self { stream })
    }

    #[must_use]
    pub const fn from_stream(stream: SerialStream) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        write_frame(&mut self.stream, frame).await
    }

    async fn read_into(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<bool> {
        read_into(&mut self.stream, buf, timeout).await
    }

    async fn clear_input(&mut self) -> io::Result<()> {
        self.stream.clear(ClearBuffer::Input)?;
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }
}
