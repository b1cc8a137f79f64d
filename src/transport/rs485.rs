// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{fmt, io, time::Duration};

use async_trait::async_trait;

use super::Transport;

/// Direction of a half-duplex line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Transmit,
    Receive,
}

/// Control line of an RS485 transceiver, e.g. the DE/RE pin driven by a GPIO.
pub trait DirectionControl: Send + fmt::Debug {
    fn set_direction(&mut self, direction: Direction) -> io::Result<()>;
}

/// [`Transport`] for RS485 transceivers that need to be switched
/// between transmitting and receiving.
///
/// The line is switched to [`Direction::Transmit`] before every write
/// and back to [`Direction::Receive`] before every read.
#[derive(Debug)]
pub struct Rs485<T, P> {
    transport: T,
    direction: P,
}

impl<T, P> Rs485<T, P> {
    pub const fn new(transport: T, direction: P) -> Self {
        Self {
            transport,
            direction,
        }
    }
}

impl<T, P> Rs485<T, P>
where
    P: DirectionControl,
{
    fn switch(&mut self, direction: Direction) -> io::Result<()> {
        log::trace!("Switching line to {direction:?}");
        self.direction.set_direction(direction)
    }
}

#[async_trait]
impl<T, P> Transport for Rs485<T, P>
where
    T: Transport,
    P: DirectionControl,
{
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.switch(Direction::Transmit)?;
        self.transport.write_frame(frame).await
    }

    async fn read_into(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<bool> {
        self.switch(Direction::Receive)?;
        self.transport.read_into(buf, timeout).await
    }

    async fn clear_input(&mut self) -> io::Result<()> {
        self.transport.clear_input().await
    }

    async fn close(&mut self) -> io::Result<()> {
        self.transport.close().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::io::{duplex, AsyncReadExt as _, AsyncWriteExt as _};

    use super::*;
    use crate::transport::StreamTransport;

    #[derive(Debug, Clone, Default)]
    struct PinMock {
        switches: Arc<Mutex<Vec<Direction>>>,
    }

    impl DirectionControl for PinMock {
        fn set_direction(&mut self, direction: Direction) -> io::Result<()> {
            self.switches.lock().unwrap().push(direction);
            Ok(())
        }
    }

    #[tokio::test]
    async fn switch_direction_around_io() {
        let (client, mut server) = duplex(64);
        let pin = PinMock::default();
        let mut rs485 = Rs485::new(StreamTransport::new(client), pin.clone());

        rs485.write_frame(&[0x01, 0x02]).await.unwrap();
        let mut sent = [0; 2];
        server.read_exact(&mut sent).await.unwrap();

        server.write_all(&[0x03]).await.unwrap();
        let mut buf = [0; 1];
        assert!(rs485
            .read_into(&mut buf, Duration::from_millis(100))
            .await
            .unwrap());

        assert_eq!(
            *pin.switches.lock().unwrap(),
            vec![Direction::Transmit, Direction::Receive]
        );
    }

    #[derive(Debug)]
    struct BrokenPin;

    impl DirectionControl for BrokenPin {
        fn set_direction(&mut self, _: Direction) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "gpio"))
        }
    }

    #[tokio::test]
    async fn failing_pin_aborts_write() {
        let (client, _server) = duplex(64);
        let mut rs485 = Rs485::new(StreamTransport::new(client), BrokenPin);
        let err = rs485.write_frame(&[0x01]).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }
}
