// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! _Modbus_ RTU client session

use std::{borrow::Cow, io, ops::Range};

use bytes::BytesMut;

use crate::{
    codec::{
        encode_request_pdu,
        rtu::{crc16, crc_valid, encode_request_adu, received_crc, CRC_SIZE, MAX_ADU_SIZE},
    },
    frame::{rtu::RequestContext, EXCEPTION_FLAG},
    transport::Transport,
    Address, BadResponse, Coil, Error, ExceptionCode, HexDump, Outcome, PduBuffer, Quantity,
    Request, Result, Slave, SlaveId, Word,
};

use super::ClientConfig;

/// Server id, function code and exception code.
const EXCEPTION_ADU_SIZE_WITHOUT_CRC: usize = 3;

/// The progress of the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A request has been initialized or nothing happened yet.
    Idle,
    /// The request frame is being transmitted.
    Sending,
    /// Waiting for the server id of the response.
    AwaitingId,
    /// Waiting for the function code of the response.
    AwaitingFunction,
    /// Waiting for the exception code and the checksum.
    AwaitingException,
    /// Waiting for the remaining response data and the checksum.
    AwaitingBody,
    /// The exchange has been completed.
    Done(Outcome),
}

/// _Modbus_ RTU client.
///
/// A client represents a single session on a half-duplex line. It owns
/// the PDU buffer that holds the request and, after a successful
/// exchange, the response. Only one request can be pending at a time.
#[derive(Debug)]
pub struct Client<T> {
    transport: Option<T>,
    config: ClientConfig,
    pub(super) pdu: PduBuffer,
    pub(super) context: Option<RequestContext>,
    phase: Phase,
    send_buf: BytesMut,
    recv_buf: [u8; MAX_ADU_SIZE],
}

impl<T> Client<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport: Some(transport),
            config,
            pdu: PduBuffer::new(),
            context: None,
            phase: Phase::Idle,
            send_buf: BytesMut::with_capacity(MAX_ADU_SIZE),
            recv_buf: [0; MAX_ADU_SIZE],
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The context of the last initialized request.
    #[must_use]
    pub const fn context(&self) -> Option<&RequestContext> {
        self.context.as_ref()
    }

    /// The current contents of the PDU buffer, i.e. the request
    /// or the received response.
    #[must_use]
    pub const fn pdu(&self) -> &PduBuffer {
        &self.pdu
    }

    /// The outcome of the last completed exchange.
    ///
    /// `None` while no exchange has been completed for the current request.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Done(outcome) => Some(outcome),
            _ => None,
        }
    }

    #[must_use]
    pub fn outcome_description(&self) -> Option<String> {
        self.outcome().map(|outcome| outcome.to_string())
    }

    /// Prepares the next request.
    ///
    /// The request is validated before anything is modified. On success
    /// the PDU buffer holds the request and all information about a
    /// previous response is discarded.
    ///
    /// Only write requests can be sent to [`Slave::broadcast()`].
    pub fn init_request(&mut self, server: Slave, request: Request<'_>) -> Result<()> {
        request.validate()?;
        if server.is_broadcast() && request.expected_range().is_some() {
            return Err(Error::InvalidArgument(
                "read requests cannot be broadcast".to_owned(),
            ));
        }
        encode_request_pdu(&mut self.pdu, &request)?;
        self.context = Some(RequestContext::new(server, &request));
        self.enter(Phase::Idle);
        log::debug!("Prepared request for server {server}: {}", self.pdu.hex());
        Ok(())
    }

    /// Read multiple coils (0x01)
    pub fn init_read_coils(&mut self, server: Slave, addr: Address, cnt: Quantity) -> Result<()> {
        self.init_request(server, Request::ReadCoils(addr, cnt))
    }

    /// Read multiple discrete inputs (0x02)
    pub fn init_read_discrete_inputs(
        &mut self,
        server: Slave,
        addr: Address,
        cnt: Quantity,
    ) -> Result<()> {
        self.init_request(server, Request::ReadDiscreteInputs(addr, cnt))
    }

    /// Read multiple holding registers (0x03)
    pub fn init_read_holding_registers(
        &mut self,
        server: Slave,
        addr: Address,
        cnt: Quantity,
    ) -> Result<()> {
        self.init_request(server, Request::ReadHoldingRegisters(addr, cnt))
    }

    /// Read multiple input registers (0x04)
    pub fn init_read_input_registers(
        &mut self,
        server: Slave,
        addr: Address,
        cnt: Quantity,
    ) -> Result<()> {
        self.init_request(server, Request::ReadInputRegisters(addr, cnt))
    }

    /// Write a single coil (0x05)
    pub fn init_write_single_coil(&mut self, server: Slave, addr: Address, coil: Coil) -> Result<()> {
        self.init_request(server, Request::WriteSingleCoil(addr, coil))
    }

    /// Write a single holding register (0x06)
    pub fn init_write_single_register(
        &mut self,
        server: Slave,
        addr: Address,
        word: Word,
    ) -> Result<()> {
        self.init_request(server, Request::WriteSingleRegister(addr, word))
    }

    /// Write multiple coils (0x0F)
    pub fn init_write_multiple_coils(
        &mut self,
        server: Slave,
        addr: Address,
        coils: &[Coil],
    ) -> Result<()> {
        self.init_request(server, Request::WriteMultipleCoils(addr, Cow::Borrowed(coils)))
    }

    /// Write multiple holding registers (0x10)
    pub fn init_write_multiple_registers(
        &mut self,
        server: Slave,
        addr: Address,
        words: &[Word],
    ) -> Result<()> {
        self.init_request(server, Request::WriteMultipleRegisters(addr, Cow::Borrowed(words)))
    }

    fn enter(&mut self, phase: Phase) {
        log::trace!("{:?} -> {phase:?}", self.phase);
        self.phase = phase;
    }

    /// Checks that the PDU buffer still contains the request.
    fn sendable_context(&self) -> Result<RequestContext> {
        let Some(context) = self.context else {
            return Err(Error::InvalidState("no request initialized".to_owned()));
        };
        match self.phase {
            // A broadcast leaves the request in place.
            Phase::Done(Outcome::Ok) if context.server.is_broadcast() => Ok(context),
            Phase::Done(Outcome::Ok | Outcome::Exception(_)) => Err(Error::InvalidState(
                "request has already been answered".to_owned(),
            )),
            _ => Ok(context),
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        if let Some(context) = &mut self.context {
            context.response_ready = outcome.is_ok() && !context.server.is_broadcast();
            let server = context.server;
            match outcome {
                Outcome::Ok => {}
                Outcome::Exception(exception) => {
                    log::warn!("Exception 0x{:0>2X} from {server}", u8::from(exception));
                }
                other => log::warn!("{other} from {server}"),
            }
        }
        self.enter(Phase::Done(outcome));
    }

    fn log_frame(&self, kind: &str, len: usize) {
        log::debug!("Read ({kind}): {}", HexDump(&self.recv_buf[..len]));
    }

    fn check_crc(&self, size: usize) -> Option<BadResponse> {
        if crc_valid(&self.recv_buf[..size + CRC_SIZE], size) {
            return None;
        }
        let expected = crc16(&self.recv_buf[..size]);
        let actual = received_crc(&self.recv_buf, size);
        log::warn!("CRC error: calculated 0x{expected:0>4X}, received 0x{actual:0>4X}");
        Some(BadResponse::Crc { expected, actual })
    }
}

impl<T> Client<T>
where
    T: Transport,
{
    /// Sends the prepared request and waits for the response.
    ///
    /// Timeouts, invalid frames and _Modbus_ exceptions are reported as
    /// [`Outcome`]. Errors are returned if no request is pending or if
    /// the transport fails, in which case the request can be sent again.
    ///
    /// Servers never answer a broadcast, so it completes with
    /// [`Outcome::Ok`] right after sending and provides no response data.
    pub async fn execute(&mut self) -> Result<Outcome> {
        let context = self.sendable_context()?;
        if let Some(context) = &mut self.context {
            context.response_ready = false;
        }
        if let Err(err) = self.send_request(&context).await {
            self.enter(Phase::Idle);
            return Err(err);
        }
        if context.server.is_broadcast() {
            log::debug!("Broadcast sent, not waiting for a response");
            self.finish(Outcome::Ok);
            return Ok(Outcome::Ok);
        }
        let outcome = match self.recv_response(&context).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.enter(Phase::Idle);
                return Err(err);
            }
        };
        self.finish(outcome);
        Ok(outcome)
    }

    async fn send_request(&mut self, context: &RequestContext) -> Result<()> {
        self.enter(Phase::Sending);
        let Self {
            transport,
            config,
            pdu,
            send_buf,
            ..
        } = self;
        let transport = transport.as_mut().ok_or_else(disconnected)?;

        transport.clear_input().await?;
        encode_request_adu(send_buf, context.server.into(), pdu.as_bytes());
        log::debug!("Write: {}", HexDump(&send_buf[..]));
        transport.write_frame(&send_buf[..]).await?;

        if !config.pause.is_zero() {
            log::trace!("Pause {:?}", config.pause);
            tokio::time::sleep(config.pause).await;
        }
        Ok(())
    }

    async fn recv_response(&mut self, context: &RequestContext) -> Result<Outcome> {
        let server = SlaveId::from(context.server);
        let function = context.function_code.value();

        if !self.read_step(Phase::AwaitingId, 0..1).await? {
            return Ok(Outcome::Timeout);
        }
        let rsp_server = self.recv_buf[0];
        if rsp_server != server {
            self.log_frame("bad id", 1);
            return Ok(Outcome::BadResponse(BadResponse::ServerMismatch {
                expected: server,
                actual: rsp_server,
            }));
        }

        if !self.read_step(Phase::AwaitingFunction, 1..2).await? {
            return Ok(Outcome::Timeout);
        }
        let rsp_function = self.recv_buf[1];
        if rsp_function & !EXCEPTION_FLAG != function {
            self.log_frame("bad function", 2);
            return Ok(Outcome::BadResponse(BadResponse::FunctionMismatch {
                expected: function,
                actual: rsp_function,
            }));
        }

        if rsp_function & EXCEPTION_FLAG != 0 {
            let size = EXCEPTION_ADU_SIZE_WITHOUT_CRC;
            if !self
                .read_step(Phase::AwaitingException, 2..size + CRC_SIZE)
                .await?
            {
                return Ok(Outcome::Timeout);
            }
            if let Some(reason) = self.check_crc(size) {
                self.log_frame("bad crc (exception)", size + CRC_SIZE);
                return Ok(Outcome::BadResponse(reason));
            }
            self.log_frame("exception", size + CRC_SIZE);
            self.pdu.copy_from(&self.recv_buf[1..size])?;
            return Ok(Outcome::Exception(ExceptionCode::new(self.recv_buf[2])));
        }

        let size = context.expected_adu_size() - CRC_SIZE;
        if !self.read_step(Phase::AwaitingBody, 2..size + CRC_SIZE).await? {
            return Ok(Outcome::Timeout);
        }
        if let Some(reason) = self.check_crc(size) {
            self.log_frame("bad crc", size + CRC_SIZE);
            return Ok(Outcome::BadResponse(reason));
        }
        self.log_frame("normal", size + CRC_SIZE);
        self.pdu.copy_from(&self.recv_buf[1..size])?;
        Ok(Outcome::Ok)
    }

    /// Reads the given range of the response frame within the timeout.
    async fn read_step(&mut self, phase: Phase, range: Range<usize>) -> Result<bool> {
        self.enter(phase);
        let timeout = self.config.timeout;
        let transport = self.transport.as_mut().ok_or_else(disconnected)?;
        let complete = transport
            .read_into(&mut self.recv_buf[range], timeout)
            .await?;
        Ok(complete)
    }

    /// Disconnects the client.
    ///
    /// Closes the transport. All subsequent exchanges will fail.
    pub async fn close(&mut self) -> io::Result<()> {
        let Some(mut transport) = self.transport.take() else {
            // Already disconnected.
            return Ok(());
        };
        transport.close().await
    }
}

fn disconnected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "disconnected")
}
