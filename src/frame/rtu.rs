// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;

use crate::Slave;

/// Everything the client needs to remember about the pending
/// request for validating and decoding the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub(crate) server: Slave,
    pub(crate) function_code: FunctionCode,
    pub(crate) expected_pdu_size: usize,
    pub(crate) expected_range: Option<(Address, Quantity)>,
    pub(crate) response_ready: bool,
}

impl RequestContext {
    pub(crate) fn new(server: Slave, request: &Request<'_>) -> Self {
        Self {
            server,
            function_code: request.function_code(),
            expected_pdu_size: request.expected_response_pdu_size(),
            expected_range: request.expected_range(),
            response_ready: false,
        }
    }

    #[must_use]
    pub const fn server(&self) -> Slave {
        self.server
    }

    #[must_use]
    pub const fn function_code(&self) -> FunctionCode {
        self.function_code
    }

    /// Size of a regular response PDU, including the function code.
    #[must_use]
    pub const fn expected_pdu_size(&self) -> usize {
        self.expected_pdu_size
    }

    /// Size of the whole response ADU, i.e. server id, PDU and CRC.
    #[must_use]
    pub const fn expected_adu_size(&self) -> usize {
        1 + self.expected_pdu_size + 2
    }

    /// `true` if the response has been received and validated.
    #[must_use]
    pub const fn is_response_ready(&self) -> bool {
        self.response_ready
    }
}
