// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU clients

use std::time::Duration;

mod response;

pub mod rtu;
pub use self::rtu::{Client, Phase};

#[cfg(feature = "sync")]
pub mod sync;

/// Timing parameters of a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Maximum time to wait for each part of the response.
    pub timeout: Duration,

    /// Fixed delay after each transmission, e.g. for settling the
    /// direction of a half-duplex line. Zero disables the delay.
    pub pause: Duration,
}

impl ClientConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

    #[must_use]
    pub const fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    #[must_use]
    pub const fn with_pause(self, pause: Duration) -> Self {
        Self { pause, ..self }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            pause: Duration::ZERO,
        }
    }
}
