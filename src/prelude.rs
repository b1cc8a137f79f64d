// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types and traits

///////////////////////////////////////////////////////////////////
/// Modules
///////////////////////////////////////////////////////////////////
pub use crate::client;

#[allow(missing_docs)]
#[cfg(feature = "sync")]
pub mod sync {
    pub use crate::client::sync::*;
}

///////////////////////////////////////////////////////////////////
/// Types
///////////////////////////////////////////////////////////////////
pub use crate::client::{Client, ClientConfig, Phase};
pub use crate::{ExceptionCode, Outcome, Request};
pub use crate::{Slave, SlaveId};

#[cfg(feature = "serial")]
pub use crate::transport::{SerialConfig, SerialTransport};

#[cfg(feature = "sync")]
pub use crate::client::sync::Client as SyncClient;

///////////////////////////////////////////////////////////////////
/// Traits
///////////////////////////////////////////////////////////////////
pub use crate::transport::{DirectionControl, Transport};
