// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local IPC surface for Hearth.
//!
//! A single Unix domain socket serves two kinds of peers. A front-end
//! registers once and then streams inbound messages while receiving
//! outbound replies on the same connection. An operator sends one command
//! request, reads optional progress lines and one result, and disconnects.

pub mod codec;
pub mod commands;
pub mod gateway;
pub mod protocol;
pub mod server;

pub use codec::{Frame, FrameCodec};
pub use commands::{CommandDeps, CommandError, CommandRegistry, OperatorCommand, builtin_registry};
pub use gateway::{FrontendGateway, FrontendHandle};
pub use protocol::{ClientFrame, FrontendCommand, OperatorRequest, ServerFrame};
pub use server::{IpcServer, ServerState};
