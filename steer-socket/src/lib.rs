//! Capture groups: many consumer sockets sharing one RX path and one
//! hot-swappable steering program.
//!
//! A [`Group`] owns the currently bound [`ResolvedProgram`](steer_lang::ResolvedProgram)
//! behind an atomic handle. Evaluating contexts pin a program version for
//! the duration of a batch; [`Group::set_program`] swaps in a replacement
//! without ever letting a reader observe a torn program, and the old
//! version is freed only when its last holder drops it.

use thiserror::Error;

mod group;
pub use group::{Group, MAX_GROUP_SOCKETS};

mod registry;
pub use registry::Groups;

mod stats;
pub use stats::GroupStats;

use steer_common::ConfigError;
use steer_lang::BindError;

/// Identifier of a capture group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub u32);

/// Identifier of a consumer socket within a group; doubles as the
/// socket's bit position in the group's delivery mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(pub u32);

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("unknown group {0}")]
    UnknownGroup(u32),
    #[error("group {0} already exists")]
    GroupExists(u32),
    #[error("socket id {0} exceeds the {MAX_GROUP_SOCKETS}-socket group capacity")]
    SocketOutOfRange(u32),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
