#![doc(issue_tracker_base_url = "https://github.com/steer-rs/steer-rs/issues/")]

pub use bytes;

pub use steer_common::*;
pub use steer_lang::*;
pub use steer_socket::*;
pub use steer_wire::{codec, Argument, ComputationDescriptor, FunctionalNode, NO_SUCCESSOR};
