//! The serializable computation-descriptor format.
//!
//! A *computation* is a DAG of named functional nodes that decides, per
//! packet, which destinations receive it. Clients build a
//! [`ComputationDescriptor`] (directly or by decoding the wire form in
//! [`codec`]) and hand it to a group, where it is validated and resolved
//! into an executable program.

mod descriptor;
pub use descriptor::{Argument, ComputationDescriptor, FunctionalNode, NO_SUCCESSOR};

pub mod codec;
