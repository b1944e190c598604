//! Wire codec for [`ComputationDescriptor`].
//!
//! Layout (big endian):
//!
//! ```text
//! u8  wire ID
//! u32 size (node count)
//! u32 entry_point
//! size x node:
//!     u16 symbol length, followed by that many UTF-8 bytes
//!     4 x argument slot:
//!         u8 tag: 0 = empty, 1 = scalar, 2 = bytes
//!         scalar -> u64 value
//!         bytes  -> u32 length, followed by that many bytes
//!     i32 left
//!     i32 right
//! ```
//!
//! Encoding a decoded descriptor reproduces the input bytes exactly.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use crate::{Argument, ComputationDescriptor, FunctionalNode};

/// The ID of the descriptor codec on the wire.
const WIRE_ID: u8 = 0x02;

/// Upper bound on the node count a peer may declare.
const MAX_NODES: u32 = 1024;

/// Upper bound on a single byte-buffer argument.
const MAX_ARG_LEN: u32 = 64 * 1024;

const ARG_EMPTY: u8 = 0;
const ARG_SCALAR: u8 = 1;
const ARG_BYTES: u8 = 2;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0:?}")]
    Io(#[from] std::io::Error),
    #[error("Invalid wire ID: {0}")]
    WireId(u8),
    #[error("Descriptor declares {0} nodes, limit is {MAX_NODES}")]
    TooManyNodes(u32),
    #[error("Argument of {0} bytes exceeds the {MAX_ARG_LEN} byte limit")]
    ArgTooLong(u32),
    #[error("Invalid argument tag: {0}")]
    ArgTag(u8),
    #[error("Symbol is not valid UTF-8")]
    Symbol(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Default)]
enum State {
    /// Waiting for the wire ID and descriptor header.
    #[default]
    Header,
    /// Reading node records.
    Nodes {
        entry_point: u32,
        remaining: u32,
        nodes: Vec<FunctionalNode>,
    },
}

/// Descriptor codec.
#[derive(Debug, Default)]
pub struct Codec {
    state: State,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Byte length of the next node record in `src`, or `None` if the buffer
/// does not yet hold a complete record. Validates tags and length bounds
/// while walking, so garbage fails before it can demand more input.
fn node_len(src: &[u8]) -> Result<Option<usize>, Error> {
    let mut at = 0usize;

    let Some(symbol_len) = read_u16(src, at) else { return Ok(None) };
    at += 2 + symbol_len as usize;

    for _ in 0..4 {
        let Some(&tag) = src.get(at) else { return Ok(None) };
        at += 1;
        match tag {
            ARG_EMPTY => {}
            ARG_SCALAR => at += 8,
            ARG_BYTES => {
                let Some(len) = read_u32(src, at) else { return Ok(None) };
                if len > MAX_ARG_LEN {
                    return Err(Error::ArgTooLong(len));
                }
                at += 4 + len as usize;
            }
            other => return Err(Error::ArgTag(other)),
        }
    }

    // left + right
    at += 8;

    if src.len() < at {
        return Ok(None);
    }
    Ok(Some(at))
}

fn read_u16(src: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes([*src.get(at)?, *src.get(at + 1)?]))
}

fn read_u32(src: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_be_bytes([
        *src.get(at)?,
        *src.get(at + 1)?,
        *src.get(at + 2)?,
        *src.get(at + 3)?,
    ]))
}

/// Parses one node record. The caller has established with [`node_len`]
/// that `src` holds a complete record.
fn parse_node(src: &mut BytesMut) -> Result<FunctionalNode, Error> {
    let symbol_len = src.get_u16() as usize;
    let symbol = String::from_utf8(src.split_to(symbol_len).to_vec())?;

    let mut args: [Argument; 4] = Default::default();
    for slot in &mut args {
        match src.get_u8() {
            ARG_EMPTY => {}
            ARG_SCALAR => *slot = Argument::Scalar(src.get_u64()),
            ARG_BYTES => {
                let len = src.get_u32() as usize;
                *slot = Argument::Bytes(src.split_to(len).freeze());
            }
            other => return Err(Error::ArgTag(other)),
        }
    }

    let left = src.get_i32();
    let right = src.get_i32();

    Ok(FunctionalNode { symbol, args, left, right })
}

impl Decoder for Codec {
    type Item = ComputationDescriptor;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                State::Header => {
                    if src.is_empty() {
                        return Ok(None);
                    }

                    // Wire ID check (without advancing the cursor)
                    let wire_id = src[0];
                    if wire_id != WIRE_ID {
                        return Err(Error::WireId(wire_id));
                    }

                    if src.len() < 1 + 4 + 4 {
                        return Ok(None);
                    }

                    src.advance(1);
                    let size = src.get_u32();
                    let entry_point = src.get_u32();

                    if size > MAX_NODES {
                        return Err(Error::TooManyNodes(size));
                    }

                    tracing::trace!(size, entry_point, "descriptor header");

                    self.state = State::Nodes {
                        entry_point,
                        remaining: size,
                        nodes: Vec::with_capacity(size as usize),
                    };
                }
                State::Nodes { entry_point, ref mut remaining, ref mut nodes } => {
                    if *remaining == 0 {
                        let nodes = std::mem::take(nodes);
                        self.state = State::Header;
                        return Ok(Some(ComputationDescriptor::new(entry_point, nodes)));
                    }

                    if node_len(src)?.is_none() {
                        return Ok(None);
                    }

                    nodes.push(parse_node(src)?);
                    *remaining -= 1;
                }
            }
        }
    }
}

impl Encoder<ComputationDescriptor> for Codec {
    type Error = Error;

    fn encode(
        &mut self,
        item: ComputationDescriptor,
        dst: &mut BytesMut,
    ) -> Result<(), Self::Error> {
        if item.size() > MAX_NODES {
            return Err(Error::TooManyNodes(item.size()));
        }

        dst.put_u8(WIRE_ID);
        dst.put_u32(item.size());
        dst.put_u32(item.entry_point);

        for node in &item.nodes {
            dst.put_u16(node.symbol.len() as u16);
            dst.put_slice(node.symbol.as_bytes());

            for arg in &node.args {
                match arg {
                    Argument::Empty => dst.put_u8(ARG_EMPTY),
                    Argument::Scalar(v) => {
                        dst.put_u8(ARG_SCALAR);
                        dst.put_u64(*v);
                    }
                    Argument::Bytes(b) => {
                        if b.len() as u32 > MAX_ARG_LEN {
                            return Err(Error::ArgTooLong(b.len() as u32));
                        }
                        dst.put_u8(ARG_BYTES);
                        dst.put_u32(b.len() as u32);
                        dst.put_slice(b);
                    }
                }
            }

            dst.put_i32(node.left);
            dst.put_i32(node.right);
        }

        Ok(())
    }
}

/// Encodes a descriptor into a fresh buffer.
pub fn encode(descriptor: &ComputationDescriptor) -> Result<Bytes, Error> {
    let mut buf = BytesMut::new();
    Codec::new().encode(descriptor.clone(), &mut buf)?;
    Ok(buf.freeze())
}

/// Decodes one descriptor from a complete buffer.
pub fn decode(bytes: &[u8]) -> Result<ComputationDescriptor, Error> {
    let mut buf = BytesMut::from(bytes);
    match Codec::new().decode(&mut buf)? {
        Some(descriptor) => Ok(descriptor),
        None => Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "truncated descriptor",
        ))),
    }
}
