/// Destination bitmask: bit `i` delivers to destination `i` of the group.
pub type QueueMask = u64;

/// The outcome of evaluating a program against one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringResult {
    /// Do not deliver the packet anywhere.
    Drop,
    /// Deliver to every destination whose bit is set.
    Deliver(QueueMask),
}

impl SteeringResult {
    /// Merges two results: the union of the delivery masks, with `Drop`
    /// as the identity element.
    #[inline]
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Drop, r) => r,
            (l, Self::Drop) => l,
            (Self::Deliver(a), Self::Deliver(b)) => Self::Deliver(a | b),
        }
    }

    /// Restricts the delivery mask to `members`; an empty intersection
    /// collapses to `Drop`.
    #[inline]
    pub fn intersect(self, members: QueueMask) -> Self {
        match self {
            Self::Deliver(mask) if mask & members != 0 => Self::Deliver(mask & members),
            _ => Self::Drop,
        }
    }
}

/// Transient, non-owning view of one captured packet.
///
/// Created by the capture batch iterator and valid for the duration of a
/// single evaluation call; the engine never stores it. `data` starts at
/// the Ethernet header; `caplen` bounds how much of it was captured.
#[derive(Debug, Clone, Copy)]
pub struct PacketView<'a> {
    /// 802.1Q VLAN ID if the capture path already untagged the frame,
    /// zero otherwise.
    pub vlan_id: u16,
    /// Captured length: the prefix of `data` that is actually valid.
    pub caplen: u32,
    /// Original packet length on the wire.
    pub len: u32,
    /// Receiving interface index.
    pub if_index: u32,
    /// Hardware RX queue the packet arrived on.
    pub hw_queue: u32,
    /// The captured bytes, starting at the Ethernet header.
    pub data: &'a [u8],
}

impl<'a> PacketView<'a> {
    /// Wraps a fully captured frame (`caplen == len == data.len()`).
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            vlan_id: 0,
            caplen: data.len() as u32,
            len: data.len() as u32,
            if_index: 0,
            hw_queue: 0,
            data,
        }
    }

    /// The valid captured bytes: `data` truncated to `caplen`.
    #[inline]
    pub fn captured(&self) -> &'a [u8] {
        let cap = (self.caplen as usize).min(self.data.len());
        &self.data[..cap]
    }
}
