//! Header readers for the built-in combinators.
//!
//! Everything here is fallible by `Option`: a truncated or malformed
//! header reads as `None`, which the combinators turn into "predicate is
//! false" or "action drops". One bad packet must never abort a batch.

pub(crate) const ETHERTYPE_IPV4: u16 = 0x0800;
pub(crate) const ETHERTYPE_IPV6: u16 = 0x86dd;
pub(crate) const ETHERTYPE_VLAN: u16 = 0x8100;

pub(crate) const PROTO_ICMP: u8 = 1;
pub(crate) const PROTO_TCP: u8 = 6;
pub(crate) const PROTO_UDP: u8 = 17;
pub(crate) const PROTO_ICMP6: u8 = 58;

const ETH_HLEN: usize = 14;
const VLAN_TAG_LEN: usize = 4;

fn be16(data: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes([*data.get(at)?, *data.get(at + 1)?]))
}

fn be32(data: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_be_bytes([
        *data.get(at)?,
        *data.get(at + 1)?,
        *data.get(at + 2)?,
        *data.get(at + 3)?,
    ]))
}

/// EtherType of the frame and the offset of the L3 header, skipping a
/// single 802.1Q tag if present.
pub(crate) fn ethertype(data: &[u8]) -> Option<(u16, usize)> {
    let ty = be16(data, 12)?;
    if ty == ETHERTYPE_VLAN {
        Some((be16(data, 16)?, ETH_HLEN + VLAN_TAG_LEN))
    } else {
        Some((ty, ETH_HLEN))
    }
}

/// Whether the frame carries an 802.1Q tag.
pub(crate) fn vlan_tagged(data: &[u8]) -> bool {
    be16(data, 12) == Some(ETHERTYPE_VLAN)
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Ipv4 {
    pub(crate) proto: u8,
    pub(crate) src: u32,
    pub(crate) dst: u32,
    /// Offset of the transport header within the frame.
    pub(crate) l4_offset: usize,
}

/// Parses the IPv4 header, honoring the IHL field.
pub(crate) fn ipv4(data: &[u8]) -> Option<Ipv4> {
    let (ty, off) = ethertype(data)?;
    if ty != ETHERTYPE_IPV4 {
        return None;
    }
    let ver_ihl = *data.get(off)?;
    if ver_ihl >> 4 != 4 {
        return None;
    }
    let ihl = (ver_ihl & 0x0f) as usize * 4;
    if ihl < 20 || data.len() < off + ihl {
        return None;
    }
    Some(Ipv4 {
        proto: *data.get(off + 9)?,
        src: be32(data, off + 12)?,
        dst: be32(data, off + 16)?,
        l4_offset: off + ihl,
    })
}

/// Transport protocol number of the frame, for either IP family.
///
/// IPv6 extension headers are not walked: the next-header field of the
/// fixed header is what the fast path sees.
pub(crate) fn transport_proto(data: &[u8]) -> Option<u8> {
    let (ty, off) = ethertype(data)?;
    match ty {
        ETHERTYPE_IPV4 => ipv4(data).map(|ip| ip.proto),
        ETHERTYPE_IPV6 => data.get(off + 6).copied(),
        _ => None,
    }
}

/// Source and destination ports, if the packet is TCP or UDP.
pub(crate) fn l4_ports(data: &[u8]) -> Option<(u16, u16)> {
    let (ty, off) = ethertype(data)?;
    let l4_offset = match ty {
        ETHERTYPE_IPV4 => {
            let ip = ipv4(data)?;
            if ip.proto != PROTO_TCP && ip.proto != PROTO_UDP {
                return None;
            }
            ip.l4_offset
        }
        ETHERTYPE_IPV6 => {
            let next = *data.get(off + 6)?;
            if next != PROTO_TCP && next != PROTO_UDP {
                return None;
            }
            off + 40
        }
        _ => return None,
    };
    Some((be16(data, l4_offset)?, be16(data, l4_offset + 2)?))
}
