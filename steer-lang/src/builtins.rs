//! The built-in combinator set.
//!
//! Predicates evaluate to `false` on any packet that lacks the fields
//! they inspect; actions short of the data they need fall back to
//! [`SteeringResult::Drop`]. Malformed traffic therefore takes the
//! "not matched" path instead of failing the batch.

use crate::parse;
use crate::symtable::{Combinator, Run};
use crate::{NodeArgs, PacketView, QueueMask, SteeringResult};

fn is_ip(_: &NodeArgs, packet: &PacketView<'_>) -> bool {
    matches!(parse::ethertype(packet.captured()), Some((parse::ETHERTYPE_IPV4, _)))
}

fn is_ip6(_: &NodeArgs, packet: &PacketView<'_>) -> bool {
    matches!(parse::ethertype(packet.captured()), Some((parse::ETHERTYPE_IPV6, _)))
}

fn is_tcp(_: &NodeArgs, packet: &PacketView<'_>) -> bool {
    parse::transport_proto(packet.captured()) == Some(parse::PROTO_TCP)
}

fn is_udp(_: &NodeArgs, packet: &PacketView<'_>) -> bool {
    parse::transport_proto(packet.captured()) == Some(parse::PROTO_UDP)
}

/// ICMP for either family (protocol 1 on IPv4, 58 on IPv6).
fn is_icmp(_: &NodeArgs, packet: &PacketView<'_>) -> bool {
    matches!(
        parse::transport_proto(packet.captured()),
        Some(parse::PROTO_ICMP) | Some(parse::PROTO_ICMP6)
    )
}

/// Tagged on the wire, or already untagged by the capture path.
fn has_vlan(_: &NodeArgs, packet: &PacketView<'_>) -> bool {
    packet.vlan_id != 0 || parse::vlan_tagged(packet.captured())
}

fn is_l4_proto(args: &NodeArgs, packet: &PacketView<'_>) -> bool {
    match (args.scalar(0), parse::transport_proto(packet.captured())) {
        (Some(proto), Some(found)) => u64::from(found) == proto,
        _ => false,
    }
}

/// Source or destination port equals the argument.
fn has_port(args: &NodeArgs, packet: &PacketView<'_>) -> bool {
    match (args.scalar(0), parse::l4_ports(packet.captured())) {
        (Some(port), Some((src, dst))) => u64::from(src) == port || u64::from(dst) == port,
        _ => false,
    }
}

fn drop(_: &NodeArgs, _: &PacketView<'_>) -> SteeringResult {
    SteeringResult::Drop
}

/// Deliver to every destination of the group; the binding layer
/// intersects with the actual member mask.
fn broadcast(_: &NodeArgs, _: &PacketView<'_>) -> SteeringResult {
    SteeringResult::Deliver(QueueMask::MAX)
}

/// Deliver to the fixed destination named by the argument.
fn classify(args: &NodeArgs, _: &PacketView<'_>) -> SteeringResult {
    match args.scalar(0) {
        Some(index) if index < QueueMask::BITS as u64 => {
            SteeringResult::Deliver(1 << index)
        }
        _ => SteeringResult::Drop,
    }
}

/// Steer by a symmetric hash of the IPv4 addresses, so both directions
/// of a flow land on the same destination. The argument is the number of
/// configured destinations.
fn steer_by_hash(args: &NodeArgs, packet: &PacketView<'_>) -> SteeringResult {
    let Some(destinations) = args.scalar(0) else { return SteeringResult::Drop };
    if destinations == 0 || destinations > QueueMask::BITS as u64 {
        return SteeringResult::Drop;
    }
    let Some(ip) = parse::ipv4(packet.captured()) else { return SteeringResult::Drop };

    let mut hash = ip.src ^ ip.dst;
    hash ^= hash >> 16;
    hash ^= hash >> 8;

    SteeringResult::Deliver(1 << (hash as u64 % destinations))
}

fn par(left: SteeringResult, right: SteeringResult) -> SteeringResult {
    left.or(right)
}

/// Every built-in combinator, in registration order.
pub(crate) static ALL: &[Combinator] = &[
    Combinator { name: "is_ip", arity: 0, run: Run::Predicate(is_ip) },
    Combinator { name: "is_ip6", arity: 0, run: Run::Predicate(is_ip6) },
    Combinator { name: "is_tcp", arity: 0, run: Run::Predicate(is_tcp) },
    Combinator { name: "is_udp", arity: 0, run: Run::Predicate(is_udp) },
    Combinator { name: "is_icmp", arity: 0, run: Run::Predicate(is_icmp) },
    Combinator { name: "has_vlan", arity: 0, run: Run::Predicate(has_vlan) },
    Combinator { name: "is_l4_proto", arity: 1, run: Run::Predicate(is_l4_proto) },
    Combinator { name: "has_port", arity: 1, run: Run::Predicate(has_port) },
    Combinator { name: "drop", arity: 0, run: Run::Action(drop) },
    Combinator { name: "broadcast", arity: 0, run: Run::Action(broadcast) },
    Combinator { name: "classify", arity: 1, run: Run::Action(classify) },
    Combinator { name: "steer_by_hash", arity: 1, run: Run::Action(steer_by_hash) },
    Combinator { name: "par", arity: 0, run: Run::Merge(par) },
];
