use steer_wire::{Argument, ComputationDescriptor, FunctionalNode};

/// An Ethernet/IPv4 frame with the given protocol and addresses.
pub fn ipv4_frame(proto: u8, src: [u8; 4], dst: [u8; 4]) -> Vec<u8> {
    let mut frame = vec![0u8; 12];
    frame.extend_from_slice(&0x0800u16.to_be_bytes());
    let mut ip = [0u8; 20];
    ip[0] = 0x45;
    ip[9] = proto;
    ip[12..16].copy_from_slice(&src);
    ip[16..20].copy_from_slice(&dst);
    frame.extend_from_slice(&ip);
    frame.extend_from_slice(&[0u8; 8]);
    frame
}

/// A frame that is not IP at all.
pub fn arp_frame() -> Vec<u8> {
    let mut frame = vec![0u8; 12];
    frame.extend_from_slice(&0x0806u16.to_be_bytes());
    frame.extend_from_slice(&[0u8; 28]);
    frame
}

/// The canonical steering computation: ICMP-over-IP is hashed across
/// `destinations`, everything else is dropped.
pub fn icmp_steering(destinations: u64) -> ComputationDescriptor {
    ComputationDescriptor::new(
        0,
        vec![
            FunctionalNode::branch("is_ip", 1, 3),
            FunctionalNode::branch("is_icmp", 2, 3),
            FunctionalNode::leaf("steer_by_hash").with_arg(0, Argument::Scalar(destinations)),
            FunctionalNode::leaf("drop"),
        ],
    )
}

/// A computation that delivers everything to the fixed destination.
pub fn classify_all(destination: u64) -> ComputationDescriptor {
    ComputationDescriptor::new(
        0,
        vec![FunctionalNode::leaf("classify").with_arg(0, Argument::Scalar(destination))],
    )
}
