//! Binds the classic ICMP steering computation to a group and runs a few
//! synthetic packets through it.

use steer::{
    codec, Argument, ComputationDescriptor, FunctionalNode, GroupId, Groups, PacketView,
    SocketId, SteeringResult,
};

fn ipv4_frame(proto: u8, src: [u8; 4], dst: [u8; 4]) -> Vec<u8> {
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

fn main() {
    tracing_subscriber::fmt::init();

    // ICMP over IP is hashed across 8 destinations, all other traffic drops
    let computation = ComputationDescriptor::new(
        0,
        vec![
            FunctionalNode::branch("is_ip", 1, 3),
            FunctionalNode::branch("is_icmp", 2, 3),
            FunctionalNode::leaf("steer_by_hash").with_arg(0, Argument::Scalar(8)),
            FunctionalNode::leaf("drop"),
        ],
    );

    // the descriptor travels as bytes between the client library and the
    // capture core
    let wire = codec::encode(&computation).unwrap();
    let decoded = codec::decode(&wire).unwrap();

    let groups = Groups::new();
    let group = groups.create(GroupId(0)).unwrap();
    for socket in 0..8 {
        group.join(SocketId(socket)).unwrap();
    }
    groups.set_group_computation(GroupId(0), &decoded).unwrap();
    group.enable();

    let packets = [
        ("icmp 10.0.0.1 -> 10.0.0.2", ipv4_frame(1, [10, 0, 0, 1], [10, 0, 0, 2])),
        ("icmp 10.0.0.7 -> 10.0.0.2", ipv4_frame(1, [10, 0, 0, 7], [10, 0, 0, 2])),
        ("udp  10.0.0.1 -> 10.0.0.2", ipv4_frame(17, [10, 0, 0, 1], [10, 0, 0, 2])),
    ];

    for (label, frame) in &packets {
        let view = PacketView::new(frame);
        match group.steer(&view) {
            SteeringResult::Deliver(mask) => {
                let targets: Vec<u32> = group.delivery_targets(SteeringResult::Deliver(mask)).collect();
                println!("{label}: deliver to {targets:?}");
            }
            SteeringResult::Drop => println!("{label}: drop"),
        }
    }

    println!(
        "received {} / delivered {} / dropped {}",
        group.stats().received(),
        group.stats().delivered(),
        group.stats().dropped()
    );
}
