use steer_lang::{PacketView, SteeringResult};
use steer_socket::{GroupError, GroupId, Groups, SocketId};
use steer_wire::{codec, ComputationDescriptor, FunctionalNode};

use crate::common::{arp_frame, classify_all, icmp_steering, ipv4_frame};

const GID: GroupId = GroupId(0);

fn group_of_eight(groups: &Groups) -> std::sync::Arc<steer_socket::Group> {
    let group = groups.create(GID).unwrap();
    for socket in 0..8 {
        group.join(SocketId(socket)).unwrap();
    }
    group.enable();
    group
}

#[test]
fn icmp_program_steers_and_drops() {
    let _ = tracing_subscriber::fmt::try_init();

    let groups = Groups::new();
    let group = group_of_eight(&groups);
    groups.set_group_computation(GID, &icmp_steering(8)).unwrap();

    // ICMP over IP: delivered to exactly one destination
    let icmp = ipv4_frame(1, [10, 0, 0, 1], [10, 0, 0, 2]);
    let SteeringResult::Deliver(mask) = group.steer(&PacketView::new(&icmp)) else {
        panic!("icmp packet was dropped");
    };
    assert_eq!(mask.count_ones(), 1);

    // UDP over IP and non-IP: dropped
    let udp = ipv4_frame(17, [10, 0, 0, 1], [10, 0, 0, 2]);
    assert_eq!(group.steer(&PacketView::new(&udp)), SteeringResult::Drop);
    assert_eq!(group.steer(&PacketView::new(&arp_frame())), SteeringResult::Drop);

    assert_eq!(group.stats().received(), 3);
    assert_eq!(group.stats().delivered(), 1);
    assert_eq!(group.stats().dropped(), 2);
}

#[test]
fn rejected_rebind_keeps_the_prior_program() {
    let groups = Groups::new();
    let group = group_of_eight(&groups);
    groups.set_group_computation(GID, &classify_all(3)).unwrap();

    let frame = ipv4_frame(17, [1, 2, 3, 4], [5, 6, 7, 8]);
    assert_eq!(group.steer(&PacketView::new(&frame)), SteeringResult::Deliver(1 << 3));

    // a descriptor with an unknown symbol is rejected as a whole...
    let bogus = ComputationDescriptor::new(0, vec![FunctionalNode::leaf("no_such_fn")]);
    match groups.set_group_computation(GID, &bogus) {
        Err(GroupError::Bind(steer_lang::BindError::UnknownSymbol(name))) => {
            assert_eq!(name, "no_such_fn");
        }
        other => panic!("expected UnknownSymbol, got {other:?}"),
    }

    // ...and the prior program keeps steering
    assert_eq!(group.steer(&PacketView::new(&frame)), SteeringResult::Deliver(1 << 3));
}

#[test]
fn drop_by_default_without_a_program() {
    let groups = Groups::new();
    let group = group_of_eight(&groups);

    let frame = ipv4_frame(1, [10, 0, 0, 1], [10, 0, 0, 2]);
    assert_eq!(group.steer(&PacketView::new(&frame)), SteeringResult::Drop);
}

#[test]
fn disabled_group_drops() {
    let groups = Groups::new();
    let group = group_of_eight(&groups);
    groups.set_group_computation(GID, &classify_all(0)).unwrap();

    group.disable();
    let frame = ipv4_frame(1, [10, 0, 0, 1], [10, 0, 0, 2]);
    assert_eq!(group.steer(&PacketView::new(&frame)), SteeringResult::Drop);

    group.enable();
    assert_eq!(group.steer(&PacketView::new(&frame)), SteeringResult::Deliver(1));
}

#[test]
fn delivery_is_restricted_to_members() {
    let groups = Groups::new();
    let group = groups.create(GID).unwrap();
    group.join(SocketId(2)).unwrap();
    group.enable();

    // the program names destination 5, but nobody sits there
    groups.set_group_computation(GID, &classify_all(5)).unwrap();
    let frame = ipv4_frame(6, [9, 9, 9, 9], [8, 8, 8, 8]);
    assert_eq!(group.steer(&PacketView::new(&frame)), SteeringResult::Drop);
    assert_eq!(group.stats().anomalies(), 1);

    // with a member on destination 5 the packet goes through
    group.join(SocketId(5)).unwrap();
    let result = group.steer(&PacketView::new(&frame));
    assert_eq!(result, SteeringResult::Deliver(1 << 5));
    assert_eq!(group.delivery_targets(result).collect::<Vec<_>>(), vec![5]);
}

#[test]
fn batches_pin_one_program_version() {
    let groups = Groups::new();
    let group = group_of_eight(&groups);
    groups.set_group_computation(GID, &icmp_steering(8)).unwrap();

    let icmp = ipv4_frame(1, [10, 0, 0, 1], [10, 0, 0, 2]);
    let udp = ipv4_frame(17, [10, 0, 0, 1], [10, 0, 0, 2]);
    let views = [PacketView::new(&icmp), PacketView::new(&udp), PacketView::new(&icmp)];

    let mut results = Vec::new();
    group.steer_batch(&views, |index, result| results.push((index, result)));

    assert_eq!(results.len(), 3);
    assert!(matches!(results[0], (0, SteeringResult::Deliver(_))));
    assert_eq!(results[1], (1, SteeringResult::Drop));
    assert_eq!(results[0].1, results[2].1);
}

#[test]
fn wire_descriptor_binds_end_to_end() {
    let groups = Groups::new();
    let group = group_of_eight(&groups);

    // client-side: build and encode; server-side: decode and bind
    let bytes = codec::encode(&icmp_steering(8)).unwrap();
    let descriptor = codec::decode(&bytes).unwrap();
    assert_eq!(descriptor, icmp_steering(8));

    groups.set_group_computation(GID, &descriptor).unwrap();

    let icmp = ipv4_frame(1, [10, 0, 0, 9], [10, 0, 0, 2]);
    assert!(matches!(
        group.steer(&PacketView::new(&icmp)),
        SteeringResult::Deliver(_)
    ));
}
