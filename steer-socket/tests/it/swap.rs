//! Program replacement under concurrent evaluation.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;

use steer_lang::{PacketView, SteeringResult};
use steer_socket::{GroupId, Groups, SocketId};

use crate::common::{classify_all, ipv4_frame};

const GID: GroupId = GroupId(0);

/// Readers hammer `steer` while a writer keeps swapping between two
/// programs. Every observed result must be internally consistent with
/// exactly one of the two versions — never a mixture, never a tear.
#[test]
fn swaps_never_tear() {
    let _ = tracing_subscriber::fmt::try_init();

    let groups = Arc::new(Groups::new());
    let group = groups.create(GID).unwrap();
    for socket in 0..8 {
        group.join(SocketId(socket)).unwrap();
    }
    group.enable();
    groups.set_group_computation(GID, &classify_all(1)).unwrap();

    let stop = Arc::new(AtomicBool::new(false));

    let writer = {
        let groups = Arc::clone(&groups);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut round = 0u64;
            while !stop.load(Ordering::Relaxed) {
                groups.set_group_computation(GID, &classify_all(1 + round % 2)).unwrap();
                round += 1;
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..4 {
        let group = Arc::clone(&group);
        readers.push(thread::spawn(move || {
            let frame = ipv4_frame(17, [10, 0, 0, 1], [10, 0, 0, 2]);
            let view = PacketView::new(&frame);
            for _ in 0..50_000 {
                match group.steer(&view) {
                    SteeringResult::Deliver(mask) => {
                        // one of the two installed programs, nothing else
                        assert!(
                            mask == 1 << 1 || mask == 1 << 2,
                            "torn steering result: {mask:#x}"
                        );
                    }
                    SteeringResult::Drop => panic!("classify program dropped"),
                }
            }
        }));
    }

    for reader in readers {
        reader.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
}

/// A batch pins the program version it started with even when swaps land
/// mid-batch.
#[test]
fn batches_are_atomic_across_swaps() {
    let groups = Arc::new(Groups::new());
    let group = groups.create(GID).unwrap();
    for socket in 0..8 {
        group.join(SocketId(socket)).unwrap();
    }
    group.enable();
    groups.set_group_computation(GID, &classify_all(1)).unwrap();

    let stop = Arc::new(AtomicBool::new(false));

    let writer = {
        let groups = Arc::clone(&groups);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut round = 0u64;
            while !stop.load(Ordering::Relaxed) {
                groups
                    .set_group_computation(GID, &classify_all(1 + round % 2))
                    .unwrap();
                round += 1;
            }
        })
    };

    let frame = ipv4_frame(6, [1, 1, 1, 1], [2, 2, 2, 2]);
    let views = vec![PacketView::new(&frame); 64];

    for _ in 0..200 {
        let mut masks = Vec::with_capacity(views.len());
        group.steer_batch(&views, |_, result| {
            let SteeringResult::Deliver(mask) = result else {
                panic!("classify program dropped")
            };
            masks.push(mask);
        });
        // identical packets through one pinned version: identical masks
        assert!(masks.windows(2).all(|pair| pair[0] == pair[1]));
    }

    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
}
