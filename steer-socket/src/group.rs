use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use arc_swap::ArcSwapOption;
use tracing::debug;

use steer_common::{BitMask, SetBits};
use steer_lang::{evaluate, PacketView, QueueMask, ResolvedProgram, SteeringResult};

use crate::{GroupError, GroupId, SocketId, stats::GroupStats};

/// Sockets per group: one bit of the delivery mask each.
pub const MAX_GROUP_SOCKETS: u32 = QueueMask::BITS;

/// A set of consumer sockets sharing one RX path and one installed
/// steering program.
///
/// All fast-path state is atomic: evaluation never locks. The program
/// handle is an [`ArcSwapOption`], so replacing it is a single pointer
/// swap — every in-flight evaluation finishes on the version it loaded,
/// and a superseded program is dropped only when the last such holder
/// releases it. Drop-by-default: a group with no program (or a disabled
/// group) drops every packet.
#[derive(Debug)]
pub struct Group {
    id: GroupId,
    program: ArcSwapOption<ResolvedProgram>,
    /// Delivery bitmask of member sockets.
    members: AtomicU64,
    enabled: AtomicBool,
    stats: GroupStats,
}

impl Group {
    pub(crate) fn new(id: GroupId) -> Self {
        Self {
            id,
            program: ArcSwapOption::const_empty(),
            members: AtomicU64::new(0),
            enabled: AtomicBool::new(false),
            stats: GroupStats::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Atomically installs `program`, superseding the current one.
    ///
    /// Safe against any number of concurrent [`steer`](Self::steer)
    /// calls: readers that already loaded the old version keep it alive
    /// until they finish.
    pub fn set_program(&self, program: Arc<ResolvedProgram>) {
        debug!(group = self.id.0, size = program.size(), "installing computation");
        self.program.store(Some(program));
    }

    /// Removes the bound program; the group reverts to dropping
    /// everything.
    pub fn clear_program(&self) {
        debug!(group = self.id.0, "clearing computation");
        self.program.store(None);
    }

    /// Pins and returns the currently bound program version, if any.
    #[inline]
    pub fn current_program(&self) -> Option<Arc<ResolvedProgram>> {
        self.program.load_full()
    }

    /// Adds a socket to the group's delivery mask.
    pub fn join(&self, socket: SocketId) -> Result<(), GroupError> {
        if socket.0 >= MAX_GROUP_SOCKETS {
            return Err(GroupError::SocketOutOfRange(socket.0));
        }
        self.members.fetch_or(1 << socket.0, Ordering::AcqRel);
        Ok(())
    }

    /// Removes a socket from the group's delivery mask.
    pub fn leave(&self, socket: SocketId) {
        if socket.0 < MAX_GROUP_SOCKETS {
            self.members.fetch_and(!(1 << socket.0), Ordering::AcqRel);
        }
    }

    /// The current member bitmask.
    #[inline]
    pub fn members(&self) -> QueueMask {
        self.members.load(Ordering::Acquire)
    }

    /// Starts delivering evaluated traffic to the member sockets.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Stops delivery; packets are dropped while disabled.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> &GroupStats {
        &self.stats
    }

    /// Evaluates one packet against the bound program and restricts the
    /// outcome to the member sockets.
    pub fn steer(&self, packet: &PacketView<'_>) -> SteeringResult {
        self.stats.increment_recv();

        if !self.is_enabled() {
            self.stats.increment_drop();
            return SteeringResult::Drop;
        }

        let guard = self.program.load();
        let Some(program) = guard.as_ref() else {
            // no computation bound: drop by default
            self.stats.increment_drop();
            return SteeringResult::Drop;
        };

        self.account(evaluate(program, packet))
    }

    /// Evaluates a batch against a single pinned program version.
    ///
    /// The whole batch observes one version even if a swap lands midway;
    /// `sink` receives each packet's index and steering outcome.
    pub fn steer_batch(
        &self,
        packets: &[PacketView<'_>],
        mut sink: impl FnMut(usize, SteeringResult),
    ) {
        let program = self.current_program();
        let enabled = self.is_enabled();

        for (index, packet) in packets.iter().enumerate() {
            self.stats.increment_recv();
            let result = match (&program, enabled) {
                (Some(program), true) => self.account(evaluate(program, packet)),
                _ => {
                    self.stats.increment_drop();
                    SteeringResult::Drop
                }
            };
            sink(index, result);
        }
    }

    /// Concrete destination indices for a steering outcome: the set bits
    /// of the delivery mask restricted to current members.
    pub fn delivery_targets(&self, result: SteeringResult) -> SetBits<QueueMask> {
        match result.intersect(self.members()) {
            SteeringResult::Deliver(mask) => mask.set_bits(),
            SteeringResult::Drop => QueueMask::ZERO.set_bits(),
        }
    }

    /// Applies the member mask and updates the counters.
    fn account(&self, raw: SteeringResult) -> SteeringResult {
        match raw.intersect(self.members()) {
            SteeringResult::Deliver(mask) => {
                self.stats.increment_deliver();
                SteeringResult::Deliver(mask)
            }
            SteeringResult::Drop => {
                if matches!(raw, SteeringResult::Deliver(_)) {
                    // steered to destinations nobody occupies
                    self.stats.increment_anomaly();
                }
                self.stats.increment_drop();
                SteeringResult::Drop
            }
        }
    }
}
