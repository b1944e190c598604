//! The per-packet interpreter.
//!
//! A pure function of `(program, packet)`: no shared state, no locks, no
//! allocation. Termination is structural — resolution proved the
//! reachable subgraph acyclic, so the walk visits each node at most once.

use crate::symtable::Run;
use crate::{PacketView, ResolvedProgram, SteeringResult};

/// Walks `program` over one packet and returns its steering outcome.
pub fn evaluate(program: &ResolvedProgram, packet: &PacketView<'_>) -> SteeringResult {
    eval_node(program, program.entry_point(), packet)
}

fn eval_node(
    program: &ResolvedProgram,
    index: usize,
    packet: &PacketView<'_>,
) -> SteeringResult {
    let node = program.node(index);
    match node.run {
        Run::Predicate(test) => {
            let taken = if test(&node.args, packet) { node.left } else { node.right };
            match taken {
                Some(next) => eval_node(program, next, packet),
                // open branch: nothing matched the packet
                None => SteeringResult::Drop,
            }
        }
        Run::Action(act) => act(&node.args, packet),
        Run::Merge(merge) => match (node.left, node.right) {
            (Some(left), Some(right)) => merge(
                eval_node(program, left, packet),
                eval_node(program, right, packet),
            ),
            // resolution guarantees both branches; drop rather than trust
            _ => SteeringResult::Drop,
        },
    }
}
