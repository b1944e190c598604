use steer_wire::{Argument, ComputationDescriptor, NO_SUCCESSOR};
use tracing::debug;

use crate::symtable::{Run, SymbolTable, Tag};
use crate::BindError;

/// The four argument slots of a resolved node, with typed accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeArgs([Argument; 4]);

impl NodeArgs {
    /// Scalar in slot `slot`, if present.
    #[inline]
    pub fn scalar(&self, slot: usize) -> Option<u64> {
        self.0.get(slot)?.as_scalar()
    }

    /// Byte buffer in slot `slot`, if present.
    #[inline]
    pub fn bytes(&self, slot: usize) -> Option<&[u8]> {
        Some(self.0.get(slot)?.as_bytes()?.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedNode {
    /// Combinator name, kept for diagnostics.
    pub(crate) name: &'static str,
    pub(crate) run: Run,
    pub(crate) args: NodeArgs,
    pub(crate) left: Option<usize>,
    pub(crate) right: Option<usize>,
}

/// A validated, symbol-resolved computation, immutable and shareable
/// across every evaluating thread.
///
/// Producing one via [`resolve`] is the only way a descriptor becomes
/// executable; all structural and symbol checks live there, so the
/// evaluator can assume entry and branch indices are in range and the
/// reachable subgraph is acyclic.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProgram {
    nodes: Vec<ResolvedNode>,
    entry_point: usize,
}

impl ResolvedProgram {
    #[inline]
    pub(crate) fn entry_point(&self) -> usize {
        self.entry_point
    }

    #[inline]
    pub(crate) fn node(&self, index: usize) -> &ResolvedNode {
        &self.nodes[index]
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Combinator names in node order, for diagnostics.
    pub fn symbols(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.nodes.iter().map(|node| node.name)
    }
}

/// Checks a branch index: `-1` is "no successor", anything else must
/// address a node.
fn branch(index: i32, size: usize) -> Result<Option<usize>, BindError> {
    if index == NO_SUCCESSOR {
        return Ok(None);
    }
    if index < 0 || index as usize >= size {
        return Err(BindError::OutOfRangeIndex { index: i64::from(index), size });
    }
    Ok(Some(index as usize))
}

/// Validates `descriptor` against `symbols` and binds every node to its
/// native combinator.
///
/// This is the single gate between wire data and the evaluation hot
/// path: unknown symbols, arity violations, out-of-range indices and
/// cycles are all rejected here, and a rejected descriptor leaves any
/// previously installed program untouched.
pub fn resolve(
    descriptor: &ComputationDescriptor,
    symbols: &SymbolTable,
) -> Result<ResolvedProgram, BindError> {
    let size = descriptor.nodes.len();
    if size == 0 {
        return Err(BindError::MalformedDescriptor("empty computation".into()));
    }

    let entry_point = descriptor.entry_point;
    if entry_point as usize >= size {
        return Err(BindError::OutOfRangeIndex { index: i64::from(entry_point), size });
    }

    let mut nodes = Vec::with_capacity(size);
    for node in &descriptor.nodes {
        let combinator = symbols
            .lookup(&node.symbol)
            .ok_or_else(|| BindError::UnknownSymbol(node.symbol.clone()))?;

        // Slots [0, arity) must be filled, slots [arity, 4) must be the
        // empty pair.
        let given = node.args.iter().take_while(|arg| !arg.is_empty()).count();
        let trailing_nonempty = node.args.iter().skip(given).any(|arg| !arg.is_empty());
        if given != combinator.arity || trailing_nonempty {
            return Err(BindError::ArityMismatch {
                symbol: node.symbol.clone(),
                expected: combinator.arity,
                given: node.args.iter().filter(|arg| !arg.is_empty()).count(),
            });
        }

        let left = branch(node.left, size)?;
        let right = branch(node.right, size)?;

        match combinator.run.tag() {
            Tag::Action => {
                if left.is_some() || right.is_some() {
                    return Err(BindError::MalformedDescriptor(format!(
                        "action '{}' must be terminal",
                        node.symbol
                    )));
                }
            }
            Tag::Merge => {
                if left.is_none() || right.is_none() {
                    return Err(BindError::MalformedDescriptor(format!(
                        "merge '{}' needs both branches",
                        node.symbol
                    )));
                }
            }
            Tag::Predicate => {}
        }

        nodes.push(ResolvedNode {
            name: combinator.name,
            run: combinator.run,
            args: NodeArgs(node.args.clone()),
            left,
            right,
        });
    }

    check_acyclic(&nodes, entry_point as usize)?;

    debug!(size, entry_point, "computation resolved");

    Ok(ResolvedProgram { nodes, entry_point: entry_point as usize })
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Depth-first walk of the subgraph reachable from `entry`; a back edge
/// to a node on the current path is a cycle. Iterative so a deep chain
/// cannot exhaust the stack before validation finishes.
fn check_acyclic(nodes: &[ResolvedNode], entry: usize) -> Result<(), BindError> {
    let mut color = vec![Color::White; nodes.len()];
    let mut stack: Vec<(usize, u8)> = Vec::with_capacity(nodes.len());

    color[entry] = Color::Gray;
    stack.push((entry, 0));

    while let Some(frame) = stack.last_mut() {
        let (index, edge) = *frame;
        if edge == 2 {
            color[index] = Color::Black;
            stack.pop();
            continue;
        }
        frame.1 += 1;

        let next = if edge == 0 { nodes[index].left } else { nodes[index].right };
        if let Some(next) = next {
            match color[next] {
                Color::Gray => return Err(BindError::CyclicGraph { node: next }),
                Color::White => {
                    color[next] = Color::Gray;
                    stack.push((next, 0));
                }
                Color::Black => {}
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use steer_wire::FunctionalNode;

    fn table() -> SymbolTable {
        SymbolTable::new()
    }

    fn icmp_steering() -> ComputationDescriptor {
        ComputationDescriptor::new(
            0,
            vec![
                FunctionalNode::branch("is_ip", 1, 3),
                FunctionalNode::branch("is_icmp", 2, 3),
                FunctionalNode::leaf("steer_by_hash").with_arg(0, Argument::Scalar(8)),
                FunctionalNode::leaf("drop"),
            ],
        )
    }

    #[test]
    fn resolves_a_well_formed_descriptor() {
        let program = resolve(&icmp_steering(), &table()).unwrap();
        assert_eq!(program.size(), 4);
        assert_eq!(
            program.symbols().collect::<Vec<_>>(),
            vec!["is_ip", "is_icmp", "steer_by_hash", "drop"]
        );
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let mut descriptor = icmp_steering();
        descriptor.nodes[1].symbol = "no_such_fn".into();
        assert_eq!(
            resolve(&descriptor, &table()),
            Err(BindError::UnknownSymbol("no_such_fn".into()))
        );
    }

    #[test]
    fn entry_point_out_of_range() {
        let mut descriptor = icmp_steering();
        descriptor.entry_point = 4;
        assert_eq!(
            resolve(&descriptor, &table()),
            Err(BindError::OutOfRangeIndex { index: 4, size: 4 })
        );
    }

    #[test]
    fn branch_out_of_range() {
        let mut descriptor = icmp_steering();
        descriptor.nodes[0].right = 9;
        assert_eq!(
            resolve(&descriptor, &table()),
            Err(BindError::OutOfRangeIndex { index: 9, size: 4 })
        );

        descriptor.nodes[0].right = -2;
        assert!(matches!(
            resolve(&descriptor, &table()),
            Err(BindError::OutOfRangeIndex { index: -2, .. })
        ));
    }

    #[test]
    fn self_loop_is_cyclic() {
        let mut descriptor = icmp_steering();
        descriptor.nodes[1].left = 1;
        assert_eq!(resolve(&descriptor, &table()), Err(BindError::CyclicGraph { node: 1 }));
    }

    #[test]
    fn longer_cycle_is_detected() {
        let descriptor = ComputationDescriptor::new(
            0,
            vec![
                FunctionalNode::branch("is_ip", 1, 1),
                FunctionalNode::branch("is_udp", 2, 2),
                FunctionalNode::branch("is_tcp", 0, 0),
            ],
        );
        assert!(matches!(
            resolve(&descriptor, &table()),
            Err(BindError::CyclicGraph { node: 0 })
        ));
    }

    #[test]
    fn diamond_sharing_is_not_a_cycle() {
        // both predicate branches funnel into the same terminal
        let descriptor = ComputationDescriptor::new(
            0,
            vec![
                FunctionalNode::branch("is_ip", 1, 2),
                FunctionalNode::branch("is_udp", 3, 3),
                FunctionalNode::branch("is_tcp", 3, 3),
                FunctionalNode::leaf("drop"),
            ],
        );
        assert!(resolve(&descriptor, &table()).is_ok());
    }

    #[test]
    fn unreachable_cycle_is_tolerated() {
        // node 3 loops on itself but nothing reaches it; indices are
        // still range-checked, the path check only covers the reachable
        // subgraph
        let descriptor = ComputationDescriptor::new(
            0,
            vec![
                FunctionalNode::branch("is_ip", 1, 2),
                FunctionalNode::leaf("drop"),
                FunctionalNode::leaf("drop"),
                FunctionalNode::branch("is_udp", 3, 3),
            ],
        );
        assert!(resolve(&descriptor, &table()).is_ok());
    }

    #[test]
    fn arity_mismatch_on_missing_argument() {
        let mut descriptor = icmp_steering();
        descriptor.nodes[2].args[0] = Argument::Empty;
        assert_eq!(
            resolve(&descriptor, &table()),
            Err(BindError::ArityMismatch {
                symbol: "steer_by_hash".into(),
                expected: 1,
                given: 0
            })
        );
    }

    #[test]
    fn arity_mismatch_on_populated_unused_slot() {
        let mut descriptor = icmp_steering();
        descriptor.nodes[3].args[2] = Argument::Scalar(7);
        assert_eq!(
            resolve(&descriptor, &table()),
            Err(BindError::ArityMismatch { symbol: "drop".into(), expected: 0, given: 1 })
        );
    }

    #[test]
    fn action_with_successor_is_malformed() {
        let mut descriptor = icmp_steering();
        descriptor.nodes[3].left = 0;
        assert!(matches!(
            resolve(&descriptor, &table()),
            Err(BindError::MalformedDescriptor(_))
        ));
    }

    #[test]
    fn merge_needs_both_branches() {
        let descriptor = ComputationDescriptor::new(
            0,
            vec![
                FunctionalNode::branch("par", 1, NO_SUCCESSOR),
                FunctionalNode::leaf("drop"),
            ],
        );
        assert!(matches!(
            resolve(&descriptor, &table()),
            Err(BindError::MalformedDescriptor(_))
        ));
    }

    #[test]
    fn empty_descriptor_is_malformed() {
        let descriptor = ComputationDescriptor::new(0, vec![]);
        assert!(matches!(
            resolve(&descriptor, &table()),
            Err(BindError::MalformedDescriptor(_))
        ));
    }
}
