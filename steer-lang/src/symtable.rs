use rustc_hash::FxHashMap;

use crate::{builtins, NodeArgs, PacketView, SteeringResult};

/// What a combinator does with the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Produces a boolean; the walk continues to `left` on true, `right`
    /// on false.
    Predicate,
    /// Terminal: produces the steering result directly.
    Action,
    /// Evaluates both branches and merges their results.
    Merge,
}

/// The native implementation bound to a node at resolution time.
///
/// Plain function pointers: after resolution the hot path performs no
/// name lookup and no dynamic dispatch beyond a single enum match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Run {
    Predicate(fn(&NodeArgs, &PacketView<'_>) -> bool),
    Action(fn(&NodeArgs, &PacketView<'_>) -> SteeringResult),
    Merge(fn(SteeringResult, SteeringResult) -> SteeringResult),
}

impl Run {
    /// The tag this implementation carries.
    #[inline]
    pub fn tag(&self) -> Tag {
        match self {
            Self::Predicate(_) => Tag::Predicate,
            Self::Action(_) => Tag::Action,
            Self::Merge(_) => Tag::Merge,
        }
    }
}

/// A named combinator with a fixed arity.
#[derive(Debug, Clone, Copy)]
pub struct Combinator {
    pub name: &'static str,
    /// Number of argument slots the descriptor must fill (0..=4).
    pub arity: usize,
    pub run: Run,
}

/// Registry mapping symbol names to native combinators.
///
/// Built once at startup; resolution consults it per bind, never per
/// packet. [`register`](Self::register) lets embedders extend the
/// built-in set with their own combinators before any group is bound.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    map: FxHashMap<&'static str, Combinator>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table preloaded with the built-in combinators.
    pub fn new() -> Self {
        let mut table = Self { map: FxHashMap::default() };
        for combinator in builtins::ALL {
            table.register(*combinator);
        }
        table
    }

    /// An empty table, for embedders that want full control over the
    /// available symbols.
    pub fn empty() -> Self {
        Self { map: FxHashMap::default() }
    }

    /// Registers a combinator under its name, replacing any previous
    /// entry.
    pub fn register(&mut self, combinator: Combinator) {
        debug_assert!(combinator.arity <= 4, "combinator arity exceeds the 4 argument slots");
        self.map.insert(combinator.name, combinator);
    }

    /// Looks up a symbol.
    #[inline]
    pub fn lookup(&self, symbol: &str) -> Option<&Combinator> {
        self.map.get(symbol)
    }

    /// Number of registered symbols.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the table has no symbols.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
