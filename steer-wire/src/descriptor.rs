use bytes::Bytes;

/// Sentinel branch index: this edge has no successor.
pub const NO_SUCCESSOR: i32 = -1;

/// A bound argument of a functional node.
///
/// Arguments are fixed at bind time, never per packet. A byte-buffer
/// argument shares its payload ([`Bytes`]), so cloning a descriptor or
/// resolving it into a program never copies argument data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Argument {
    /// Unused slot.
    #[default]
    Empty,
    /// An inline scalar.
    Scalar(u64),
    /// An externally built byte buffer.
    Bytes(Bytes),
}

impl Argument {
    /// Returns `true` for an unused slot.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the scalar value, if this argument is one.
    #[inline]
    pub fn as_scalar(&self) -> Option<u64> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the byte payload, if this argument is one.
    #[inline]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

/// One node of a computation DAG.
///
/// `symbol` names a combinator in the symbol table; `left`/`right` are the
/// indices of the successor nodes ([`NO_SUCCESSOR`] marks a terminal edge).
/// Every node carries exactly four argument slots; slots beyond the
/// combinator's arity must be [`Argument::Empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionalNode {
    pub symbol: String,
    pub args: [Argument; 4],
    pub left: i32,
    pub right: i32,
}

impl FunctionalNode {
    /// A terminal node with no arguments.
    pub fn leaf(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            args: Default::default(),
            left: NO_SUCCESSOR,
            right: NO_SUCCESSOR,
        }
    }

    /// A node branching to `left` on true and `right` on false.
    pub fn branch(symbol: impl Into<String>, left: i32, right: i32) -> Self {
        Self { symbol: symbol.into(), args: Default::default(), left, right }
    }

    /// Replaces argument slot `slot`.
    pub fn with_arg(mut self, slot: usize, arg: Argument) -> Self {
        self.args[slot] = arg;
        self
    }
}

/// The serializable form of a computation: an ordered node array plus the
/// index evaluation starts from.
///
/// A descriptor carries no behavior. It becomes executable only through
/// resolution, which validates the structure (entry point and branch
/// indices in range, reachable subgraph acyclic) and binds each symbol to
/// its native combinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputationDescriptor {
    pub entry_point: u32,
    pub nodes: Vec<FunctionalNode>,
}

impl ComputationDescriptor {
    /// Creates a descriptor evaluating from `entry_point`.
    pub fn new(entry_point: u32, nodes: Vec<FunctionalNode>) -> Self {
        Self { entry_point, nodes }
    }

    /// Node count (`size` on the wire).
    #[inline]
    pub fn size(&self) -> u32 {
        self.nodes.len() as u32
    }
}
