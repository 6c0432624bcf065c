//! Node representation (see SPEC_FULL.md §3).

use crate::literal::{Lit, Var};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeKind {
    Const1,
    Pi,
    Po,
    /// The state-holding output half of a latch; behaves like a CI (no fanins).
    LatchOut,
    /// The next-state input half of a latch; fanin0 is the next-state driver.
    /// Its reset value lives in `AigStore::latches`, keyed by the paired output.
    LatchIn,
    And,
    /// A logically-deleted slot; the arena cell is still live (may be reused
    /// only once the driver's renumbering pass runs).
    Void,
}

/// Scratch mark bits used by cut/MFFC/cone algorithms. Both must read as
/// zero between passes (checked by the integrity check).
#[derive(Clone, Copy, Default, Debug)]
pub struct Marks {
    pub a: bool,
    pub b: bool,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub id: Var,
    /// For And/Po/Latch-input: both fanins are meaningful for And; Po and
    /// Latch use only fanin0.
    pub fanin0: Lit,
    pub fanin1: Lit,
    /// Value of this node's function under the all-zero input assignment.
    pub phase: bool,
    pub marks: Marks,
    /// Count of live fanin edges pointing at this node.
    pub refcount: u32,
    /// Longest AND-path from a PI; 0 for PI and constant.
    pub level: u32,
    /// Traversal stamp, compared against the store's current stamp.
    pub stamp: u32,
}

impl Node {
    pub fn new_void(id: Var) -> Node {
        Node {
            kind: NodeKind::Void,
            id,
            fanin0: Lit::FALSE,
            fanin1: Lit::FALSE,
            phase: false,
            marks: Marks::default(),
            refcount: 0,
            level: 0,
            stamp: 0,
        }
    }

    #[inline]
    pub fn is_and(&self) -> bool { self.kind == NodeKind::And }

    #[inline]
    pub fn is_ci(&self) -> bool { matches!(self.kind, NodeKind::Pi | NodeKind::LatchOut) }

    #[inline]
    pub fn is_co(&self) -> bool { matches!(self.kind, NodeKind::Po | NodeKind::LatchIn) }

    #[inline]
    pub fn is_dangling(&self) -> bool {
        self.kind == NodeKind::And && self.refcount == 0
    }
}
