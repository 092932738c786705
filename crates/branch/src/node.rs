use alloc::vec::Vec;

use jvm2wasm_core::BlockOp;

/// The extra data a structural marker carries beyond its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// The branch depth for a `Br`/`BrIf` node: the number of enclosing
    /// structured regions to exit to reach the target.
    Depth(u32),
    /// The dispatch table for a `BrTable` node emitted at the head of a
    /// reconstructed `tableswitch`/`lookupswitch`: a dense vector of block
    /// indices in original key order (table switches are keyed `0..n`; for
    /// lookup switches `keys` holds the parallel sparse key list), plus the
    /// block index to use for keys outside the table.
    Dispatch {
        is_table_switch: bool,
        keys: Option<Vec<i32>>,
        block_indices: Vec<u32>,
        default_index: u32,
    },
}

/// A node in the reconstructed control-flow region tree.
///
/// A node spans the half-open byte interval `[start, end)`. `open` is the
/// tag emitted when a linear scan of the method reaches `start` (if any);
/// `close` is the tag emitted when it reaches `end` (if any). `Else` nodes
/// are the one case where `open` and `close` both fire from the *same*
/// physical `goto`-adjacent boundary conceptually, but structurally each
/// `BranchNode` still only opens at its own `start` and closes at its own
/// `end`.
///
/// # Invariants
///
/// - Every child's `[start, end)` lies within its parent's `[start, end)`.
/// - Sibling intervals never overlap.
/// - The root spans `[0, u32::MAX)` and carries no open/close tag of its
///   own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchNode {
    pub start: u32,
    pub end: u32,
    pub open: Option<BlockOp>,
    pub open_payload: Option<Payload>,
    pub close: Option<BlockOp>,
    pub children: Vec<BranchNode>,
}

impl BranchNode {
    pub fn new(
        start: u32,
        end: u32,
        open: Option<BlockOp>,
        open_payload: Option<Payload>,
        close: Option<BlockOp>,
        children: Vec<BranchNode>,
    ) -> Self {
        Self {
            start,
            end,
            open,
            open_payload,
            close,
            children,
        }
    }

    /// A zero-width marker node: opens at `at` and never closes. Used for
    /// `Br`/`BrIf` nodes, which denote a single instruction rather than a
    /// region.
    pub fn marker(at: u32, open: BlockOp, payload: Payload) -> Self {
        Self {
            start: at,
            end: at,
            open: Some(open),
            open_payload: Some(payload),
            close: None,
            children: Vec::new(),
        }
    }

    /// Visits every node (this one, then its descendants depth-first)
    /// whose interval contains `position`, invoking `on_open` when
    /// `position == start` and `on_close` when `position == end`.
    ///
    /// This is the query the method translator's second pass drives: for
    /// every bytecode position it visits, it calls `handle` on the root and
    /// emits whatever structural tags come back before/after emitting the
    /// position's own instruction.
    pub fn handle(&self, position: u32, mut on_open: impl FnMut(BlockOp, Option<&Payload>), mut on_close: impl FnMut(BlockOp)) {
        self.handle_inner(position, &mut on_open, &mut on_close);
    }

    fn handle_inner(
        &self,
        position: u32,
        on_open: &mut impl FnMut(BlockOp, Option<&Payload>),
        on_close: &mut impl FnMut(BlockOp),
    ) {
        if position < self.start || position > self.end {
            return;
        }
        if position == self.start {
            if let Some(op) = self.open {
                on_open(op, self.open_payload.as_ref());
            }
        }
        for child in &self.children {
            child.handle_inner(position, on_open, on_close);
        }
        if position == self.end {
            if let Some(op) = self.close {
                on_close(op);
            }
        }
    }

    /// Checks the structural invariants (child containment, sibling
    /// non-overlap) recursively. Intended for tests and debug assertions,
    /// not the hot path.
    pub fn check_invariants(&self) -> bool {
        let mut prev_end: Option<u32> = None;
        for child in &self.children {
            if child.start < self.start || child.end > self.end {
                return false;
            }
            if let Some(prev_end) = prev_end {
                if child.start < prev_end {
                    return false;
                }
            }
            prev_end = Some(child.end);
            if !child.check_invariants() {
                return false;
            }
        }
        true
    }
}
