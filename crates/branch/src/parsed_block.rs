/// A branch-like instruction recorded during the method translator's first
/// pass over a method's bytecode.
///
/// # Note
///
/// `end` is the instruction's *resolved* target byte position — i.e.
/// `start + signed offset` — which may be smaller than `start` for a
/// backward branch. `len_bytes` is the number of bytes the instruction
/// itself occupies in the bytecode stream (3 for `goto`/`ifXX`/
/// `if_icmpXX`, 5 for `goto_w`, variable for `tableswitch`/`lookupswitch`);
/// it is only used to compute where scanning resumes once an instruction
/// has been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBlock {
    pub kind: BlockKind,
    pub start: u32,
    pub end: u32,
    pub len_bytes: u32,
    pub line: Option<u32>,
}

impl ParsedBlock {
    /// Records a conditional branch (`ifeq`, `if_icmpne`, …).
    pub fn new_if(start: u32, target: u32, len_bytes: u32, line: Option<u32>) -> Self {
        Self {
            kind: BlockKind::If,
            start,
            end: target,
            len_bytes,
            line,
        }
    }

    /// Records an unconditional branch (`goto`, `goto_w`).
    pub fn new_goto(start: u32, target: u32, len_bytes: u32, line: Option<u32>) -> Self {
        Self {
            kind: BlockKind::Goto,
            start,
            end: target,
            len_bytes,
            line,
        }
    }

    /// Records a `tableswitch` or `lookupswitch`.
    pub fn new_switch(start: u32, switch: SwitchData, len_bytes: u32, line: Option<u32>) -> Self {
        Self {
            kind: BlockKind::Switch(switch),
            start,
            end: start,
            len_bytes,
            line,
        }
    }

    /// `true` if this is a branch whose target precedes its own position.
    pub fn is_backward(&self) -> bool {
        self.end < self.start
    }
}

/// The operator kind of a [`ParsedBlock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    If,
    Goto,
    Switch(SwitchData),
}

/// The parallel case data carried by a `tableswitch`/`lookupswitch`
/// [`ParsedBlock`].
///
/// `keys = None` means a table-switch indexed densely by `0..targets.len()`;
/// `keys = Some(_)` means a lookup-switch with explicit (and possibly
/// sparse, possibly unsorted) integer keys parallel to `targets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchData {
    pub keys: Option<alloc::vec::Vec<i32>>,
    pub targets: alloc::vec::Vec<u32>,
    pub default_target: u32,
}
