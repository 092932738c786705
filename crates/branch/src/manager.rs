use alloc::{collections::BTreeMap, vec, vec::Vec};

use jvm2wasm_core::{BlockOp, CompileError};

use crate::{
    node::{BranchNode, Payload},
    parsed_block::{BlockKind, ParsedBlock, SwitchData},
};

/// A regular `goto`'s encoded size in bytes. Used only for the if/else
/// detection heuristic below, which assumes the companion branch is a
/// plain `goto` (never a `goto_w`).
const GOTO_SIZE: u32 = 3;

/// An entry on the stack of structured regions currently open during tree
/// construction, used to resolve the branch depth of a `goto` that targets
/// one of them.
struct OpenRegion {
    target: u32,
    depth: u32,
}

/// Collects the branch-like instructions seen while scanning a method's
/// bytecode and reduces them to a [`BranchNode`] tree.
///
/// This is the structural-recovery pass: it never looks at the bytecode
/// itself, only at the addresses and targets of `if`/`goto`/`tableswitch`/
/// `lookupswitch` instructions recorded via [`start_if`][Self::start_if],
/// [`start_goto`][Self::start_goto], and [`start_switch`][Self::start_switch].
#[derive(Debug, Default)]
pub struct BranchManager {
    blocks: Vec<ParsedBlock>,
}

impl BranchManager {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub fn start_if(&mut self, start: u32, target: u32, len_bytes: u32, line: Option<u32>) {
        self.blocks.push(ParsedBlock::new_if(start, target, len_bytes, line));
    }

    pub fn start_goto(&mut self, start: u32, target: u32, len_bytes: u32, line: Option<u32>) {
        self.blocks.push(ParsedBlock::new_goto(start, target, len_bytes, line));
    }

    pub fn start_switch(&mut self, start: u32, switch: SwitchData, len_bytes: u32, line: Option<u32>) {
        self.blocks.push(ParsedBlock::new_switch(start, switch, len_bytes, line));
    }

    /// Reduces the recorded branches to a single root [`BranchNode`]
    /// spanning `[0, u32::MAX)`, whose children describe the method's
    /// `method_length`-byte body.
    pub fn calculate(mut self, method_length: u32) -> Result<BranchNode, CompileError> {
        self.blocks.sort_by_key(|b| b.start);

        let mut loop_headers: BTreeMap<u32, u32> = BTreeMap::new();
        for block in &self.blocks {
            if matches!(block.kind, BlockKind::Goto) && block.is_backward() {
                let close = block.start + block.len_bytes;
                loop_headers
                    .entry(block.end)
                    .and_modify(|existing| {
                        if close > *existing {
                            *existing = close;
                        }
                    })
                    .or_insert(close);
            }
        }

        let mut builder = Builder {
            blocks: &self.blocks,
            idx: 0,
            loop_headers,
        };
        let mut open = Vec::new();
        let children = builder.build_region(0, &mut open, 0, method_length)?;
        Ok(BranchNode::new(0, u32::MAX, None, None, None, children))
    }
}

struct Builder<'a> {
    blocks: &'a [ParsedBlock],
    idx: usize,
    loop_headers: BTreeMap<u32, u32>,
}

impl<'a> Builder<'a> {
    /// Builds the sibling list covering `[region_start, region_end)`.
    fn build_region(
        &mut self,
        depth: u32,
        open: &mut Vec<OpenRegion>,
        region_start: u32,
        region_end: u32,
    ) -> Result<Vec<BranchNode>, CompileError> {
        let mut out = Vec::new();
        let mut pos = region_start;

        loop {
            // A loop header need not coincide with `pos` exactly: the
            // straight-line instructions between a loop's first byte and
            // its first branch (e.g. the `iload`/comparison operands of the
            // condition that will eventually `goto` back here) never
            // register a `ParsedBlock`, so `pos` would otherwise skip clean
            // over the header on its way to the next registered block.
            // Look ahead to the nearest still-open header and only defer to
            // an intervening block if that block actually starts first.
            let next_block_start = self.blocks.get(self.idx).map(|b| b.start).filter(|&s| s < region_end).unwrap_or(region_end);
            if let Some((&header, &close)) = self.loop_headers.range(pos..).next() {
                if close <= region_end && header <= next_block_start {
                    // Consume the header so the recursive call over the
                    // loop's own body (which starts scanning at this same
                    // position) does not reopen it.
                    self.loop_headers.remove(&header);
                    open.push(OpenRegion { target: header, depth });
                    let children = self.build_region(depth + 1, open, header, close)?;
                    open.pop();
                    out.push(BranchNode::new(header, close, Some(BlockOp::Loop), None, Some(BlockOp::End), children));
                    pos = close;
                    continue;
                }
            }

            if self.idx >= self.blocks.len() || self.blocks[self.idx].start >= region_end {
                break;
            }
            let block = self.blocks[self.idx].clone();
            if block.start < pos {
                // Already consumed as part of an earlier construct (e.g. an
                // else-arm goto); skip it.
                self.idx += 1;
                continue;
            }

            match &block.kind {
                BlockKind::If => {
                    self.idx += 1;
                    let if_end = block.end.min(region_end);
                    let else_goto = if if_end >= GOTO_SIZE {
                        let else_start = if_end - GOTO_SIZE;
                        self.blocks.get(self.idx).and_then(|g| {
                            if matches!(g.kind, BlockKind::Goto) && g.start == else_start {
                                Some(g.clone())
                            } else {
                                None
                            }
                        })
                    } else {
                        None
                    };

                    if let Some(goto) = else_goto.filter(|g| g.end > g.start) {
                        // Forward goto right before the if's target: an
                        // else arm, not a loop-continue.
                        self.idx += 1;
                        let else_end = goto.end.min(region_end);
                        let if_children = self.build_region(depth + 1, open, block.start, if_end)?;
                        out.push(BranchNode::new(block.start, if_end, Some(BlockOp::If), None, None, if_children));
                        let else_children = self.build_region(depth + 1, open, if_end, else_end)?;
                        out.push(BranchNode::new(if_end, else_end, Some(BlockOp::Else), None, Some(BlockOp::End), else_children));
                        pos = else_end;
                    } else {
                        // Plain if (no else), or the goto at ifEnd-3 is
                        // itself a backward branch (loop continue) which
                        // belongs to the if's own true-arm body and is left
                        // pending for the recursive call below.
                        let if_children = self.build_region(depth + 1, open, block.start, if_end)?;
                        out.push(BranchNode::new(block.start, if_end, Some(BlockOp::If), None, Some(BlockOp::End), if_children));
                        pos = if_end;
                    }
                }
                BlockKind::Goto => {
                    self.idx += 1;
                    let region = open.iter().rev().find(|r| r.target == block.end);
                    match region {
                        Some(region) => {
                            let br_depth = depth - 1 - region.depth;
                            out.push(BranchNode::marker(block.start, BlockOp::Br, Payload::Depth(br_depth)));
                        }
                        None => return Err(CompileError::irreducible_control_flow(block.start, block.end)),
                    }
                    pos = block.start + block.len_bytes;
                }
                BlockKind::Switch(data) => {
                    self.idx += 1;
                    let data = data.clone();
                    let node = self.build_switch(block.start, &data, depth, open)?;
                    pos = node.end;
                    out.push(node);
                }
            }
        }

        Ok(out)
    }

    /// Builds the nested-block reconstruction of a single `tableswitch`/
    /// `lookupswitch`.
    fn build_switch(
        &mut self,
        start: u32,
        data: &SwitchData,
        depth: u32,
        open: &mut Vec<OpenRegion>,
    ) -> Result<BranchNode, CompileError> {
        let is_table_switch = data.keys.is_none();
        let cases_in_key_order: Vec<(Option<i32>, u32)> = match &data.keys {
            Some(keys) => keys.iter().copied().zip(data.targets.iter().copied()).map(|(k, t)| (Some(k), t)).collect(),
            None => (0..data.targets.len() as i32).zip(data.targets.iter().copied()).map(|(k, t)| (Some(k), t)).collect(),
        };

        let mut all_targets: Vec<u32> = cases_in_key_order.iter().map(|&(_, t)| t).collect();
        all_targets.push(data.default_target);

        let mut distinct_targets: Vec<u32> = all_targets.clone();
        distinct_targets.sort_unstable();
        distinct_targets.dedup();

        let mut block_index_of_target: BTreeMap<u32, u32> = BTreeMap::new();
        for (idx, &target) in distinct_targets.iter().enumerate() {
            block_index_of_target.insert(target, idx as u32);
        }

        let default_index = block_index_of_target[&data.default_target];
        let block_indices: Vec<u32> = cases_in_key_order.iter().map(|&(_, t)| block_index_of_target[&t]).collect();
        let keys = if is_table_switch {
            None
        } else {
            Some(cases_in_key_order.iter().map(|&(k, _)| k.expect("lookup-switch keys are always Some")).collect())
        };

        let dispatch_payload = Payload::Dispatch {
            is_table_switch,
            keys,
            block_indices,
            default_index,
        };

        let m = distinct_targets.len();
        self.build_switch_level(m - 1, &distinct_targets, dispatch_payload, start, depth, open)
    }

    fn build_switch_level(
        &mut self,
        level: usize,
        distinct_targets: &[u32],
        dispatch_payload: Payload,
        start: u32,
        depth: u32,
        open: &mut Vec<OpenRegion>,
    ) -> Result<BranchNode, CompileError> {
        let end = distinct_targets[level];
        if level == 0 {
            let dispatch_node = BranchNode::marker(start, BlockOp::BrTable, dispatch_payload);
            return Ok(BranchNode::new(start, end, Some(BlockOp::Block), None, Some(BlockOp::End), vec![dispatch_node]));
        }

        open.push(OpenRegion { target: end, depth });
        let inner = self.build_switch_level(level - 1, distinct_targets, dispatch_payload, start, depth + 1, open)?;
        let gap_start = distinct_targets[level - 1];
        let gap_children = self.build_region(depth + 1, open, gap_start, end)?;
        open.pop();

        let mut children = vec![inner];
        children.extend(gap_children);
        Ok(BranchNode::new(start, end, Some(BlockOp::Block), None, Some(BlockOp::End), children))
    }
}
