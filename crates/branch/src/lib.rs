//! Structural recovery: turns the unstructured `if`/`goto`/`tableswitch`/
//! `lookupswitch` branches of a stack-machine method into a tree of nested
//! Wasm `block`/`loop`/`if`/`else` regions.
//!
//! The method translator feeds every branch-like instruction it encounters
//! to a [`BranchManager`] during a first pass over a method's bytecode,
//! then calls [`BranchManager::calculate`] to get back a [`BranchNode`]
//! tree. A second pass walks the bytecode again, address by address,
//! calling [`BranchNode::handle`] at each position to learn which
//! structural tags (`block`, `loop`, `if`, `else`, `end`, `br`, `br_if`,
//! `br_table`) to emit before and after that position's own instruction.
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

mod manager;
mod node;
mod parsed_block;

pub use self::{
    manager::BranchManager,
    node::{BranchNode, Payload},
    parsed_block::{BlockKind, ParsedBlock, SwitchData},
};

#[cfg(test)]
mod tests {
    use alloc::vec;

    use jvm2wasm_core::BlockOp;

    use super::*;

    #[test]
    fn straight_line_method_has_no_structure() {
        let manager = BranchManager::new();
        let root = manager.calculate(10).unwrap();
        assert!(root.children.is_empty());
        assert!(root.check_invariants());
    }

    #[test]
    fn if_without_else_wraps_its_body() {
        let mut manager = BranchManager::new();
        // ifeq at 0, 3 bytes, targets 10 (the "no" branch skips the body)
        manager.start_if(0, 10, 3, Some(1));
        let root = manager.calculate(10).unwrap();
        assert!(root.check_invariants());
        assert_eq!(root.children.len(), 1);
        let if_node = &root.children[0];
        assert_eq!(if_node.open, Some(BlockOp::If));
        assert_eq!(if_node.close, Some(BlockOp::End));
        assert_eq!((if_node.start, if_node.end), (0, 10));
    }

    #[test]
    fn if_else_splits_into_two_sibling_nodes() {
        let mut manager = BranchManager::new();
        // ifeq at 0 -> else at 10; goto at 7 (ifEnd - 3) -> end at 20
        manager.start_if(0, 10, 3, Some(1));
        manager.start_goto(7, 20, 3, Some(2));
        let root = manager.calculate(20).unwrap();
        assert!(root.check_invariants());
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].open, Some(BlockOp::If));
        assert_eq!(root.children[0].close, None);
        assert_eq!((root.children[0].start, root.children[0].end), (0, 10));
        assert_eq!(root.children[1].open, Some(BlockOp::Else));
        assert_eq!(root.children[1].close, Some(BlockOp::End));
        assert_eq!((root.children[1].start, root.children[1].end), (10, 20));
    }

    #[test]
    fn backward_goto_opens_a_loop() {
        let mut manager = BranchManager::new();
        // a method body that is one big `while (true) { ...; goto 0 }`
        manager.start_goto(17, 0, 3, Some(5));
        let root = manager.calculate(20).unwrap();
        assert!(root.check_invariants());
        assert_eq!(root.children.len(), 1);
        let loop_node = &root.children[0];
        assert_eq!(loop_node.open, Some(BlockOp::Loop));
        assert_eq!(loop_node.close, Some(BlockOp::End));
        assert_eq!((loop_node.start, loop_node.end), (0, 20));
        assert_eq!(loop_node.children.len(), 1);
        assert_eq!(loop_node.children[0].open, Some(BlockOp::Br));
    }

    #[test]
    fn conditional_continue_inside_a_loop_resolves_via_the_open_loop() {
        let mut manager = BranchManager::new();
        // do { if (a < 10) { b++; } else { return a; } a++; } while (true)
        // if_icmpge at 0 -> else at 10 (the b++ arm is [0,10))
        manager.start_if(0, 10, 3, Some(1));
        // the else arm returns, no goto needed there; straight-line a++
        // follows at 10..17, then the closing backward goto at 17 -> 0
        manager.start_goto(17, 0, 3, Some(6));
        let root = manager.calculate(20).unwrap();
        assert!(root.check_invariants());
        assert_eq!(root.children.len(), 1);
        let loop_node = &root.children[0];
        assert_eq!(loop_node.open, Some(BlockOp::Loop));
        assert_eq!(loop_node.children.len(), 2);
        assert_eq!(loop_node.children[0].open, Some(BlockOp::If));
        assert_eq!(loop_node.children[1].open, Some(BlockOp::Br));
    }

    #[test]
    fn loop_header_preceded_by_a_straight_line_prologue_still_opens() {
        // Realistic shape: locals-init prologue (iconst_0; istore_0; iconst_0;
        // istore_1, bytes 0..4) runs before the loop header at byte 4, where
        // the condition's own operand-pushing instructions (iload/bipush,
        // bytes 4..7) precede the first registered branch at byte 7. Nothing
        // before the `if` registers a `ParsedBlock`, so the scan's `pos`
        // would otherwise step straight from 0 to 7 and never notice the
        // loop header sitting at 4.
        let mut manager = BranchManager::new();
        manager.start_if(7, 16, 3, Some(2));
        manager.start_goto(13, 18, 3, Some(3)); // else arm, forward
        manager.start_goto(21, 4, 3, Some(5)); // closing backward branch
        let root = manager.calculate(24).unwrap();
        assert!(root.check_invariants());
        assert_eq!(root.children.len(), 1);
        let loop_node = &root.children[0];
        assert_eq!(loop_node.open, Some(BlockOp::Loop));
        assert_eq!((loop_node.start, loop_node.end), (4, 24));
        assert_eq!(loop_node.children.len(), 3);
        assert_eq!(loop_node.children[0].open, Some(BlockOp::If));
        assert_eq!(loop_node.children[1].open, Some(BlockOp::Else));
        assert_eq!(loop_node.children[2].open, Some(BlockOp::Br));
    }

    #[test]
    fn lookup_switch_nests_one_block_per_distinct_target() {
        let mut manager = BranchManager::new();
        let switch = SwitchData {
            keys: Some(vec![1, 2, 5]),
            targets: vec![30, 40, 30],
            default_target: 50,
        };
        manager.start_switch(0, switch, 13, Some(9));
        let root = manager.calculate(50).unwrap();
        assert!(root.check_invariants());
        // distinct targets sorted: 30, 40, 50 -> 3 nested blocks
        assert_eq!(root.children.len(), 1);
        let outer = &root.children[0];
        assert_eq!(outer.open, Some(BlockOp::Block));
        assert_eq!(outer.end, 50);
        let middle = &outer.children[0];
        assert_eq!(middle.open, Some(BlockOp::Block));
        assert_eq!(middle.end, 40);
        let inner = &middle.children[0];
        assert_eq!(inner.open, Some(BlockOp::Block));
        assert_eq!(inner.end, 30);
        let dispatch = &inner.children[0];
        assert_eq!(dispatch.open, Some(BlockOp::BrTable));
        match dispatch.open_payload.as_ref().unwrap() {
            Payload::Dispatch {
                is_table_switch,
                block_indices,
                default_index,
                ..
            } => {
                assert!(!is_table_switch);
                // keys 1 -> target 30 (block 0), 2 -> target 40 (block 1), 5 -> target 30 (block 0)
                assert_eq!(block_indices, &vec![0, 1, 0]);
                assert_eq!(*default_index, 2);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn unmatched_forward_goto_is_irreducible() {
        let mut manager = BranchManager::new();
        manager.start_goto(0, 100, 3, Some(1));
        let err = manager.calculate(10).unwrap_err();
        assert!(err.message().contains("cannot be reduced"));
    }
}
