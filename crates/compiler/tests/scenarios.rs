//! End-to-end compilation scenarios, one per concrete example used to
//! validate the structural-recovery pass and the binary/textual back-ends
//! together: a constant return, arithmetic over two value types, an
//! `if`/`else` built from a bare `ifeq`, a table-switch, a lookup-switch,
//! and a `do`/`while(true)` loop with a conditional early return.
//!
//! Every scenario is hand-assembled bytecode rather than a real `.class`
//! file — `jvm2wasm_classfile` has its own parser-level tests — so these
//! exercise exactly the translator and branch manager against inputs shaped
//! the way a real compiler would emit them (including tableswitch/
//! lookupswitch padding and JVM's inverted-condition `ifXX` encoding).

use std::collections::BTreeMap;

use assert_matches::assert_matches;
use jvm2wasm::{
    class_reader::{CodeAttribute, FixtureClass, FixtureMethod},
    CompilerConfig, CompilerSession,
};
use jvm2wasm_core::ValueType;

fn one_method_class(method: FixtureMethod) -> FixtureClass {
    FixtureClass {
        class_name: "Scenarios".into(),
        methods: vec![method],
        constants: BTreeMap::new(),
    }
}

fn contains_subsequence(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn compile_binary(method: FixtureMethod) -> Vec<u8> {
    let class = one_method_class(method);
    let mut session = CompilerSession::new_binary(CompilerConfig::default());
    session.compile_class(&class).expect("scenario should compile");
    session.finish()
}

fn compile_text(method: FixtureMethod) -> String {
    let class = one_method_class(method);
    let mut session = CompilerSession::new_text(CompilerConfig::default());
    session.compile_class(&class).expect("scenario should compile");
    session.finish_text()
}

fn be32(v: i32) -> [u8; 4] {
    v.to_be_bytes()
}

/// §8 scenario 1: `intConst` — no parameters, returns `int 42`.
#[test]
fn int_const_returns_a_literal() {
    let method = FixtureMethod {
        name: "intConst".into(),
        export_name: Some("intConst".into()),
        params: vec![],
        result: Some(ValueType::I32),
        code: Some(CodeAttribute::new(0, vec![0x10, 42, 0xac], BTreeMap::new())), // bipush 42; ireturn
    };
    let wasm = compile_binary(method);
    assert_eq!(&wasm[0..8], b"\0asm\x01\x00\x00\x00");
    // i32.const 42; return; end
    assert!(contains_subsequence(&wasm, &[0x41, 42, 0x0f, 0x0b]));
}

/// §8 scenario 2: `addInt(1, 3)` — two `i32` params, `iadd`.
#[test]
fn add_int_adds_two_params() {
    let method = FixtureMethod {
        name: "addInt".into(),
        export_name: Some("addInt".into()),
        params: vec![ValueType::I32, ValueType::I32],
        result: Some(ValueType::I32),
        code: Some(CodeAttribute::new(
            2,
            vec![0x1a, 0x1b, 0x60, 0xac], // iload_0; iload_1; iadd; ireturn
            BTreeMap::new(),
        )),
    };
    let wasm = compile_binary(method);
    // get_local 0; get_local 1; i32.add; return
    assert!(contains_subsequence(&wasm, &[0x20, 0, 0x20, 1, 0x6a, 0x0f]));
}

/// §8 scenario 3: `addDouble(1.0, 3.5)` — two `f64` params, `dadd`.
#[test]
fn add_double_adds_two_params() {
    let method = FixtureMethod {
        name: "addDouble".into(),
        export_name: Some("addDouble".into()),
        params: vec![ValueType::F64, ValueType::F64],
        result: Some(ValueType::F64),
        code: Some(CodeAttribute::new(
            4, // two double-width params occupy local slots 0..4
            vec![0x26, 0x28, 0x63, 0xaf], // dload_0 (slot 0); dload_2 (slot 2); dadd; dreturn
            BTreeMap::new(),
        )),
    };
    let text = compile_text(method);
    assert!(text.contains("f64.add"));
    assert!(text.contains("get_local 0"));
    assert!(text.contains("get_local 2"));
}

/// `dup_x2` inserts a copy of the top value two slots down: `..., v3, v2,
/// v1 -> ..., v1, v3, v2, v1`. Popping the two topmost values back off
/// afterward should leave the *original* `v3` on top, proving the copy was
/// inserted below both `v2` and `v3` rather than just below `v2` (which is
/// what `dup_x1` would have done instead).
#[test]
fn dup_x2_inserts_the_copy_below_two_values() {
    let code = vec![
        0x10, 3, // bipush 3 (v3)
        0x10, 2, // bipush 2 (v2)
        0x10, 1, // bipush 1 (v1)
        0x5b, // dup_x2 -> v1, v3, v2, v1
        0x57, // pop (discard top v1)
        0x57, // pop (discard v2)
        0xac, // ireturn (returns v3)
    ];
    let method = FixtureMethod {
        name: "dupX2".into(),
        export_name: Some("dupX2".into()),
        params: vec![],
        result: Some(ValueType::I32),
        code: Some(CodeAttribute::new(0, code, BTreeMap::new())),
    };
    let text = compile_text(method);
    // dup_x2's lowering stores v1, v2, v3 into three scratch locals then
    // reloads them in a, c, b, a order; each subsequent `pop` stores its
    // discarded value into one more scratch local.
    assert_eq!(text.matches("set_local").count(), 5);
    assert_eq!(text.matches("get_local").count(), 4);
    assert!(text.contains("return"));
}

/// A `long`/`double` parameter occupies two local-variable slots, so a
/// third `int` parameter following one lives at slot 3, not slot 2 — the
/// parameter's position in the descriptor and its JVM local index diverge
/// once a wide parameter precedes it.
#[test]
fn wide_parameter_shifts_the_following_locals_slot() {
    let method = FixtureMethod {
        name: "firstWordOfSplit".into(),
        export_name: Some("firstWordOfSplit".into()),
        params: vec![ValueType::F64, ValueType::I32],
        result: Some(ValueType::I32),
        code: Some(CodeAttribute::new(
            3, // double at slots 0..2, int at slot 2
            vec![0x1c, 0xac], // iload_2 (slot 2, the int param); ireturn
            BTreeMap::new(),
        )),
    };
    let text = compile_text(method);
    assert!(text.contains("get_local 2"));
}

/// §8 scenario 4: `ifeq` — `if (condition != 0) return 13 else return 76`
/// with `condition = 0`, compiled as bare `ifeq`/straight-line (no `goto`
/// is needed since both arms return, so there is no wasm `else`; the
/// fall-through after the `if` block realizes the else-arm).
#[test]
fn ifeq_without_else_still_distinguishes_both_arms() {
    // iconst_0; istore_0 (condition := 0); iload_0; ifeq L1; bipush 13;
    // ireturn; L1: bipush 76; ireturn
    let code = vec![
        0x03, // iconst_0
        0x3b, // istore_0
        0x1a, // iload_0
        0x99, 0x00, 0x06, // ifeq +6 (target = pc 3 + 6 = 9)
        0x10, 13, // bipush 13
        0xac, // ireturn
        0x10, 76, // bipush 76 (L1, pc 9)
        0xac, // ireturn
    ];
    assert_eq!(code.len(), 12);
    let method = FixtureMethod {
        name: "ifeq".into(),
        export_name: Some("ifeq".into()),
        params: vec![],
        result: Some(ValueType::I32),
        code: Some(CodeAttribute::new(1, code, BTreeMap::new())),
    };
    let text = compile_text(method);
    // The fall-through (condition != 0) arm is wrapped in the `if`; the
    // condition != 0 branch is never emitted directly (goto/ifeq are
    // realized entirely through the block markers), so bipush 13 sits
    // inside the `if` block and bipush 76 sits after its `end`.
    let if_pos = text.find("if").expect("if marker present");
    let bipush13_pos = text.find("13").expect("bipush 13 present");
    let end_pos = text.rfind("end").expect("end marker present");
    let bipush76_pos = text.find("76").expect("bipush 76 present");
    assert!(if_pos < bipush13_pos);
    assert!(bipush13_pos < end_pos);
    assert!(end_pos < bipush76_pos);
}

/// §8 scenario 5 (table-switch half): `switchDirect` dispatches via a
/// dense `tableswitch` over keys `0..=1` plus a default, each landing on a
/// distinct case body.
#[test]
fn table_switch_dispatches_through_nested_blocks() {
    // iload_0; tableswitch { low: 0, high: 1, default: +29, targets: [+23, +26] }
    // case bodies: bipush 10; ireturn / bipush 20; ireturn / bipush 30; ireturn
    let mut code = vec![0x1a, 0xaa]; // iload_0; tableswitch
    code.extend_from_slice(&[0, 0]); // 2 padding bytes (opcode at pc 1, operand_start must be pc 4)
    code.extend_from_slice(&be32(29)); // default offset, relative to pc 1 -> target 30
    code.extend_from_slice(&be32(0)); // low
    code.extend_from_slice(&be32(1)); // high
    code.extend_from_slice(&be32(23)); // case 0 offset -> target 24
    code.extend_from_slice(&be32(26)); // case 1 offset -> target 27
    assert_eq!(code.len(), 24);
    code.extend_from_slice(&[0x10, 10, 0xac]); // pc 24: bipush 10; ireturn
    code.extend_from_slice(&[0x10, 20, 0xac]); // pc 27: bipush 20; ireturn
    code.extend_from_slice(&[0x10, 30, 0xac]); // pc 30: bipush 30; ireturn
    assert_eq!(code.len(), 33);

    let method = FixtureMethod {
        name: "switchDirect".into(),
        export_name: Some("switchDirect".into()),
        params: vec![ValueType::I32],
        result: Some(ValueType::I32),
        code: Some(CodeAttribute::new(1, code, BTreeMap::new())),
    };
    let text = compile_text(method);
    assert!(text.contains("br_table"));
    // three distinct targets (24, 27, 30) -> three nested blocks, one per
    // distinct target, per the governing design's switch reconstruction.
    assert_eq!(text.matches("block").count(), 3);
    assert!(text.contains("30")); // default case body reachable
}

/// §8 scenario 5 (lookup-switch half): sparse keys with one case sharing a
/// target with the default, forcing a `br_if` chain instead of `br_table`.
#[test]
fn lookup_switch_dispatches_through_br_if_chain() {
    // iload_0; lookupswitch { default: +.., pairs: (1 -> caseA), (1000 -> caseB) }
    let mut code = vec![0x1a, 0xab]; // iload_0; lookupswitch
    code.extend_from_slice(&[0, 0]); // padding (opcode at pc 1, operand_start at pc 4)
    let default_target = 4 + 4 + 4 + 2 * 8; // right after the two pairs
    code.extend_from_slice(&be32(default_target - 1)); // default offset relative to pc 1
    code.extend_from_slice(&be32(2)); // npairs
    code.extend_from_slice(&be32(1)); // key 0
    code.extend_from_slice(&be32(default_target - 1 + 3)); // target for key 1 (case A, 3 bytes past default)
    code.extend_from_slice(&be32(1000)); // key 1
    code.extend_from_slice(&be32(default_target - 1 + 6)); // target for key 1000 (case B, 6 bytes past default)
    assert_eq!(code.len() as i32, default_target);
    code.extend_from_slice(&[0x10, 7, 0xac]); // default: bipush 7; ireturn
    code.extend_from_slice(&[0x10, 9, 0xac]); // case A: bipush 9; ireturn
    code.extend_from_slice(&[0x10, 11, 0xac]); // case B: bipush 11; ireturn

    let method = FixtureMethod {
        name: "lookupDirect".into(),
        export_name: Some("lookupDirect".into()),
        params: vec![ValueType::I32],
        result: Some(ValueType::I32),
        code: Some(CodeAttribute::new(1, code, BTreeMap::new())),
    };
    let text = compile_text(method);
    assert!(text.contains("br_if"));
    assert!(!text.contains("br_table"));
}

/// §8 scenario 6: `endlessLoop` — `do { if (a<10) b++; else return a; a++; }
/// while(true)` with `a=0` initialized by a locals prologue that precedes
/// the loop header (a straight-line run the branch manager must skip over
/// without losing track of where the loop starts).
#[test]
fn endless_loop_recovers_a_loop_around_a_conditional_return() {
    let code = vec![
        0x03, // pc0: iconst_0         (a := 0)
        0x3b, // pc1: istore_0
        0x03, // pc2: iconst_0         (b := 0)
        0x3c, // pc3: istore_1
        // L0 (pc4): loop header
        0x1a, // pc4: iload_0 (a)
        0x10, 10, // pc5: bipush 10
        0xa2, 0x00, 0x09, // pc7: if_icmpge +9 (target pc 16)
        0x84, 1, 1, // pc10: iinc 1, 1  (b++)
        0xa7, 0x00, 0x05, // pc13: goto +5 (target pc 18)
        0x1a, // pc16: iload_0 (a), L1
        0xac, // pc17: ireturn
        0x84, 0, 1, // pc18: iinc 0, 1  (a++), L2
        0xa7, 0xff, 0xef, // pc21: goto -17 (target pc 4)
    ];
    assert_eq!(code.len(), 24);
    let method = FixtureMethod {
        name: "endlessLoop".into(),
        export_name: Some("endlessLoop".into()),
        params: vec![],
        result: Some(ValueType::I32),
        code: Some(CodeAttribute::new(2, code, BTreeMap::new())),
    };
    let text = compile_text(method);
    assert!(text.contains("loop"));
    assert!(text.contains("br 0"));
    // The `if_icmpge` guard is inverted to `i32.lt_s` since the fall-through
    // (the `b++` arm, wrapped in the `if`) is taken exactly when the
    // original JVM test is false.
    assert!(text.contains("i32.lt_s"));
}

/// An unrecognized opcode (here `frem`, which has no native Wasm
/// remainder instruction) aborts the whole class, not just the offending
/// method.
#[test]
fn unsupported_opcode_aborts_compilation() {
    let method = FixtureMethod {
        name: "floatRem".into(),
        export_name: Some("floatRem".into()),
        params: vec![ValueType::F32, ValueType::F32],
        result: Some(ValueType::F32),
        code: Some(CodeAttribute::new(2, vec![0x22, 0x23, 0x72, 0xae], BTreeMap::new())), // fload_0; fload_1; frem; freturn
    };
    let class = one_method_class(method);
    let mut session = CompilerSession::new_binary(CompilerConfig::default());
    assert_matches!(session.compile_class(&class), Err(_));
}

/// Reading a local slot before any parameter binding or `store` has
/// established its type is a compile error, not a default-zero read.
#[test]
fn uninitialized_local_read_is_rejected() {
    let method = FixtureMethod {
        name: "readBeforeWrite".into(),
        export_name: Some("readBeforeWrite".into()),
        params: vec![],
        result: Some(ValueType::I32),
        code: Some(CodeAttribute::new(1, vec![0x1a, 0xac], BTreeMap::new())), // iload_0; ireturn
    };
    let class = one_method_class(method);
    let mut session = CompilerSession::new_binary(CompilerConfig::default());
    assert_matches!(session.compile_class(&class), Err(_));
}
