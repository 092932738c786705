/// Per-session options bundled by [`CompilerSession`](crate::CompilerSession).
///
/// None of these change the observable semantics of a compiled method; they
/// tune ambient behavior the governing design leaves as open questions or
/// optional niceties (§9).
#[derive(Debug, Clone, Copy)]
pub struct CompilerConfig {
    /// Deduplicate [`FunctionType`](jvm2wasm_core::FunctionType)s in the
    /// module's Type table by structural equality instead of assigning a
    /// fresh type index per function. Defaults to `false`, matching the
    /// conservative one-type-per-function behavior the governing design
    /// describes as its baseline (§9 "FunctionType deduplication").
    pub dedup_function_types: bool,
    /// Append a `name` custom section (function names only) to the binary
    /// output. Defaults to `false`; the information is otherwise only
    /// visible through the textual back-end.
    pub emit_custom_name_section: bool,
    /// A defensive cap on a single function's emitted code size, in bytes.
    /// `None` (the default) means unlimited. Exceeding the cap raises
    /// [`CompileError::body_too_large`](jvm2wasm_core::CompileError). This
    /// is ambient resource hygiene against pathological inputs, not a
    /// described feature; it is never exercised unless a caller opts in.
    pub max_function_body_size: Option<u32>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            dedup_function_types: false,
            emit_custom_name_section: false,
            max_function_body_size: None,
        }
    }
}
