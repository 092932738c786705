use alloc::{boxed::Box, string::String};
use core::fmt::{self, Display};

/// The single domain error kind raised anywhere in the jvm2wasm pipeline.
///
/// # Note
///
/// Mirrors `WasmException` from the governing specification: a message
/// plus an optional source line number. Every fallible operation in this
/// crate family returns `Result<T, CompileError>`; there is deliberately no
/// internal recovery, and the error is fatal to the method or module being
/// compiled (see the error handling design).
#[derive(Debug)]
pub struct CompileError {
    message: String,
    line: Option<u32>,
    source: Option<Box<CompileError>>,
}

impl CompileError {
    /// Creates a new [`CompileError`] with no associated source line.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            source: None,
        }
    }

    /// Creates a new [`CompileError`] tagged with the bytecode's source
    /// line number, if the class file's `LineNumberTable` covers it.
    pub fn at_line(message: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
            source: None,
        }
    }

    /// An unrecognized bytecode opcode was encountered at the given
    /// position.
    pub fn unsupported_opcode(opcode: u8, line: Option<u32>) -> Self {
        let message = alloc::format!("unsupported or unrecognized bytecode opcode 0x{opcode:02x}");
        match line {
            Some(line) => Self::at_line(message, line),
            None => Self::new(message),
        }
    }

    /// The observed branch structure cannot be reduced to a valid,
    /// strictly-nested Wasm region tree.
    pub fn irreducible_control_flow(start: u32, end: u32) -> Self {
        Self::new(alloc::format!(
            "control flow in byte range [{start}, {end}) cannot be reduced to structured Wasm blocks"
        ))
    }

    /// A numeric or cast operation has no Wasm counterpart for the given
    /// value type.
    pub fn unrepresentable_operation(op: impl Into<String>, line: Option<u32>) -> Self {
        let message = op.into();
        match line {
            Some(line) => Self::at_line(message, line),
            None => Self::new(message),
        }
    }

    /// A local variable was read before any parameter or store established
    /// its type.
    pub fn uninitialized_local(index: u32, line: Option<u32>) -> Self {
        let message = alloc::format!("read of local variable #{index} before it was ever written");
        match line {
            Some(line) => Self::at_line(message, line),
            None => Self::new(message),
        }
    }

    /// The supplementary class-file reader could not parse far enough to
    /// drive translation.
    pub fn unsupported_class_file(reason: impl Into<String>) -> Self {
        Self::new(reason)
    }

    /// A function body exceeded `CompilerConfig::max_function_body_size`.
    pub fn body_too_large(name: &str, size: u32, limit: u32) -> Self {
        Self::new(alloc::format!(
            "function `{name}` body is {size} bytes, exceeding the configured limit of {limit}"
        ))
    }

    /// Wraps a lower-level error as the cause of a new [`CompileError`].
    ///
    /// If `source` already carries a line number, the wrapper keeps it;
    /// otherwise `line` (the point at which the wrapping occurred) is used.
    pub fn wrap(message: impl Into<String>, source: CompileError, line: Option<u32>) -> Self {
        let effective_line = source.line.or(line);
        Self {
            message: message.into(),
            line: effective_line,
            source: Some(Box::new(source)),
        }
    }

    /// Returns the human-readable message, without the line number suffix.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the source line number this error is attributed to, if any.
    pub fn line(&self) -> Option<u32> {
        self.line
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {line})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl core::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn core::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_prefers_inner_line_number() {
        let inner = CompileError::at_line("bad leb128", 7);
        let outer = CompileError::wrap("failed to write locals", inner, Some(99));
        assert_eq!(outer.line(), Some(7));
    }

    #[test]
    fn wrap_falls_back_to_wrapper_line_number() {
        let inner = CompileError::new("bad leb128");
        let outer = CompileError::wrap("failed to write locals", inner, Some(99));
        assert_eq!(outer.line(), Some(99));
    }

    #[test]
    fn display_includes_line_when_present() {
        let err = CompileError::at_line("oops", 3);
        assert_eq!(err.to_string(), "oops (line 3)");
        let err = CompileError::new("oops");
        assert_eq!(err.to_string(), "oops");
    }
}
