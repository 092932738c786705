use alloc::{string::String, vec::Vec};

use jvm2wasm_core::CompileError;

use crate::{
    class_reader::ClassReader,
    config::CompilerConfig,
    translator::translate_method,
    writer::{BinaryWriter, TextWriter},
};

/// One of the two back-ends a [`CompilerSession`] can be driving. The
/// writer is chosen once, at construction, and every compiled class feeds
/// the same one.
enum Writer {
    Binary(BinaryWriter),
    Text(TextWriter),
}

/// Drives zero or more classes' worth of exported methods through the
/// structural-recovery and translation pipeline into a single output
/// module.
///
/// A session is single-use: [`finish`](Self::finish) (or
/// [`finish_text`](Self::finish_text)) consumes it.
pub struct CompilerSession {
    writer: Writer,
    config: CompilerConfig,
}

impl CompilerSession {
    /// Starts a session that will produce a binary `.wasm` module.
    pub fn new_binary(config: CompilerConfig) -> Self {
        Self {
            writer: Writer::Binary(BinaryWriter::new(config.dedup_function_types, config.emit_custom_name_section)),
            config,
        }
    }

    /// Starts a session that will produce the textual `(module ...)`
    /// S-expression form.
    pub fn new_text(config: CompilerConfig) -> Self {
        Self {
            writer: Writer::Text(TextWriter::new(config.dedup_function_types)),
            config,
        }
    }

    /// Compiles every exported method of `class`, in declaration order.
    /// Methods without an `@Export` annotation are skipped entirely; they
    /// are never reachable from the compiled module and translating them
    /// would be wasted, possibly-failing work.
    #[tracing::instrument(level = "debug", skip(self, class), fields(class = class.name()))]
    pub fn compile_class<C: ClassReader>(&mut self, class: &C) -> Result<(), CompileError> {
        for method in class.methods() {
            let Some(export_name) = method.export_name() else {
                continue;
            };
            self.compile_method(class, method, export_name)?;
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, class, method), fields(method = method.name()))]
    fn compile_method<C: ClassReader>(&mut self, class: &C, method: &C::Method, export_name: &str) -> Result<(), CompileError> {
        let result = match &mut self.writer {
            Writer::Binary(w) => translate_method(class, method, export_name, w),
            Writer::Text(w) => translate_method(class, method, export_name, w),
        };
        if let Err(err) = &result {
            tracing::error!(error = %err, line = ?err.line(), "method translation failed");
        }
        if let (Ok(()), Some(limit)) = (&result, self.config.max_function_body_size) {
            self.check_body_size(method.name(), limit)?;
        }
        result
    }

    fn check_body_size(&self, name: &str, limit: u32) -> Result<(), CompileError> {
        let size = match &self.writer {
            Writer::Binary(w) => w.last_function_body_len(),
            Writer::Text(w) => w.last_function_text_len(),
        };
        if size > limit {
            return Err(CompileError::body_too_large(name, size, limit));
        }
        Ok(())
    }

    /// Assembles the final binary module. Panics if this session was
    /// started with [`new_text`](Self::new_text).
    #[tracing::instrument(name = "encode_module", level = "debug", skip(self))]
    pub fn finish(self) -> Vec<u8> {
        match self.writer {
            Writer::Binary(w) => w.finish(),
            Writer::Text(_) => panic!("finish() called on a textual CompilerSession; use finish_text()"),
        }
    }

    /// Assembles the final `(module ...)` text. Panics if this session was
    /// started with [`new_binary`](Self::new_binary).
    #[tracing::instrument(name = "encode_module", level = "debug", skip(self))]
    pub fn finish_text(self) -> String {
        match self.writer {
            Writer::Text(w) => w.finish(),
            Writer::Binary(_) => panic!("finish_text() called on a binary CompilerSession; use finish()"),
        }
    }
}
