use crate::ValueType;
use alloc::vec::Vec;

/// A function type: an ordered sequence of parameter [`ValueType`]s plus an
/// optional single result type.
///
/// # Note
///
/// Equality and ordering are structural over `(params, result)`, and the
/// type derives `Hash`, so a back-end may deduplicate [`FunctionType`]s in
/// the module's Type table via [`jvm2wasm_arena::DedupArena`] instead of
/// assigning every function a fresh type index (see
/// [`CompilerConfig::dedup_function_types`](../jvm2wasm/struct.CompilerConfig.html)).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionType {
    params: Vec<ValueType>,
    result: Option<ValueType>,
}

impl FunctionType {
    /// Creates a new [`FunctionType`] from its parameter types and optional
    /// result type.
    pub fn new(params: impl IntoIterator<Item = ValueType>, result: Option<ValueType>) -> Self {
        Self {
            params: params.into_iter().collect(),
            result,
        }
    }

    /// Returns the parameter types in declaration order.
    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    /// Returns the result type, if the function returns a value.
    pub fn result(&self) -> Option<ValueType> {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_ignores_construction_path() {
        let a = FunctionType::new([ValueType::I32, ValueType::I32], Some(ValueType::I32));
        let b = FunctionType::new(Vec::from([ValueType::I32, ValueType::I32]), Some(ValueType::I32));
        assert_eq!(a, b);

        let c = FunctionType::new([ValueType::I32, ValueType::I32], None);
        assert_ne!(a, c);
    }
}
