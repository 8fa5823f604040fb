//! Variable-reference handles and "prettify" rendering. Handles expand one
//! level at a time — a `Nested` handle carries only its own raw text, never
//! a reconstructed value tree (the eager alternative lives in
//! `perl_dap_variables::VariableParser`, kept for callers who want it, but
//! the facade does not use it here).

use std::collections::HashMap;

use perl_dap_variables::{classify_value, parse_nested_array, parse_nested_hash, strip_scalar_indirection, ValueTyping};

use crate::driver::{DriverError, PerlProcessDriver};
use crate::protocol::ProtocolVariable;

/// What a `variablesReference` resolves to.
#[derive(Debug, Clone)]
pub enum VariableHandle {
    Locals,
    Globals,
    Nested(ValueTyping, String),
}

/// Mints monotonically increasing handles and holds the raw payload each
/// one resolves to. `0` is reserved (DAP convention: a variable with no
/// children has `variablesReference == 0`), so the first minted handle is 1.
#[derive(Debug, Default)]
pub struct VariableStore {
    handles: HashMap<i64, VariableHandle>,
    next_id: i64,
}

impl VariableStore {
    pub fn new() -> Self {
        Self { handles: HashMap::new(), next_id: 1 }
    }

    /// Handles are only valid while stopped. Call this on every `continued`
    /// event.
    pub fn invalidate_all(&mut self) {
        self.handles.clear();
    }

    fn mint(&mut self, handle: VariableHandle) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.handles.insert(id, handle);
        id
    }

    pub fn locals_reference(&mut self) -> i64 {
        self.mint(VariableHandle::Locals)
    }

    pub fn globals_reference(&mut self) -> i64 {
        self.mint(VariableHandle::Globals)
    }

    /// Resolve `reference` into DAP variables, invoking the process driver
    /// as needed for the two scope-root handles.
    pub async fn resolve(&mut self, driver: &PerlProcessDriver, reference: i64) -> Result<Vec<ProtocolVariable>, DriverError> {
        let handle = match self.handles.get(&reference) {
            Some(h) => h.clone(),
            None => return Ok(Vec::new()),
        };
        match handle {
            VariableHandle::Locals => {
                let raw = driver.get_local_scoped_variables().await?;
                Ok(self.entries_to_variables(&raw))
            }
            VariableHandle::Globals => {
                let raw = driver.get_global_scoped_variables().await?;
                Ok(self.entries_to_variables(&raw))
            }
            VariableHandle::Nested(ValueTyping::Array, raw) => {
                let items = parse_nested_array(&raw);
                Ok(items.into_iter().enumerate().map(|(i, value)| self.prettify(i.to_string(), value)).collect())
            }
            VariableHandle::Nested(ValueTyping::Hash, raw) => {
                let pairs = parse_nested_hash(&raw);
                Ok(pairs.into_iter().map(|(key, value)| self.prettify(key, value)).collect())
            }
            VariableHandle::Nested(ValueTyping::Scalar, raw) => {
                let referent = strip_scalar_indirection(&raw);
                Ok(vec![self.prettify("value".to_string(), referent)])
            }
            VariableHandle::Nested(ValueTyping::Leaf, raw) => Ok(vec![ProtocolVariable { name: "value".to_string(), value: raw, type_: None, variables_reference: 0 }]),
        }
    }

    fn entries_to_variables(&mut self, raw: &str) -> Vec<ProtocolVariable> {
        perl_dap_variables::split_variable_entries(raw).into_iter().map(|(name, value)| self.prettify(name, value)).collect()
    }

    /// Prettify one `(name, raw_value)` pair: mint a fresh `Nested` handle
    /// for container values, and render arrays as `[«len»] «raw»`.
    fn prettify(&mut self, name: String, raw_value: String) -> ProtocolVariable {
        match classify_value(&raw_value) {
            ValueTyping::Hash => {
                let reference = self.mint(VariableHandle::Nested(ValueTyping::Hash, raw_value.clone()));
                ProtocolVariable { name, value: raw_value, type_: None, variables_reference: reference }
            }
            ValueTyping::Array => {
                let len = parse_nested_array(&raw_value).len();
                let display = format!("[{len}] {raw_value}");
                let reference = self.mint(VariableHandle::Nested(ValueTyping::Array, raw_value));
                ProtocolVariable { name, value: display, type_: None, variables_reference: reference }
            }
            ValueTyping::Scalar => {
                let reference = self.mint(VariableHandle::Nested(ValueTyping::Scalar, raw_value.clone()));
                ProtocolVariable { name, value: raw_value, type_: None, variables_reference: reference }
            }
            ValueTyping::Leaf => ProtocolVariable { name, value: raw_value, type_: None, variables_reference: 0 },
        }
    }

    /// Mint a handle for an `evaluate` result if the parsed value is a
    /// container; leaf values get no handle.
    pub fn reference_for_evaluate(&mut self, raw_value: &str) -> i64 {
        match classify_value(raw_value) {
            ValueTyping::Leaf => 0,
            typing => self.mint(VariableHandle::Nested(typing, raw_value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_minted_handle_is_one_not_zero() {
        let mut store = VariableStore::new();
        assert_eq!(store.locals_reference(), 1);
        assert_eq!(store.globals_reference(), 2);
    }

    #[test]
    fn invalidate_all_clears_minted_handles() {
        let mut store = VariableStore::new();
        store.locals_reference();
        store.invalidate_all();
        assert!(store.handles.is_empty());
    }

    #[test]
    fn prettify_leaf_value_has_no_reference() {
        let mut store = VariableStore::new();
        let variable = store.prettify("$x".to_string(), "42".to_string());
        assert_eq!(variable.variables_reference, 0);
        assert_eq!(variable.value, "42");
    }

    #[test]
    fn prettify_array_ref_gets_len_prefixed_display_and_a_reference() {
        let mut store = VariableStore::new();
        let variable = store.prettify("@a".to_string(), "ARRAY(0x1234)".to_string());
        assert!(variable.value.starts_with("[0] ARRAY(0x1234)"));
        assert!(variable.variables_reference > 0);
    }

    #[test]
    fn prettify_hash_ref_mints_a_nested_handle() {
        let mut store = VariableStore::new();
        let variable = store.prettify("$h".to_string(), "HASH(0xabcd)".to_string());
        assert!(variable.variables_reference > 0);
    }

    #[test]
    fn reference_for_evaluate_is_zero_for_leaf_values() {
        let mut store = VariableStore::new();
        assert_eq!(store.reference_for_evaluate("42"), 0);
    }

    #[test]
    fn reference_for_evaluate_mints_for_container_values() {
        let mut store = VariableStore::new();
        assert!(store.reference_for_evaluate("ARRAY(0x1234)") > 0);
    }
}
