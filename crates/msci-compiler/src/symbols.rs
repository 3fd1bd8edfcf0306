use std::collections::HashMap;

use msci_core::SymbolKind;
use serde::{Deserialize, Serialize};

use crate::tree::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub name: String,
    /// Variable slot, or the standard index of a label definition.
    pub id: u16,
    pub kind: SymbolKind,
    #[serde(skip)]
    pub(crate) writes: usize,
    #[serde(skip)]
    pub(crate) first_write: Option<NodeId>,
}

impl Symbol {
    fn new(name: &str, id: u16, kind: SymbolKind) -> Self {
        Self {
            name: name.to_string(),
            id,
            kind,
            writes: 0,
            first_write: None,
        }
    }
}

/// Variables in first-appearance order and labels, in separate namespaces.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    variables: Vec<Symbol>,
    variable_slots: HashMap<String, usize>,
    labels: Vec<Symbol>,
    label_slots: HashMap<String, usize>,
}

impl SymbolTable {
    /// Returns the variable's ID, allocating the next one for new names.
    /// `None` once the ID space is exhausted.
    pub fn declare_variable(&mut self, name: &str, kind: SymbolKind) -> Option<u16> {
        if let Some(slot) = self.variable_slots.get(name) {
            return Some(self.variables[*slot].id);
        }
        let id = u16::try_from(self.variables.len()).ok()?;
        self.variable_slots
            .insert(name.to_string(), self.variables.len());
        self.variables.push(Symbol::new(name, id, kind));
        Some(id)
    }

    /// Returns `false` when the label was already declared.
    pub fn declare_label(&mut self, name: &str) -> bool {
        if self.label_slots.contains_key(name) {
            return false;
        }
        self.label_slots.insert(name.to_string(), self.labels.len());
        self.labels.push(Symbol::new(name, 0, SymbolKind::Label));
        true
    }

    pub fn variable(&self, name: &str) -> Option<&Symbol> {
        self.variable_slots
            .get(name)
            .map(|slot| &self.variables[*slot])
    }

    pub(crate) fn variable_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let slot = *self.variable_slots.get(name)?;
        self.variables.get_mut(slot)
    }

    pub fn label(&self, name: &str) -> Option<&Symbol> {
        self.label_slots.get(name).map(|slot| &self.labels[*slot])
    }

    pub(crate) fn label_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let slot = *self.label_slots.get(name)?;
        self.labels.get_mut(slot)
    }

    pub fn variables(&self) -> &[Symbol] {
        &self.variables
    }

    pub(crate) fn variables_mut(&mut self) -> &mut [Symbol] {
        &mut self.variables
    }

    pub fn labels(&self) -> &[Symbol] {
        &self.labels
    }

    pub fn into_vec(self) -> Vec<Symbol> {
        self.variables.into_iter().chain(self.labels).collect()
    }
}

#[cfg(test)]
mod symbols_tests {
    use super::*;

    #[test]
    fn variables_keep_first_appearance_ids() {
        let mut table = SymbolTable::default();
        assert_eq!(table.declare_variable("ship", SymbolKind::Argument), Some(0));
        assert_eq!(table.declare_variable("count", SymbolKind::Variable), Some(1));
        assert_eq!(table.declare_variable("ship", SymbolKind::Variable), Some(0));
        assert_eq!(
            table.variable("ship").map(|symbol| symbol.kind),
            Some(SymbolKind::Argument)
        );
    }

    #[test]
    fn labels_live_in_their_own_namespace() {
        let mut table = SymbolTable::default();
        table.declare_variable("main", SymbolKind::Variable);
        assert!(table.declare_label("main"));
        assert!(!table.declare_label("main"));
        assert_eq!(table.labels().len(), 1);
        assert_eq!(table.into_vec().len(), 2);
    }
}
