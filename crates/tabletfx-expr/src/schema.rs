//! Ordered variable catalogs that formulas are bound against.

use std::fmt;
use std::sync::Arc;

/// An ordered set of unique variable names.
///
/// The position of a name is the slot its value occupies in the argument
/// array passed to a [`CompiledExpression`](crate::CompiledExpression).
/// Schemas are cheap to clone and never change once built.
///
/// # Example
///
/// ```
/// use tabletfx_expr::VariableSchema;
///
/// let schema = VariableSchema::new(["x", "y", "lx", "ly"]);
/// assert_eq!(schema.len(), 4);
/// assert_eq!(schema.slot_of("lx"), Some(2));
/// assert_eq!(schema.slot_of("q"), None);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VariableSchema {
    names: Arc<[String]>,
}

impl VariableSchema {
    /// Build a schema from names in slot order.
    ///
    /// Later duplicates of a name are dropped so every name maps to exactly
    /// one slot.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self {
            names: unique.into(),
        }
    }

    /// Number of variables (and therefore the expected argument count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the schema declares no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Slot index of `name`, if declared.
    #[must_use]
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Name declared at `slot`.
    #[must_use]
    pub fn name_at(&self, slot: usize) -> Option<&str> {
        self.names.get(slot).map(String::as_str)
    }

    /// Whether `name` is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.slot_of(name).is_some()
    }

    /// Names in slot order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl fmt::Debug for VariableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names.iter()).finish()
    }
}

impl fmt::Display for VariableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join(", "))
    }
}
