//! Process-lifetime operator defaults.
//!
//! The defaults table maps each encoding to the names of the operators a
//! driver uses when the caller supplies none. It can be changed for the
//! whole process with [`set_defaults`]; drivers snapshot the table at
//! construction, so runs already configured keep the defaults they saw.
//!
//! ```rust
//! use genoptim::control::{defaults, set_defaults};
//! use genoptim::encoding::EncodingKind;
//!
//! let snapshot = defaults();
//! assert_eq!(snapshot.for_kind(EncodingKind::Binary).crossover, "single_point");
//!
//! set_defaults(|table| {
//!     table.binary.crossover = "uniform".to_string();
//! });
//! assert_eq!(defaults().for_kind(EncodingKind::Binary).crossover, "uniform");
//! # set_defaults(|table| { table.binary.crossover = "single_point".to_string(); });
//! ```

use std::sync::{OnceLock, RwLock};

use crate::encoding::EncodingKind;

/// Default operator names for one encoding: the 4-tuple of population
/// init, selection, crossover, and mutation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorNames {
    /// Population initializer name.
    pub init: String,
    /// Selection strategy name.
    pub selection: String,
    /// Crossover strategy name.
    pub crossover: String,
    /// Mutation strategy name.
    pub mutation: String,
}

impl OperatorNames {
    fn new(init: &str, selection: &str, crossover: &str, mutation: &str) -> Self {
        Self {
            init: init.to_string(),
            selection: selection.to_string(),
            crossover: crossover.to_string(),
            mutation: mutation.to_string(),
        }
    }
}

/// The process-wide defaults table.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlTable {
    /// Defaults for [`EncodingKind::Binary`].
    pub binary: OperatorNames,
    /// Defaults for [`EncodingKind::RealValued`].
    pub real_valued: OperatorNames,
    /// Defaults for [`EncodingKind::Permutation`].
    pub permutation: OperatorNames,
}

impl ControlTable {
    /// The defaults for one encoding kind.
    pub fn for_kind(&self, kind: EncodingKind) -> &OperatorNames {
        match kind {
            EncodingKind::Binary => &self.binary,
            EncodingKind::RealValued => &self.real_valued,
            EncodingKind::Permutation => &self.permutation,
        }
    }
}

impl Default for ControlTable {
    fn default() -> Self {
        Self {
            binary: OperatorNames::new("uniform", "linear_rank", "single_point", "bit_flip"),
            real_valued: OperatorNames::new("uniform", "linear_rank", "blend", "uniform"),
            permutation: OperatorNames::new("uniform", "linear_rank", "order", "swap"),
        }
    }
}

fn table() -> &'static RwLock<ControlTable> {
    static TABLE: OnceLock<RwLock<ControlTable>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(ControlTable::default()))
}

/// Returns a snapshot of the current defaults table.
pub fn defaults() -> ControlTable {
    table().read().expect("control table poisoned").clone()
}

/// Applies `update` to the process-wide defaults table.
pub fn set_defaults<F: FnOnce(&mut ControlTable)>(update: F) {
    let mut guard = table().write().expect("control table poisoned");
    update(&mut guard);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_detached_from_later_updates() {
        let before = defaults();
        set_defaults(|t| t.permutation.mutation = "scramble".to_string());
        assert_eq!(before.permutation.mutation, "swap");
        assert_eq!(defaults().permutation.mutation, "scramble");
        set_defaults(|t| t.permutation.mutation = "swap".to_string());
    }
}
