// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Species and site-type registries: name ↔ dense code mapping.

use rustc_hash::FxHashMap;

use crate::error::Error;

/// The wildcard name. Matches any species and never writes.
pub const WILDCARD: &str = "*";

/// Dense code reserved for the wildcard.
pub const WILDCARD_CODE: u32 = 0;

/// Interned type names with stable dense codes.
///
/// Code 0 is always the wildcard `*`; user types start at 1 in the order
/// they were registered. The same structure backs both the species registry
/// of a configuration and the site-type registry of a sites map.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    names: Vec<String>,
    codes: FxHashMap<String, u32>,
}

impl TypeRegistry {
    /// Builds a registry from the possible type names.
    ///
    /// The wildcard is implicit and must not appear in `possible`; passing it
    /// is a validation error (it would make `*` a writable species).
    pub fn new<S: AsRef<str>>(possible: &[S]) -> Result<Self, Error> {
        let mut names = vec![WILDCARD.to_string()];
        let mut codes = FxHashMap::default();
        codes.insert(WILDCARD.to_string(), WILDCARD_CODE);
        for name in possible {
            let name = name.as_ref();
            if name == WILDCARD {
                return Err(Error::validation(
                    "the wildcard character '*' is not a valid type",
                ));
            }
            if codes.contains_key(name) {
                continue;
            }
            let code = names.len() as u32;
            names.push(name.to_string());
            codes.insert(name.to_string(), code);
        }
        Ok(Self { names, codes })
    }

    /// Number of codes, wildcard included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// `true` when only the wildcard is registered.
    pub fn is_empty(&self) -> bool {
        self.names.len() == 1
    }

    /// Code of `name`, if registered.
    pub fn code(&self, name: &str) -> Option<u32> {
        self.codes.get(name).copied()
    }

    /// Code of `name`, or a validation error naming the unknown type.
    pub fn require(&self, name: &str) -> Result<u32, Error> {
        self.code(name).ok_or_else(|| {
            Error::validation(format!("type '{name}' is not among the possible types"))
        })
    }

    /// Name of `code`.
    ///
    /// Codes are produced by this registry, so an unknown code is a logic
    /// error; it maps to the wildcard name rather than panicking.
    pub fn name(&self, code: u32) -> &str {
        self.names
            .get(code as usize)
            .map_or(WILDCARD, String::as_str)
    }

    /// All names, wildcard first, in code order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn codes_are_dense_and_ordered() {
        let reg = TypeRegistry::new(&["A", "B", "V"]).unwrap();
        assert_eq!(reg.code("*"), Some(0));
        assert_eq!(reg.code("A"), Some(1));
        assert_eq!(reg.code("B"), Some(2));
        assert_eq!(reg.code("V"), Some(3));
        assert_eq!(reg.name(2), "B");
        assert_eq!(reg.len(), 4);
    }

    #[test]
    fn duplicate_names_collapse() {
        let reg = TypeRegistry::new(&["A", "B", "A"]).unwrap();
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn wildcard_is_rejected_as_possible_type() {
        assert!(TypeRegistry::new(&["A", "*"]).is_err());
    }

    #[test]
    fn unknown_type_is_a_validation_error() {
        let reg = TypeRegistry::new(&["A"]).unwrap();
        assert!(reg.require("Z").is_err());
    }
}
