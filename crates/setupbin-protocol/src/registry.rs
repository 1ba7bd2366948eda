//! Immutable name ↔ identifier registry built from a catalog

use std::collections::BTreeMap;

use tracing::debug;

use crate::catalog::{Catalog, CatalogEntry, amt_catalog};
use crate::error::{SetupBinError, SetupBinResult};
use crate::types::{VariableDefinition, VariableType};

/// Lookup table from variable names to definitions and back.
///
/// Built once and never mutated; share it between threads through an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableRegistry {
    by_name: BTreeMap<String, VariableDefinition>,
    by_id: BTreeMap<(u16, u16), String>,
}

impl VariableRegistry {
    /// Build a registry from `catalog`, failing atomically on the first bad entry.
    ///
    /// # Errors
    ///
    /// - [`SetupBinError::UnknownType`] for a type code outside the closed set
    /// - [`SetupBinError::ReservedIdentifier`] for module or variable id 0
    /// - [`SetupBinError::DuplicateVariable`] when two entries share a name
    pub fn build(catalog: &Catalog) -> SetupBinResult<Self> {
        Self::from_rows(catalog.iter().flat_map(|(&module_id, variables)| {
            variables
                .iter()
                .map(move |(&variable_id, entry)| (module_id, variable_id, entry.clone()))
        }))
    }

    /// Build a registry from `(module id, variable id, entry)` rows given in
    /// any order.
    ///
    /// Rows are validated in (module id, variable id, name, type code) order,
    /// so every permutation of the same rows yields the same registry or the
    /// same error.
    ///
    /// # Errors
    ///
    /// As [`VariableRegistry::build`], plus
    /// [`SetupBinError::DuplicateIdentifier`] when two rows share an
    /// identifier pair.
    pub fn from_rows<I>(rows: I) -> SetupBinResult<Self>
    where
        I: IntoIterator<Item = (u16, u16, CatalogEntry)>,
    {
        let mut rows: Vec<_> = rows.into_iter().collect();
        rows.sort_by(|(am, av, a), (bm, bv, b)| {
            (am, av, &a.name, a.type_code).cmp(&(bm, bv, &b.name, b.type_code))
        });

        let mut registry = Self::default();
        for (module_id, variable_id, entry) in rows {
            let variable_type = VariableType::from_code(entry.type_code).ok_or_else(|| {
                SetupBinError::UnknownType {
                    name: entry.name.clone(),
                    type_code: entry.type_code,
                }
            })?;
            if module_id == 0 || variable_id == 0 {
                return Err(SetupBinError::ReservedIdentifier {
                    name: entry.name,
                    module_id,
                    variable_id,
                });
            }
            if registry.by_id.contains_key(&(module_id, variable_id)) {
                return Err(SetupBinError::DuplicateIdentifier {
                    module_id,
                    variable_id,
                });
            }
            if registry.by_name.contains_key(&entry.name) {
                return Err(SetupBinError::DuplicateVariable(entry.name));
            }

            registry
                .by_id
                .insert((module_id, variable_id), entry.name.clone());
            registry.by_name.insert(
                entry.name.clone(),
                VariableDefinition::new(
                    entry.name,
                    module_id,
                    variable_id,
                    variable_type,
                    entry.domain,
                ),
            );
        }

        debug!(
            variables = registry.by_name.len(),
            modules = registry.modules(),
            "built variable registry"
        );
        Ok(registry)
    }

    fn modules(&self) -> usize {
        let mut modules: Vec<u16> = self.by_id.keys().map(|&(module_id, _)| module_id).collect();
        modules.dedup();
        modules.len()
    }

    /// Registry over the built-in AMT catalog.
    ///
    /// # Errors
    ///
    /// Propagates [`VariableRegistry::build`] failures.
    pub fn amt() -> SetupBinResult<Self> {
        Self::build(&amt_catalog())
    }

    /// # Errors
    ///
    /// Returns [`SetupBinError::UnknownVariable`] if `name` is not registered.
    pub fn resolve_by_name(&self, name: &str) -> SetupBinResult<&VariableDefinition> {
        self.by_name
            .get(name)
            .ok_or_else(|| SetupBinError::UnknownVariable(name.to_string()))
    }

    /// # Errors
    ///
    /// Returns [`SetupBinError::UnknownVariableId`] if the pair is not registered.
    pub fn resolve_by_id(&self, module_id: u16, variable_id: u16) -> SetupBinResult<&str> {
        self.by_id
            .get(&(module_id, variable_id))
            .map(String::as_str)
            .ok_or(SetupBinError::UnknownVariableId {
                module_id,
                variable_id,
            })
    }

    /// Definition for an identifier pair, via its registered name.
    ///
    /// # Errors
    ///
    /// Returns [`SetupBinError::UnknownVariableId`] if the pair is not registered.
    pub fn definition_by_id(
        &self,
        module_id: u16,
        variable_id: u16,
    ) -> SetupBinResult<&VariableDefinition> {
        let name = self.resolve_by_id(module_id, variable_id)?;
        self.resolve_by_name(name)
    }

    /// Definitions ordered by (module id, variable id).
    pub fn definitions(&self) -> impl Iterator<Item = &VariableDefinition> {
        self.by_id
            .values()
            .filter_map(|name| self.by_name.get(name))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Domain;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn small_catalog() -> Catalog {
        Catalog::from([(
            1,
            BTreeMap::from([
                (1, CatalogEntry::new(0, "Current MEBx Password", None)),
                (2, CatalogEntry::new(0, "New MEBx Password", None)),
                (
                    3,
                    CatalogEntry::new(1, "Flag", Some(Domain::choices([(0, "Off"), (1, "On")]))),
                ),
            ]),
        )])
    }

    #[test]
    fn resolves_both_directions() -> TestResult {
        let registry = VariableRegistry::build(&small_catalog())?;
        let def = registry.resolve_by_name("New MEBx Password")?;
        assert_eq!((def.module_id(), def.variable_id()), (1, 2));
        assert_eq!(def.variable_type(), VariableType::String);
        assert_eq!(registry.resolve_by_id(1, 3)?, "Flag");
        assert_eq!(registry.definition_by_id(1, 1)?.name(), "Current MEBx Password");
        assert_eq!(registry.len(), 3);
        Ok(())
    }

    #[test]
    fn unknown_lookups_fail() -> TestResult {
        let registry = VariableRegistry::build(&small_catalog())?;
        assert_eq!(
            registry.resolve_by_name("Nope"),
            Err(SetupBinError::UnknownVariable("Nope".to_string()))
        );
        assert_eq!(
            registry.resolve_by_id(1, 9),
            Err(SetupBinError::UnknownVariableId {
                module_id: 1,
                variable_id: 9
            })
        );
        Ok(())
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut catalog = small_catalog();
        catalog.insert(
            2,
            BTreeMap::from([(7, CatalogEntry::new(1, "Flag", None))]),
        );
        assert_eq!(
            VariableRegistry::build(&catalog),
            Err(SetupBinError::DuplicateVariable("Flag".to_string()))
        );
    }

    #[test]
    fn unknown_type_codes_are_rejected() {
        let mut catalog = small_catalog();
        catalog.insert(2, BTreeMap::from([(1, CatalogEntry::new(9, "Odd", None))]));
        assert_eq!(
            VariableRegistry::build(&catalog),
            Err(SetupBinError::UnknownType {
                name: "Odd".to_string(),
                type_code: 9
            })
        );
    }

    #[test]
    fn rows_in_reverse_order_build_the_same_registry() -> TestResult {
        let catalog = amt_catalog();
        let mut rows: Vec<_> = catalog
            .iter()
            .flat_map(|(&module_id, variables)| {
                variables
                    .iter()
                    .map(move |(&variable_id, entry)| (module_id, variable_id, entry.clone()))
            })
            .collect();
        rows.reverse();
        assert_eq!(VariableRegistry::from_rows(rows)?, VariableRegistry::build(&catalog)?);
        Ok(())
    }

    #[test]
    fn first_duplicate_name_is_reported_whatever_the_row_order() {
        let rows = [
            (3, 1, CatalogEntry::new(1, "Beta", None)),
            (1, 1, CatalogEntry::new(1, "Alpha", None)),
            (2, 1, CatalogEntry::new(1, "Beta", None)),
            (4, 1, CatalogEntry::new(1, "Alpha", None)),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();
        let expected = Err(SetupBinError::DuplicateVariable("Beta".to_string()));
        assert_eq!(VariableRegistry::from_rows(rows), expected);
        assert_eq!(VariableRegistry::from_rows(reversed), expected);
    }

    #[test]
    fn repeated_identifier_pairs_are_rejected() {
        let rows = [
            (1, 5, CatalogEntry::new(1, "Left", None)),
            (1, 5, CatalogEntry::new(3, "Right", None)),
        ];
        assert_eq!(
            VariableRegistry::from_rows(rows),
            Err(SetupBinError::DuplicateIdentifier {
                module_id: 1,
                variable_id: 5
            })
        );
    }

    #[test]
    fn zero_ids_are_reserved() {
        let catalog = Catalog::from([(0, BTreeMap::from([(1, CatalogEntry::new(1, "Z", None))]))]);
        assert!(matches!(
            VariableRegistry::build(&catalog),
            Err(SetupBinError::ReservedIdentifier { .. })
        ));
    }

    #[test]
    fn definitions_iterate_in_id_order() -> TestResult {
        let registry = VariableRegistry::amt()?;
        let ids: Vec<(u16, u16)> = registry
            .definitions()
            .map(|d| (d.module_id(), d.variable_id()))
            .collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert_eq!(ids.len(), registry.len());
        Ok(())
    }
}
