// src/models/core.rs
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::utils::constants::LITERAL_ORIGINAL_OVERRIDES;

/// Opaque registry identifier. Never parsed, only compared and echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntity {
    /// `None` when the source row had no id; the row still takes part in matching.
    pub id: Option<EntityId>,
    pub company_name: String,
}

/// Raw transaction row after missing-value canonicalization. `None` means the
/// cell was absent or empty in the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub merchant_name: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedTransaction {
    pub original: String,
}

impl TransactionRecord {
    /// `merchant_name` if present, else `name`, else empty. A few raw `name`
    /// values force a fixed canonical string regardless of `merchant_name`.
    pub fn resolve(&self) -> ResolvedTransaction {
        if let Some(name) = self.name.as_deref() {
            for (raw_name, forced) in LITERAL_ORIGINAL_OVERRIDES.iter() {
                if name == *raw_name {
                    return ResolvedTransaction {
                        original: forced.to_string(),
                    };
                }
            }
        }

        let original = self
            .merchant_name
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_default();
        ResolvedTransaction { original }
    }
}

/// Company name -> entity id, first registry occurrence wins. Later rows that
/// repeat a company name are unreachable through this index; that loss is
/// accepted so a name never fans out into several matches.
#[derive(Debug, Clone, Default)]
pub struct RegistryNameIndex {
    ids_by_name: HashMap<String, Option<EntityId>>,
    shadowed_rows: usize,
}

impl RegistryNameIndex {
    pub fn build(registry: &[RegistryEntity]) -> Self {
        let mut ids_by_name = HashMap::with_capacity(registry.len());
        let mut shadowed_rows = 0;
        for entity in registry {
            if ids_by_name.contains_key(&entity.company_name) {
                shadowed_rows += 1;
            } else {
                ids_by_name.insert(entity.company_name.clone(), entity.id.clone());
            }
        }
        if shadowed_rows > 0 {
            debug!(
                "{} registry rows share a company name with an earlier row and resolve to the first id",
                shadowed_rows
            );
        }
        Self {
            ids_by_name,
            shadowed_rows,
        }
    }

    /// `None` for unknown names and for names whose first row had no id.
    pub fn entity_id(&self, company_name: &str) -> Option<&EntityId> {
        self.ids_by_name.get(company_name).and_then(Option::as_ref)
    }

    pub fn shadowed_rows(&self) -> usize {
        self.shadowed_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_index_first_occurrence_wins() {
        let registry = vec![
            RegistryEntity { id: Some(EntityId::from("1")), company_name: "Delta".to_string() },
            RegistryEntity { id: Some(EntityId::from("2")), company_name: "Delta".to_string() },
            RegistryEntity { id: Some(EntityId::from("3")), company_name: "Acme Inc".to_string() },
        ];
        let index = RegistryNameIndex::build(&registry);
        assert_eq!(index.entity_id("Delta"), Some(&EntityId::from("1")));
        assert_eq!(index.entity_id("Acme Inc"), Some(&EntityId::from("3")));
        assert_eq!(index.entity_id("Globex"), None);
        assert_eq!(index.shadowed_rows(), 1);
    }

    #[test]
    fn test_name_index_keeps_first_row_without_id() {
        let registry = vec![
            RegistryEntity { id: None, company_name: "Delta".to_string() },
            RegistryEntity { id: Some(EntityId::from("2")), company_name: "Delta".to_string() },
        ];
        let index = RegistryNameIndex::build(&registry);
        assert_eq!(index.entity_id("Delta"), None);
        assert_eq!(index.shadowed_rows(), 1);
    }

    fn record(merchant_name: Option<&str>, name: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            merchant_name: merchant_name.map(str::to_string),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn test_merchant_name_preferred_over_name() {
        let resolved = record(Some("Starbucks"), Some("STARBUCKS STORE 123")).resolve();
        assert_eq!(resolved.original, "Starbucks");
    }

    #[test]
    fn test_falls_back_to_name() {
        let resolved = record(None, Some("SQ *COFFEE CART")).resolve();
        assert_eq!(resolved.original, "SQ *COFFEE CART");
    }

    #[test]
    fn test_both_missing_resolves_to_empty() {
        assert_eq!(record(None, None).resolve().original, "");
    }

    #[test]
    fn test_literal_overrides_win() {
        assert_eq!(
            record(Some("Kayak"), Some("KAYAK HANALEI")).resolve().original,
            "KAYAK HANALEI"
        );
        assert_eq!(
            record(Some("Uber"), Some("Uber Eats")).resolve().original,
            "UBER EATS"
        );
        assert_eq!(record(None, Some("uber eats")).resolve().original, "uber eats");
    }
}
