use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{Result, SettlementError};

/// Ordered list of unit names taking part in the settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    names: Vec<String>,
}

impl Roster {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|existing| existing == name)
    }

    /// Appends a unit. Names are trimmed and must be unique.
    pub fn add(&mut self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SettlementError::InvalidInput(
                "unit name cannot be empty".into(),
            ));
        }
        if self.contains(name) {
            return Err(SettlementError::DuplicateUnit(name.to_string()));
        }
        self.names.push(name.to_string());
        info!(unit = name, units = self.names.len(), "unit added");
        Ok(name.to_string())
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        let before = self.names.len();
        self.names.retain(|existing| existing != name);
        if self.names.len() == before {
            return Err(SettlementError::UnitNotFound(name.to_string()));
        }
        info!(unit = name, units = self.names.len(), "unit removed");
        Ok(())
    }

    /// Comma separated listing used by the shell.
    pub fn display_list(&self) -> String {
        self.names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_trims_and_rejects_duplicates() {
        let mut roster = Roster::new(vec!["301호".into()]);
        assert_eq!(roster.add("  302호 ").expect("add"), "302호");
        assert_eq!(roster.names(), ["301호", "302호"]);

        let err = roster.add("301호").expect_err("duplicate");
        assert!(matches!(err, SettlementError::DuplicateUnit(name) if name == "301호"));
        assert!(matches!(
            roster.add("   "),
            Err(SettlementError::InvalidInput(_))
        ));
    }

    #[test]
    fn remove_reports_unknown_names() {
        let mut roster = Roster::new(vec!["301호".into(), "302호".into()]);
        roster.remove("301호").expect("remove");
        assert_eq!(roster.display_list(), "302호");
        assert!(matches!(
            roster.remove("401호"),
            Err(SettlementError::UnitNotFound(_))
        ));
    }

    #[test]
    fn serializes_as_plain_array() {
        let roster = Roster::new(vec!["A".into(), "B".into()]);
        let json = serde_json::to_string(&roster).expect("serialize");
        assert_eq!(json, r#"["A","B"]"#);
        let back: Roster = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, roster);
    }
}
