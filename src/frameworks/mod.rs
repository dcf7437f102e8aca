//! Critique framework catalog.
//!
//! The catalog is loaded once at startup and shared read-only across
//! sessions.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::error::CatalogError;

/// A named critique lens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framework {
    /// Unique framework name, also used as the critique section header.
    pub name: String,
    /// What the framework examines.
    pub description: String,
    /// How the critique output for this framework should be structured.
    #[serde(default)]
    pub output_instructions: String,
    /// Short hint shown next to the framework in selectors.
    #[serde(default)]
    pub tooltip: String,
}

/// Ordered, name-unique collection of frameworks.
#[derive(Debug, Clone)]
pub struct FrameworkCatalog {
    frameworks: Vec<Framework>,
}

/// Selector entry for a framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameworkOption {
    /// Framework name, also the reflection field name.
    pub name: String,
    /// Short hint for the selector.
    pub tooltip: String,
}

impl FrameworkCatalog {
    /// Build a catalog, rejecting empty lists, blank names and duplicate names.
    pub fn new(frameworks: Vec<Framework>) -> Result<Self, CatalogError> {
        if frameworks.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for (index, fw) in frameworks.iter().enumerate() {
            if fw.name.trim().is_empty() {
                return Err(CatalogError::EmptyName { index });
            }
            if !seen.insert(fw.name.as_str()) {
                return Err(CatalogError::DuplicateName {
                    name: fw.name.clone(),
                });
            }
        }

        Ok(Self { frameworks })
    }

    /// Parse a catalog from a JSON array.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let frameworks: Vec<Framework> = serde_json::from_str(json)?;
        Self::new(frameworks)
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            frameworks = catalog.len(),
            "Framework catalog loaded"
        );
        Ok(catalog)
    }

    /// Number of frameworks.
    pub fn len(&self) -> usize {
        self.frameworks.len()
    }

    /// Always false for a constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.frameworks.is_empty()
    }

    /// Every framework, in catalog order.
    pub fn all(&self) -> Vec<&Framework> {
        self.frameworks.iter().collect()
    }

    /// Look up a framework by exact name.
    pub fn get(&self, name: &str) -> Option<&Framework> {
        self.frameworks.iter().find(|fw| fw.name == name)
    }

    /// Frameworks whose names are not in `used`, in catalog order.
    pub fn excluding(&self, used: &[String]) -> Vec<&Framework> {
        self.frameworks
            .iter()
            .filter(|fw| !used.iter().any(|u| u == &fw.name))
            .collect()
    }

    /// Resolve user-selected names to catalog entries, in catalog order.
    ///
    /// Returns the first unknown name as the error.
    pub fn selected(&self, names: &[String]) -> Result<Vec<&Framework>, String> {
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(unknown.clone());
        }
        Ok(self
            .frameworks
            .iter()
            .filter(|fw| names.iter().any(|n| n == &fw.name))
            .collect())
    }

    /// Name and tooltip pairs for selectors.
    pub fn options(&self) -> Vec<FrameworkOption> {
        self.frameworks
            .iter()
            .map(|fw| FrameworkOption {
                name: fw.name.clone(),
                tooltip: fw.tooltip.clone(),
            })
            .collect()
    }
}

/// Render frameworks as the text block handed to the critique prompts.
pub fn catalog_text(frameworks: &[&Framework]) -> String {
    frameworks
        .iter()
        .map(|fw| {
            format!(
                "{}:\n{}\nHow to apply (output instructions): {}",
                fw.name, fw.description, fw.output_instructions
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render frameworks as `name: description` lines.
pub fn selection_text(frameworks: &[&Framework]) -> String {
    frameworks
        .iter()
        .map(|fw| format!("{}: {}", fw.name, fw.description))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn framework(name: &str) -> Framework {
        Framework {
            name: name.to_string(),
            description: format!("{} description", name),
            output_instructions: format!("{} instructions", name),
            tooltip: format!("{} tip", name),
        }
    }

    fn catalog() -> FrameworkCatalog {
        FrameworkCatalog::new(vec![
            framework("A"),
            framework("B"),
            framework("C"),
            framework("D"),
            framework("E"),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = FrameworkCatalog::new(vec![framework("A"), framework("A")]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateName { name } if name == "A"));
    }

    #[test]
    fn test_rejects_blank_name() {
        let err = FrameworkCatalog::new(vec![framework("A"), framework("  ")]).unwrap_err();
        assert!(matches!(err, CatalogError::EmptyName { index: 1 }));
    }

    #[test]
    fn test_rejects_empty_catalog() {
        assert!(matches!(
            FrameworkCatalog::from_json("[]"),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_from_json_defaults_optional_fields() {
        let catalog =
            FrameworkCatalog::from_json(r#"[{"name": "Pre-Mortem", "description": "d"}]"#)
                .unwrap();
        let fw = catalog.get("Pre-Mortem").unwrap();
        assert_eq!(fw.output_instructions, "");
        assert_eq!(fw.tooltip, "");
    }

    #[test]
    fn test_excluding_removes_exactly_used_names() {
        let catalog = catalog();
        let used = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let names: Vec<&str> = catalog
            .excluding(&used)
            .into_iter()
            .map(|fw| fw.name.as_str())
            .collect();
        assert_eq!(names, vec!["D", "E"]);
    }

    #[test]
    fn test_selected_preserves_catalog_order() {
        let catalog = catalog();
        let names = vec!["E".to_string(), "B".to_string()];
        let selected: Vec<&str> = catalog
            .selected(&names)
            .unwrap()
            .into_iter()
            .map(|fw| fw.name.as_str())
            .collect();
        assert_eq!(selected, vec!["B", "E"]);
    }

    #[test]
    fn test_selected_reports_unknown_name() {
        let catalog = catalog();
        let names = vec!["A".to_string(), "Nope".to_string()];
        assert_eq!(catalog.selected(&names).unwrap_err(), "Nope");
    }

    #[test]
    fn test_catalog_text_format() {
        let a = framework("A");
        let b = framework("B");
        assert_eq!(
            catalog_text(&[&a, &b]),
            "A:\nA description\nHow to apply (output instructions): A instructions\n\n\
             B:\nB description\nHow to apply (output instructions): B instructions"
        );
    }

    #[test]
    fn test_options_carry_tooltips() {
        let options = catalog().options();
        assert_eq!(options.len(), 5);
        assert_eq!(options[0].tooltip, "A tip");
    }
}
