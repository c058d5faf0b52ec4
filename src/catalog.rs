use crate::schema::Element;
use serde::{Deserialize, Serialize};

/// Known work-breakdown elements of a project, used to resolve the element
/// references found in imported rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementCatalog {
    elements: Vec<Element>,
}

impl ElementCatalog {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn by_id(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Resolves a reference by exact (case-insensitive) code, falling back
    /// to a case-insensitive substring of the description. An empty
    /// reference never matches.
    pub fn resolve(&self, reference: &str) -> Option<&Element> {
        let needle = reference.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.elements
            .iter()
            .find(|e| e.code.trim().to_lowercase() == needle)
            .or_else(|| {
                self.elements
                    .iter()
                    .find(|e| e.description.to_lowercase().contains(&needle))
            })
    }
}

impl From<Vec<Element>> for ElementCatalog {
    fn from(elements: Vec<Element>) -> Self {
        Self::new(elements)
    }
}
