use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a category panel (its category code).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(pub String);

impl PanelId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PanelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PanelId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where the caller would like a category to sit. This is business meaning
/// only; the engine groups panels by measured position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Top,
    Bottom,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRow {
    pub problem: String,
    #[serde(default)]
    pub solution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub code: PanelId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub placement: Placement,
    #[serde(default)]
    pub rows: Vec<ContentRow>,
}

impl Category {
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            self.code.as_str()
        } else {
            &self.label
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourcePanel {
    pub label: String,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(default)]
    pub title: Option<String>,
    pub source: SourcePanel,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Diagram {
    /// Categories with at least one content row, in declaration order.
    pub fn visible_categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(|category| !category.rows.is_empty())
    }
}
