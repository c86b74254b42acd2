use serde::{Deserialize, Serialize};

/// Identity and discovery metadata for a use-case module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseCaseDescriptor {
    /// Unique key for lookup and channel routing
    pub id: String,
    pub title: String,
    pub category: String,
    /// Free-form labels for discovery, in declaration order
    #[serde(default)]
    pub tags: Vec<String>,
}

impl UseCaseDescriptor {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
        tags: Vec<&str>,
    ) -> Self {
        UseCaseDescriptor {
            id: id.into(),
            title: title.into(),
            category: category.into(),
            tags: tags.into_iter().map(String::from).collect(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
