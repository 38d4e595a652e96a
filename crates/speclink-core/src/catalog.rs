//! Capability catalog
//!
//! A static, load-once list of `{name, tags, description}` records. The
//! catalog is an immutable value handed to the matcher; there is no global
//! instance.
//!
//! Files are either a bare list of modules or a map with a `capabilities`
//! list, in YAML or JSON.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../catalog/builtin.yaml");

/// One reusable capability module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityModule {
    /// Unique module name
    pub name: String,
    /// Tags matched against requirement text
    #[serde(default, alias = "keywords")]
    pub tags: Vec<String>,
    /// Free-text description
    #[serde(default, alias = "description_text")]
    pub description: String,
    /// Grouping label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl CapabilityModule {
    /// Create module with tags
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            description: String::new(),
            category: None,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With category
    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    // Lowercased, trimmed, blank and duplicate tags dropped
    fn normalized(mut self) -> Self {
        let mut seen = Vec::with_capacity(self.tags.len());
        for tag in self.tags.drain(..) {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() && !seen.contains(&tag) {
                seen.push(tag);
            }
        }
        self.tags = seen;
        self.name = self.name.trim().to_string();
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { capabilities: Vec<CapabilityModule> },
    List(Vec<CapabilityModule>),
}

impl CatalogFile {
    fn into_modules(self) -> Vec<CapabilityModule> {
        match self {
            Self::Wrapped { capabilities } => capabilities,
            Self::List(modules) => modules,
        }
    }
}

/// Immutable, ordered capability catalog
///
/// Declaration order is the matcher's tie-break order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    modules: Vec<CapabilityModule>,
}

impl Catalog {
    /// Create from modules (tags are lowercased and deduplicated)
    #[must_use]
    pub fn new(modules: Vec<CapabilityModule>) -> Self {
        Self {
            modules: modules.into_iter().map(CapabilityModule::normalized).collect(),
        }
    }

    /// Parse a YAML catalog
    ///
    /// # Errors
    /// `CatalogError::Yaml` when the text is not a catalog.
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(text)?;
        Ok(Self::new(file.into_modules()))
    }

    /// Parse a JSON catalog
    ///
    /// # Errors
    /// `CatalogError::Json` when the text is not a catalog.
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(text)?;
        Ok(Self::new(file.into_modules()))
    }

    /// Load a catalog file, format chosen by extension
    ///
    /// # Errors
    /// - `CatalogError::Io` if unreadable
    /// - `CatalogError::UnsupportedFormat` for extensions other than
    ///   `yaml`, `yml` and `json`
    /// - `CatalogError::Yaml` / `CatalogError::Json` if invalid
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let read = || {
            std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        let catalog = match extension.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&read()?)?,
            Some("json") => Self::from_json_str(&read()?)?,
            _ => return Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
        };
        tracing::debug!(path = %path.display(), modules = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Embedded catalog of common mobile-app capabilities
    ///
    /// # Errors
    /// `CatalogError::Yaml` if the embedded catalog is corrupt.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    /// Modules in declaration order
    #[inline]
    #[must_use]
    pub fn modules(&self) -> &[CapabilityModule] {
        &self.modules
    }

    /// Module by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CapabilityModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Number of modules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
