//! Template registry and placeholder expansion
//!
//! Templates are data: a role, an output path pattern, a comment prefix for
//! the header block and an opaque body. The generator never knows where a
//! role's file goes; the template says so.
//!
//! A manifest (`templates.yaml`) looks like:
//!
//! ```yaml
//! templates:
//!   - name: room-repository
//!     role: repository_impl
//!     requires: android-database-room
//!     path: src/main/kotlin/{{namespace_path}}/data/{{entity}}RepositoryImpl.kt
//!     comment_prefix: "//"
//!     body_file: repository_impl.kt.tpl
//! ```

use crate::entity::snake_case;
use crate::error::TemplateError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use speclink_artifact::{Role, SpecId};
use std::path::{Component, Path, PathBuf};

const BUILTIN_TEMPLATES: &str = include_str!("../templates/builtin.yaml");

/// Manifest file name inside a templates directory
pub const MANIFEST_FILE_NAME: &str = "templates.yaml";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_]+)\s*\}\}").expect("placeholder pattern is valid"));

/// One scaffold template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    /// Template name (for reports)
    pub name: String,
    /// Role it produces
    pub role: Role,
    /// Capability that must be matched for this template to apply
    pub requires: Option<String>,
    /// Output path pattern, relative to the output directory
    pub path: String,
    /// Line-comment prefix for the header block
    pub comment_prefix: String,
    /// Opaque body text
    pub body: String,
}

impl Template {
    /// Create template with `//` comments and no capability requirement
    #[must_use]
    pub fn new(name: impl Into<String>, role: Role, path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role,
            requires: None,
            path: path.into(),
            comment_prefix: "//".to_string(),
            body: body.into(),
        }
    }

    /// With required capability
    #[inline]
    #[must_use]
    pub fn requiring(mut self, capability: impl Into<String>) -> Self {
        self.requires = Some(capability.into());
        self
    }

    /// With comment prefix
    #[inline]
    #[must_use]
    pub fn with_comment_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.comment_prefix = prefix.into();
        self
    }

    /// Whether this template applies given the matched capabilities
    #[must_use]
    pub fn applies(&self, capabilities: &[String]) -> bool {
        self.requires
            .as_ref()
            .map_or(true, |required| capabilities.iter().any(|c| c == required))
    }

    /// Expand the path pattern and check it stays inside the output directory
    ///
    /// # Errors
    /// `TemplateError::UnsafePath` for absolute paths or `..` components.
    pub fn output_path(&self, context: &TemplateContext) -> Result<PathBuf, TemplateError> {
        let path = PathBuf::from(expand(&self.path, context));
        let safe = path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if safe && !path.as_os_str().is_empty() {
            Ok(path)
        } else {
            Err(TemplateError::UnsafePath {
                template: self.name.clone(),
                path: self.path.clone(),
            })
        }
    }
}

#[derive(Deserialize)]
struct Manifest {
    templates: Vec<ManifestEntry>,
}

#[derive(Deserialize)]
struct ManifestEntry {
    name: String,
    role: String,
    #[serde(default)]
    requires: Option<String>,
    path: String,
    #[serde(default = "default_comment_prefix")]
    comment_prefix: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    body_file: Option<PathBuf>,
}

fn default_comment_prefix() -> String {
    "//".to_string()
}

impl ManifestEntry {
    fn into_template(self, base_dir: Option<&Path>) -> Result<Template, TemplateError> {
        let role = self.role.parse::<Role>().map_err(|_| TemplateError::InvalidRole {
            template: self.name.clone(),
            role: self.role.clone(),
        })?;
        let body = match (self.body, self.body_file) {
            (Some(body), _) => body,
            (None, Some(file)) => {
                let path = base_dir.map_or_else(|| file.clone(), |dir| dir.join(&file));
                std::fs::read_to_string(&path).map_err(|source| TemplateError::Io { path, source })?
            }
            (None, None) => String::new(),
        };
        Ok(Template {
            name: self.name,
            role,
            requires: self.requires,
            path: self.path,
            comment_prefix: self.comment_prefix,
            body,
        })
    }
}

/// Ordered templates; the first applicable template of a role wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
}

impl TemplateRegistry {
    /// Create from templates in lookup order
    #[inline]
    #[must_use]
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    /// Embedded Kotlin templates
    ///
    /// # Errors
    /// `TemplateError::Manifest` if the embedded manifest is corrupt.
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::from_manifest_str(BUILTIN_TEMPLATES, None)
    }

    /// Parse a manifest; `body_file` entries resolve against `base_dir`
    ///
    /// # Errors
    /// `Manifest` for invalid YAML, `InvalidRole` for unknown role names,
    /// `Io` for unreadable body files.
    pub fn from_manifest_str(text: &str, base_dir: Option<&Path>) -> Result<Self, TemplateError> {
        let manifest: Manifest = serde_yaml::from_str(text)?;
        let templates = manifest
            .templates
            .into_iter()
            .map(|entry| entry.into_template(base_dir))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(templates))
    }

    /// Load `templates.yaml` from a directory
    ///
    /// # Errors
    /// As [`from_manifest_str`](Self::from_manifest_str), plus `Io` when the
    /// manifest is unreadable.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let dir = dir.as_ref();
        let path = dir.join(MANIFEST_FILE_NAME);
        let text = std::fs::read_to_string(&path).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;
        let registry = Self::from_manifest_str(&text, Some(dir))?;
        tracing::debug!(path = %path.display(), templates = registry.len(), "user templates loaded");
        Ok(registry)
    }

    /// User templates (optional directory) layered over the builtins
    ///
    /// # Errors
    /// Propagates load errors from either source.
    pub fn with_user_dir(dir: Option<&Path>) -> Result<Self, TemplateError> {
        let builtin = Self::builtin()?;
        match dir {
            Some(dir) => Ok(Self::load_dir(dir)?.layered_over(builtin)),
            None => Ok(builtin),
        }
    }

    /// This registry's templates first, then `fallback`'s
    #[must_use]
    pub fn layered_over(mut self, fallback: Self) -> Self {
        self.templates.extend(fallback.templates);
        self
    }

    /// First template of `role` applicable to `capabilities`
    ///
    /// # Errors
    /// `TemplateError::UnknownRole` when none applies.
    pub fn lookup(&self, role: Role, capabilities: &[String]) -> Result<&Template, TemplateError> {
        self.templates
            .iter()
            .find(|t| t.role == role && t.applies(capabilities))
            .ok_or(TemplateError::UnknownRole(role))
    }

    /// Templates in lookup order
    #[inline]
    #[must_use]
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Number of templates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Values available to placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    /// PascalCase entity name
    pub entity: String,
    /// Dotted namespace (`com.example.app`)
    pub namespace: String,
    /// Source document id
    pub spec_id: SpecId,
    /// Feature name
    pub feature: String,
}

impl TemplateContext {
    /// Value of a placeholder, `None` when unknown
    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        match key {
            "entity" => Some(self.entity.clone()),
            "entity_lower" => Some(self.entity.to_lowercase()),
            "entity_snake" => Some(snake_case(&self.entity)),
            "namespace" => Some(self.namespace.clone()),
            "namespace_path" => Some(self.namespace.replace('.', "/")),
            "spec_id" => Some(self.spec_id.to_string()),
            "feature" => Some(self.feature.clone()),
            _ => None,
        }
    }
}

/// Replace `{{name}}` placeholders; unknown ones are left as written
#[must_use]
pub fn expand(text: &str, context: &TemplateContext) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &regex::Captures<'_>| {
            context.value(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
