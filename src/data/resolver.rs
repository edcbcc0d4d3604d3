use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::dataset::{ContentItem, Dataset};
use crate::error::{ErrorCode, LabflowError, Result};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("Valid regex pattern"));

const PLACEHOLDERS: &[&str] = &[
    "sample",
    "dataset",
    "dataset_id",
    "file_name",
    "extension",
    "type",
];

/// What a resolver sees for one file.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// File kind being staged.
    pub data_type: &'a str,
    pub source: &'a Path,
    pub content: &'a ContentItem,
    pub dataset: &'a Dataset,
}

impl ResolveContext<'_> {
    fn placeholder(&self, name: &str) -> Option<String> {
        let value = match name {
            "sample" => self.content.name.clone(),
            "dataset" => self.dataset.name.clone(),
            "dataset_id" => self.dataset.id.clone(),
            "type" => self.data_type.to_string(),
            "file_name" => self.source.file_name()?.to_string_lossy().to_string(),
            "extension" => self.source.extension()?.to_string_lossy().to_string(),
            _ => return None,
        };
        Some(value)
    }
}

/// Destination for one file, relative to the workflow directory. `None`
/// leaves the file unstaged.
pub type ResolveFn = Arc<dyn Fn(&ResolveContext<'_>) -> Option<PathBuf> + Send + Sync>;

/// Maps file kinds to destination paths.
#[derive(Clone, Default)]
pub struct PathResolver {
    resolvers: BTreeMap<String, ResolveFn>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, data_type: impl Into<String>, resolve: F) -> Self
    where
        F: Fn(&ResolveContext<'_>) -> Option<PathBuf> + Send + Sync + 'static,
    {
        self.resolvers.insert(data_type.into(), Arc::new(resolve));
        self
    }

    /// A resolver filling `{placeholder}`s in `template`.
    ///
    /// Known placeholders are `{sample}`, `{dataset}`, `{dataset_id}`,
    /// `{file_name}`, `{extension}` and `{type}`. A placeholder with no value
    /// for a given file (no extension, say) skips that file.
    pub fn with_template(self, data_type: impl Into<String>, template: &str) -> Result<Self> {
        for capture in PLACEHOLDER.captures_iter(template) {
            let name = &capture[1];
            if !PLACEHOLDERS.contains(&name) {
                return Err(LabflowError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    format!("Unknown placeholder '{{{}}}' in path template '{}'", name, template),
                ));
            }
        }

        let template = template.to_string();
        Ok(self.with(data_type, move |context| render_template(&template, context)))
    }

    /// Add every resolver of `other`, replacing those for the same kind.
    pub fn merge(mut self, other: PathResolver) -> Self {
        self.resolvers.extend(other.resolvers);
        self
    }

    pub fn supports(&self, data_type: &str) -> bool {
        self.resolvers.contains_key(data_type)
    }

    pub fn supported_types(&self) -> Vec<&str> {
        self.resolvers.keys().map(String::as_str).collect()
    }

    pub fn resolve(&self, context: &ResolveContext<'_>) -> Option<PathBuf> {
        let resolve = self.resolvers.get(context.data_type)?;
        resolve(context)
    }
}

fn render_template(template: &str, context: &ResolveContext<'_>) -> Option<PathBuf> {
    let mut missing = false;
    let rendered = PLACEHOLDER.replace_all(template, |caps: &regex::Captures<'_>| {
        context.placeholder(&caps[1]).unwrap_or_else(|| {
            missing = true;
            String::new()
        })
    });

    if missing || rendered.is_empty() {
        None
    } else {
        Some(PathBuf::from(rendered.into_owned()))
    }
}

impl fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathResolver")
            .field("types", &self.supported_types())
            .finish()
    }
}
