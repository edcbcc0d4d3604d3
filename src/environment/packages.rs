use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output of `<manager> env list --json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentListing {
    #[serde(default)]
    pub envs: Vec<PathBuf>,
}

impl EnvironmentListing {
    /// Environment names, in the order reported.
    ///
    /// A path under one of `roots` is named by the remainder of the path;
    /// otherwise the standard `<prefix>/envs/<name>` layout is recognised.
    /// Anything else (the root installation itself) is skipped, as is
    /// `base_name`.
    pub fn names(&self, roots: &[PathBuf], base_name: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for path in &self.envs {
            let Some(name) = environment_name(path, roots) else {
                continue;
            };
            if name != base_name && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

fn environment_name(path: &Path, roots: &[PathBuf]) -> Option<String> {
    for root in roots {
        if let Ok(rest) = path.strip_prefix(root) {
            let name = rest.to_string_lossy().trim_matches('/').to_string();
            if !name.is_empty() {
                return Some(name);
            }
        }
    }

    let parent = path.parent()?;
    if parent.file_name()? == "envs" {
        return path.file_name().map(|n| n.to_string_lossy().to_string());
    }
    None
}

/// One entry of `<manager> list --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub build_string: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}
