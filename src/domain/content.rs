//! Resolved config content handed to the compiler

use std::collections::BTreeMap;

use super::naming::ConfigScope;

/// File name -> file content for one config group
pub type ConfigFiles = BTreeMap<String, String>;

/// Config content for the active environment, resolved by a config source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub scope: ConfigScope,
    groups: BTreeMap<String, ConfigFiles>,
}

impl ResolvedConfig {
    /// Per-group content, bundles named `{app}-{group}-{env}`
    pub fn new() -> Self {
        Self::default()
    }

    /// A single config root, bundle named `{app}`
    pub fn unscoped() -> Self {
        Self {
            scope: ConfigScope::Unscoped,
            groups: BTreeMap::new(),
        }
    }

    /// Builder: add a group's files
    pub fn with_group(mut self, group: impl Into<String>, files: ConfigFiles) -> Self {
        self.insert(group, files);
        self
    }

    pub fn insert(&mut self, group: impl Into<String>, files: ConfigFiles) {
        self.groups.insert(group.into(), files);
    }

    /// Files for a group; absent and empty groups both mean "no content"
    pub fn files(&self, group: &str) -> Option<&ConfigFiles> {
        self.groups.get(group).filter(|files| !files.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.values().all(BTreeMap::is_empty)
    }
}
