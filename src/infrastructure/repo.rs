//! Checked-out repository as a descriptor and config source
//!
//! Layout:
//! ```text
//! <checkout>/
//!   release.yaml          # descriptor (path configurable)
//!   config/prod/app.yaml  # group files, located via `filesPath[env]`
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{ConfigSource, DescriptorSource};
use crate::domain::{ConfigFiles, ReleaseDescriptor, ResolvedConfig};
use crate::error::SourceError;

/// Reads descriptors and config files from a local tree
#[derive(Debug, Clone)]
pub struct RepoSource {
    checkout: PathBuf,
    descriptor_file: String,
    config_root: Option<PathBuf>,
}

impl RepoSource {
    pub fn new(checkout: impl Into<PathBuf>, descriptor_file: impl Into<String>) -> Self {
        Self {
            checkout: checkout.into(),
            descriptor_file: descriptor_file.into(),
            config_root: None,
        }
    }

    /// Read one directory as the single unscoped config group
    pub fn with_config_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config_root = Some(root.into());
        self
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.checkout.join(&self.descriptor_file)
    }

    /// Parse the descriptor file
    pub fn read_descriptor(&self) -> Result<ReleaseDescriptor, SourceError> {
        let path = self.descriptor_path();
        let content = fs::read_to_string(&path).map_err(|source| SourceError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let descriptor: ReleaseDescriptor =
            serde_yaml::from_str(&content).map_err(|e| SourceError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        info!("Loaded descriptor {} from {}", descriptor.name(), path.display());
        Ok(descriptor)
    }

    /// Config content for every group in the descriptor's environment
    pub fn read_config(
        &self,
        descriptor: &ReleaseDescriptor,
    ) -> Result<ResolvedConfig, SourceError> {
        if let Some(root) = &self.config_root {
            return self.read_unscoped(descriptor, root);
        }

        let mut resolved = ResolvedConfig::new();
        for group in &descriptor.config_groups {
            let Some(locator) = group.files_path.get(&descriptor.environment) else {
                debug!(
                    "Config group {} has no files for environment '{}'",
                    group.name, descriptor.environment
                );
                continue;
            };
            let files = read_dir_files(&self.checkout.join(locator))?;
            resolved.insert(group.name.clone(), files);
        }
        Ok(resolved)
    }

    fn read_unscoped(
        &self,
        descriptor: &ReleaseDescriptor,
        root: &Path,
    ) -> Result<ResolvedConfig, SourceError> {
        let mut resolved = ResolvedConfig::unscoped();
        let Some(group) = descriptor.config_groups.first() else {
            warn!(
                "Config root {} given but {} declares no config group to mount it",
                root.display(),
                descriptor.name()
            );
            return Ok(resolved);
        };

        resolved.insert(group.name.clone(), read_dir_files(root)?);
        Ok(resolved)
    }
}

/// Every regular file below `dir`, keyed by file name
///
/// Hidden entries are skipped. A missing directory is no content. Two files
/// sharing a name in different subdirectories are an error.
pub fn read_dir_files(dir: &Path) -> Result<ConfigFiles, SourceError> {
    let mut files = ConfigFiles::new();
    if !dir.exists() {
        warn!("Config directory {} does not exist", dir.display());
        return Ok(files);
    }

    let entries = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in entries {
        let entry = entry.map_err(|e| SourceError::Io {
            path: dir.display().to_string(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if files.insert(name.clone(), content).is_some() {
            return Err(SourceError::Parse {
                path: path.display().to_string(),
                message: format!(
                    "file name '{}' appears more than once under {}",
                    name,
                    dir.display()
                ),
            });
        }
    }

    debug!("Read {} files from {}", files.len(), dir.display());
    Ok(files)
}

impl DescriptorSource for RepoSource {
    async fn resolve_descriptor(&self) -> Result<ReleaseDescriptor, SourceError> {
        self.read_descriptor()
    }
}

impl ConfigSource for RepoSource {
    async fn resolve_config(
        &self,
        descriptor: &ReleaseDescriptor,
    ) -> Result<ResolvedConfig, SourceError> {
        self.read_config(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfigScope, Strategy};
    use tempfile::TempDir;

    const DESCRIPTOR: &str = r#"
type: normal
env: prod
app:
  name: orders
  namespace: shop
service:
  - name: http
    port: 8080
configs:
  - name: app
    mountPath: /etc/orders
    filesPath:
      prod: config/prod
      staging: config/staging
"#;

    fn checkout() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("release.yaml"), DESCRIPTOR).unwrap();
        fs::create_dir_all(dir.path().join("config/prod/nested")).unwrap();
        fs::write(dir.path().join("config/prod/app.yaml"), "port: 8080\n").unwrap();
        fs::write(dir.path().join("config/prod/nested/db.yaml"), "pool: 4\n").unwrap();
        fs::write(dir.path().join("config/prod/.hidden"), "secret").unwrap();
        dir
    }

    #[test]
    fn test_read_descriptor() {
        let dir = checkout();
        let source = RepoSource::new(dir.path(), "release.yaml");

        let descriptor = source.read_descriptor().unwrap();
        assert_eq!(descriptor.name(), "orders");
        assert_eq!(descriptor.strategy, Strategy::Normal);
        assert_eq!(descriptor.config_groups[0].files_path["prod"], "config/prod");
    }

    #[test]
    fn test_missing_descriptor_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RepoSource::new(dir.path(), "release.yaml")
            .read_descriptor()
            .unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn test_malformed_descriptor_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("release.yaml"), "app: [").unwrap();
        let err = RepoSource::new(dir.path(), "release.yaml")
            .read_descriptor()
            .unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }

    #[test]
    fn test_group_files_read_recursively() {
        let dir = checkout();
        let source = RepoSource::new(dir.path(), "release.yaml");
        let descriptor = source.read_descriptor().unwrap();

        let resolved = source.read_config(&descriptor).unwrap();
        let files = resolved.files("app").unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files["app.yaml"], "port: 8080\n");
        assert_eq!(files["db.yaml"], "pool: 4\n");
        assert_eq!(resolved.scope, ConfigScope::PerGroup);
    }

    #[test]
    fn test_missing_environment_directory_is_empty() {
        let dir = checkout();
        let source = RepoSource::new(dir.path(), "release.yaml");
        let descriptor = source.read_descriptor().unwrap().with_environment("staging");

        let resolved = source.read_config(&descriptor).unwrap();
        assert!(resolved.files("app").is_none());
    }

    #[test]
    fn test_config_root_is_unscoped() {
        let dir = checkout();
        let source = RepoSource::new(dir.path(), "release.yaml")
            .with_config_root(dir.path().join("config/prod"));
        let descriptor = source.read_descriptor().unwrap();

        let resolved = tokio_test::block_on(source.resolve_config(&descriptor)).unwrap();
        assert_eq!(resolved.scope, ConfigScope::Unscoped);
        assert_eq!(resolved.files("app").unwrap().len(), 2);
    }

    #[test]
    fn test_repeated_file_name_is_rejected() {
        let dir = checkout();
        fs::write(dir.path().join("config/prod/nested/app.yaml"), "port: 9090\n").unwrap();

        let err = read_dir_files(&dir.path().join("config/prod")).unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
        assert!(err.to_string().contains("app.yaml"));
    }
}
