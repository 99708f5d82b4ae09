use std::io;
use std::path::{Path, PathBuf};

use crate::core::config::{Config, SecurityConfig};

/// Errors that can occur during path validation
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Path '{path}' is outside allowed root directory '{root}'")]
    OutsideRootDirectory { path: PathBuf, root: PathBuf },

    #[error("Symlink '{path}' points outside allowed root directory")]
    SymlinkOutsideRoot { path: PathBuf },

    #[error("Symlinks are not allowed: '{path}'")]
    SymlinkNotAllowed { path: PathBuf },

    #[error("Cannot canonicalize path '{path}': {error}")]
    CannotCanonicalize { path: PathBuf, error: io::Error },

    #[error("Path does not exist: '{path}'")]
    PathNotFound { path: PathBuf },

    #[error("IO error for path '{path}': {error}")]
    IoError { path: PathBuf, error: io::Error },
}

/// Resolves user-supplied paths against the security policy.
///
/// The root is canonicalized once when the guard is built.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: Option<PathBuf>,
    allow_symlinks: bool,
}

impl PathGuard {
    pub fn new(security: &SecurityConfig) -> Result<Self, PathSecurityError> {
        let root = security
            .root_path
            .as_ref()
            .map(|root| {
                root.canonicalize().map_err(|error| PathSecurityError::IoError {
                    path: root.clone(),
                    error,
                })
            })
            .transpose()?;

        Ok(Self {
            root,
            allow_symlinks: security.allow_symlinks,
        })
    }

    /// The canonical root, if one is configured.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Canonicalize `input_path` and check it against the policy.
    ///
    /// The path must exist. With a root configured, the resolved path must be
    /// the root or lie beneath it; a symlink is rejected outright when
    /// symlinks are disabled.
    pub fn resolve(&self, input_path: &str) -> Result<PathBuf, PathSecurityError> {
        let path = Path::new(input_path);

        let is_symlink = path
            .symlink_metadata()
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false);

        if is_symlink && !self.allow_symlinks {
            return Err(PathSecurityError::SymlinkNotAllowed {
                path: path.to_path_buf(),
            });
        }

        let canonical = canonicalize_path(path)?;

        let Some(root) = &self.root else {
            return Ok(canonical);
        };

        if canonical.starts_with(root) {
            Ok(canonical)
        } else if is_symlink {
            Err(PathSecurityError::SymlinkOutsideRoot {
                path: path.to_path_buf(),
            })
        } else {
            Err(PathSecurityError::OutsideRootDirectory {
                path: canonical,
                root: root.clone(),
            })
        }
    }
}

/// Validates that a given path is within the configured security boundaries.
///
/// ```rust,ignore
/// let config = Config::from_env();
/// let safe_path = validate_path("/srv/tools/data.txt", &config)?;
/// ```
pub fn validate_path(input_path: &str, config: &Config) -> Result<PathBuf, PathSecurityError> {
    PathGuard::new(&config.security)?.resolve(input_path)
}

fn canonicalize_path(path: &Path) -> Result<PathBuf, PathSecurityError> {
    path.canonicalize().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PathSecurityError::PathNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PathSecurityError::CannotCanonicalize {
                path: path.to_path_buf(),
                error: e,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn guard(root: Option<&Path>, allow_symlinks: bool) -> PathGuard {
        PathGuard::new(&SecurityConfig {
            root_path: root.map(Path::to_path_buf),
            allow_symlinks,
        })
        .unwrap()
    }

    #[test]
    fn test_no_root_allows_existing_paths() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("test.txt");
        fs::write(&test_file, "test").unwrap();

        assert!(guard(None, true).resolve(test_file.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_root_is_canonical() {
        let root = TempDir::new().unwrap();
        let guard = guard(Some(root.path()), true);
        assert_eq!(guard.root(), Some(root.path().canonicalize().unwrap().as_path()));
        assert!(PathGuard::new(&SecurityConfig::default()).unwrap().root().is_none());
    }

    #[test]
    fn test_path_within_root() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("test.txt");
        fs::write(&test_file, "test").unwrap();

        let guard = guard(Some(temp_dir.path()), true);
        assert!(guard.resolve(test_file.to_str().unwrap()).is_ok());
        assert!(guard.resolve(temp_dir.path().to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_path_outside_root() {
        let root_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();
        let outside_file = outside_dir.path().join("outside.txt");
        fs::write(&outside_file, "test").unwrap();

        let result = guard(Some(root_dir.path()), true).resolve(outside_file.to_str().unwrap());
        assert!(matches!(
            result,
            Err(PathSecurityError::OutsideRootDirectory { .. })
        ));
    }

    #[test]
    fn test_path_traversal_blocked() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        fs::write(temp_dir.path().join("test.txt"), "test").unwrap();

        let traversal_path = subdir.join("../test.txt");
        let result = guard(Some(&subdir), true).resolve(traversal_path.to_str().unwrap());
        assert!(matches!(
            result,
            Err(PathSecurityError::OutsideRootDirectory { .. })
        ));
    }

    #[test]
    fn test_nonexistent_path() {
        let temp_dir = TempDir::new().unwrap();
        let nonexistent = temp_dir.path().join("does_not_exist.txt");

        let result = guard(Some(temp_dir.path()), true).resolve(nonexistent.to_str().unwrap());
        assert!(matches!(result, Err(PathSecurityError::PathNotFound { .. })));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let result = PathGuard::new(&SecurityConfig {
            root_path: Some(PathBuf::from("/definitely/not/a/real/root")),
            allow_symlinks: true,
        });
        assert!(matches!(result, Err(PathSecurityError::IoError { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_within_root() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let target_file = temp_dir.path().join("target.txt");
        let link_file = temp_dir.path().join("link.txt");
        fs::write(&target_file, "test").unwrap();
        symlink(&target_file, &link_file).unwrap();

        let result = guard(Some(temp_dir.path()), true).resolve(link_file.to_str().unwrap());
        assert!(result.is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_outside_root_blocked() {
        use std::os::unix::fs::symlink;

        let root_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();
        let target_file = outside_dir.path().join("target.txt");
        let link_file = root_dir.path().join("link.txt");
        fs::write(&target_file, "test").unwrap();
        symlink(&target_file, &link_file).unwrap();

        let result = guard(Some(root_dir.path()), true).resolve(link_file.to_str().unwrap());
        assert!(matches!(
            result,
            Err(PathSecurityError::SymlinkOutsideRoot { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_disallowed_by_config() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let target_file = temp_dir.path().join("target.txt");
        let link_file = temp_dir.path().join("link.txt");
        fs::write(&target_file, "test").unwrap();
        symlink(&target_file, &link_file).unwrap();

        let result = guard(Some(temp_dir.path()), false).resolve(link_file.to_str().unwrap());
        assert!(matches!(
            result,
            Err(PathSecurityError::SymlinkNotAllowed { .. })
        ));
    }

    #[test]
    fn test_validate_path_uses_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.security.root_path = Some(temp_dir.path().to_path_buf());

        assert!(validate_path(temp_dir.path().to_str().unwrap(), &config).is_ok());
        assert!(validate_path("/", &config).is_err());
    }
}
