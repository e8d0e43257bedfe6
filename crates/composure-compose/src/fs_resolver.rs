//! Filesystem [`FileResolver`] confined to a project directory.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use composure_common::types::EnvFilePath;

use crate::env_file::{EnvFileStream, FileResolver};

/// Opens env files below a project root.
///
/// Paths are resolved with symbolic links followed; a file whose real
/// location is outside the root is refused even if its link is inside.
#[derive(Debug, Clone)]
pub struct ProjectFileResolver {
    root: PathBuf,
}

impl ProjectFileResolver {
    /// Creates a resolver rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `root` does not exist or cannot be resolved.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = std::fs::canonicalize(root.as_ref())?;
        tracing::debug!(root = %root.display(), "project file resolver ready");
        Ok(Self { root })
    }

    /// Returns the canonical project root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl FileResolver for ProjectFileResolver {
    async fn resolve(&self, path: &EnvFilePath) -> io::Result<EnvFileStream> {
        let candidate = self.root.join(path.as_str());
        let real = tokio::fs::canonicalize(&candidate).await?;
        if !real.starts_with(&self.root) {
            tracing::debug!(path = %path, real = %real.display(), "env file escapes project root");
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("'{path}' resolves outside the project directory"),
            ));
        }
        if !tokio::fs::metadata(&real).await?.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{path}' is not a regular file"),
            ));
        }
        let file = tokio::fs::File::open(&real).await?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    fn env_path(raw: &str) -> EnvFilePath {
        EnvFilePath::parse(raw).expect("valid env path")
    }

    async fn read(resolver: &ProjectFileResolver, raw: &str) -> io::Result<String> {
        let mut stream = resolver.resolve(&env_path(raw)).await?;
        let mut content = String::new();
        let _ = stream.read_to_string(&mut content).await?;
        Ok(content)
    }

    #[tokio::test]
    async fn reads_file_inside_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("conf")).expect("mkdir");
        std::fs::write(dir.path().join("conf/app.env"), "A=1\n").expect("write");

        let resolver = ProjectFileResolver::new(dir.path()).expect("resolver");
        let content = read(&resolver, "conf/app.env").await.expect("read");
        assert_eq!(content, "A=1\n");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resolver = ProjectFileResolver::new(dir.path()).expect("resolver");
        let err = read(&resolver, "absent.env").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn directory_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("conf")).expect("mkdir");
        let resolver = ProjectFileResolver::new(dir.path()).expect("resolver");
        let err = read(&resolver, "conf").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_escape_is_refused() {
        let outside = tempfile::tempdir().expect("tempdir");
        std::fs::write(outside.path().join("secret.env"), "TOKEN=x\n").expect("write");
        let project = tempfile::tempdir().expect("tempdir");
        std::os::unix::fs::symlink(
            outside.path().join("secret.env"),
            project.path().join("linked.env"),
        )
        .expect("symlink");

        let resolver = ProjectFileResolver::new(project.path()).expect("resolver");
        let err = read(&resolver, "linked.env").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_inside_root_is_followed() {
        let project = tempfile::tempdir().expect("tempdir");
        std::fs::write(project.path().join("real.env"), "B=2\n").expect("write");
        std::os::unix::fs::symlink(
            project.path().join("real.env"),
            project.path().join("alias.env"),
        )
        .expect("symlink");

        let resolver = ProjectFileResolver::new(project.path()).expect("resolver");
        assert_eq!(read(&resolver, "alias.env").await.expect("read"), "B=2\n");
    }

    #[test]
    fn missing_root_fails() {
        assert!(ProjectFileResolver::new("/nonexistent/composure/root").is_err());
    }
}
