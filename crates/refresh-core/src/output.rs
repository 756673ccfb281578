use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::RefreshError;
use crate::models::manifest::RefreshManifest;

/// Clean an output path and resolve it against the working directory.
///
/// `.` components are dropped and `dir/..` pairs collapse. A `..` that would
/// climb above the start of a relative path is rejected.
pub fn sanitize_output_path(raw: &Path) -> Result<PathBuf, RefreshError> {
    sanitize_in(raw, &std::env::current_dir()?)
}

/// Like [`sanitize_output_path`] with an explicit base for relative paths.
pub fn sanitize_in(raw: &Path, base: &Path) -> Result<PathBuf, RefreshError> {
    let invalid = |message: &str| RefreshError::InvalidOutputPath {
        path: raw.to_path_buf(),
        message: message.to_string(),
    };

    let mut cleaned = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => return Err(invalid("path contains directory traversal")),
            },
            other => cleaned.push(other.as_os_str()),
        }
    }

    if cleaned.file_name().is_none() {
        return Err(invalid("path does not name a file"));
    }
    if cleaned.is_absolute() {
        Ok(cleaned)
    } else {
        Ok(base.join(cleaned))
    }
}

/// Write the manifest as pretty-printed JSON, readable by the owner only.
pub fn write_manifest(path: &Path, manifest: &RefreshManifest) -> Result<(), RefreshError> {
    let json = manifest.to_json_pretty()?;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;

    // `mode` only applies when the file is created.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(json.as_bytes())?;
    file.flush()?;
    tracing::debug!(path = %path.display(), bytes = json.len(), "manifest written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_resolves_against_base() {
        let base = Path::new("/work");
        assert_eq!(
            sanitize_in(Path::new("out.json"), base).unwrap(),
            PathBuf::from("/work/out.json")
        );
        assert_eq!(
            sanitize_in(Path::new("./reports/../out.json"), base).unwrap(),
            PathBuf::from("/work/out.json")
        );
    }

    #[test]
    fn test_absolute_path_is_cleaned() {
        let base = Path::new("/work");
        assert_eq!(
            sanitize_in(Path::new("/tmp/./a/../out.json"), base).unwrap(),
            PathBuf::from("/tmp/out.json")
        );
    }

    #[test]
    fn test_traversal_is_rejected() {
        let base = Path::new("/work");
        for raw in ["../out.json", "a/../../out.json", "..", "."] {
            let err = sanitize_in(Path::new(raw), base).unwrap_err();
            assert!(matches!(err, RefreshError::InvalidOutputPath { .. }), "{raw}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_manifest_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, "stale").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_manifest(&path, &RefreshManifest::new(Some("g-1".into()))).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["groupId"], "g-1");
    }
}
