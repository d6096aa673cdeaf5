use std::path::{Component, Path, PathBuf};

use anyhow::Context;

/// Path relative to `root`, joined with forward slashes regardless of the
/// host separator.
pub fn rel_path_slash(root: &Path, path: &Path) -> anyhow::Result<String> {
    let rel = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
    let mut parts = Vec::new();
    for component in rel.components() {
        let part = component
            .as_os_str()
            .to_str()
            .with_context(|| format!("non-utf8 path component in {}", path.display()))?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

/// Lexically resolves `.` and `..` components without touching the
/// filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_use_forward_slashes() {
        let rel = rel_path_slash(Path::new("/repo"), Path::new("/repo/lectures/1.1/intro.ipynb"));
        assert_eq!(rel.unwrap(), "lectures/1.1/intro.ipynb");
    }

    #[test]
    fn paths_outside_the_root_are_rejected() {
        assert!(rel_path_slash(Path::new("/repo"), Path::new("/elsewhere/x.ipynb")).is_err());
    }

    #[test]
    fn normalization_resolves_dot_and_dotdot() {
        assert_eq!(
            normalize_path(Path::new("lectures/1.1/./figures/../img.png")),
            PathBuf::from("lectures/1.1/img.png")
        );
    }
}
