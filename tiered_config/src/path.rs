//! Filesystem path helpers shared by file-backed sources.

use std::path::{Path, PathBuf};

/// Expand a leading `~` to the current user's home directory.
///
/// Only the bare `~` and `~/…` forms are expanded; `~user` is returned
/// unchanged, as is every path when no home directory can be determined.
#[must_use]
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) if rest.as_os_str().is_empty() => home,
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Create the parent directory of `path` if it does not already exist.
pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::expand_home;
    use rstest::rstest;
    use std::path::{Path, PathBuf};

    #[rstest]
    #[case("/etc/app/config.toml")]
    #[case("relative/config.json")]
    #[case("~other/config.json")]
    fn leaves_other_paths_alone(#[case] raw: &str) {
        assert_eq!(expand_home(Path::new(raw)), PathBuf::from(raw));
    }

    #[rstest]
    fn expands_tilde_prefix() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_home(Path::new("~/app.toml")), home.join("app.toml"));
        assert_eq!(expand_home(Path::new("~")), home);
    }
}
