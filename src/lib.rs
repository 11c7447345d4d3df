use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

pub mod buildinfo;
pub mod commands;
pub mod label;
pub mod report;

/// Environment variable consulted when no root path is given on the command line.
pub const ROOT_ENV: &str = "GITTY_PATH";

pub fn resolve_root(provided_dir: Option<PathBuf>) -> PathBuf {
    root_or_default(provided_dir, env::var_os(ROOT_ENV))
}

fn root_or_default(provided_dir: Option<PathBuf>, from_env: Option<OsString>) -> PathBuf {
    match provided_dir {
        Some(dir) => dir,
        None => from_env
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_root_prefers_provided_dir() {
        let root = resolve_root(Some(PathBuf::from("/tmp/repos")));
        assert_eq!(root, PathBuf::from("/tmp/repos"));
    }

    #[test]
    fn test_provided_dir_wins_over_env() {
        let root = root_or_default(
            Some(PathBuf::from("/tmp/repos")),
            Some(OsString::from("/srv/repos")),
        );
        assert_eq!(root, PathBuf::from("/tmp/repos"));
    }

    #[test]
    fn test_env_fallback() {
        let root = root_or_default(None, Some(OsString::from("/srv/repos")));
        assert_eq!(root, PathBuf::from("/srv/repos"));
    }

    #[test]
    fn test_empty_env_falls_back_to_current_dir() {
        assert_eq!(root_or_default(None, Some(OsString::new())), PathBuf::from("."));
        assert_eq!(root_or_default(None, None), PathBuf::from("."));
    }
}
