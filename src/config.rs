use std::path::{Path, PathBuf};

use crate::state;

/// Directory under the repository root holding per-video folders.
pub const VIDEOS_DIR: &str = "videos";

/// Runtime configuration shared by all commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub repo: PathBuf,
    pub state_path: PathBuf,
}

pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Config {
    pub fn from_cli(cli: &crate::cli::Cli) -> Self {
        Self::for_repo(&expand_tilde(&cli.repo))
    }

    pub fn for_repo(repo: &Path) -> Self {
        Self {
            repo: repo.to_path_buf(),
            state_path: state::state_path(repo),
        }
    }

    /// Default root for content verification.
    pub fn videos_dir(&self) -> PathBuf {
        self.repo.join(VIDEOS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_with_home() {
        let result = expand_tilde("~/archive");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(result, home.join("archive"));
        }
    }

    #[test]
    fn test_expand_tilde_no_prefix() {
        assert_eq!(expand_tilde("/srv/archive"), PathBuf::from("/srv/archive"));
        assert_eq!(expand_tilde("relative/path"), PathBuf::from("relative/path"));
    }

    #[test]
    fn test_from_cli_paths() {
        use clap::Parser;
        let cli =
            crate::cli::Cli::try_parse_from(["annextube-rs", "--repo", "/srv/archive", "status"])
                .unwrap();
        let cfg = Config::from_cli(&cli);
        assert_eq!(cfg.repo, PathBuf::from("/srv/archive"));
        assert_eq!(
            cfg.state_path,
            PathBuf::from("/srv/archive/.annextube/sync_state.json")
        );
        assert_eq!(cfg.videos_dir(), PathBuf::from("/srv/archive/videos"));
    }
}
