use std::path::{Path, PathBuf};

const APP_DIR: &str = "wavedial";

#[cfg(unix)]
pub fn player_binary_name() -> &'static str {
    "mplayer"
}

#[cfg(windows)]
pub fn player_binary_name() -> &'static str {
    "mplayer.exe"
}

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/wavedial/ (XDG standard)
    // instead of macOS Application Support for consistency
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn config_dir() -> PathBuf {
    // On macOS and Linux, always use ~/.config/wavedial/
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_DIR)
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

fn find_beside_exe(name: &str) -> Option<PathBuf> {
    let current_exe = std::env::current_exe().ok()?;
    let dir = current_exe.parent()?;
    let p = dir.join(name);
    if p.is_file() {
        return Some(p);
    }
    None
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        let p = dir.join(name);
        if p.is_file() {
            return Some(p);
        }
        #[cfg(windows)]
        {
            let p = dir.join(format!("{}.exe", name));
            if p.is_file() {
                return Some(p);
            }
        }
    }
    None
}

/// Resolve a player executable the way a shell would.
///
/// Anything containing a path separator is taken literally; a bare name is
/// searched beside the current executable, then on `PATH`.
pub fn resolve_executable(name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let literal = Path::new(name);
    if literal.components().count() > 1 || literal.is_absolute() {
        let p = expand_home(literal);
        return p.is_file().then_some(p);
    }

    find_beside_exe(name).or_else(|| find_on_path(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_empty_name() {
        assert!(resolve_executable("").is_none());
    }

    #[test]
    fn test_resolve_missing_binary() {
        assert!(resolve_executable("definitely-not-a-real-player-binary-4711").is_none());
        assert!(resolve_executable("/nonexistent/dir/mplayer").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_shell_on_path() {
        let sh = resolve_executable("sh").expect("sh should be on PATH");
        assert!(sh.ends_with("sh"));
        assert!(resolve_executable("/bin/sh").is_some());
    }

    #[test]
    fn test_expand_home() {
        let plain = expand_home(Path::new("/etc/stations.csv"));
        assert_eq!(plain, PathBuf::from("/etc/stations.csv"));

        if let Some(home) = dirs::home_dir() {
            let expanded = expand_home(Path::new("~/radio/stations.csv"));
            assert_eq!(expanded, home.join("radio/stations.csv"));
        }
    }
}
