use std::path::PathBuf;

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

pub fn fixtures_root() -> PathBuf {
    workspace_root().join("fixtures")
}

pub fn fixture_dir(name: &str) -> PathBuf {
    fixtures_root().join(name)
}

pub fn testcase_path(name: &str) -> PathBuf {
    fixture_dir(name).join("testcase.json")
}

/// Every fixture directory, sorted by name.
pub fn fixture_dirs() -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(fixtures_root()) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_root_points_to_workspace() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }

    #[test]
    fn fixtures_root_points_to_fixtures_directory() {
        assert!(fixtures_root().is_dir());
    }

    #[test]
    fn fixture_dir_joins_name() {
        assert!(fixture_dir("01-greeting").is_dir());
    }

    #[test]
    fn testcase_path_joins_default_filename() {
        let path = testcase_path("01-greeting");
        assert!(path.ends_with("testcase.json"));
        assert!(path.is_file());
    }

    #[test]
    fn fixture_dirs_lists_sorted_directories() {
        let dirs = fixture_dirs();
        assert!(!dirs.is_empty());
        assert!(dirs.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
