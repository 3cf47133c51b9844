use crate::config::WalkerConfig;
use crate::core::ParseWarning;
use crate::errors::Result;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directory names that are never descended into.
pub const EXCLUDED_DIRS: &[&str] =
    &["node_modules", ".git", "dist", "build", "target", "bin", "obj"];

pub fn is_excluded_dir(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name)
}

/// Depth-first, pre-order walker over a repository tree.
///
/// The root itself is never visited. Children are visited in file-name
/// order. Symlinks are followed by default; a link that leads back to one
/// of its own ancestors is reported as a warning and not descended.
pub struct DirectoryWalker {
    root: PathBuf,
    excluded: Vec<String>,
    ignore_patterns: Vec<glob::Pattern>,
    include_dirs: bool,
    follow_symlinks: bool,
}

impl DirectoryWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded: EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect(),
            ignore_patterns: Vec::new(),
            include_dirs: false,
            follow_symlinks: true,
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &WalkerConfig) -> Result<Self> {
        Ok(Self::new(root)
            .with_excluded_dirs(config.exclude_dirs.iter().cloned())
            .with_ignore_patterns(&config.ignore_patterns)?
            .follow_symlinks(config.follow_symlinks))
    }

    pub fn with_excluded_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(dirs.into_iter().map(Into::into));
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: &[String]) -> Result<Self> {
        for pattern in patterns {
            self.ignore_patterns.push(glob::Pattern::new(pattern)?);
        }
        Ok(self)
    }

    pub fn include_dirs(mut self, include: bool) -> Self {
        self.include_dirs = include;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Invoke `visit` once per matched path and return the warnings met on
    /// the way (unreadable entries, symlink cycles).
    pub fn walk<F>(&self, mut visit: F) -> Vec<ParseWarning>
    where
        F: FnMut(&Path),
    {
        let mut warnings = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_pruned(entry));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let is_dir = entry.file_type().is_dir();
                    if !is_dir || self.include_dirs {
                        visit(entry.path());
                    }
                }
                Err(err) => warnings.push(walk_warning(&err)),
            }
        }

        warnings
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if entry.file_type().is_dir() {
            let name = entry.file_name().to_string_lossy();
            if self.excluded.iter().any(|excluded| *excluded == name) {
                tracing::trace!("Skipping excluded directory {}", entry.path().display());
                return true;
            }
        }

        if self.ignore_patterns.is_empty() {
            return false;
        }
        let relative = entry
            .path()
            .strip_prefix(&self.root)
            .unwrap_or(entry.path())
            .to_string_lossy();
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches(&relative))
    }
}

fn walk_warning(err: &walkdir::Error) -> ParseWarning {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    match err.loop_ancestor() {
        Some(ancestor) => ParseWarning::at(
            "walker",
            path,
            format!(
                "symlink cycle back to {}; not descending",
                ancestor.display()
            ),
        ),
        None => ParseWarning::at("walker", path, err.to_string()),
    }
}

/// Collect every file under `root` with the default exclusion set, together
/// with the warnings met on the way.
pub fn walk_collect(root: &Path) -> (Vec<PathBuf>, Vec<ParseWarning>) {
    let mut files = Vec::new();
    let warnings = DirectoryWalker::new(root).walk(|p| files.push(p.to_path_buf()));
    (files, warnings)
}

/// Walk `root` with the default exclusion set, invoking `visit` for every
/// file (and every directory when `include_dirs` is set). Warnings are
/// logged, not returned.
pub fn walk<F>(root: &Path, include_dirs: bool, visit: F)
where
    F: FnMut(&Path),
{
    let warnings = DirectoryWalker::new(root)
        .include_dirs(include_dirs)
        .walk(visit);
    for warning in warnings {
        tracing::warn!("{}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree(files: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for file in files {
            let path = temp.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "x").unwrap();
        }
        temp
    }

    fn relative(root: &Path, visited: Vec<PathBuf>) -> Vec<String> {
        visited
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_walk_skips_excluded_directories() {
        let temp = tree(&[
            "src/main.js",
            "node_modules/lodash/index.js",
            ".git/HEAD",
            "dist/bundle.js",
            "nested/build/out.o",
            "README.md",
        ]);

        let mut visited = Vec::new();
        walk(temp.path(), false, |p| visited.push(p.to_path_buf()));

        assert_eq!(
            relative(temp.path(), visited),
            vec!["README.md".to_string(), "src/main.js".to_string()]
        );
    }

    #[test]
    fn test_include_dirs_visits_directories_before_children() {
        let temp = tree(&["docs/guide.md", "src/lib/util.js"]);

        let mut visited = Vec::new();
        walk(temp.path(), true, |p| visited.push(p.to_path_buf()));

        assert_eq!(
            relative(temp.path(), visited),
            vec!["docs", "docs/guide.md", "src", "src/lib", "src/lib/util.js"]
        );
    }

    #[test]
    fn test_configured_exclusions_and_patterns() {
        let temp = tree(&["vendor/a.js", "app.min.js", "app.js"]);

        let mut visited = Vec::new();
        let walker = DirectoryWalker::new(temp.path())
            .with_excluded_dirs(["vendor"])
            .with_ignore_patterns(&["*.min.js".to_string()])
            .unwrap();
        let warnings = walker.walk(|p| visited.push(p.to_path_buf()));

        assert!(warnings.is_empty());
        assert_eq!(relative(temp.path(), visited), vec!["app.js"]);
    }

    #[test]
    fn test_root_named_like_excluded_dir_is_still_walked() {
        let temp = tree(&["build/main.js"]);
        let root = temp.path().join("build");

        let mut visited = Vec::new();
        walk(&root, false, |p| visited.push(p.to_path_buf()));

        assert_eq!(visited.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_is_reported_not_followed() {
        let temp = tree(&["a/file.txt"]);
        std::os::unix::fs::symlink(temp.path().join("a"), temp.path().join("a/loop")).unwrap();

        let mut visited = Vec::new();
        let warnings = DirectoryWalker::new(temp.path()).walk(|p| visited.push(p.to_path_buf()));

        assert_eq!(relative(temp.path(), visited), vec!["a/file.txt"]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("symlink cycle"));
    }
}
