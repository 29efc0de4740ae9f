use std::path::{Path, PathBuf};

use archgraph_core::config::FrontendSection;
use tracing::{debug, warn};

use crate::Result;

/// Files under `root` matching any include pattern and no exclude pattern,
/// restricted to the given extensions. Sorted and deduplicated.
pub fn discover_sources(
    root: &Path,
    section: &FrontendSection,
    extensions: &[&str],
) -> Result<Vec<PathBuf>> {
    let excludes = section
        .exclude_patterns
        .iter()
        .map(|p| glob::Pattern::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut matched = Vec::new();
    for pattern in &section.include_patterns {
        let full_pattern = root.join(pattern).to_string_lossy().to_string();
        let paths = glob::glob(&full_pattern)?;
        for entry in paths {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "Unreadable path skipped");
                    continue;
                }
            };
            if entry.is_file()
                && has_extension(&entry, extensions)
                && !is_excluded(&entry, root, &excludes)
            {
                matched.push(entry);
            }
        }
    }

    matched.sort();
    matched.dedup();
    debug!(root = %root.display(), files = matched.len(), "Discovered sources");
    Ok(matched)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}

fn is_excluded(path: &Path, root: &Path, excludes: &[glob::Pattern]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    excludes.iter().any(|p| p.matches_path(relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrontendError;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "package x\n").unwrap();
    }

    #[test]
    fn include_and_exclude_patterns() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "main.go");
        touch(dir.path(), "pkg/util/util.go");
        touch(dir.path(), "vendor/dep/dep.go");
        touch(dir.path(), "pkg/testdata/fixture.go");
        touch(dir.path(), "README.md");

        let files = discover_sources(dir.path(), &FrontendSection::default(), &["go"]).unwrap();
        let rel: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(rel, vec!["main.go", "pkg/util/util.go"]);
    }

    #[test]
    fn overlapping_includes_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.go");
        let section = FrontendSection {
            include_patterns: vec!["*.go".into(), "**/*.go".into()],
            exclude_patterns: Vec::new(),
        };
        assert_eq!(discover_sources(dir.path(), &section, &["go"]).unwrap().len(), 1);
    }

    #[test]
    fn bad_exclude_pattern_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let section = FrontendSection {
            include_patterns: vec!["**/*.go".into()],
            exclude_patterns: vec!["[".into()],
        };
        assert!(matches!(
            discover_sources(dir.path(), &section, &["go"]),
            Err(FrontendError::Pattern(_))
        ));
    }
}
