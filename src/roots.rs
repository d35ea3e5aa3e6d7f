//! Project root expansion
//!
//! Folds packages linked into `node_modules` (e.g. via `npm link` or
//! `yarn link`) into the list of project roots so the packager can see them.

use crate::utils::resolve_link_target;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Discovers module directories that are symlinked into a project root.
pub trait SymlinkFinder: Send + Sync {
    /// Return the link targets found under `root`. `roots` is the full list
    /// of declared roots so targets pointing back at them can be skipped.
    fn find_symlinked_modules(&self, root: &Path, roots: &[PathBuf]) -> Vec<PathBuf>;
}

/// Append each root's symlinked modules after the original roots.
///
/// Never removes or reorders a root and does not deduplicate.
pub fn resolve_symlinks_for_roots(roots: &[PathBuf], finder: &dyn SymlinkFinder) -> Vec<PathBuf> {
    let mut resolved = roots.to_vec();
    for root in roots {
        let links = finder.find_symlinked_modules(root, roots);
        debug!("Found {} symlinked modules under {}", links.len(), root.display());
        resolved.extend(links);
    }
    resolved
}

/// Scans `<root>/node_modules` (including `@scope` directories) for
/// symlinks, then repeats the scan inside each link target.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeModulesSymlinkFinder;

impl SymlinkFinder for NodeModulesSymlinkFinder {
    fn find_symlinked_modules(&self, root: &Path, roots: &[PathBuf]) -> Vec<PathBuf> {
        let mut ignored = Vec::with_capacity(2 * (roots.len() + 1));
        for declared in std::iter::once(root).chain(roots.iter().map(PathBuf::as_path)) {
            ignored.push(declared.to_path_buf());
            ignored.push(real_path(declared));
        }

        let mut found = Vec::new();
        find_module_symlinks(&root.join("node_modules"), &mut ignored, &mut found);
        found
    }
}

/// The fully resolved form of `path`, or `path` itself when it does not
/// exist.
fn real_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn find_module_symlinks(modules_dir: &Path, ignored: &mut Vec<PathBuf>, found: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(modules_dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    let mut candidates = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_scope = entry.file_name().to_string_lossy().starts_with('@');
        if is_scope && path.is_dir() {
            match fs::read_dir(&path) {
                Ok(scoped) => candidates.extend(scoped.flatten().map(|e| e.path())),
                Err(e) => warn!("Failed to read {}: {}", path.display(), e),
            }
        } else {
            candidates.push(path);
        }
    }
    candidates.sort();

    let mut level = Vec::new();
    for candidate in candidates {
        let is_link = fs::symlink_metadata(&candidate)
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false);
        if !is_link {
            continue;
        }

        // Dangling links fall back to their lexical target.
        let target = match fs::canonicalize(&candidate) {
            Ok(real) => real,
            Err(_) => match fs::read_link(&candidate) {
                Ok(target) => resolve_link_target(&candidate, &target),
                Err(e) => {
                    warn!("Failed to read link {}: {}", candidate.display(), e);
                    continue;
                }
            },
        };

        if ignored.contains(&target) || found.contains(&target) || level.contains(&target) {
            continue;
        }
        debug!("{} -> {}", candidate.display(), target.display());
        level.push(target);
    }

    ignored.extend(level.iter().cloned());
    found.extend(level.iter().cloned());

    for target in level {
        find_module_symlinks(&target.join("node_modules"), ignored, found);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns `<root>/linked-a` and `<root>/linked-b` for every root.
    struct FixedFinder;

    impl SymlinkFinder for FixedFinder {
        fn find_symlinked_modules(&self, root: &Path, _roots: &[PathBuf]) -> Vec<PathBuf> {
            vec![root.join("linked-a"), root.join("linked-b")]
        }
    }

    struct NoLinks;

    impl SymlinkFinder for NoLinks {
        fn find_symlinked_modules(&self, _root: &Path, _roots: &[PathBuf]) -> Vec<PathBuf> {
            Vec::new()
        }
    }

    #[test]
    fn test_empty_roots() {
        assert!(resolve_symlinks_for_roots(&[], &FixedFinder).is_empty());
    }

    #[test]
    fn test_originals_first_then_links_per_root() {
        let roots = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        let resolved = resolve_symlinks_for_roots(&roots, &FixedFinder);

        assert_eq!(
            resolved,
            vec![
                PathBuf::from("/a"),
                PathBuf::from("/b"),
                PathBuf::from("/a/linked-a"),
                PathBuf::from("/a/linked-b"),
                PathBuf::from("/b/linked-a"),
                PathBuf::from("/b/linked-b"),
            ]
        );
    }

    #[test]
    fn test_no_links_keeps_roots() {
        let roots = vec![PathBuf::from("/a"), PathBuf::from("/a")];
        assert_eq!(resolve_symlinks_for_roots(&roots, &NoLinks), roots);
    }

    #[test]
    fn test_missing_node_modules() {
        let temp = tempfile::TempDir::new().unwrap();
        let links = NodeModulesSymlinkFinder.find_symlinked_modules(temp.path(), &[]);
        assert!(links.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_node_modules_symlinks() {
        use std::os::unix::fs::symlink;

        let temp = tempfile::TempDir::new().unwrap();
        let base = fs::canonicalize(temp.path()).unwrap();
        let app = base.join("app");
        let shared = base.join("shared");
        let scoped = base.join("ui-kit");
        let nested = base.join("nested");
        for dir in [&app, &shared, &scoped, &nested] {
            fs::create_dir_all(dir).unwrap();
        }

        let modules = app.join("node_modules");
        fs::create_dir_all(modules.join("regular")).unwrap();
        fs::create_dir_all(modules.join("@acme")).unwrap();
        symlink("../../shared", modules.join("shared")).unwrap();
        symlink(&scoped, modules.join("@acme").join("ui-kit")).unwrap();
        // Points back at the app itself.
        symlink("..", modules.join("self")).unwrap();

        fs::create_dir_all(shared.join("node_modules")).unwrap();
        symlink(&nested, shared.join("node_modules").join("nested")).unwrap();

        let links = NodeModulesSymlinkFinder.find_symlinked_modules(&app, &[app.clone()]);

        assert_eq!(links.len(), 3);
        assert!(links.contains(&shared));
        assert!(links.contains(&scoped));
        assert!(links.contains(&nested));
        assert!(!links.contains(&app));
        // Nested discoveries come after the first level.
        assert_eq!(links[2], nested);
    }

    #[cfg(unix)]
    #[test]
    fn test_links_to_declared_roots_are_skipped() {
        use std::os::unix::fs::symlink;

        let temp = tempfile::TempDir::new().unwrap();
        let base = fs::canonicalize(temp.path()).unwrap();
        let app = base.join("app");
        let lib = base.join("lib");
        fs::create_dir_all(app.join("node_modules")).unwrap();
        fs::create_dir_all(&lib).unwrap();
        symlink(&lib, app.join("node_modules").join("lib")).unwrap();

        let roots = vec![app.clone(), lib.clone()];
        assert!(NodeModulesSymlinkFinder.find_symlinked_modules(&app, &roots).is_empty());
        assert_eq!(
            NodeModulesSymlinkFinder.find_symlinked_modules(&app, &[app.clone()]),
            vec![lib]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_link_chains_resolve_to_real_directory() {
        use std::os::unix::fs::symlink;

        let temp = tempfile::TempDir::new().unwrap();
        let base = fs::canonicalize(temp.path()).unwrap();
        let app = base.join("app");
        let lib = base.join("packages").join("lib");
        fs::create_dir_all(app.join("node_modules")).unwrap();
        fs::create_dir_all(&lib).unwrap();
        // app/node_modules/lib -> alias -> packages/lib
        symlink(&lib, base.join("alias")).unwrap();
        symlink("../../alias", app.join("node_modules").join("lib")).unwrap();
        // `..` after a link component climbs from the real directory.
        symlink("../../alias/../shared", app.join("node_modules").join("shared")).unwrap();
        fs::create_dir_all(base.join("packages").join("shared")).unwrap();

        let links = NodeModulesSymlinkFinder.find_symlinked_modules(&app, &[app.clone()]);
        assert_eq!(links, vec![lib.clone(), base.join("packages").join("shared")]);

        // A declared root reached through the alias is still recognized.
        let roots = vec![app.clone(), lib];
        assert_eq!(
            NodeModulesSymlinkFinder.find_symlinked_modules(&app, &roots),
            vec![base.join("packages").join("shared")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_keeps_lexical_target() {
        use std::os::unix::fs::symlink;

        let temp = tempfile::TempDir::new().unwrap();
        let base = fs::canonicalize(temp.path()).unwrap();
        let app = base.join("app");
        fs::create_dir_all(app.join("node_modules")).unwrap();
        symlink("../../gone", app.join("node_modules").join("gone")).unwrap();

        assert_eq!(
            NodeModulesSymlinkFinder.find_symlinked_modules(&app, &[app.clone()]),
            vec![base.join("gone")]
        );
    }
}
