//! Resolves site-relative paths against a Next.js-style source tree.
//!
//! A path resolves when any of these exist under the project root (also
//! under `src/`):
//!
//! - `public/<path>` as a file
//! - `app/<path>/page.<ext>`, where directories named `[param]` match any
//!   segment, `[...rest]` / `[[...rest]]` match the remainder, and `(group)`
//!   directories are transparent
//! - `pages/<path>.<ext>` or `pages/<path>/index.<ext>`, with the same
//!   dynamic segment rules

use std::fs;
use std::path::Path;

const PAGE_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js", "mdx", "md"];
const PREFIXES: &[&str] = &["", "src"];

/// True if `path` (e.g. `/services/roofing`) maps to a file or route under `root`.
pub fn resolves(root: &Path, path: &str) -> bool {
    let trimmed = path.trim_start_matches("./").trim_matches('/');
    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

    if segments.iter().any(|s| *s == "..") {
        return false;
    }

    if !segments.is_empty() && root.join("public").join(trimmed).is_file() {
        return true;
    }

    PREFIXES.iter().any(|prefix| {
        let base = root.join(prefix);
        app_route(&base.join("app"), &segments) || pages_route(&base.join("pages"), &segments)
    })
}

fn has_page_file(dir: &Path, stem: &str) -> bool {
    PAGE_EXTENSIONS
        .iter()
        .any(|ext| dir.join(format!("{stem}.{ext}")).is_file())
}

fn child_dirs(dir: &Path) -> Vec<(String, std::path::PathBuf)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .map(|e| (e.file_name().to_string_lossy().into_owned(), e.path()))
        .collect()
}

fn is_catch_all(name: &str) -> bool {
    name.starts_with("[...") || name.starts_with("[[...")
}

fn is_dynamic(name: &str) -> bool {
    name.starts_with('[') && name.ends_with(']') && !is_catch_all(name)
}

fn is_group(name: &str) -> bool {
    name.starts_with('(') && name.ends_with(')')
}

fn app_route(dir: &Path, segments: &[&str]) -> bool {
    if !dir.is_dir() {
        return false;
    }

    let Some((head, rest)) = segments.split_first() else {
        if has_page_file(dir, "page") {
            return true;
        }
        // Optional catch-all also matches the bare parent path.
        return child_dirs(dir).iter().any(|(name, path)| {
            (name.starts_with("[[...") && has_page_file(path, "page"))
                || (is_group(name) && app_route(path, segments))
        });
    };

    if app_route(&dir.join(head), rest) {
        return true;
    }

    child_dirs(dir).iter().any(|(name, path)| {
        if is_group(name) {
            app_route(path, segments)
        } else if is_catch_all(name) {
            has_page_file(path, "page")
        } else if is_dynamic(name) {
            app_route(path, rest)
        } else {
            false
        }
    })
}

fn pages_route(dir: &Path, segments: &[&str]) -> bool {
    if !dir.is_dir() {
        return false;
    }

    let Some((head, rest)) = segments.split_first() else {
        return has_page_file(dir, "index");
    };

    if rest.is_empty() && has_page_file(dir, head) {
        return true;
    }
    if pages_route(&dir.join(head), rest) {
        return true;
    }

    let dynamic_file = fs::read_dir(dir).ok().is_some_and(|entries| {
        entries.filter_map(Result::ok).any(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            let stem = name.rsplit_once('.').map_or(name.as_str(), |(s, _)| s);
            let is_page = e.path().is_file()
                && Path::new(&name)
                    .extension()
                    .and_then(|x| x.to_str())
                    .is_some_and(|x| PAGE_EXTENSIONS.contains(&x));
            is_page && ((rest.is_empty() && is_dynamic(stem)) || is_catch_all(stem))
        })
    });
    if dynamic_file {
        return true;
    }

    child_dirs(dir).iter().any(|(name, path)| {
        if is_catch_all(name) {
            has_page_file(path, "index")
        } else if is_dynamic(name) {
            pages_route(path, rest)
        } else {
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_public_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "public/files/brochure.pdf");
        assert!(resolves(dir.path(), "/files/brochure.pdf"));
        assert!(!resolves(dir.path(), "/files/missing.pdf"));
    }

    #[test]
    fn test_app_router_static_and_root() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "app/page.tsx");
        touch(dir.path(), "app/services/page.tsx");
        assert!(resolves(dir.path(), "/"));
        assert!(resolves(dir.path(), "/services"));
        assert!(resolves(dir.path(), "/services/"));
        assert!(!resolves(dir.path(), "/servces"));
    }

    #[test]
    fn test_app_router_dynamic_groups_and_catch_all() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/app/(marketing)/about/page.tsx");
        touch(dir.path(), "app/blog/[slug]/page.tsx");
        touch(dir.path(), "app/docs/[...path]/page.mdx");
        assert!(resolves(dir.path(), "/about"));
        assert!(resolves(dir.path(), "/blog/first-post"));
        assert!(!resolves(dir.path(), "/blog/first-post/comments"));
        assert!(resolves(dir.path(), "/docs/a/b/c"));
    }

    #[test]
    fn test_pages_router() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "pages/index.tsx");
        touch(dir.path(), "pages/contact.tsx");
        touch(dir.path(), "pages/team/index.jsx");
        touch(dir.path(), "pages/posts/[id].tsx");
        assert!(resolves(dir.path(), "/"));
        assert!(resolves(dir.path(), "/contact"));
        assert!(resolves(dir.path(), "/team"));
        assert!(resolves(dir.path(), "/posts/42"));
        assert!(!resolves(dir.path(), "/careers"));
    }

    #[test]
    fn test_parent_segments_never_resolve() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "secret.md");
        assert!(!resolves(dir.path(), "/../secret.md"));
    }
}
