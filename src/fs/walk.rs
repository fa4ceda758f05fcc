use ignore::WalkBuilder;
use std::path::Path;
use tracing::warn;

/// Directories never descended into: package-manager and build caches.
pub const DEPENDENCY_CACHE_DIRS: &[&str] = &["node_modules", "Pods", ".gradle", ".dart_tool"];

#[derive(Debug, Clone)]
pub struct WalkConfig {
    pub max_depth: usize,
    pub max_files: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_files: 20_000,
        }
    }
}

/// Lists regular files under `root` as sorted, `/`-separated relative paths.
///
/// Hidden entries and [`DEPENDENCY_CACHE_DIRS`] are skipped. `.gitignore`
/// rules are deliberately not applied since uploads are taken as-is.
pub fn list_files(root: &Path, config: &WalkConfig) -> Vec<String> {
    let mut files = Vec::new();

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(true)
        .follow_links(false)
        .max_depth(Some(config.max_depth))
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !DEPENDENCY_CACHE_DIRS.contains(&name.as_ref())
        })
        .build();

    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        if files.len() >= config.max_files {
            warn!(
                max_files = config.max_files,
                root = %root.display(),
                "Reached file limit, truncating listing"
            );
            break;
        }

        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(to_slash_path(relative));
        }
    }

    files.sort();
    files
}

pub(crate) fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
