//! File classification and derived project metrics

use super::types::{ProjectStats, SizeBucket, SourceStructure};
use crate::stack::FrameworkId;

const TEST_MARKERS: &[&str] = &[".test.js", ".test.ts", ".spec.js", ".spec.ts", "_test.dart"];
const SOURCE_EXTENSIONS: &[&str] = &[
    ".js", ".jsx", ".ts", ".tsx", ".dart", ".java", ".kt", ".swift", ".m", ".h",
];
const ASSET_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".ttf", ".otf", ".woff", ".woff2",
];
const CONFIG_EXTENSIONS: &[&str] = &[
    ".json", ".yaml", ".yml", ".xml", ".gradle", ".properties", ".plist",
];
const ASSET_DIRS: &[&str] = &["assets/", "images/", "fonts/"];
const RESOURCE_DIRS: &[&str] = &[
    "android/app/src/main/res/",
    "app/src/main/res/",
    "Assets.xcassets/",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Test,
    Source,
    Asset,
    Config,
    Other,
}

fn has_extension(path: &str, extensions: &[&str]) -> bool {
    let lower = path.to_ascii_lowercase();
    extensions.iter().any(|ext| lower.ends_with(ext))
}

/// Test markers take priority over source extensions.
pub fn classify(path: &str) -> FileKind {
    if TEST_MARKERS.iter().any(|marker| path.contains(marker)) {
        FileKind::Test
    } else if has_extension(path, SOURCE_EXTENSIONS) {
        FileKind::Source
    } else if has_extension(path, ASSET_EXTENSIONS) {
        FileKind::Asset
    } else if has_extension(path, CONFIG_EXTENSIONS) {
        FileKind::Config
    } else {
        FileKind::Other
    }
}

pub fn tally(files: &[String]) -> ProjectStats {
    let mut stats = ProjectStats {
        total_files: files.len(),
        ..Default::default()
    };

    for file in files {
        match classify(file) {
            FileKind::Test => stats.test_files += 1,
            FileKind::Source => stats.source_files += 1,
            FileKind::Asset => stats.asset_files += 1,
            FileKind::Config => stats.config_files += 1,
            FileKind::Other => {}
        }
    }
    stats
}

fn is_test_path(path: &str) -> bool {
    classify(path) == FileKind::Test
        || path.starts_with("test/")
        || path.contains("/test/")
        || path.contains("__tests__/")
}

pub fn source_structure(files: &[String]) -> SourceStructure {
    let mut structure = SourceStructure::default();

    for file in files {
        let kind = classify(file);
        if is_test_path(file) {
            structure.test_source.push(file.clone());
        } else if kind == FileKind::Source {
            structure.main_source.push(file.clone());
        }

        if kind == FileKind::Asset || ASSET_DIRS.iter().any(|dir| file.contains(dir)) {
            structure.assets.push(file.clone());
        }
        if RESOURCE_DIRS.iter().any(|dir| file.contains(dir)) || file.ends_with("Info.plist") {
            structure.resources.push(file.clone());
        }
    }
    structure
}

/// Build time estimate rendered as a two-minute window.
pub fn estimate_build_time(stats: &ProjectStats, framework: &FrameworkId) -> String {
    let mut minutes = 2;
    if stats.source_files > 100 {
        minutes += 2;
    }
    if stats.source_files > 500 {
        minutes += 3;
    }
    if stats.dependencies > 50 {
        minutes += 2;
    }
    minutes += framework.build_time_surcharge();
    format!("{}-{} minutes", minutes, minutes + 2)
}

/// Fills the dependency counts, build time and size bucket.
pub fn finalize_stats(
    stats: &mut ProjectStats,
    dependencies: usize,
    dev_dependencies: usize,
    framework: &FrameworkId,
) {
    stats.dependencies = dependencies;
    stats.dev_dependencies = dev_dependencies;
    stats.estimated_build_time = estimate_build_time(stats, framework);
    stats.project_size = Some(SizeBucket::from_file_count(stats.total_files));
}
