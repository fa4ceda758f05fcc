use crate::stack::{FrameworkId, LanguageId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bumped whenever the serialized analysis layout changes.
pub const ANALYSIS_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Hybrid,
    Native,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
}

impl SizeBucket {
    pub fn from_file_count(total_files: usize) -> Self {
        if total_files < 50 {
            SizeBucket::Small
        } else if total_files < 200 {
            SizeBucket::Medium
        } else {
            SizeBucket::Large
        }
    }
}

impl fmt::Display for SizeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SizeBucket::Small => "Small",
            SizeBucket::Medium => "Medium",
            SizeBucket::Large => "Large",
        };
        f.write_str(label)
    }
}

/// Framework-specific toolchain facts, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Toolchain {
    ReactNative {
        react_native_version: String,
        node_version: String,
    },
    Flutter {
        flutter_version: String,
        dart_version: String,
    },
    Android {
        gradle_version: Option<String>,
        kotlin_version: Option<String>,
        has_build_gradle: bool,
        has_manifest: bool,
    },
    Cordova {
        app_name: String,
        has_config_xml: bool,
        has_www_folder: bool,
    },
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    pub target_sdk: u32,
    pub min_sdk: u32,
    pub compile_sdk: u32,
    pub build_tools: String,
    pub build_variants: Vec<String>,
    pub application_id: String,
    pub version_name: String,
    pub version_code: u32,
    pub toolchain: Toolchain,
}

impl BuildConfig {
    /// Defaults used when a manifest leaves a field out.
    pub fn defaults_for(framework: &FrameworkId) -> Self {
        let variants = |names: &[&str]| names.iter().map(|v| v.to_string()).collect();

        match framework {
            FrameworkId::ReactNative => Self {
                target_sdk: 33,
                min_sdk: 21,
                compile_sdk: 33,
                build_tools: "React Native CLI".to_string(),
                build_variants: variants(&["debug", "release"]),
                application_id: String::new(),
                version_name: "1.0.0".to_string(),
                version_code: 1,
                toolchain: Toolchain::ReactNative {
                    react_native_version: "latest".to_string(),
                    node_version: ">=16.0.0".to_string(),
                },
            },
            FrameworkId::Flutter => Self {
                target_sdk: 34,
                min_sdk: 21,
                compile_sdk: 34,
                build_tools: "Flutter SDK".to_string(),
                build_variants: variants(&["debug", "profile", "release"]),
                application_id: String::new(),
                version_name: "1.0.0".to_string(),
                version_code: 1,
                toolchain: Toolchain::Flutter {
                    flutter_version: ">=3.0.0".to_string(),
                    dart_version: ">=3.0.0 <4.0.0".to_string(),
                },
            },
            FrameworkId::Android => Self {
                target_sdk: 33,
                min_sdk: 21,
                compile_sdk: 33,
                build_tools: "Gradle".to_string(),
                build_variants: variants(&["debug", "release"]),
                application_id: String::new(),
                version_name: "1.0.0".to_string(),
                version_code: 1,
                toolchain: Toolchain::Android {
                    gradle_version: None,
                    kotlin_version: None,
                    has_build_gradle: false,
                    has_manifest: false,
                },
            },
            FrameworkId::Cordova => Self {
                target_sdk: 33,
                min_sdk: 22,
                compile_sdk: 33,
                build_tools: "Cordova CLI".to_string(),
                build_variants: variants(&["debug", "release"]),
                application_id: String::new(),
                version_name: "1.0.0".to_string(),
                version_code: 1,
                toolchain: Toolchain::Cordova {
                    app_name: "Mobile App".to_string(),
                    has_config_xml: false,
                    has_www_folder: false,
                },
            },
            FrameworkId::GenericMobile | FrameworkId::Custom(_) => Self {
                target_sdk: 33,
                min_sdk: 21,
                compile_sdk: 33,
                build_tools: "Generic Mobile Build".to_string(),
                build_variants: variants(&["release"]),
                application_id: String::new(),
                version_name: "1.0.0".to_string(),
                version_code: 1,
                toolchain: Toolchain::Generic,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_files: usize,
    pub source_files: usize,
    pub test_files: usize,
    pub asset_files: usize,
    pub config_files: usize,
    pub dependencies: usize,
    pub dev_dependencies: usize,
    pub estimated_build_time: String,
    pub project_size: Option<SizeBucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStructure {
    pub main_source: Vec<String>,
    pub test_source: Vec<String>,
    pub assets: Vec<String>,
    pub resources: Vec<String>,
}

/// Framework profile of an extracted project tree.
///
/// All paths are relative to the project working directory and use `/`
/// separators regardless of platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAnalysis {
    pub schema_version: u32,
    pub framework: FrameworkId,
    pub framework_version: Option<String>,
    pub language: LanguageId,
    pub project_type: ProjectType,
    pub project_name: String,
    pub package_name: String,
    /// Directory holding the primary manifest, empty for the archive root
    pub root_dir: String,
    pub has_valid_structure: bool,
    pub missing_files: Vec<String>,
    pub dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,
    pub build_config: BuildConfig,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub project_stats: ProjectStats,
    pub source_structure: SourceStructure,
}

impl ProjectAnalysis {
    pub fn new(framework: FrameworkId, language: LanguageId, project_type: ProjectType) -> Self {
        let build_config = BuildConfig::defaults_for(&framework);
        Self {
            schema_version: ANALYSIS_SCHEMA_VERSION,
            framework,
            framework_version: None,
            language,
            project_type,
            project_name: "mobile-app".to_string(),
            package_name: "com.example.mobileapp".to_string(),
            root_dir: String::new(),
            has_valid_structure: false,
            missing_files: Vec::new(),
            dependencies: Vec::new(),
            dev_dependencies: Vec::new(),
            build_config,
            errors: Vec::new(),
            warnings: Vec::new(),
            project_stats: ProjectStats::default(),
            source_structure: SourceStructure::default(),
        }
    }

    /// Joins a project-relative path onto the manifest root.
    pub fn rooted(&self, relative: &str) -> String {
        if self.root_dir.is_empty() {
            relative.to_string()
        } else {
            format!("{}/{}", self.root_dir, relative)
        }
    }

    pub fn add_missing(&mut self, relative: &str) {
        let path = self.rooted(relative);
        if !self.missing_files.contains(&path) {
            self.missing_files.push(path);
        }
    }
}

impl fmt::Display for ProjectAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {} v{}",
            self.framework, self.language, self.project_name, self.build_config.version_name
        )
    }
}
