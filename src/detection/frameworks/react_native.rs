use super::{parent_dir, read_manifest, sanitize_identifier, MobileFramework, ProjectFiles};
use crate::detection::parsers::{GradleSettings, PackageJson};
use crate::detection::types::{ProjectAnalysis, ProjectType, Toolchain};
use crate::stack::{FrameworkId, LanguageId};
use tracing::debug;

const ENTRY_FILES: &[&str] = &["App.js", "App.tsx", "index.js"];
const APP_GRADLE: &str = "android/app/build.gradle";

pub struct ReactNativeFramework;

impl ReactNativeFramework {
    fn path_markers<'a>(files: &'a ProjectFiles) -> Vec<&'a str> {
        files
            .all()
            .iter()
            .map(String::as_str)
            .filter(|f| f.contains("react-native") || f.contains("metro.config"))
            .collect()
    }

    fn encloses(dir: &str, path: &str) -> bool {
        dir.is_empty()
            || path
                .strip_prefix(dir)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// The deepest manifest directory containing one of the marker paths.
    fn closest_to_marker<'a>(manifests: &[&'a String], markers: &[&str]) -> Option<&'a str> {
        manifests
            .iter()
            .copied()
            .map(|m| parent_dir(m))
            .filter(|dir| markers.iter().any(|marker| Self::encloses(dir, marker)))
            .max_by_key(|dir| if dir.is_empty() { 0 } else { dir.split('/').count() })
    }

    fn declares_react_native(files: &ProjectFiles, manifest: &str) -> bool {
        files
            .read(manifest)
            .ok()
            .and_then(|content| PackageJson::parse(&content).ok())
            .map(|pkg| {
                pkg.dependencies.contains_key("react-native")
                    || pkg.dev_dependencies.contains_key("react-native")
            })
            .unwrap_or(false)
    }
}

impl MobileFramework for ReactNativeFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::ReactNative
    }

    fn project_type(&self) -> ProjectType {
        ProjectType::Hybrid
    }

    fn language(&self, _files: &ProjectFiles) -> LanguageId {
        LanguageId::JavaScript
    }

    fn detect(&self, files: &ProjectFiles) -> Option<String> {
        let manifests = files.named("package.json");
        if let Some(declared) = manifests
            .iter()
            .find(|m| Self::declares_react_native(files, m))
        {
            return Some(parent_dir(declared).to_string());
        }

        let markers = Self::path_markers(files);
        Self::closest_to_marker(&manifests, &markers).map(str::to_string)
    }

    fn analyze(&self, files: &ProjectFiles, analysis: &mut ProjectAnalysis) {
        let Some(content) = read_manifest(files, "package.json", analysis) else {
            return;
        };

        let pkg = match PackageJson::parse(&content) {
            Ok(pkg) => pkg,
            Err(e) => {
                analysis
                    .errors
                    .push(format!("Failed to parse package.json: {}", e));
                PackageJson::default()
            }
        };

        let name = pkg
            .name
            .clone()
            .unwrap_or_else(|| "react-native-app".to_string());
        analysis.package_name = format!("com.reactnative.{}", sanitize_identifier(&name));
        analysis.project_name = name;
        analysis.dependencies = pkg.dependencies.keys().cloned().collect();
        analysis.dev_dependencies = pkg.dev_dependencies.keys().cloned().collect();

        let rn_version = pkg.dependency_version("react-native");
        analysis.framework_version = rn_version.clone();

        let config = &mut analysis.build_config;
        config.application_id = analysis.package_name.clone();
        if let Some(version) = &pkg.version {
            config.version_name = version.clone();
        }
        if let Toolchain::ReactNative {
            react_native_version,
            node_version,
        } = &mut config.toolchain
        {
            if let Some(v) = rn_version {
                *react_native_version = v;
            }
            if let Some(node) = pkg.node_engine() {
                *node_version = node;
            }
        }

        if files.has(APP_GRADLE) {
            match files.read(APP_GRADLE) {
                Ok(gradle) => {
                    let settings = GradleSettings::parse(&gradle);
                    debug!(?settings, "Parsed React Native app gradle");
                    let config = &mut analysis.build_config;
                    config.target_sdk = settings.target_sdk.unwrap_or(config.target_sdk);
                    config.min_sdk = settings.min_sdk.unwrap_or(config.min_sdk);
                    config.compile_sdk = settings.compile_sdk.unwrap_or(config.compile_sdk);
                    config.version_code = settings.version_code.unwrap_or(config.version_code);
                    if let Some(version_name) = settings.version_name {
                        config.version_name = version_name;
                    }
                    if let Some(app_id) = settings.application_id {
                        config.application_id = app_id;
                    }
                }
                Err(e) => analysis
                    .warnings
                    .push(format!("Could not read {}: {}", APP_GRADLE, e)),
            }
        }

        if !ENTRY_FILES.iter().any(|entry| files.has(entry)) {
            analysis.add_missing("App.js");
        }

        if !files.has_dir("android") {
            analysis.warnings.push(
                "Android platform files missing - APK build may require additional setup"
                    .to_string(),
            );
        }
        if !files.has_dir("ios") {
            analysis
                .warnings
                .push("iOS platform files missing - iOS build not supported".to_string());
        }
    }
}
