use super::{file_name, parent_dir, sanitize_identifier, MobileFramework, ProjectFiles};
use crate::detection::parsers::{
    android_manifest_package, gradle_root_project_name, gradle_wrapper_version, GradleSettings,
};
use crate::detection::types::{ProjectAnalysis, ProjectType, Toolchain};
use crate::stack::{FrameworkId, LanguageId};

const ROOT_GRADLE: &[&str] = &["build.gradle", "build.gradle.kts"];
const APP_GRADLE: &[&str] = &["app/build.gradle", "app/build.gradle.kts"];
const SETTINGS_GRADLE: &[&str] = &["settings.gradle", "settings.gradle.kts"];
const MANIFEST: &str = "app/src/main/AndroidManifest.xml";
const WRAPPER_PROPERTIES: &str = "gradle/wrapper/gradle-wrapper.properties";

pub struct AndroidFramework;

fn first_present<'a>(files: &ProjectFiles, candidates: &[&'a str]) -> Option<&'a str> {
    candidates.iter().copied().find(|c| files.has(c))
}

/// Maps a build file or manifest location to the project root directory.
fn root_for(path: &str) -> String {
    if file_name(path) == "AndroidManifest.xml" {
        for suffix in ["app/src/main/AndroidManifest.xml", "src/main/AndroidManifest.xml"] {
            if let Some(prefix) = path.strip_suffix(suffix) {
                return prefix.trim_end_matches('/').to_string();
            }
        }
        return parent_dir(path).to_string();
    }

    let dir = parent_dir(path);
    match dir.rsplit_once('/') {
        Some((parent, "app")) => parent.to_string(),
        None if dir == "app" => String::new(),
        _ => dir.to_string(),
    }
}

impl MobileFramework for AndroidFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::Android
    }

    fn project_type(&self) -> ProjectType {
        ProjectType::Native
    }

    fn language(&self, files: &ProjectFiles) -> LanguageId {
        if files.any_with_extension(".kt") {
            LanguageId::Kotlin
        } else if files.any_with_extension(".java") {
            LanguageId::Java
        } else {
            LanguageId::Unknown
        }
    }

    fn detect(&self, files: &ProjectFiles) -> Option<String> {
        let settings = SETTINGS_GRADLE.iter().flat_map(|n| files.named(n)).next();
        if let Some(settings) = settings {
            return Some(parent_dir(settings).to_string());
        }

        let mut build_files: Vec<&String> = ROOT_GRADLE.iter().flat_map(|n| files.named(n)).collect();
        build_files.sort_by_key(|f| f.matches('/').count());
        if let Some(build) = build_files.first() {
            return Some(root_for(build));
        }

        files
            .named("AndroidManifest.xml")
            .first()
            .map(|manifest| root_for(manifest))
    }

    fn analyze(&self, files: &ProjectFiles, analysis: &mut ProjectAnalysis) {
        if first_present(files, ROOT_GRADLE).is_none() {
            analysis.add_missing("build.gradle");
        }
        let app_gradle = first_present(files, APP_GRADLE);
        if app_gradle.is_none() {
            analysis.add_missing("app/build.gradle");
        }
        let has_manifest = files.has(MANIFEST);
        if !has_manifest {
            analysis.add_missing(MANIFEST);
        }

        let project_name = first_present(files, SETTINGS_GRADLE)
            .and_then(|settings| files.read(settings).ok())
            .and_then(|content| gradle_root_project_name(&content))
            .or_else(|| {
                let base = files.base();
                (!base.is_empty()).then(|| file_name(base).to_string())
            })
            .unwrap_or_else(|| "android-app".to_string());
        analysis.package_name = format!("com.example.{}", sanitize_identifier(&project_name));
        analysis.project_name = project_name;

        let mut kotlin_version = None;
        if let Some(app_gradle) = app_gradle {
            match files.read(app_gradle) {
                Ok(content) => {
                    let settings = GradleSettings::parse(&content);
                    let config = &mut analysis.build_config;
                    config.target_sdk = settings.target_sdk.unwrap_or(config.target_sdk);
                    config.min_sdk = settings.min_sdk.unwrap_or(config.min_sdk);
                    config.compile_sdk = settings.compile_sdk.unwrap_or(config.compile_sdk);
                    config.version_code = settings.version_code.unwrap_or(config.version_code);
                    if let Some(version_name) = settings.version_name {
                        config.version_name = version_name;
                    }
                    if let Some(app_id) = settings.application_id {
                        analysis.package_name = app_id;
                    }
                    analysis.dependencies = settings.dependencies;
                    analysis.dev_dependencies = settings.test_dependencies;
                    kotlin_version = settings.kotlin_version;
                }
                Err(e) => analysis
                    .errors
                    .push(format!("Failed to read {}: {}", app_gradle, e)),
            }
        }

        if kotlin_version.is_none() {
            kotlin_version = first_present(files, ROOT_GRADLE)
                .and_then(|root| files.read(root).ok())
                .and_then(|content| GradleSettings::parse(&content).kotlin_version);
        }

        if has_manifest {
            match files.read(MANIFEST).map(|xml| android_manifest_package(&xml)) {
                Ok(Ok(Some(package))) => {
                    // applicationId in gradle wins over the manifest namespace
                    if app_gradle.is_none() || analysis.package_name.starts_with("com.example.") {
                        analysis.package_name = package;
                    }
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => analysis
                    .errors
                    .push(format!("Failed to parse AndroidManifest.xml: {}", e)),
                Err(e) => analysis
                    .errors
                    .push(format!("Failed to read AndroidManifest.xml: {}", e)),
            }
        }

        let gradle_version = files
            .read(WRAPPER_PROPERTIES)
            .ok()
            .and_then(|content| gradle_wrapper_version(&content));

        analysis.framework_version = gradle_version.clone();
        analysis.build_config.application_id = analysis.package_name.clone();
        analysis.build_config.toolchain = Toolchain::Android {
            gradle_version,
            kotlin_version,
            has_build_gradle: app_gradle.is_some(),
            has_manifest,
        };
    }
}
