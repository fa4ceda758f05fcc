use super::{parent_dir, read_manifest, MobileFramework, ProjectFiles};
use crate::detection::parsers::{android_manifest_package, GradleSettings, Pubspec};
use crate::detection::types::{ProjectAnalysis, ProjectType, Toolchain};
use crate::stack::{FrameworkId, LanguageId};

const RECOMMENDED: &[&str] = &[
    "android/app/build.gradle",
    "ios/Runner.xcodeproj/project.pbxproj",
];
const MANIFEST: &str = "android/app/src/main/AndroidManifest.xml";

pub struct FlutterFramework;

/// Flutter package names keep underscores; anything else non-alphanumeric
/// is dropped.
fn flutter_identifier(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "flutter_app".to_string()
    } else {
        cleaned
    }
}

impl MobileFramework for FlutterFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::Flutter
    }

    fn project_type(&self) -> ProjectType {
        ProjectType::Hybrid
    }

    fn language(&self, _files: &ProjectFiles) -> LanguageId {
        LanguageId::Dart
    }

    fn detect(&self, files: &ProjectFiles) -> Option<String> {
        files
            .named("pubspec.yaml")
            .into_iter()
            .chain(files.named("pubspec.yml"))
            .next()
            .map(|m| parent_dir(m).to_string())
    }

    fn analyze(&self, files: &ProjectFiles, analysis: &mut ProjectAnalysis) {
        let manifest = if !files.has("pubspec.yaml") && files.has("pubspec.yml") {
            "pubspec.yml"
        } else {
            "pubspec.yaml"
        };
        let Some(content) = read_manifest(files, manifest, analysis) else {
            return;
        };

        let pubspec = match Pubspec::parse(&content) {
            Ok(pubspec) => pubspec,
            Err(e) => {
                analysis
                    .errors
                    .push(format!("Failed to parse {}: {}", manifest, e));
                Pubspec::default()
            }
        };

        let name = pubspec
            .name
            .clone()
            .unwrap_or_else(|| "flutter_app".to_string());
        let identifier = flutter_identifier(&name);
        analysis.project_name = name;
        analysis.package_name = format!("com.example.{}", identifier);
        analysis.dependencies = pubspec.dependency_names("flutter");
        analysis.dev_dependencies = pubspec.dev_dependency_names("flutter_test");

        let flutter_constraint = pubspec.environment_constraint("flutter");
        analysis.framework_version = flutter_constraint.clone();

        let config = &mut analysis.build_config;
        config.application_id = analysis.package_name.clone();
        if let Some((version_name, version_code)) = pubspec.version_parts() {
            config.version_name = version_name;
            config.version_code = version_code;
        }
        if let Toolchain::Flutter {
            flutter_version,
            dart_version,
        } = &mut config.toolchain
        {
            if let Some(constraint) = flutter_constraint {
                *flutter_version = constraint;
            }
            if let Some(sdk) = pubspec.environment_constraint("sdk") {
                *dart_version = sdk;
            }
        }

        if !files.has("lib/main.dart") {
            analysis.add_missing("lib/main.dart");
        }

        for recommended in RECOMMENDED {
            if !files.has(recommended) {
                analysis
                    .warnings
                    .push(format!("Recommended file/directory missing: {}", recommended));
            }
        }
        if !files.has_dir("test") {
            analysis
                .warnings
                .push("Recommended file/directory missing: test/".to_string());
        }

        if let Ok(gradle) = files.read("android/app/build.gradle") {
            let settings = GradleSettings::parse(&gradle);
            let config = &mut analysis.build_config;
            config.min_sdk = settings.min_sdk.unwrap_or(config.min_sdk);
            config.target_sdk = settings.target_sdk.unwrap_or(config.target_sdk);
            config.compile_sdk = settings.compile_sdk.unwrap_or(config.compile_sdk);
        }

        if files.has(MANIFEST) {
            match files.read(MANIFEST).map(|xml| android_manifest_package(&xml)) {
                Ok(Ok(Some(package))) => {
                    analysis.build_config.application_id = package.clone();
                    analysis.package_name = package;
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => analysis
                    .warnings
                    .push(format!("Could not parse {}: {}", MANIFEST, e)),
                Err(e) => analysis
                    .warnings
                    .push(format!("Could not read {}: {}", MANIFEST, e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn run(root: &Path, files: &[&str]) -> ProjectAnalysis {
        let files: Vec<String> = files.iter().map(|s| s.to_string()).collect();
        let view = ProjectFiles::new(root, &files);
        let base = FlutterFramework.detect(&view).expect("flutter detected");
        let mut analysis =
            ProjectAnalysis::new(FrameworkId::Flutter, LanguageId::Dart, ProjectType::Hybrid);
        analysis.root_dir = base.clone();
        FlutterFramework.analyze(&view.scoped(&base), &mut analysis);
        analysis
    }

    #[test]
    fn test_demo_project() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pubspec.yaml", "name: demo\nversion: 2.0.0+5\n");
        write(dir.path(), "lib/main.dart", "void main() {}");

        let analysis = run(dir.path(), &["lib/main.dart", "pubspec.yaml"]);

        assert_eq!(analysis.project_name, "demo");
        assert_eq!(analysis.build_config.version_name, "2.0.0");
        assert_eq!(analysis.build_config.version_code, 5);
        assert_eq!(analysis.build_config.application_id, "com.example.demo");
        assert_eq!(analysis.build_config.target_sdk, 34);
        assert!(analysis.missing_files.is_empty());
        assert!(analysis.errors.is_empty());
        assert_eq!(analysis.warnings.len(), 3);
    }

    #[test]
    fn test_nested_root_and_manifest_package() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app/pubspec.yaml", "name: nested_app\n");
        write(
            dir.path(),
            "app/android/app/src/main/AndroidManifest.xml",
            r#"<manifest package="io.acme.nested"><application/></manifest>"#,
        );

        let analysis = run(
            dir.path(),
            &["app/android/app/src/main/AndroidManifest.xml", "app/pubspec.yaml"],
        );

        assert_eq!(analysis.root_dir, "app");
        assert_eq!(analysis.missing_files, vec!["app/lib/main.dart"]);
        assert_eq!(analysis.package_name, "io.acme.nested");
        assert_eq!(analysis.build_config.application_id, "io.acme.nested");
    }

    #[test]
    fn test_invalid_pubspec_is_recorded() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pubspec.yaml", "name: [unclosed\n");
        write(dir.path(), "lib/main.dart", "");

        let analysis = run(dir.path(), &["lib/main.dart", "pubspec.yaml"]);

        assert_eq!(analysis.errors.len(), 1);
        assert!(analysis.errors[0].starts_with("Failed to parse pubspec.yaml"));
        assert_eq!(analysis.project_name, "flutter_app");
    }

    #[test]
    fn test_flutter_identifier() {
        assert_eq!(flutter_identifier("My_App"), "my_app");
        assert_eq!(flutter_identifier("!!"), "flutter_app");
    }
}
