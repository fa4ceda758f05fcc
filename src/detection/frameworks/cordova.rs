use super::{parent_dir, read_manifest, sanitize_identifier, MobileFramework, ProjectFiles};
use crate::detection::parsers::{CordovaConfig, PackageJson};
use crate::detection::types::{ProjectAnalysis, ProjectType, Toolchain};
use crate::stack::{FrameworkId, LanguageId};

pub struct CordovaFramework;

impl MobileFramework for CordovaFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::Cordova
    }

    fn project_type(&self) -> ProjectType {
        ProjectType::Hybrid
    }

    fn language(&self, _files: &ProjectFiles) -> LanguageId {
        LanguageId::JavaScript
    }

    /// A config.xml only counts when a `www/` directory sits beside it.
    fn detect(&self, files: &ProjectFiles) -> Option<String> {
        files
            .named("config.xml")
            .into_iter()
            .map(|config| parent_dir(config))
            .find(|dir| files.scoped(dir).has_dir("www"))
            .map(str::to_string)
    }

    fn analyze(&self, files: &ProjectFiles, analysis: &mut ProjectAnalysis) {
        if !files.has("www/index.html") {
            analysis.add_missing("www/index.html");
        }

        let Some(content) = read_manifest(files, "config.xml", analysis) else {
            return;
        };

        let config = match CordovaConfig::parse(&content) {
            Ok(config) => config,
            Err(e) => {
                analysis
                    .errors
                    .push(format!("Failed to parse config.xml: {}", e));
                CordovaConfig::default()
            }
        };

        let app_name = config.name.clone().unwrap_or_else(|| "Mobile App".to_string());
        analysis.project_name = app_name.clone();
        analysis.package_name = config
            .id
            .clone()
            .unwrap_or_else(|| format!("io.cordova.{}", sanitize_identifier(&app_name)));
        analysis.dependencies = config.plugins.clone();

        if files.has("package.json") {
            match files.read("package.json").map(|c| PackageJson::parse(&c)) {
                Ok(Ok(pkg)) => {
                    for dep in pkg.dependencies.keys() {
                        if !analysis.dependencies.contains(dep) {
                            analysis.dependencies.push(dep.clone());
                        }
                    }
                    analysis.dev_dependencies = pkg.dev_dependencies.keys().cloned().collect();
                    if let Some(cordova) = pkg.dependency_version("cordova-android") {
                        analysis.framework_version = Some(cordova);
                    }
                }
                Ok(Err(e)) => analysis
                    .warnings
                    .push(format!("Could not parse package.json: {}", e)),
                Err(e) => analysis
                    .warnings
                    .push(format!("Could not read package.json: {}", e)),
            }
        }

        let build_config = &mut analysis.build_config;
        build_config.application_id = analysis.package_name.clone();
        if let Some(version) = config.version {
            build_config.version_name = version;
        }
        build_config.toolchain = Toolchain::Cordova {
            app_name,
            has_config_xml: true,
            has_www_folder: files.has_dir("www"),
        };
    }
}
