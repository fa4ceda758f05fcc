//! Manifest parsers for package.json, pubspec.yaml, Gradle scripts and
//! Android/Cordova XML.

use regex::Regex;
use roxmltree::Document;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageJson {
    pub name: Option<String>,
    pub version: Option<String>,
    pub dependencies: BTreeMap<String, serde_json::Value>,
    pub dev_dependencies: BTreeMap<String, serde_json::Value>,
    pub engines: BTreeMap<String, serde_json::Value>,
}

impl PackageJson {
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn dependency_version(&self, name: &str) -> Option<String> {
        self.dependencies
            .get(name)
            .or_else(|| self.dev_dependencies.get(name))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    pub fn node_engine(&self) -> Option<String> {
        self.engines
            .get("node")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Pubspec {
    pub name: Option<String>,
    pub version: Option<serde_yaml::Value>,
    pub environment: Option<BTreeMap<String, serde_yaml::Value>>,
    pub dependencies: Option<BTreeMap<String, serde_yaml::Value>>,
    pub dev_dependencies: Option<BTreeMap<String, serde_yaml::Value>>,
}

impl Pubspec {
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Splits `version: X+N` into (`X`, `N`). The build number defaults to 1.
    pub fn version_parts(&self) -> Option<(String, u32)> {
        let raw = yaml_scalar(self.version.as_ref()?)?;
        let (name, code) = match raw.split_once('+') {
            Some((name, code)) => (name.trim().to_string(), code.trim().parse().unwrap_or(1)),
            None => (raw.trim().to_string(), 1),
        };
        Some((name, code))
    }

    pub fn environment_constraint(&self, key: &str) -> Option<String> {
        self.environment
            .as_ref()?
            .get(key)
            .and_then(yaml_scalar)
    }

    pub fn dependency_names(&self, exclude: &str) -> Vec<String> {
        names_without(self.dependencies.as_ref(), exclude)
    }

    pub fn dev_dependency_names(&self, exclude: &str) -> Vec<String> {
        names_without(self.dev_dependencies.as_ref(), exclude)
    }
}

fn names_without(map: Option<&BTreeMap<String, serde_yaml::Value>>, exclude: &str) -> Vec<String> {
    map.map(|m| m.keys().filter(|k| *k != exclude).cloned().collect())
        .unwrap_or_default()
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Values pulled from an app-level `build.gradle` or `build.gradle.kts`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GradleSettings {
    pub target_sdk: Option<u32>,
    pub min_sdk: Option<u32>,
    pub compile_sdk: Option<u32>,
    pub application_id: Option<String>,
    pub version_code: Option<u32>,
    pub version_name: Option<String>,
    pub kotlin_version: Option<String>,
    pub dependencies: Vec<String>,
    pub test_dependencies: Vec<String>,
}

struct GradlePatterns {
    target_sdk: Option<Regex>,
    min_sdk: Option<Regex>,
    compile_sdk: Option<Regex>,
    application_id: Option<Regex>,
    version_code: Option<Regex>,
    version_name: Option<Regex>,
    kotlin_version: Option<Regex>,
    dependency: Option<Regex>,
    test_dependency: Option<Regex>,
}

fn gradle_patterns() -> &'static GradlePatterns {
    static PATTERNS: OnceLock<GradlePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).ok();
        GradlePatterns {
            target_sdk: re(r"targetSdk(?:Version)?\s*=?\s*\(?\s*(\d+)"),
            min_sdk: re(r"minSdk(?:Version)?\s*=?\s*\(?\s*(\d+)"),
            compile_sdk: re(r"compileSdk(?:Version)?\s*=?\s*\(?\s*(\d+)"),
            application_id: re(r#"applicationId\s*=?\s*["']([^"']+)["']"#),
            version_code: re(r"versionCode\s*=?\s*(\d+)"),
            version_name: re(r#"versionName\s*=?\s*["']([^"']+)["']"#),
            kotlin_version: re(
                r#"(?:kotlin_version\s*=\s*["']([^"']+)["'])|(?:org\.jetbrains\.kotlin[\w.\-:]*["']\)?\s*version\s*["']([^"']+)["'])"#,
            ),
            dependency: re(
                r#"(?m)^\s*(?:implementation|api|compileOnly|runtimeOnly|kapt|annotationProcessor)\s*\(?\s*["']([^"']+)["']"#,
            ),
            test_dependency: re(
                r#"(?m)^\s*(?:testImplementation|androidTestImplementation)\s*\(?\s*["']([^"']+)["']"#,
            ),
        }
    })
}

fn capture_u32(re: Option<&Regex>, content: &str) -> Option<u32> {
    re?.captures(content)?.get(1)?.as_str().parse().ok()
}

fn capture_string(re: Option<&Regex>, content: &str) -> Option<String> {
    let caps = re?.captures(content)?;
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .map(|m| m.as_str().to_string())
}

fn capture_all(re: Option<&Regex>, content: &str) -> Vec<String> {
    re.map(|re| {
        re.captures_iter(content)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect()
    })
    .unwrap_or_default()
}

impl GradleSettings {
    pub fn parse(content: &str) -> Self {
        let p = gradle_patterns();
        Self {
            target_sdk: capture_u32(p.target_sdk.as_ref(), content),
            min_sdk: capture_u32(p.min_sdk.as_ref(), content),
            compile_sdk: capture_u32(p.compile_sdk.as_ref(), content),
            application_id: capture_string(p.application_id.as_ref(), content),
            version_code: capture_u32(p.version_code.as_ref(), content),
            version_name: capture_string(p.version_name.as_ref(), content),
            kotlin_version: capture_string(p.kotlin_version.as_ref(), content),
            dependencies: capture_all(p.dependency.as_ref(), content),
            test_dependencies: capture_all(p.test_dependency.as_ref(), content),
        }
    }
}

/// `rootProject.name` from settings.gradle.
pub fn gradle_root_project_name(content: &str) -> Option<String> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r#"rootProject\.name\s*=\s*["']([^"']+)["']"#).ok());
    capture_string(re.as_ref(), content)
}

/// Gradle version from the wrapper's `distributionUrl`.
pub fn gradle_wrapper_version(content: &str) -> Option<String> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"distributionUrl=.*gradle-([\d.]+)-(?:bin|all)\.zip").ok()
    });
    capture_string(re.as_ref(), content)
}

/// The `package` attribute of an AndroidManifest.xml root element.
pub fn android_manifest_package(content: &str) -> Result<Option<String>, roxmltree::Error> {
    let doc = Document::parse(content)?;
    Ok(doc
        .root_element()
        .attribute("package")
        .map(str::to_string))
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CordovaConfig {
    pub id: Option<String>,
    pub version: Option<String>,
    pub name: Option<String>,
    pub plugins: Vec<String>,
}

impl CordovaConfig {
    pub fn parse(content: &str) -> Result<Self, roxmltree::Error> {
        let doc = Document::parse(content)?;
        let widget = doc.root_element();

        let name = widget
            .children()
            .find(|n| n.tag_name().name() == "name")
            .and_then(|n| n.text())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let plugins = widget
            .descendants()
            .filter(|n| n.tag_name().name() == "plugin")
            .filter_map(|n| n.attribute("name").map(str::to_string))
            .collect();

        Ok(Self {
            id: widget.attribute("id").map(str::to_string),
            version: widget.attribute("version").map(str::to_string),
            name,
            plugins,
        })
    }
}
