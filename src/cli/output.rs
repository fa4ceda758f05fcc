//! Output formatting for `apkforge analyze`
//!
//! JSON and YAML dump the analysis as served by the API; the human format is
//! a short summary.

use anyhow::{Context, Result};

use crate::detection::ProjectAnalysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, analysis: &ProjectAnalysis) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(analysis)
                .context("Failed to serialize analysis to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(analysis).context("Failed to serialize analysis to YAML")
            }
            OutputFormat::Human => Ok(self.format_human(analysis)),
        }
    }

    fn format_human(&self, analysis: &ProjectAnalysis) -> String {
        let mut output = String::new();

        if analysis.has_valid_structure {
            output.push_str("\u{2713} Project Analysis\n");
        } else {
            output.push_str("\u{2717} Project Analysis (Invalid Structure)\n");
        }
        output.push_str(&"\u{2501}".repeat(42));
        output.push_str("\n\n");

        output.push_str(&format!("Framework:     {}\n", analysis.framework.name()));
        if let Some(version) = &analysis.framework_version {
            output.push_str(&format!("Version:       {}\n", version));
        }
        output.push_str(&format!("Language:      {}\n", analysis.language));
        output.push_str(&format!("Project:       {}\n", analysis.project_name));
        output.push_str(&format!("Package:       {}\n", analysis.package_name));
        if !analysis.root_dir.is_empty() {
            output.push_str(&format!("Root:          {}\n", analysis.root_dir));
        }

        let config = &analysis.build_config;
        output.push_str("\nBuild Configuration:\n");
        output.push_str(&format!(
            "\u{251C}\u{2500} SDK:      target {} / min {} / compile {}\n",
            config.target_sdk, config.min_sdk, config.compile_sdk
        ));
        output.push_str(&format!(
            "\u{251C}\u{2500} Version:  {} ({})\n",
            config.version_name, config.version_code
        ));
        output.push_str(&format!(
            "\u{2514}\u{2500} App ID:   {}\n",
            config.application_id
        ));

        let stats = &analysis.project_stats;
        output.push_str(&format!(
            "\nFiles: {} total, {} source, {} test, {} assets",
            stats.total_files, stats.source_files, stats.test_files, stats.asset_files
        ));
        if let Some(size) = stats.project_size {
            output.push_str(&format!(" ({})", size));
        }
        output.push('\n');
        output.push_str(&format!(
            "Estimated build time: {}\n",
            stats.estimated_build_time
        ));

        push_section(&mut output, "Missing Files", &analysis.missing_files);
        push_section(&mut output, "Errors", &analysis.errors);
        push_section(&mut output, "Warnings", &analysis.warnings);

        output
    }
}

fn push_section(output: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    output.push_str(&format!("\n{}:\n", title));
    for item in items {
        output.push_str(&format!("  - {}\n", item));
    }
}
