use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Mobile project to APK conversion service
#[derive(Parser, Debug)]
#[command(
    name = "apkforge",
    about = "Mobile project to APK conversion service",
    version,
    author,
    long_about = "apkforge accepts zipped mobile projects (React Native, Flutter, native Android, \
                  Cordova or plain web apps), detects the framework, prepares the project and \
                  packages an installable APK. Run `serve` for the HTTP API or `analyze` to \
                  inspect a local project."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run the HTTP API",
        long_about = "Starts the HTTP API. Settings come from APKFORGE_* environment variables; \
                      flags override them.\n\n\
                      Examples:\n  \
                      apkforge serve\n  \
                      apkforge serve --bind 127.0.0.1:8080 --offline-tools"
    )]
    Serve(ServeArgs),

    #[command(
        about = "Analyze a local project directory",
        long_about = "Runs framework detection on an extracted project and prints the analysis.\n\n\
                      Examples:\n  \
                      apkforge analyze ./my-app\n  \
                      apkforge analyze ./my-app --format json"
    )]
    Analyze(AnalyzeArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, value_name = "ADDR", help = "Listen address (host:port)")]
    pub bind: Option<String>,

    #[arg(long, value_name = "DIR", help = "Directory for raw uploads")]
    pub uploads_dir: Option<PathBuf>,

    #[arg(long, value_name = "DIR", help = "Directory for project working copies")]
    pub builds_dir: Option<PathBuf>,

    #[arg(long, help = "Never invoke external tools such as npm, flutter or gradle")]
    pub offline_tools: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to the project (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_default_serve_args() {
        let args = CliArgs::parse_from(["apkforge", "serve"]);
        match args.command {
            Commands::Serve(serve) => {
                assert!(serve.bind.is_none());
                assert!(serve.uploads_dir.is_none());
                assert!(!serve.offline_tools);
            }
            _ => panic!("Expected Serve command"),
        }
        assert!(!args.verbose);
        assert!(args.log_level.is_none());
    }

    #[test]
    fn test_serve_overrides() {
        let args = CliArgs::parse_from([
            "apkforge",
            "serve",
            "--bind",
            "127.0.0.1:9000",
            "--builds-dir",
            "/tmp/b",
            "--offline-tools",
        ]);
        match args.command {
            Commands::Serve(serve) => {
                assert_eq!(serve.bind.as_deref(), Some("127.0.0.1:9000"));
                assert_eq!(serve.builds_dir, Some(PathBuf::from("/tmp/b")));
                assert!(serve.offline_tools);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_analyze_with_format() {
        let args = CliArgs::parse_from(["apkforge", "analyze", "/tmp/app", "--format", "yaml", "-q"]);
        match args.command {
            Commands::Analyze(analyze) => {
                assert_eq!(analyze.path, Some(PathBuf::from("/tmp/app")));
                assert_eq!(analyze.format, OutputFormatArg::Yaml);
            }
            _ => panic!("Expected Analyze command"),
        }
        assert!(args.quiet);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = CliArgs::try_parse_from(["apkforge", "-v", "-q", "serve"]);
        assert!(result.is_err());
    }
}
