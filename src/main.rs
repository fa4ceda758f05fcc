use apkforge::cli::commands::{CliArgs, Commands};
use apkforge::cli::handlers::{handle_analyze, handle_serve};
use apkforge::util::logging::{self, parse_level};
use apkforge::VERSION;

use clap::Parser;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("apkforge v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Serve(serve_args) => handle_serve(serve_args).await,
        Commands::Analyze(analyze_args) => handle_analyze(analyze_args, args.quiet).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let mut config = logging::config_from_env();
    if let Some(level_str) = &args.log_level {
        config.level = parse_level(level_str);
    } else if args.verbose {
        config.level = Level::DEBUG;
    } else if args.quiet {
        config.level = Level::ERROR;
    }

    // `analyze` prints results on stdout, so logs go to stderr there.
    if matches!(args.command, Commands::Analyze(_)) {
        config = config.to_stderr();
    }

    logging::init_logging(config);
}
