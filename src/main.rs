//! Network Tools - command-line entry point
//!
//! Runs one network tool per invocation, prints its result to stdout and
//! reports failures on stderr with a category-specific exit code.

use clap::Parser;
use network_tools::{app::App, cli::Cli, error::ErrorReporter, BUILD_TIME, GIT_COMMIT, PKG_NAME, VERSION};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();

    if cli.version {
        println!("{} {}", PKG_NAME, VERSION);
        println!("Build time: {}", BUILD_TIME);
        println!("Git commit: {}", GIT_COMMIT);
        return;
    }

    if cli.help_topic.is_some() && cli.command.is_none() {
        println!("{}", cli.display_help());
        return;
    }

    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose);

    let result = match App::new(cli) {
        Ok(app) => app.run().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            reporter.report_error(&e);
            process::exit(e.exit_code());
        }
    }
}
