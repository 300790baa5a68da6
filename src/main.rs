use clap::Parser;
use dcat_ap_lu_tools::{CliArgs, LoggingConfig, find_tool_error, init_logging, run};
use std::io;
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let _guard = init_logging(LoggingConfig::from_env())?;

    let cli = CliArgs::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match run(cli, &mut out) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(error) => match find_tool_error(&error) {
            // Flag misuse and empty lookups are reported without a backtrace-style chain.
            Some(tool_error) if tool_error.is_user_facing() => {
                eprintln!("Error: {tool_error}");
                Ok(ExitCode::FAILURE)
            }
            _ => Err(error),
        },
    }
}
