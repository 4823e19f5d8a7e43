mod cli;
mod rules;
mod ui;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use rightskit::{EXIT_FAILURE, EXIT_SUCCESS, EXIT_USAGE, ExecutionResult};
use std::ffi::OsString;
use std::process::ExitCode;

fn main() -> ExitCode {
    ExitCode::from(status_byte(run_cli(std::env::args_os())))
}

/// Parse `args`, run what they ask for and return the exit code.
fn run_cli<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args).and_then(|cli| cli.validate().map(|()| cli)) {
        Ok(cli) => cli,
        Err(err) => return usage(&err),
    };

    init_logging(&cli);
    ui::init_color();

    match run(cli) {
        Ok(result) => {
            for msg in &result.messages {
                ui::message(msg);
            }
            result.exit_code
        }
        Err(err) => {
            report(&err);
            EXIT_FAILURE
        }
    }
}

/// Print a clap error and map it to an exit code.
fn usage(err: &clap::Error) -> i32 {
    // --help and --version also arrive here, on stdout
    let code = if err.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS };
    if let Err(io) = err.print() {
        ui::error(&format!("Could not print usage: {io}"));
        return EXIT_FAILURE;
    }
    code
}

fn init_logging(cli: &Cli) {
    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let installed = env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .try_init();
    if let Err(err) = installed {
        log::debug!("keeping existing logger: {err}");
    }
}

fn run(cli: Cli) -> Result<ExecutionResult> {
    if let Some(rules_file) = &cli.rules {
        let requests = rules::load(rules_file, &cli.attrs)?;
        log::info!("loaded {} rules from {}", requests.len(), rules_file.display());
        return Ok(rightskit::execute_all(&requests)?);
    }

    // clap guarantees a path whenever --rules is absent
    let path = cli.path.unwrap_or_default();
    let request = rightskit::ChangeRequest::new(path, cli.attrs.into_options())?;
    Ok(rightskit::execute(&request)?)
}

/// Validation errors are printed as they are. Execution errors get their
/// kind as a heading; anything else gets its context chain.
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<rightskit::Error>() {
        Some(core) if core.is_validation() => ui::error(&core.to_string()),
        Some(core) => {
            ui::error(&format!("{}: {core}", core.kind().description()));
            log::warn!("changes applied before the failure were kept");
        }
        None => ui::error(&format!("{err:#}")),
    }
}

/// Exit codes outside `0..=255` collapse to 255.
fn status_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(u8::MAX)
}
