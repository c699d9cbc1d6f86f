//! Command-line front end for the script registry.
//!
//! Lists the configured scripts, prints a script's parameter form as JSON, or
//! runs one with `KEY=VALUE` parameters parsed per their declared types.
//! `--background` runs the script on a worker thread and waits for it, the
//! same path an interactive front end uses to stay responsive.

use anyhow::{Context, Result, anyhow, bail};
use scriptrunner::logging::{self, LogSettings};
use scriptrunner::{FileSource, ScriptController, UnitTable, find_config_path};
use std::{env, path::PathBuf};
use tracing::debug;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse()?;
    let _log_guard = logging::init(&LogSettings::from_env().with_file(cli.log_file.clone()))?;

    let config_path = match cli.config_path {
        Some(path) => path,
        None => find_config_path()?,
    };
    debug!(config = %config_path.display(), "using script configuration");
    let controller = ScriptController::load(&FileSource::new(&config_path), UnitTable::builtin())
        .with_context(|| format!("loading scripts from {}", config_path.display()))?;

    match cli.command {
        Command::List => {
            for name in controller.list_script_names() {
                println!("{name}");
            }
        }
        Command::Describe(name) => {
            let descriptor = controller.get_descriptor(&name)?;
            println!("{}", serde_json::to_string_pretty(descriptor)?);
        }
        Command::Run(request) => run_script(&controller, request)?,
    }
    Ok(())
}

fn run_script(controller: &ScriptController, request: RunRequest) -> Result<()> {
    if request.background {
        let handle = controller.spawn_execute_raw(
            request.name.clone(),
            request.input,
            request.output,
            request.params,
        );
        handle
            .join()
            .map_err(|_| anyhow!("worker thread for {} panicked", request.name))??;
    } else {
        controller.execute_raw(
            &request.name,
            request.input.as_deref(),
            request.output.as_deref(),
            &request.params,
        )?;
    }
    eprintln!("script-runner: {} finished", request.name);
    Ok(())
}

struct Cli {
    config_path: Option<PathBuf>,
    log_file: Option<PathBuf>,
    command: Command,
}

enum Command {
    List,
    Describe(String),
    Run(RunRequest),
}

struct RunRequest {
    name: String,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    params: Vec<(String, String)>,
    background: bool,
}

impl Cli {
    fn parse() -> Result<Self> {
        Self::parse_from(env::args().skip(1))
    }

    fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let mut config_path = None;
        let mut log_file = None;
        let mut command = None;
        let mut input = None;
        let mut output = None;
        let mut params = Vec::new();
        let mut background = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => config_path = Some(next_path("--config", &mut args)?),
                "--log-file" => log_file = Some(next_path("--log-file", &mut args)?),
                "--list" => set_command(&mut command, PendingCommand::List)?,
                "--describe" => set_command(
                    &mut command,
                    PendingCommand::Describe(next_value("--describe", &mut args)?),
                )?,
                "--run" => set_command(
                    &mut command,
                    PendingCommand::Run(next_value("--run", &mut args)?),
                )?,
                "--input" => input = Some(next_path("--input", &mut args)?),
                "--output" => output = Some(next_path("--output", &mut args)?),
                "--param" => params.push(parse_param(&next_value("--param", &mut args)?)?),
                "--background" => background = true,
                "--help" | "-h" => usage(0),
                other => bail!("unknown argument: {other}"),
            }
        }

        let run_options = input.is_some() || output.is_some() || !params.is_empty() || background;
        let command = match command {
            None => usage(1),
            Some(PendingCommand::Run(name)) => Command::Run(RunRequest {
                name,
                input,
                output,
                params,
                background,
            }),
            Some(_) if run_options => {
                bail!("--input, --output, --param and --background only apply to --run")
            }
            Some(PendingCommand::List) => Command::List,
            Some(PendingCommand::Describe(name)) => Command::Describe(name),
        };

        Ok(Self {
            config_path,
            log_file,
            command,
        })
    }
}

enum PendingCommand {
    List,
    Describe(String),
    Run(String),
}

fn set_command(slot: &mut Option<PendingCommand>, command: PendingCommand) -> Result<()> {
    if slot.is_some() {
        bail!("only one of --list, --describe, --run may be given");
    }
    *slot = Some(command);
    Ok(())
}

fn next_value(flag: &str, args: &mut impl Iterator<Item = String>) -> Result<String> {
    let value = args
        .next()
        .ok_or_else(|| anyhow!("{flag} requires a value"))?;
    if value.is_empty() {
        bail!("{flag} must not be empty");
    }
    Ok(value)
}

fn next_path(flag: &str, args: &mut impl Iterator<Item = String>) -> Result<PathBuf> {
    next_value(flag, args).map(PathBuf::from)
}

fn parse_param(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("--param expects KEY=VALUE, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("--param key must not be empty in {raw:?}");
    }
    Ok((key.to_string(), value.to_string()))
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: script-runner [--config PATH] [--log-file PATH] <command>\n\nCommands:\n  --list                    Print configured script names, one per line.\n  --describe NAME           Print the script's descriptor as JSON.\n  --run NAME                Run a script.\n\nRun options:\n  --input PATH              Input file passed to the script.\n  --output PATH             Output file passed to the script.\n  --param KEY=VALUE         Parameter value; repeat for each parameter.\n  --background              Run on a worker thread and wait for it.\n\nOptions:\n  --config PATH             Script configuration file (or set SCRIPTRUNNER_CONFIG).\n  --log-file PATH           Append logs to PATH (or set SCRIPTRUNNER_LOG_FILE).\n  --help                    Show this help text."
    );
    std::process::exit(code);
}
