use std::path::PathBuf;

use anyhow::{bail, Context};
use gcodelevel::{init_logging, Config, Leveler, BUILD_DATE, VERSION};
use tracing::{error, info};

const USAGE: &str = "Usage: gcodelevel [--config <file>] <file.gcode>...";

/// What the command line asks for
#[derive(Debug, PartialEq)]
enum Command {
    Level {
        config: Option<PathBuf>,
        files: Vec<PathBuf>,
    },
    Help,
    Version,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Command> {
    let mut config = None;
    let mut files = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let path = args.next().context("--config needs a file argument")?;
                config = Some(PathBuf::from(path));
            }
            "-h" | "--help" => return Ok(Command::Help),
            "-V" | "--version" => return Ok(Command::Version),
            _ => files.push(PathBuf::from(arg)),
        }
    }

    if files.is_empty() {
        bail!("{USAGE}");
    }
    Ok(Command::Level { config, files })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, files) = match parse_args(std::env::args().skip(1))? {
        Command::Help => {
            println!("{USAGE}");
            return Ok(());
        }
        Command::Version => {
            println!("gcodelevel {VERSION} ({BUILD_DATE})");
            return Ok(());
        }
        Command::Level { config, files } => (config, files),
    };

    // Initialize logging
    init_logging()?;
    info!("gcodelevel {} (built {})", VERSION, BUILD_DATE);

    let config =
        Config::load_or_default(config.as_deref()).context("Failed to load configuration")?;

    let Some(leveler) = Leveler::from_config(&config) else {
        info!("No calibration data; leveling is disabled");
        return Ok(());
    };

    let mut failed = 0usize;
    for (input, result) in leveler.level_files(files).await {
        match result {
            Ok(Some(outcome)) => println!("{}", outcome.output.display()),
            Ok(None) => {}
            Err(e) => {
                error!("{}: {:#}", input.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} file(s) could not be leveled");
    }
    Ok(())
}
