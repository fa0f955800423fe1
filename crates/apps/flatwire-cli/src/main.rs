use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use flatwire_cli::commands::{encode_file, inspect_file};
use flatwire_cli::config::{CliConfig, OutputFormat};
use flatwire_cli::output::Output;

#[derive(Parser, Debug)]
#[command(name = "flatwire", version, about = "Encode and inspect envelope buffers")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[arg(short, long, global = true, default_value_t = false)]
    quiet: bool,

    /// Overrides `output.format` from the config file.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build an envelope from a TOML description.
    Encode {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the fields and vtable layout of an envelope buffer.
    Inspect {
        file: PathBuf,
        #[arg(long, default_value_t = false)]
        hex_input: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("flatwire error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let format = if cli.json {
        OutputFormat::Json
    } else {
        cli.format.unwrap_or(config.output.format)
    };
    let output = Output::new(format, cli.quiet);
    log::debug!("flatwire: output format {format:?}, builder {:?}", config.builder);

    match cli.command {
        Command::Encode { input, output: out } => {
            encode_file(&input, out.as_deref(), &config, &output)
        }
        Command::Inspect { file, hex_input } => inspect_file(&file, hex_input, &output),
    }
}
