use std::{collections::HashMap, fs, path::PathBuf, str::FromStr};

use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use qasm2_rs::{
    expression::Expression,
    loader::IncludeInputDirectory,
    pulse::{Channel, Schedule},
    qasm::ToQasm,
    units::TimeUnit,
    visualization::pulse::{DeviceInfo, Stylesheet},
    draw, load, loads, DrawOptions, LoadOptions, Program,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "qasm2", about = "Parse OpenQASM 2 programs and draw pulse schedules")]
struct Cli {
    /// Log more; repeat for more detail. `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Parse a program or expression and print it back.
    Parse(ParseArgs),
    /// Draw a pulse schedule, read from JSON, as an SVG file.
    Draw(DrawArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ParseArgs {
    #[arg(short = 't', long = "type", value_enum, default_value_t)]
    input_type: InputType,
    /// Accept only the syntax of the OpenQASM 2.0 paper.
    #[arg(long)]
    strict: bool,
    /// A directory to search for included files. May be repeated.
    #[arg(short = 'I', long = "include")]
    include_path: Vec<PathBuf>,
    /// Where to search the input file's own directory for includes.
    #[arg(long, value_enum, default_value_t)]
    include_input_directory: IncludeDirectoryPolicy,
    /// Source text to parse instead of a file.
    #[arg(short = 'e', long = "eval", conflicts_with = "file")]
    source: Option<String>,
    file: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum InputType {
    /// Load and check the program, printing the resulting circuit.
    #[default]
    Circuit,
    /// Only parse the program, printing its syntax back.
    Program,
    /// Parse a constant expression and print its value.
    Expression,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum IncludeDirectoryPolicy {
    #[default]
    Append,
    Prepend,
    Ignore,
}

impl From<IncludeDirectoryPolicy> for IncludeInputDirectory {
    fn from(policy: IncludeDirectoryPolicy) -> Self {
        match policy {
            IncludeDirectoryPolicy::Append => Self::Append,
            IncludeDirectoryPolicy::Prepend => Self::Prepend,
            IncludeDirectoryPolicy::Ignore => Self::Ignore,
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct DrawArgs {
    /// A schedule in JSON, as written by serializing `Schedule`.
    schedule: PathBuf,
    /// The name of a built-in stylesheet.
    #[arg(long, default_value = "iqx-standard")]
    style: String,
    /// A JSON file of stylesheet entries to change, nested or with dotted keys.
    #[arg(long)]
    style_overrides: Option<PathBuf>,
    /// A JSON file describing the device, with its name, dt, and channel frequencies.
    #[arg(long)]
    device: Option<PathBuf>,
    #[arg(long, default_value = "dt")]
    time_unit: String,
    /// The length of one sample in seconds, overriding the device's.
    #[arg(long)]
    dt: Option<f64>,
    /// The range of time to draw, in the time unit, such as `0,1600`.
    #[arg(long, value_parser = parse_time_range)]
    time_range: Option<(f64, f64)>,
    /// Channels not to draw, such as `a0`. May be repeated.
    #[arg(long = "disable-channel")]
    disable_channels: Vec<String>,
    #[arg(short, long)]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Parse(args) => handle_parse(args)?,
        Command::Draw(args) => handle_draw(args)?,
    };

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_parse(args: ParseArgs) -> anyhow::Result<()> {
    let options = LoadOptions::default()
        .with_strict(args.strict)
        .with_include_path(args.include_path.clone())
        .with_include_input_directory(args.include_input_directory.into());

    let parsed = match args.input_type {
        InputType::Circuit => {
            let circuit = match (&args.source, &args.file) {
                (Some(source), _) => loads(source, &options).context("Failed to load source.")?,
                (None, Some(file)) => load(file, &options)
                    .with_context(|| format!("Failed to load {}.", file.display()))?,
                (None, None) => bail!("Expected a file or --eval SOURCE."),
            };
            debug!(
                instructions = circuit.instructions().len(),
                depth = circuit.depth(),
                "loaded circuit"
            );
            circuit
                .dumps()
                .context("Failed to write the circuit as OpenQASM 2.")?
        }
        InputType::Program => {
            let source = read_source(&args)?;
            Program::parse(&source, args.strict)
                .context("Failed to parse program.")?
                .to_qasm()
                .context("Failed to write the program as OpenQASM 2.")?
        }
        InputType::Expression => {
            let source = read_source(&args)?;
            let expression = Expression::from_str(source.trim())
                .context("Failed to parse expression.")?
                .simplify();
            match expression.evaluate(&HashMap::new(), &HashMap::new()) {
                Ok(value) => value.to_string(),
                Err(err) => {
                    debug!(%err, "expression is not constant");
                    expression
                        .to_qasm()
                        .context("Failed to write the expression as OpenQASM 2.")?
                }
            }
        }
    };

    println!("{}", parsed.trim_end());

    Ok(())
}

fn read_source(args: &ParseArgs) -> anyhow::Result<String> {
    match (&args.source, &args.file) {
        (Some(source), _) => Ok(source.clone()),
        (None, Some(file)) => fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}.", file.display())),
        (None, None) => bail!("Expected a file or --eval SOURCE."),
    }
}

fn handle_draw(args: DrawArgs) -> anyhow::Result<()> {
    let schedule: Schedule = read_json(&args.schedule).context("Failed to read the schedule.")?;

    let mut style = Stylesheet::named(&args.style)?;
    if let Some(path) = &args.style_overrides {
        let overrides: serde_json::Value =
            read_json(path).context("Failed to read the stylesheet overrides.")?;
        style = style.with_overrides(&overrides)?;
    }

    let mut device = match &args.device {
        Some(path) => read_json(path).context("Failed to read the device description.")?,
        None => DeviceInfo::default(),
    };
    if let Some(dt) = args.dt {
        device = device.with_dt(dt);
    }

    let time_unit = TimeUnit::from_str(&args.time_unit)
        .with_context(|| format!("Unknown time unit '{}'.", args.time_unit))?;
    let disable_channels = args
        .disable_channels
        .iter()
        .map(|channel| channel.parse::<Channel>())
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to parse a disabled channel.")?;

    let mut options = DrawOptions::default()
        .with_style(style)
        .with_device(device)
        .with_time_unit(time_unit)
        .with_disabled_channels(disable_channels);
    if let Some((start, end)) = args.time_range {
        options = options.with_time_range(start, end);
    }

    let figure = draw(&schedule, &options)
        .with_context(|| format!("Failed to draw {}.", args.schedule.display()))?;
    figure.save(&args.output)?;
    debug!(output = %args.output.display(), "wrote figure");

    Ok(())
}

/// Parse `START,END` into a pair of times.
fn parse_time_range(value: &str) -> Result<(f64, f64), String> {
    let times = value
        .split(',')
        .map(|time| time.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| format!("invalid time: {error}"))?;
    match times.as_slice() {
        [start, end] => Ok((*start, *end)),
        _ => Err(format!(
            "expected START,END but found {} value(s)",
            times.len()
        )),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> anyhow::Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}.", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}.", path.display()))
}
