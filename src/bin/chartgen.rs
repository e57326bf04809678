use std::{
    fs::File,
    io::{BufReader, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser, Debug)]
#[command(name = "chartgen", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a chart spec into a Vega spec.
    Compile(CompileArgs),
    /// Print the normalized form of a chart spec.
    Normalize(NormalizeArgs),
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Input chart spec JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output Vega spec path (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Pretty-print the output JSON.
    #[arg(long)]
    pretty: bool,
}

#[derive(Parser, Debug)]
struct NormalizeArgs {
    /// Input chart spec JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chartgen=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compile(args) => cmd_compile(args),
        Command::Normalize(args) => cmd_normalize(args),
    }
}

fn read_spec_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let f = File::open(path).with_context(|| format!("open spec '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f)).with_context(|| "parse spec JSON")
}

fn report(sink: &chartgen::CollectingSink) {
    for diagnostic in sink.at_least(chartgen::DiagnosticLevel::Warn) {
        eprintln!("{diagnostic}");
    }
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let input = read_spec_json(&args.in_path)?;

    let mut sink = chartgen::CollectingSink::new();
    let result = chartgen::compile(&input, Some(&mut sink));
    report(&sink);
    let output = result.with_context(|| format!("compile '{}'", args.in_path.display()))?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&output.spec)?
    } else {
        serde_json::to_string(&output.spec)?
    };

    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(out, json).with_context(|| format!("write '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("write stdout")?;
        }
    }
    Ok(())
}

fn cmd_normalize(args: NormalizeArgs) -> anyhow::Result<()> {
    let input = read_spec_json(&args.in_path)?;
    let config = chartgen::init_config(input.get("config"))?;

    let mut sink = chartgen::CollectingSink::new();
    let result = chartgen::normalize(&input, &config, &mut sink);
    report(&sink);
    let spec = result.with_context(|| format!("normalize '{}'", args.in_path.display()))?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string_pretty(&spec)?).context("write stdout")?;
    Ok(())
}
