use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use sts::binder::FileSnapshot;
use sts::config::{self, TsConfig};
use sts::{Compiler, Reporter};

#[derive(Parser, Debug)]
#[command(name = "sts", version, about = "Sound type checker for a TypeScript subset")]
struct CliArgs {
    /// Source files to check, in order.
    files: Vec<PathBuf>,

    /// tsconfig-style JSON with `compilerOptions` and `files`.
    #[arg(short = 'p', long = "project")]
    project: Option<PathBuf>,

    /// Translation table for the configured locale.
    #[arg(long = "localeFile")]
    locale_file: Option<PathBuf>,

    /// Colour diagnostics (defaults to on for terminals).
    #[arg(long)]
    pretty: Option<bool>,

    /// Print the runtime tag annotations as JSON.
    #[arg(long = "emitTags")]
    emit_tags: bool,
}

fn main() -> Result<ExitCode> {
    sts::tracing_config::init_tracing();
    let args = CliArgs::parse();

    let tsconfig = match &args.project {
        Some(path) => config::load_tsconfig(path)?,
        None => TsConfig::default(),
    };
    let options = config::resolve_compiler_options(tsconfig.compiler_options.as_ref())?;

    let locale_json = match &args.locale_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read locale file: {}", path.display()))?,
        ),
        None => None,
    };
    let catalog = config::message_catalog(&options, locale_json.as_deref())?;

    let mut paths = args.files.clone();
    if paths.is_empty() {
        let base = args
            .project
            .as_ref()
            .and_then(|path| path.parent())
            .map(PathBuf::from)
            .unwrap_or_default();
        paths = tsconfig
            .files
            .unwrap_or_default()
            .into_iter()
            .map(|file| base.join(file))
            .collect();
    }
    if paths.is_empty() {
        bail!("no input files");
    }

    let mut snapshots = Vec::with_capacity(paths.len());
    for path in &paths {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read source file: {}", path.display()))?;
        snapshots.push(FileSnapshot::new(path.display().to_string(), 1, text));
    }

    let mut compiler = Compiler::new(options);
    compiler.update_files(&snapshots);
    let result = compiler.compile();

    let color = args.pretty.unwrap_or_else(|| std::io::stdout().is_terminal());
    let mut reporter = Reporter::new(catalog, color);
    for snapshot in &snapshots {
        reporter.add_source(&snapshot.path, &snapshot.text);
    }
    if !result.diagnostics.is_empty() {
        println!("{}", reporter.render(&result.diagnostics));
    }
    if args.emit_tags {
        let json = serde_json::to_string_pretty(&result.tags).context("failed to serialize tags")?;
        println!("{json}");
    }

    Ok(if result.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
