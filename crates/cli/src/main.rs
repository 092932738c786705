//! Command-line front end: reads one or more `.class` files, compiles
//! their exported methods into a single Wasm module, and writes the
//! result to disk (or stdout).

use std::{
    fs,
    io::{self, Write as _},
    path::PathBuf,
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use jvm2wasm::{CompilerConfig, CompilerSession};
use jvm2wasm_classfile::ClassFile;

/// Compiles JVM class files into a WebAssembly module.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The `.class` files to compile, in the order their methods should
    /// appear in the output module.
    #[arg(required = true)]
    class_files: Vec<PathBuf>,

    /// Where to write the compiled module. Defaults to stdout for `--text`,
    /// or `a.wasm` in the current directory otherwise.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit the textual `(module ...)` S-expression form instead of the
    /// binary `.wasm` encoding.
    #[arg(long)]
    text: bool,

    /// Increase log verbosity. Repeat for more detail (`-v` = info,
    /// `-vv` = debug, `-vvv` = trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut session = if args.text {
        CompilerSession::new_text(CompilerConfig::default())
    } else {
        CompilerSession::new_binary(CompilerConfig::default())
    };

    for path in &args.class_files {
        let bytes = fs::read(path).with_context(|| format!("failed to read class file {}", path.display()))?;
        let class = ClassFile::parse(&bytes).map_err(|error| anyhow!("failed to parse class file {}: {error}", path.display()))?;
        compile_one(&mut session, &class, path)?;
    }

    write_output(args.output.as_deref(), args.text, session)
}

fn compile_one(session: &mut CompilerSession, class: &ClassFile, path: &PathBuf) -> Result<()> {
    session
        .compile_class(class)
        .map_err(|error| anyhow!("failed to compile {}: {error}", path.display()))
}

fn write_output(output: Option<&std::path::Path>, text: bool, session: CompilerSession) -> Result<()> {
    if text {
        let rendered = session.finish_text();
        match output {
            Some(path) => fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display())),
            None => io::stdout().write_all(rendered.as_bytes()).context("failed to write to stdout"),
        }
    } else {
        let wasm = session.finish();
        let path = output.map_or_else(|| PathBuf::from("a.wasm"), PathBuf::from);
        fs::write(&path, wasm).with_context(|| format!("failed to write {}", path.display()))
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
