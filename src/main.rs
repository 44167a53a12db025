use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result};

use yul::{assemble, block2, Assembled, AssemblerOptions, FileLoader};

/// yul assembles AGC Block II source into a rope image, listing and symbol tables.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble an `.agc` file and write the binary image
    Assemble {
        /// Main `.agc` file; include-files are looked up beside it
        name: PathBuf,
        /// Destination for the binary image
        #[arg(short, long)]
        dest: Option<PathBuf>,
        /// Destination for the listing
        #[arg(short, long)]
        listing: Option<PathBuf>,
        /// Also write one HTML page per source file
        #[arg(long)]
        html: bool,
        /// Also write the symbol table and the debug line table
        #[arg(short, long)]
        symbols: bool,
        /// Most discovery passes to run before emitting [env: YUL_PASSES]
        #[arg(short, long)]
        passes: Option<usize>,
    },
    /// Check an `.agc` file without writing anything
    Check {
        /// File to check
        name: PathBuf,
        /// Most discovery passes to run before emitting [env: YUL_PASSES]
        #[arg(short, long)]
        passes: Option<usize>,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    yul::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(yul::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    let Some(command) = args.command else {
        println!("\n~ yul v{VERSION} ~");
        println!("{SHORT_INFO}");
        return Ok(());
    };

    match command {
        Command::Assemble {
            name,
            dest,
            listing,
            html,
            symbols,
            passes,
        } => {
            file_message(Green, "Assembling", &name);
            let out = run(&name, passes, html)?;

            let listing = listing.unwrap_or_else(|| default_output(&name, "lst"));
            fs::write(&listing, &out.report.listing).into_diagnostic()?;
            file_message(Green, "Listed", &listing);

            if symbols {
                let path = default_output(&name, "symtab");
                let mut file = BufWriter::new(File::create(&path).into_diagnostic()?);
                out.assembly.symbols.write_to(&mut file).into_diagnostic()?;
                file.flush().into_diagnostic()?;
                file_message(Green, "Saved", &path);

                let path = default_output(&name, "lines");
                let mut file = BufWriter::new(File::create(&path).into_diagnostic()?);
                out.assembly.lines.write_to(&mut file).into_diagnostic()?;
                file.flush().into_diagnostic()?;
                file_message(Green, "Saved", &path);
            }

            let Assembled {
                assembly, report, ..
            } = out;
            if let Some(book) = report.html {
                let dir = name.parent().unwrap_or(Path::new("."));
                for (page, contents) in book.finish() {
                    fs::write(dir.join(&page), contents).into_diagnostic()?;
                }
                message(Green, "Saved", "html pages");
            }

            if report.fatals > 0 {
                message(Red, "Failed", "binary not written");
                bail!(
                    "Assembly reported {} fatal error(s) and {} warning(s).",
                    report.fatals,
                    report.warnings
                );
            }

            let dest = dest.unwrap_or_else(|| default_output(&name, "bin"));
            let mut file = BufWriter::new(File::create(&dest).into_diagnostic()?);
            assembly.image.write_binary(&mut file).into_diagnostic()?;
            file.flush().into_diagnostic()?;
            message(Green, "Finished", "emit binary");
            file_message(Green, "Saved", &dest);
            Ok(())
        }
        Command::Check { name, passes } => {
            file_message(Green, "Checking", &name);
            let out = run(&name, passes, false)?;
            if out.report.fatals > 0 {
                bail!(
                    "Assembly reported {} fatal error(s) and {} warning(s).",
                    out.report.fatals,
                    out.report.warnings
                );
            }
            if out.report.warnings > 0 {
                message(Cyan, "Warnings", out.report.warnings.to_string().as_str());
            }
            message(Green, "Success", "no errors found!");
            Ok(())
        }
    }
}

enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

/// Assemble `name` with the built-in table, printing every diagnostic.
fn run(name: &Path, passes: Option<usize>, html: bool) -> Result<Assembled> {
    if !name.exists() {
        bail!("File does not exist. Exiting...");
    }
    let (loader, main) = FileLoader::for_main(name);
    let options = AssemblerOptions {
        max_passes: passes
            .or_else(yul::env::max_passes)
            .unwrap_or(yul::assembler::DEFAULT_MAX_PASSES),
        html,
        trace: yul::env::is_trace_enabled(),
    };
    let out = assemble(&block2::table(), &loader, &main, &options)?;
    for report in &out.report.diagnostics {
        eprintln!("{report:?}");
    }
    let passes = format!("{} discovery pass(es)", out.passes);
    message(MsgColor::Green, "Resolved", passes.as_str());
    Ok(out)
}

/// `name` with extension `ext`, placed in the working directory.
fn default_output(name: &Path, ext: &str) -> PathBuf {
    name.with_extension(ext)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("yul.{ext}")))
}

const SHORT_INFO: &str = r"
Welcome to yul, a cross-assembler for the Block II Apollo Guidance Computer.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
