//! Command line front end: parse DTD files, report diagnostics and
//! optionally dump the structural event stream.

use std::{path::PathBuf, process::ExitCode};

use anyhow::ensure;
use clap::Parser;
use edtd::{
    error::XmlErrorLevel,
    parser::{DtdParserCtxt, EventCollector},
};

#[derive(Parser)]
#[command(name = "edtdlint", version, about = "Parse and validate XML DTD files")]
struct Cli {
    /// DTD files, each parsed as an external subset
    files: Vec<PathBuf>,
    /// Print the structural event stream
    #[arg(long)]
    events: bool,
    /// Print warnings as well as errors
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: &Cli) -> anyhow::Result<u8> {
    ensure!(!cli.files.is_empty(), "no input files");
    let mut status = 0u8;
    for file in &cli.files {
        let mut collector = EventCollector::new();
        let mut ctxt = DtdParserCtxt::new(&mut collector);
        let result = ctxt.parse_uri(&file.display().to_string());
        let (well_formed, valid) = (ctxt.well_formed, ctxt.valid);
        drop(ctxt);
        for diagnostic in &collector.diagnostics {
            if cli.verbose || diagnostic.level >= XmlErrorLevel::XmlErrError {
                eprintln!("{diagnostic}");
            }
        }
        if cli.events {
            for event in &collector.events {
                println!("{event}");
            }
        }
        if result.is_err() || !well_formed {
            status = status.max(2);
        } else if !valid {
            status = status.max(1);
        }
    }
    Ok(status)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(status) => ExitCode::from(status),
        Err(error) => {
            eprintln!("edtdlint: {error:#}");
            ExitCode::from(2)
        }
    }
}
