//! `parse-openapi`: fill `$ref` and combine `allOf` in an OpenAPI document.
//!
//! Usage:
//!   parse-openapi [--format json|yaml] [--hide-pagination] [--add-nulls] [--max-depth N] < api.yaml
//!
//! The document is read from stdin and written to stdout in the same format.
//! Set `RUST_LOG=debug` to see what the walker does on stderr.

use std::io::{self, Read, Write};
use std::process;

use clap::Parser;
use tree_grafter::cli::{init_tracing, run, CliOptions, Format};

#[derive(Parser, Debug)]
#[command(
    name = "parse-openapi",
    about = "Fill $ref:... and combine allOf in OpenAPI docs from stdin",
    version
)]
struct Cli {
    /// Input AND output format (json or yaml)
    #[arg(short, long, default_value_t = Format::Yaml)]
    format: Format,
    /// Remove pagination levels of schemas
    #[arg(short = 'p', long)]
    hide_pagination: bool,
    /// Add "null" to the type of every property
    #[arg(long)]
    add_nulls: bool,
    /// Truncate everything below this depth
    #[arg(long, value_name = "DEPTH")]
    max_depth: Option<usize>,
}

impl From<Cli> for CliOptions {
    fn from(cli: Cli) -> Self {
        CliOptions {
            format: cli.format,
            hide_pagination: cli.hide_pagination,
            add_nulls: cli.add_nulls,
            max_depth: cli.max_depth,
        }
    }
}

fn main() {
    init_tracing();
    let options = CliOptions::from(Cli::parse());

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        process::exit(1);
    }

    match run(&buf, &options) {
        Ok(result) => {
            if let Err(e) = io::stdout().write_all(result.as_bytes()) {
                eprintln!("{e}");
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}
