use clap::{Parser, Subcommand};
use std::process;

use morphic::repl::Repl;
use morphic::Signature;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "morphic")]
#[command(version = VERSION)]
#[command(about = "Runtime multiple dispatch playground", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive playground REPL
    Repl,

    /// Print the canonical form of a signature string
    Parse {
        /// Signature, e.g. "int, int|string, ...list"
        signature: String,
    },

    /// Evaluate a single call line against the playground functions
    Call {
        /// Call line, e.g. 'add 1 2'
        line: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Repl) | None => match Repl::new() {
            Ok(repl) => {
                repl.run();
                Ok(())
            }
            Err(e) => Err(e),
        },
        Some(Commands::Parse { signature }) => {
            Signature::parse(&signature).map(|sig| {
                let canonical = sig.to_string();
                let shown = if canonical.is_empty() { "()" } else { canonical.as_str() };
                println!("{}", shown);
            })
        }
        Some(Commands::Call { line }) => Repl::new().and_then(|repl| {
            let value = repl.eval_line(&line)?;
            println!("{}", value);
            Ok(())
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(1);
    }
}
