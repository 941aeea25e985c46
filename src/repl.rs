//! Interactive playground for the dispatch engine.
//!
//! Boots a demo engine with a handful of typed functions and conversions,
//! reads call lines, and prints dispatch results or the structured errors
//! the engine reports.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::engine::Engine;
use crate::error::Error;
use crate::reader;
use crate::value::Value;
use crate::{Conversion, Handler, TypedFn};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const HISTORY_FILE: &str = ".morphic-history";

/// Builds the playground engine: int/float arithmetic, string utilities,
/// and two conversions (`int → float`, `boolean → int`) to demo
/// conversion-aware dispatch.
pub fn demo_engine() -> Result<(Engine, Vec<TypedFn>), Error> {
    let mut engine = Engine::new();
    engine.add_conversion(Conversion::new("int", "float", |v| match v {
        Value::Int(n) => Value::Float(*n as f64),
        other => other.clone(),
    }))?;
    engine.add_conversion(Conversion::new("boolean", "int", |v| match v {
        Value::Bool(b) => Value::Int(if *b { 1 } else { 0 }),
        other => other.clone(),
    }))?;

    let add = engine.function(
        "add",
        vec![
            (
                "int, int",
                Handler::new(|args| match args {
                    [Value::Int(a), Value::Int(b)] => Ok(Value::Int(a + b)),
                    _ => Err(Error::Runtime("add expects two ints".to_string())),
                }),
            ),
            (
                "float, float",
                Handler::new(|args| match args {
                    [Value::Float(a), Value::Float(b)] => Ok(Value::Float(a + b)),
                    _ => Err(Error::Runtime("add expects two floats".to_string())),
                }),
            ),
        ],
    )?;

    let concat = engine.function(
        "concat",
        vec![(
            "...string",
            Handler::new(|args| match args {
                [Value::List(items)] => {
                    let mut out = String::new();
                    for item in items {
                        if let Value::String(s) = item {
                            out.push_str(s);
                        }
                    }
                    Ok(Value::String(out))
                }
                _ => Err(Error::Runtime("concat expects strings".to_string())),
            }),
        )],
    )?;

    let len = engine.function(
        "len",
        vec![
            (
                "string",
                Handler::new(|args| match args {
                    [Value::String(s)] => Ok(Value::Int(s.chars().count() as i64)),
                    _ => Err(Error::Runtime("len expects a string".to_string())),
                }),
            ),
            (
                "list",
                Handler::new(|args| match args {
                    [Value::List(items)] => Ok(Value::Int(items.len() as i64)),
                    _ => Err(Error::Runtime("len expects a list".to_string())),
                }),
            ),
        ],
    )?;

    let repeat = engine.function(
        "repeat",
        vec![(
            "string, int",
            Handler::new(|args| match args {
                [Value::String(s), Value::Int(n)] => {
                    Ok(Value::String(s.repeat((*n).max(0) as usize)))
                }
                _ => Err(Error::Runtime("repeat expects string, int".to_string())),
            }),
        )],
    )?;

    let classify = engine.types().clone();
    let describe = engine.function(
        "describe",
        vec![(
            "any",
            Handler::new(move |args| match args {
                [value] => Ok(Value::String(classify.type_name_or_unknown(value))),
                _ => Err(Error::Runtime("describe expects one value".to_string())),
            }),
        )],
    )?;

    Ok((engine, vec![add, concat, len, repeat, describe]))
}

//===----------------------------------------------------------------------===//
// REPL
//===----------------------------------------------------------------------===//

pub struct Repl {
    engine: Engine,
    fns: Vec<TypedFn>,
}

enum CommandResult {
    Print(String),
    Error(String),
    Quit,
}

impl Repl {
    pub fn new() -> Result<Self, Error> {
        let (engine, fns) = demo_engine()?;
        Ok(Repl { engine, fns })
    }

    /// Evaluates one call line against the demo functions.
    pub fn eval_line(&self, line: &str) -> Result<Value, Error> {
        let (name, args) = reader::read_call(line)?;
        let f = self
            .fns
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| Error::Runtime(format!("Unknown function '{}'", name)))?;
        f.call(&args)
    }

    fn handle_command(&self, command: &str) -> Option<CommandResult> {
        let parts: Vec<&str> = command.trim().split_whitespace().collect();
        if parts.is_empty() {
            return None;
        }

        match parts[0] {
            ":help" | ":h" | ":?" => Some(CommandResult::Print(self.help_message())),
            ":quit" | ":exit" | ":q" => Some(CommandResult::Quit),
            ":fns" => Some(CommandResult::Print(self.list_fns())),
            ":types" => Some(CommandResult::Print(self.list_types())),
            ":sigs" => {
                if parts.len() < 2 {
                    Some(CommandResult::Error("Usage: :sigs <fn>".to_string()))
                } else {
                    Some(self.list_sigs(parts[1]))
                }
            }
            _ => None,
        }
    }

    fn help_message(&self) -> String {
        format!(
            r#"{}

{}
  :help, :h, :?     Show this help message
  :fns              List the playground functions
  :sigs <fn>        Show the signatures of one function
  :types            Show the type registry in classification order
  :quit, :exit, :q  Exit the REPL

{}
  add 1 2           => 3
  add 1 2.5         => 3.5 (int converted to float)
  concat "a" "b"    => ab
  len [1 2 3]       => 3
  describe nil      => nil (the type name)
"#,
            format!("morphic playground v{}", VERSION).bold(),
            "Commands:".yellow().bold(),
            "Examples:".yellow().bold()
        )
    }

    fn list_fns(&self) -> String {
        let mut out = String::new();
        for f in &self.fns {
            let keys: Vec<&str> = f.signatures().map(|(k, _)| k).collect();
            out.push_str(&format!(
                "  {} [{}]\n",
                f.name().green(),
                keys.join("; ")
            ));
        }
        out
    }

    fn list_types(&self) -> String {
        let names: Vec<&str> = self.engine.types().names().collect();
        format!("  {}", names.join(" -> "))
    }

    fn list_sigs(&self, name: &str) -> CommandResult {
        match self.fns.iter().find(|f| f.name() == name) {
            Some(f) => {
                let mut out = String::new();
                for (key, _) in f.signatures() {
                    let shown = if key.is_empty() { "()" } else { key };
                    out.push_str(&format!("  {}\n", shown.cyan()));
                }
                CommandResult::Print(out)
            }
            None => CommandResult::Error(format!("Unknown function '{}'", name)),
        }
    }

    fn print_welcome(&self) {
        println!(
            "{}",
            format!("morphic v{} - multiple dispatch playground", VERSION).cyan()
        );
        println!(
            "Type {} for help, {} to exit.\n",
            ":help".yellow(),
            ":quit".yellow()
        );
    }

    pub fn run(&self) {
        let mut rl = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(err) => {
                eprintln!("{}: {:?}", "Failed to start REPL".red(), err);
                return;
            }
        };
        if rl.load_history(HISTORY_FILE).is_err() {}

        self.print_welcome();

        loop {
            match rl.readline("morphic> ") {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Err(err) = rl.add_history_entry(line.as_str()) {
                        eprintln!("{}: {:?}", "History error".red(), err);
                    }

                    if line.trim().starts_with(':') {
                        match self.handle_command(&line) {
                            Some(CommandResult::Print(msg)) => println!("{}", msg),
                            Some(CommandResult::Error(msg)) => {
                                eprintln!("{}: {}", "Error".red().bold(), msg)
                            }
                            Some(CommandResult::Quit) => break,
                            None => eprintln!(
                                "{}: unknown command {}",
                                "Error".red().bold(),
                                line.trim()
                            ),
                        }
                        continue;
                    }

                    match self.eval_line(&line) {
                        Ok(value) => println!("{}", colorize(&value)),
                        Err(err) => eprintln!("{}: {}", "Error".red().bold(), err),
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("{}: {:?}", "Error".red(), err);
                    break;
                }
            }
        }

        if let Err(err) = rl.save_history(HISTORY_FILE) {
            eprintln!("{}: {:?}", "Save history error".red(), err);
        }
        println!("{}", "Goodbye!".cyan());
    }
}

/// Colorizes a value by its variant.
fn colorize(value: &Value) -> String {
    match value {
        Value::Nil => value.to_string().dimmed().to_string(),
        Value::Bool(true) => value.to_string().green().to_string(),
        Value::Bool(false) => value.to_string().red().to_string(),
        Value::Int(_) | Value::Float(_) => value.to_string().blue().to_string(),
        Value::String(_) => value.to_string().green().to_string(),
        Value::List(_) | Value::Object(_) => value.to_string(),
    }
}
