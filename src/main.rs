//! Interactive shell over a [`FixedSizeMap<String>`].
//!
//! ```text
//! $ fsmap 4
//! set name alice
//! set name bob
//! get name
//! load
//! ```

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use fsmap::FixedSizeMap;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fsmap")]
#[command(about = "Read set/get/delete commands from stdin against a fixed-capacity map")]
struct Args {
    /// Number of entries the map can hold
    #[arg(allow_negative_numbers = true)]
    capacity: i64,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

const HELP: &str = "\
commands:
  set <key> <value>   associate value with key
  get <key>           look up key
  delete <key>        remove key
  load                print the load factor
  size                print item count and capacity
  dump                print the tree
  clear               remove everything
  help                show this text
  quit                exit";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Set(&'a str, &'a str),
    Get(&'a str),
    Delete(&'a str),
    Load,
    Size,
    Dump,
    Clear,
    Help,
    Quit,
}

fn parse(line: &str) -> Result<Command<'_>, String> {
    let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let key = || {
        if rest.is_empty() || rest.contains(char::is_whitespace) {
            Err(format!("usage: {cmd} <key>"))
        } else {
            Ok(rest)
        }
    };
    match cmd.to_ascii_lowercase().as_str() {
        "set" => match rest.split_once(char::is_whitespace) {
            Some((k, v)) => Ok(Command::Set(k, v.trim())),
            None => Err("usage: set <key> <value>".to_string()),
        },
        "get" => key().map(Command::Get),
        "delete" | "del" => key().map(Command::Delete),
        "load" => Ok(Command::Load),
        "size" => Ok(Command::Size),
        "dump" => Ok(Command::Dump),
        "clear" => Ok(Command::Clear),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        _ => Err(format!("unrecognized command `{cmd}` (try `help`)")),
    }
}

fn run<R: BufRead, W: Write>(map: &mut FixedSizeMap<String>, input: R, out: &mut W) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cmd = match parse(line) {
            Ok(cmd) => cmd,
            Err(msg) => {
                writeln!(out, "{msg}")?;
                continue;
            }
        };
        tracing::debug!(?cmd, "command");
        match cmd {
            Command::Set(key, value) => match map.try_associate(key, value.to_string()) {
                Ok(()) => writeln!(out, "set {key}")?,
                Err(err) => writeln!(out, "could not set {key}: {err}")?,
            },
            Command::Get(key) => match map.lookup(key) {
                Some(v) => writeln!(out, "{key} = {v}")?,
                None => writeln!(out, "{key} not found")?,
            },
            Command::Delete(key) => match map.remove(key) {
                Some(v) => writeln!(out, "deleted {key} (was {v})")?,
                None => writeln!(out, "{key} not found")?,
            },
            Command::Load => writeln!(out, "load factor {:.3}", map.load_factor())?,
            Command::Size => writeln!(out, "{}/{} items", map.len(), map.capacity())?,
            Command::Dump => write!(out, "{}", map.dump())?,
            Command::Clear => {
                map.clear();
                writeln!(out, "cleared")?;
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => break,
        }
    }
    out.flush()
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .try_init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut map = match FixedSizeMap::try_from_signed(args.capacity) {
        Ok(map) => map,
        Err(err) => {
            tracing::error!(capacity = args.capacity, %err, "cannot create map");
            eprintln!("error: invalid capacity {}: {err}", args.capacity);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(capacity = map.capacity(), "map ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    if let Err(err) = run(&mut map, stdin.lock(), &mut stdout) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
