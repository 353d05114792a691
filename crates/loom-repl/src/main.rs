//! `loom`: a thin line-oriented REPL demonstrating scan -> evaluate -> mold
//! (spec §6 external interfaces, SPEC_FULL §8). Plays the role the
//! teacher's `crates/repl` plays, minus the split-pane IR visualization —
//! there is no IR to show here, just IDE-free IDE scripting against a
//! single persistent `Interpreter`.

use clap::Parser;
use loom_runtime::InterpreterOptions;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

mod engine;

use engine::Engine;

#[derive(Parser)]
#[command(name = "loom")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A thin REPL for the Loom interpreter core", long_about = None)]
struct Args {
    /// Enable `trace`-level tracing of pool/GC/scanner/frame events.
    #[arg(long)]
    trace: bool,

    /// Disable ANSI color in the prompt and error output.
    #[arg(long)]
    no_color: bool,

    /// Evaluator recursion ballast before a GC recycle is requested.
    #[arg(long, default_value_t = 10_000)]
    stack_size: i64,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.trace);

    let options = InterpreterOptions { ballast: args.stack_size, ..InterpreterOptions::default() };
    let mut engine = Engine::new(options);

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("failed to start line editor: {e}");
            std::process::exit(1);
        }
    };

    let prompt = if args.no_color { ">> ".to_string() } else { "\x1b[1;32m>>\x1b[0m ".to_string() };

    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == ":quit" || line == ":q" {
                    break;
                }
                let _ = rl.add_history_entry(line);
                match engine.eval_line(line) {
                    Ok(molded) if !molded.is_empty() => println!("== {molded}"),
                    Ok(_) => {}
                    Err(message) => eprintln!("{message}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {e}");
                break;
            }
        }
    }
}

fn init_tracing(trace: bool) {
    let filter = if trace {
        tracing_subscriber::EnvFilter::new("trace")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
