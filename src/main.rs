use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use ising_sim::SweepConfig;
use tracing::error;

mod cli;
mod command;
mod error;
mod report;
mod session;

use cli::Cli;
use session::{Outcome, Session};

fn prompt(out: &mut impl Write) -> io::Result<()> {
    let dir = std::env::current_dir()?;
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());
    write!(out, "{name}> ")?;
    out.flush()
}

fn repl(session: &mut Session) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    println!("REPL started, `help` lists the commands.");

    prompt(&mut stdout)?;
    for line in stdin.lock().lines() {
        match session.run_line(&line?) {
            Ok(Outcome::Continue(text)) => stdout.write_all(text.as_bytes())?,
            Ok(Outcome::Exit) => break,
            Err(e) => eprintln!("{e}"),
        }
        prompt(&mut stdout)?;
    }
    println!("bye");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.log_filter() {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = SweepConfig {
        beta: cli.beta,
        site_order: cli.site_order,
    };
    let mut session = match Session::new(config, cli.bond_energy, cli.seed, !cli.quiet) {
        Ok(session) => session,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = repl(&mut session) {
        error!("{e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
