//! Line parsing for the shell.
//!
//! A line is split on whitespace. Words starting with `--` are session
//! options (only `--time` is known) and may appear anywhere; the remaining
//! words form the command.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, ShellError};

/// Sweeps run by `evolve` and `scan` when the count is omitted.
pub const DEFAULT_SWEEPS: usize = 1000;

/// Which quantities `show` prints or `evolve` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Quantities {
    pub energy: bool,
    pub state: bool,
    pub magnetization: bool,
    /// Full spin/field/bond dump. Only meaningful for `show`.
    pub configuration: bool,
}

impl Quantities {
    pub fn all() -> Self {
        Self {
            energy: true,
            state: true,
            magnetization: true,
            configuration: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Setting {
    Beta(f64),
    BondEnergy(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Init { spins: PathBuf, bonds: PathBuf },
    Grid { rows: usize, cols: usize },
    Show(Quantities),
    Evolve { sweeps: usize, record: Quantities },
    Hist { output: Option<PathBuf> },
    Scan {
        beta_min: f64,
        beta_max: f64,
        steps: usize,
        sweeps: usize,
    },
    Set(Setting),
    Path,
    Help,
    Exit,
    ChangeDir(PathBuf),
    /// `ls`, `cat`, `echo` or `dir`, forwarded to the host.
    Host { program: String, args: Vec<String> },
}

impl Command {
    /// Whether the command operates on the current model.
    pub fn needs_model(&self) -> bool {
        matches!(
            self,
            Command::Show(_) | Command::Evolve { .. } | Command::Hist { .. } | Command::Scan { .. }
        )
    }
}

/// A parsed line: the command plus session options.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: Command,
    /// Report the elapsed time after executing.
    pub timed: bool,
}

const HOST_PROGRAMS: [&str; 4] = ["ls", "cat", "echo", "dir"];

fn number<T: FromStr>(word: &str, what: &str) -> Result<T> {
    word.parse()
        .map_err(|_| ShellError::Usage(format!("invalid {what} '{word}'")))
}

fn flags(words: &[&str], allowed: &str, usage: &str) -> Result<Quantities> {
    let mut q = Quantities::default();
    for word in words {
        let flag = word
            .strip_prefix('-')
            .filter(|f| f.len() == 1 && allowed.contains(*f))
            .ok_or_else(|| ShellError::Usage(usage.to_string()))?;
        match flag {
            "e" => q.energy = true,
            "s" => q.state = true,
            "m" => q.magnetization = true,
            "c" => q.configuration = true,
            _ => return Err(ShellError::Usage(usage.to_string())),
        }
    }
    Ok(q)
}

/// Parse one line. `Ok(None)` for a blank line.
pub fn parse(line: &str) -> Result<Option<Invocation>> {
    let mut timed = false;
    let mut words = Vec::new();
    for word in line.split_whitespace() {
        match word.strip_prefix("--") {
            Some("time") => timed = true,
            Some(other) => {
                return Err(ShellError::Usage(format!("unknown option '--{other}'")));
            }
            None => words.push(word),
        }
    }

    let Some((&name, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match (name, args) {
        ("init", [spins, bonds]) => Command::Init {
            spins: PathBuf::from(spins),
            bonds: PathBuf::from(bonds),
        },
        ("init", _) => return Err(usage("init <spins_file> <bonds_file>")),

        ("grid", [n]) => {
            let n = number(n, "row count")?;
            Command::Grid { rows: n, cols: n }
        }
        ("grid", [rows, cols]) => Command::Grid {
            rows: number(rows, "row count")?,
            cols: number(cols, "column count")?,
        },
        ("grid", _) => return Err(usage("grid <rows> [cols]")),

        ("show", []) => Command::Show(Quantities::all()),
        ("show", opts) => Command::Show(flags(opts, "escm", "show [-e] [-s] [-m] [-c]")?),

        ("evolve", [first, opts @ ..]) if !first.starts_with('-') => Command::Evolve {
            sweeps: number(first, "sweep count")?,
            record: flags(opts, "esm", "evolve [sweeps] [-e] [-s] [-m]")?,
        },
        ("evolve", opts) => Command::Evolve {
            sweeps: DEFAULT_SWEEPS,
            record: flags(opts, "esm", "evolve [sweeps] [-e] [-s] [-m]")?,
        },

        ("hist", []) => Command::Hist { output: None },
        ("hist", [file]) => Command::Hist {
            output: Some(PathBuf::from(file)),
        },
        ("hist", _) => return Err(usage("hist [output_file]")),

        ("scan", [lo, hi, steps, rest @ ..]) if rest.len() <= 1 => {
            let steps: usize = number(steps, "step count")?;
            if steps == 0 {
                return Err(usage("scan needs at least one step"));
            }
            Command::Scan {
                beta_min: number(lo, "beta")?,
                beta_max: number(hi, "beta")?,
                steps,
                sweeps: match rest {
                    [s] => number(s, "sweep count")?,
                    _ => DEFAULT_SWEEPS,
                },
            }
        }
        ("scan", _) => return Err(usage("scan <beta_min> <beta_max> <steps> [sweeps]")),

        ("set", ["beta", v]) => Command::Set(Setting::Beta(number(v, "beta")?)),
        ("set", ["bond", v]) => Command::Set(Setting::BondEnergy(number(v, "bond energy")?)),
        ("set", _) => return Err(usage("set beta|bond <value>")),

        ("path", []) => Command::Path,
        ("help", _) => Command::Help,
        ("exit", []) => Command::Exit,

        ("cd", [dir]) => Command::ChangeDir(PathBuf::from(dir)),
        ("cd", _) => return Err(usage("cd <directory>")),
        (program, args) if HOST_PROGRAMS.iter().any(|&p| p == program) => Command::Host {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        },

        (other, _) => {
            return Err(ShellError::Usage(format!(
                "unknown command '{other}', try `help`"
            )))
        }
    };

    Ok(Some(Invocation { command, timed }))
}

fn usage(text: &str) -> ShellError {
    ShellError::Usage(text.to_string())
}
