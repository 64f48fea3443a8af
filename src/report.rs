//! Text produced by the shell commands.

use std::fmt::Write;
use std::time::Duration;

use ising_sim::statistics::Histogram;
use ising_sim::{ChainResult, LatticeModel, Spin, SweepStats};

use crate::command::Quantities;

const USAGE: &[(&str, &str)] = &[
    ("help", "Print this message."),
    ("init <spins_file> <bonds_file>", "Load a model from a spin list and a bond list."),
    ("grid <rows> [cols]", "Build an open-boundary grid with zero field."),
    ("show [-e] [-s] [-m] [-c]", "Print energy, state, magnetization or the configuration."),
    ("evolve [sweeps] [-e] [-s] [-m]", "Stabilize, then run and record Metropolis sweeps."),
    ("hist [output_file]", "Histogram of the last recorded energy series."),
    ("scan <beta_min> <beta_max> <steps> [sweeps]", "Independent chains over a range of beta."),
    ("set beta|bond <value>", "Change the inverse temperature or the grid bond energy."),
    ("path", "Print the working directory."),
    ("cd, ls, cat, echo, dir", "Forwarded to the host."),
    ("exit", "Leave the shell."),
];

pub fn usage() -> String {
    let mut out = String::from("Usage:\n");
    for (cmd, text) in USAGE {
        let _ = writeln!(out, "    {cmd:<46}{text}");
    }
    out.push_str("    Add --time to any command to report how long it took.\n");
    out
}

pub fn quantities(model: &LatticeModel<Spin>, q: Quantities) -> String {
    let mut out = String::new();
    if q.configuration {
        let _ = writeln!(out, "{model}");
    }
    if q.energy {
        let _ = writeln!(out, "energy: {}", model.energy());
    }
    if q.state {
        let note = if model.state_is_exact() {
            ""
        } else {
            " (wrapped, not unique for this many sites)"
        };
        let _ = writeln!(out, "state: {}{note}", model.state());
    }
    if q.magnetization {
        let m = model.magnetization();
        let _ = writeln!(out, "magnetization: {m}");
        let _ = writeln!(out, "magnetization squared: {}", m * m);
    }
    out
}

pub fn evolution(stats: &SweepStats, model: &LatticeModel<Spin>, recorded: usize) -> String {
    let mut out = format!(
        "{} sweeps, acceptance {:.4}, energy {}, magnetization {:.4}",
        stats.sweeps,
        stats.acceptance_rate(),
        model.energy(),
        model.magnetization(),
    );
    if recorded > 0 {
        let _ = write!(out, ", {recorded} series recorded");
    }
    out.push('\n');
    out
}

pub fn scan(results: &[ChainResult]) -> String {
    let mut out = format!(
        "{:>10}  {:>14}  {:>10}  {:>10}  {:>10}  {:>8}\n",
        "beta", "<E>", "err", "<|m|>", "err", "accept"
    );
    for r in results {
        let _ = writeln!(
            out,
            "{:>10.4}  {:>14.6}  {:>10.2e}  {:>10.6}  {:>10.2e}  {:>8.4}",
            r.beta,
            r.energy.mean,
            r.energy.std_error(),
            r.abs_magnetization.mean,
            r.abs_magnetization.std_error(),
            r.stats.acceptance_rate(),
        );
    }
    out
}

/// Bar chart followed by a sample count and range line.
pub fn histogram(hist: &Histogram, width: usize) -> String {
    let mut out = hist.render(width);
    let _ = writeln!(
        out,
        "{} samples in [{}, {}]",
        hist.total(),
        hist.min,
        hist.max
    );
    out
}

pub fn elapsed(d: Duration) -> String {
    format!("Operation spent: {}ms\n", d.as_millis())
}
