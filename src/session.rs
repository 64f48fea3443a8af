use std::env;
use std::fs;
use std::process;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use ising_sim::simulation::chains_for_betas;
use ising_sim::statistics::Histogram;
use ising_sim::{
    input, run_chains, CompositeRecorder, EnergyRecorder, LatticeModel, MagnetizationRecorder,
    Observation, Observer, Spin, StateRecorder, SweepConfig, DEFAULT_BOND_ENERGY,
};
use tracing::{debug, info};
use validator::Validate;

use crate::command::{self, Command, Quantities, Setting};
use crate::error::{Result, ShellError};
use crate::report;

const HIST_BINS: usize = 20;
const HIST_WIDTH: usize = 50;

/// Runs shorter than this don't get a progress bar.
const PROGRESS_MIN_SWEEPS: usize = 1000;

/// What the caller should do after a line has been executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print this text (possibly empty) and read the next line.
    Continue(String),
    Exit,
}

/// Series recorded by the last `evolve`.
#[derive(Debug, Clone, Default)]
pub struct Trajectories {
    pub energies: Vec<f64>,
    pub states: Vec<u128>,
    pub magnetizations: Vec<f64>,
}

/// Forwards every sweep to a recorder and ticks a progress bar.
struct Progress<'a, O> {
    inner: &'a mut O,
    bar: &'a ProgressBar,
}

impl<O: Observer<Spin>> Observer<Spin> for Progress<'_, O> {
    fn observe(&mut self, model: &LatticeModel<Spin>) {
        self.inner.observe(model);
        self.bar.inc(1);
    }
}

/// Shell state: the current model and the settings commands run with.
pub struct Session {
    model: Option<LatticeModel<Spin>>,
    config: SweepConfig,
    bond_energy: f64,
    /// Seed for the next model, advanced after each use.
    next_seed: Option<u64>,
    trajectories: Trajectories,
    show_progress: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            model: None,
            config: SweepConfig::default(),
            bond_energy: DEFAULT_BOND_ENERGY,
            next_seed: None,
            trajectories: Trajectories::default(),
            show_progress: false,
        }
    }
}

impl Session {
    pub fn new(
        config: SweepConfig,
        bond_energy: f64,
        seed: Option<u64>,
        show_progress: bool,
    ) -> Result<Self> {
        config.validate()?;
        check_bond_energy(bond_energy)?;
        Ok(Self {
            config,
            bond_energy,
            next_seed: seed,
            show_progress,
            ..Self::default()
        })
    }

    pub fn model(&self) -> Option<&LatticeModel<Spin>> {
        self.model.as_ref()
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn trajectories(&self) -> &Trajectories {
        &self.trajectories
    }

    /// Parse and execute one line, appending the elapsed time when the line
    /// carries `--time`.
    pub fn run_line(&mut self, line: &str) -> Result<Outcome> {
        let Some(invocation) = command::parse(line)? else {
            return Ok(Outcome::Continue(String::new()));
        };
        let start = Instant::now();
        let outcome = self.execute(invocation.command)?;
        match outcome {
            Outcome::Continue(mut text) if invocation.timed => {
                text.push_str(&report::elapsed(start.elapsed()));
                Ok(Outcome::Continue(text))
            }
            other => Ok(other),
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        if command.needs_model() && !self.model.as_ref().is_some_and(|m| m.is_valid()) {
            return Err(ShellError::NoModel);
        }

        let text = match command {
            Command::Init { spins, bonds } => {
                let seed = self.take_seeds(1);
                let model = input::load_model::<Spin>(&spins, &bonds, seed)?;
                let text = format!(
                    "loaded {} spins and {} bonds\n",
                    model.site_count(),
                    model.bonds().count()
                );
                self.replace_model(model);
                text
            }
            Command::Grid { rows, cols } => {
                let seed = self.take_seeds(1);
                let model = LatticeModel::from_grid(rows, cols, self.bond_energy, seed)?;
                let text = format!(
                    "built a {rows} x {cols} grid, {} bonds of energy {}\n",
                    model.bonds().count(),
                    self.bond_energy
                );
                self.replace_model(model);
                text
            }
            Command::Show(q) => report::quantities(self.current()?, q),
            Command::Evolve { sweeps, record } => self.evolve(sweeps, record)?,
            Command::Hist { output } => {
                if self.trajectories.energies.is_empty() {
                    return Err(ShellError::NoTrajectory);
                }
                let hist = Histogram::from_series(&self.trajectories.energies, HIST_BINS);
                let chart = report::histogram(&hist, HIST_WIDTH);
                match output {
                    Some(path) => {
                        fs::write(&path, &chart)?;
                        format!("histogram written to {}\n", path.display())
                    }
                    None => chart,
                }
            }
            Command::Scan {
                beta_min,
                beta_max,
                steps,
                sweeps,
            } => self.scan(beta_min, beta_max, steps, sweeps)?,
            Command::Set(Setting::Beta(beta)) => {
                let config = SweepConfig { beta, ..self.config };
                config.validate()?;
                self.config = config;
                format!("beta = {beta}\n")
            }
            Command::Set(Setting::BondEnergy(energy)) => {
                check_bond_energy(energy)?;
                self.bond_energy = energy;
                format!("bond energy = {energy}, used by the next `grid`\n")
            }
            Command::Path => format!("{}\n", env::current_dir()?.display()),
            Command::Help => report::usage(),
            Command::Exit => return Ok(Outcome::Exit),
            Command::ChangeDir(dir) => {
                env::set_current_dir(&dir)?;
                String::new()
            }
            Command::Host { program, args } => {
                let status = process::Command::new(&program).args(&args).status()?;
                debug!(%program, ?status, "host command finished");
                String::new()
            }
        };
        Ok(Outcome::Continue(text))
    }

    fn current(&mut self) -> Result<&mut LatticeModel<Spin>> {
        self.model
            .as_mut()
            .filter(|m| m.is_valid())
            .ok_or(ShellError::NoModel)
    }

    fn replace_model(&mut self, model: LatticeModel<Spin>) {
        info!(n_spins = model.site_count(), "model replaced");
        self.model = Some(model);
        self.trajectories = Trajectories::default();
    }

    /// Reserve `n` consecutive seeds and return the first.
    fn take_seeds(&mut self, n: u64) -> Option<u64> {
        let seed = self.next_seed;
        self.next_seed = seed.map(|s| s.wrapping_add(n));
        seed
    }

    fn evolve(&mut self, sweeps: usize, record: Quantities) -> Result<String> {
        let config = self.config;
        let bar = if self.show_progress && sweeps >= PROGRESS_MIN_SWEEPS {
            let bar = ProgressBar::new(sweeps as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "{msg} [{bar:40}] {pos}/{len} [{elapsed_precise} < {eta_precise}, {per_sec}]",
            ) {
                bar.set_style(style.progress_chars("=> "));
            }
            bar.set_message("sweeps");
            bar
        } else {
            ProgressBar::hidden()
        };

        let mut recorder = CompositeRecorder::new();
        if record.energy {
            recorder.push(EnergyRecorder::new());
        }
        if record.state {
            recorder.push(StateRecorder::new());
        }
        if record.magnetization {
            recorder.push(MagnetizationRecorder::new());
        }

        let model = self.current()?;
        model.stabilize(&config)?;
        let stats = model.run_sweeps(
            &config,
            &mut Progress {
                inner: &mut recorder,
                bar: &bar,
            },
            sweeps,
        )?;
        bar.finish_and_clear();
        let text = report::evolution(&stats, model, recorder.width());

        if !record.is_empty() {
            let mut traj = Trajectories::default();
            for row in recorder.drain()? {
                for obs in row {
                    match obs {
                        Observation::Energy(e) => traj.energies.push(e),
                        Observation::State(s) => traj.states.push(s),
                        Observation::Magnetization(m) => traj.magnetizations.push(m),
                    }
                }
            }
            self.trajectories = traj;
        }
        Ok(text)
    }

    fn scan(&mut self, beta_min: f64, beta_max: f64, steps: usize, sweeps: usize) -> Result<String> {
        let betas: Vec<f64> = if steps == 1 {
            vec![beta_min]
        } else {
            let step = (beta_max - beta_min) / (steps - 1) as f64;
            (0..steps).map(|i| beta_min + step * i as f64).collect()
        };
        for &beta in &betas {
            SweepConfig { beta, ..self.config }.validate()?;
        }

        let spec = self.current()?.to_spec();
        let seed = self.take_seeds(steps as u64);
        let mut chains = chains_for_betas::<Spin>(&spec, &betas, self.config, seed)?;
        let results = run_chains(&mut chains, sweeps)?;
        Ok(report::scan(&results))
    }
}

fn check_bond_energy(energy: f64) -> Result<()> {
    if !energy.is_finite() {
        return Err(ShellError::Usage(format!(
            "bond energy must be finite, got {energy}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn session() -> Session {
        Session::new(SweepConfig::with_beta(0.3), 1.0, Some(17), false).unwrap()
    }

    fn text(outcome: Outcome) -> String {
        match outcome {
            Outcome::Continue(text) => text,
            Outcome::Exit => panic!("unexpected exit"),
        }
    }

    #[test]
    fn test_commands_need_a_model() {
        let mut s = session();
        for line in ["show", "evolve 10", "hist", "scan 0.1 0.5 2"] {
            assert!(matches!(s.run_line(line), Err(ShellError::NoModel)), "{line}");
        }
        assert!(s.run_line("help").is_ok());
        assert!(s.run_line("set beta 0.5").is_ok());
    }

    #[test]
    fn test_grid_then_show() {
        let mut s = session();
        let out = text(s.run_line("grid 3").unwrap());
        assert!(out.contains("3 x 3"));
        assert_eq!(s.model().unwrap().site_count(), 9);

        let out = text(s.run_line("show -e").unwrap());
        let energy = s.model().unwrap().energy();
        assert_eq!(out, format!("energy: {energy}\n"));
    }

    #[test]
    fn test_evolve_records_selected_series() {
        let mut s = session();
        s.run_line("grid 4 5").unwrap();
        s.run_line("evolve 25 -e -m").unwrap();

        let traj = s.trajectories();
        assert_eq!(traj.energies.len(), 25);
        assert_eq!(traj.magnetizations.len(), 25);
        assert!(traj.states.is_empty());
        let model = s.model().unwrap();
        assert_eq!(*traj.energies.last().unwrap(), model.energy());

        // Without flags nothing is recorded and the old series are kept.
        s.run_line("evolve 5").unwrap();
        assert_eq!(s.trajectories().energies.len(), 25);
    }

    #[test]
    fn test_hist() {
        let mut s = session();
        s.run_line("grid 4").unwrap();
        assert!(matches!(s.run_line("hist"), Err(ShellError::NoTrajectory)));

        s.run_line("evolve 40 -e").unwrap();
        let chart = text(s.run_line("hist").unwrap());
        assert_eq!(chart.lines().count(), HIST_BINS + 1);
        assert!(chart.lines().last().unwrap().starts_with("40 samples"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist.txt");
        s.run_line(&format!("hist {}", path.display())).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), chart);
    }

    #[test]
    fn test_new_model_clears_trajectories() {
        let mut s = session();
        s.run_line("grid 3").unwrap();
        s.run_line("evolve 5 -e").unwrap();
        s.run_line("grid 2").unwrap();
        assert!(s.trajectories().energies.is_empty());
    }

    #[test]
    fn test_init_from_files() {
        let mut spins = tempfile::NamedTempFile::new().unwrap();
        writeln!(spins, "1 0.0\n2 0.0\n3 0.5").unwrap();
        let mut bonds = tempfile::NamedTempFile::new().unwrap();
        writeln!(bonds, "1 2 1.0\n2 3 -1.0").unwrap();

        let mut s = session();
        let line = format!(
            "init {} {}",
            spins.path().display(),
            bonds.path().display()
        );
        let out = text(s.run_line(&line).unwrap());
        assert_eq!(out, "loaded 3 spins and 2 bonds\n");

        assert!(matches!(
            s.run_line("init /nonexistent/a /nonexistent/b"),
            Err(ShellError::Engine(ising_sim::Error::Io { .. }))
        ));
        // The failed load kept the previous model.
        assert_eq!(s.model().unwrap().site_count(), 3);
    }

    #[test]
    fn test_oversized_grid_keeps_live_model() {
        let mut s = session();
        s.run_line("grid 3").unwrap();
        assert!(matches!(
            s.run_line("grid 4294967296 4294967296"),
            Err(ShellError::Engine(ising_sim::Error::Config(_)))
        ));
        assert!(s.run_line("grid 100000 100000").is_err());
        assert_eq!(s.model().unwrap().site_count(), 9);
    }

    #[test]
    fn test_settings() {
        let mut s = session();
        s.run_line("set beta 0.7").unwrap();
        assert_eq!(s.config().beta, 0.7);
        assert!(s.run_line("set beta -1").is_err());
        assert_eq!(s.config().beta, 0.7);

        s.run_line("set bond -2").unwrap();
        s.run_line("grid 2").unwrap();
        assert!(s.model().unwrap().bonds().all(|(_, _, e)| e == -2.0));
        assert!(s.run_line("set bond inf").is_err());
    }

    #[test]
    fn test_scan_reports_each_beta() {
        let mut s = session();
        s.run_line("grid 4").unwrap();
        let out = text(s.run_line("scan 0.1 0.9 3 50").unwrap());
        // header plus one row per beta
        assert_eq!(out.lines().count(), 4);
        assert!(out.lines().nth(1).unwrap().trim_start().starts_with("0.1000"));
        assert!(out.lines().nth(3).unwrap().trim_start().starts_with("0.9000"));
    }

    #[test]
    fn test_seeded_sessions_repeat() {
        let mut a = session();
        let mut b = session();
        for s in [&mut a, &mut b] {
            s.run_line("grid 5").unwrap();
            s.run_line("evolve 20 -s").unwrap();
        }
        assert_eq!(a.trajectories().states, b.trajectories().states);
    }

    #[test]
    fn test_time_and_exit() {
        let mut s = session();
        let out = text(s.run_line("help --time").unwrap());
        assert!(out.ends_with("ms\n"));
        assert_eq!(s.run_line("exit").unwrap(), Outcome::Exit);
        assert_eq!(s.run_line("   ").unwrap(), Outcome::Continue(String::new()));
    }
}
