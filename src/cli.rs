use clap::Parser;
use ising_sim::{SiteOrder, DEFAULT_BETA, DEFAULT_BOND_ENERGY};
use tracing_subscriber::EnvFilter;

fn parse_site_order(s: &str) -> Result<SiteOrder, String> {
    SiteOrder::try_from(s)
}

/// Interactive shell for Metropolis Monte Carlo on Ising lattices.
#[derive(Parser, Debug)]
#[command(name = "ising", version, about)]
pub struct Cli {
    /// Inverse temperature used by `evolve`.
    #[arg(long, default_value_t = DEFAULT_BETA)]
    pub beta: f64,

    /// Coupling assigned to bonds created by `grid`.
    #[arg(long = "bond-energy", default_value_t = DEFAULT_BOND_ENERGY)]
    pub bond_energy: f64,

    /// Base seed for every model the session builds. Random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Site selection within a sweep: `random` or `shuffled`.
    #[arg(long, default_value = "random", value_parser = parse_site_order)]
    pub site_order: SiteOrder,

    /// Log filter, e.g. `debug` or `ising_sim=trace`.
    #[arg(long, default_value = "warn")]
    pub log: String,

    /// Hide the progress bar during long runs.
    #[arg(long)]
    pub quiet: bool,
}

impl Cli {
    /// The `--log` directives as a subscriber filter.
    pub fn log_filter(&self) -> Result<EnvFilter, String> {
        EnvFilter::try_new(&self.log).map_err(|e| format!("invalid --log filter '{}': {e}", self.log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["ising"]);
        assert_eq!(cli.beta, DEFAULT_BETA);
        assert_eq!(cli.bond_energy, DEFAULT_BOND_ENERGY);
        assert_eq!(cli.seed, None);
        assert_eq!(cli.site_order, SiteOrder::Random);
        assert_eq!(cli.log, "warn");
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "ising",
            "--beta",
            "0.44",
            "--seed",
            "7",
            "--site-order",
            "shuffled",
            "--quiet",
        ]);
        assert_eq!(cli.beta, 0.44);
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.site_order, SiteOrder::Shuffled);
        assert!(cli.quiet);
        assert!(Cli::try_parse_from(["ising", "--site-order", "spiral"]).is_err());
    }

    #[test]
    fn test_log_filter() {
        let cli = Cli::parse_from(["ising", "--log", "ising_sim=debug"]);
        assert!(cli.log_filter().is_ok());

        let cli = Cli::parse_from(["ising", "--log", "ising_sim=loud"]);
        let err = cli.log_filter().unwrap_err();
        assert!(err.contains("ising_sim=loud"));
    }
}
