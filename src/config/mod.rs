pub mod booking_config;

pub use booking_config::BookingConfig;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "pitch-booker")]
#[command(about = "Watches a sports-field overview page and books the desired slot")]
pub struct CliConfig {
    #[arg(short, long, default_value = "booking.toml", help = "Booking profile (.toml or .json)")]
    pub config: String,

    #[arg(long, help = "Fetch the overview once, print it and exit")]
    pub dry_run: bool,

    #[arg(short = 'y', long, help = "Continue without asking when the profile has problems")]
    pub yes: bool,

    #[arg(long, help = "Run the browser without a window")]
    pub headless: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = CliConfig::parse_from(["pitch-booker"]);
        assert_eq!(cli.config, "booking.toml");
        assert!(!cli.dry_run && !cli.yes && !cli.headless && !cli.verbose);
    }

    #[test]
    fn test_cli_flags() {
        let cli = CliConfig::parse_from([
            "pitch-booker",
            "--config",
            "form_data.json",
            "-y",
            "--headless",
            "--json-logs",
        ]);
        assert_eq!(cli.config, "form_data.json");
        assert!(cli.yes && cli.headless && cli.json_logs);
    }
}
