use std::path::PathBuf;

use bevy::prelude::*;

use crate::plugins::core::WaterPhase;

/// Command-line arguments parsed at startup.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct CliArgs {
    /// Config file to use instead of the platform default.
    /// Usage: `cargo run -- --config ./surface.json`
    pub config: Option<PathBuf>,

    /// Fixed seed for leaf randomness, overriding the config.
    pub seed: Option<u64>,

    /// Image shown behind the water.
    /// Usage: `cargo run -- --background ./desktop.png`
    pub background: Option<PathBuf>,

    /// Phase to enter on startup.
    pub phase: Option<WaterPhase>,
}

impl CliArgs {
    /// Parse the process arguments.
    /// Supports:
    /// - `--config <path>`
    /// - `--seed <u64>`
    /// - `--background <image path>`
    /// - `--phase <off|filling|on|draining>`
    pub fn parse() -> Self {
        Self::parse_from(std::env::args().skip(1))
    }

    /// Parse an argument list (without the program name).
    pub fn parse_from(args: impl IntoIterator<Item = String>) -> Self {
        let args: Vec<String> = args.into_iter().collect();
        let mut cli = CliArgs::default();

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let value = args.get(i + 1).filter(|v| !v.starts_with("--"));
            match (flag, value) {
                ("--config", Some(path)) => {
                    cli.config = Some(PathBuf::from(path));
                    info!("CLI: Using config '{}'", path);
                    i += 2;
                }
                ("--background", Some(path)) => {
                    cli.background = Some(PathBuf::from(path));
                    info!("CLI: Background image '{}'", path);
                    i += 2;
                }
                ("--seed", Some(raw)) => {
                    match raw.parse::<u64>() {
                        Ok(seed) => {
                            cli.seed = Some(seed);
                            info!("CLI: Leaf seed {}", seed);
                        }
                        Err(_) => warn!("CLI: --seed expects an unsigned integer, got '{}'", raw),
                    }
                    i += 2;
                }
                ("--phase", Some(raw)) => {
                    match WaterPhase::parse(raw) {
                        Some(phase) => {
                            cli.phase = Some(phase);
                            info!("CLI: Starting in {:?}", phase);
                        }
                        None => warn!("CLI: Unknown phase '{}'", raw),
                    }
                    i += 2;
                }
                ("--config" | "--background" | "--seed" | "--phase", None) => {
                    warn!("CLI: {} requires an argument", flag);
                    i += 1;
                }
                (arg, _) => {
                    if arg.starts_with('-') {
                        warn!("CLI: Unknown argument '{}'", arg);
                    }
                    i += 1;
                }
            }
        }

        cli
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parses_all_flags() {
        let cli = parse(&["--config", "a.json", "--seed", "42", "--background", "bg.png", "--phase", "on"]);
        assert_eq!(cli.config, Some(PathBuf::from("a.json")));
        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.background, Some(PathBuf::from("bg.png")));
        assert_eq!(cli.phase, Some(WaterPhase::On));
    }

    #[test]
    fn test_bad_values_are_skipped() {
        let cli = parse(&["--seed", "many", "--phase", "flood", "--config"]);
        assert_eq!(cli, CliArgs::default());
    }

    #[test]
    fn test_missing_value_does_not_eat_next_flag() {
        let cli = parse(&["--background", "--seed", "3"]);
        assert_eq!(cli.background, None);
        assert_eq!(cli.seed, Some(3));
    }
}
