use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use waypoint_tour::TourConfig;

use crate::page::{self, MIN_HEIGHT, MIN_WIDTH};
use crate::script::{self, Action};
use crate::{DemoError, Result};

/// Script used when none is given: walk the welcome tour to the end.
pub const DEFAULT_SCRIPT: &str =
    "click:Next,click:Next,key:ArrowRight,next,back,next,resize:100x30,click:Next,click:Done";

#[derive(Debug, Parser)]
#[command(
    name = "waypoint-demo",
    about = "Run a guided tour against a headless page and print text snapshots",
    version
)]
pub struct Cli {
    /// Viewport width in cells.
    #[arg(long, default_value_t = 80, value_parser = clap::value_parser!(u16).range(i64::from(MIN_WIDTH)..))]
    pub width: u16,

    /// Viewport height in cells.
    #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(u16).range(i64::from(MIN_HEIGHT)..))]
    pub height: u16,

    /// Comma-separated actions, e.g. `next,click:Back,key:Escape`.
    #[arg(long, value_delimiter = ',', default_value = DEFAULT_SCRIPT)]
    pub script: Vec<String>,

    /// Tour definition (TOML or JSON) to use instead of the bundled one.
    #[arg(long)]
    pub tour: Option<PathBuf>,

    /// Print only the final frame.
    #[arg(long)]
    pub last_only: bool,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "warn")]
    pub log: String,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);
    run(&cli, &mut io::stdout().lock())
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Load the tour a CLI invocation asks for.
pub fn load_config(cli: &Cli) -> Result<TourConfig> {
    let Some(path) = &cli.tour else {
        return Ok(TourConfig::from_toml_str(crate::WELCOME_TOML)?);
    };
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config = if is_json {
        TourConfig::from_json_file(path)?
    } else {
        TourConfig::from_toml_file(path)?
    };
    Ok(config)
}

pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let actions = cli
        .script
        .iter()
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| entry.parse::<Action>())
        .collect::<Result<Vec<_>>>()?;

    let config = load_config(cli)?;
    let page = page::layout(cli.width, cli.height);
    let tour = crate::build_tour(&page, &config)?;
    let frames = script::run(&page, &tour, &actions)?;

    let shown = if cli.last_only {
        frames.len().saturating_sub(1)
    } else {
        0
    };
    for frame in &frames[shown..] {
        writeln!(out, "{frame}").map_err(DemoError::Output)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let cli = Cli::try_parse_from(["waypoint-demo"]).expect("parse");
        assert_eq!((cli.width, cli.height), (80, 24));
        assert_eq!(cli.script.len(), DEFAULT_SCRIPT.split(',').count());
        assert!(cli.tour.is_none());
    }

    #[test]
    fn tiny_viewports_are_refused() {
        assert!(Cli::try_parse_from(["waypoint-demo", "--width", "10"]).is_err());
    }

    #[test]
    fn script_is_split_on_commas() {
        let cli = Cli::try_parse_from(["waypoint-demo", "--script", "next,key:Escape"]).expect("parse");
        assert_eq!(cli.script, vec!["next", "key:Escape"]);
    }
}
