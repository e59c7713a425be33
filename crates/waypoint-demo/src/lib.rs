#![forbid(unsafe_code)]

//! Scripted welcome tour over a headless page.
//!
//! [`page::layout`] builds a landing page with the sections the welcome
//! tour points at, [`welcome_tour`] loads the tour definition, and
//! [`script::run`] drives it with a list of [`script::Action`]s, capturing a
//! text snapshot after each one.

pub mod cli;
pub mod page;
pub mod script;

use thiserror::Error;
use waypoint_tour::{ConfigError, Registry, Tour, TourConfig};

use crate::page::Page;

/// The welcome tour definition shipped with the demo.
pub const WELCOME_TOML: &str = include_str!("../data/welcome.toml");

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("tour definition: {0}")]
    Config(#[from] ConfigError),

    #[error("unknown action {0:?}")]
    UnknownAction(String),

    #[error("no button {text:?} on the current step")]
    NoSuchButton { text: String },

    #[error("no step is shown")]
    NoCurrentStep,

    #[error("writing output: {0}")]
    Output(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DemoError>;

/// Build the tour described by `config` on `page`.
pub fn build_tour(page: &Page, config: &TourConfig) -> Result<Tour> {
    Ok(config.build(page.host.host(), Registry::new())?)
}

/// Build the bundled welcome tour on `page`.
pub fn welcome_tour(page: &Page) -> Result<Tour> {
    let config = TourConfig::from_toml_str(WELCOME_TOML)?;
    build_tour(page, &config)
}
