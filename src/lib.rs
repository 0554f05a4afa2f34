//! An online learning controller driven over a plaintext TCP command protocol.
//!
//! A single client streams labelled feature vectors. Depending on the configured
//! mode every enabled online classifier is trained on them and saved, or asked for
//! a prediction. Trained and inferred samples are kept as CSV audit logs.

pub mod audit;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod registry;
pub mod server;

use std::path::Path;

use log::info;

use crate::{
    config::{Layout, PropertiesFile, Settings},
    dispatcher::ModelDispatcher,
    registry::Registry,
};

pub use error::{ExitCode, OrbitErr, Result};

/// Reads the configuration at `props`, then serves one client until it sends `exit`.
///
/// # Args
/// * `props` - Path of the properties file.
/// * `layout` - Where models and logs live, its directories must exist.
///
/// # Errors
/// Returns `OrbitErr::Config` for bad configuration, `OrbitErr::Setup` if the
/// socket can't be set up and `OrbitErr::Disconnected` or `OrbitErr::Transport`
/// if the session breaks.
pub async fn run(props: &Path, layout: Layout) -> Result<()> {
    let props = PropertiesFile::open(props)?;
    let settings = Settings::from_source(&props)?;
    info!(
        "mode {:?} with {} inputs, training log {}",
        settings.mode,
        settings.dim(),
        if settings.log_training { "on" } else { "off" }
    );

    let registry = Registry::build(settings.dim(), &props)?;
    info!("{} algorithms enabled", registry.len());

    let dispatcher = ModelDispatcher::new(
        registry,
        layout,
        &settings.inputs,
        settings.log_training,
    );

    server::serve(settings.addr(), dispatcher, settings.mode, settings.dim()).await
}
