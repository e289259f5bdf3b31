pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod event;
pub mod home;
pub mod month;
pub mod recurrence;
pub mod render;
pub mod scheduler;
pub mod store;
pub mod style;
pub mod timeline;
pub mod week_strip;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use error::CalendarError;
pub use event::{
  Event,
  EventId
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting hubcal"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let cfg = config::Config::load(
    cli.config.as_deref()
  )?
  .apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  )
  .context("failed to apply style overrides")?;

  let store = cli
    .events
    .as_deref()
    .map(store::EventStore::open);

  let mut session =
    commands::Session::new(
      cfg.style,
      Utc::now(),
      cli.date.as_deref(),
      store
    )?;

  let renderer = render::Renderer::new(
    std::env::var_os("NO_COLOR")
      .is_none()
  );
  let inv =
    cli::Invocation::parse(cli.rest)?;

  commands::dispatch(
    &mut session,
    &renderer,
    inv
  )?;

  info!("done");
  Ok(())
}
