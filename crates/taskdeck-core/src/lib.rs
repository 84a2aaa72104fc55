pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod manager;
pub mod render;
pub mod timezone;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use taskdeck_shared::pages::PageContext;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli = cli::GlobalCli::parse_from(
    raw_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting taskdeck CLI"
  );

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .iter()
      .map(|kv| {
        (kv.key.clone(), kv.value.clone())
      })
      .chain(cli.flag_overrides())
  );
  debug!(
    files = ?cfg.loaded_files,
    "configuration resolved"
  );

  let tz = timezone::display_timezone(&cfg);
  let renderer =
    render::Renderer::new(&cfg, tz)?;
  let page = PageContext::resolve(
    &cfg.default_page()
  );

  let client = api::ApiClient::new(
    cfg.api_roots(),
    cfg.timeout()?
  )
  .context(
    "failed to set up the API client"
  )?;
  let mut manager =
    manager::TaskManager::new(
      client,
      page.page_name.clone()
    );

  let ctx = commands::CommandContext {
    cfg: &cfg,
    renderer: &renderer,
    page: &page,
    tz
  };
  commands::dispatch(
    &mut manager,
    &ctx,
    cli
      .command
      .unwrap_or(cli::Command::List)
  )?;

  info!("done");
  Ok(())
}
