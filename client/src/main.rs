//! `lifetag` entry-point: loads settings, wires adapters and runs one command.

use std::ffi::OsString;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use lifetag_client::config::ClientSettings;
use lifetag_client::domain::SessionStore;
use lifetag_client::inbound::cli::{App, Cli};
use lifetag_client::outbound::nominatim::NominatimGeocoder;
use lifetag_client::outbound::registry::ReqwestRegistryApi;
use lifetag_client::outbound::storage::FileKeyValueStore;

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let settings = ClientSettings::load_from_iter([OsString::from("lifetag")])
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    init_tracing(settings.json_logs);

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(cli, &settings))
}

fn init_tracing(json: bool) {
    let builder = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}

async fn run(cli: Cli, settings: &ClientSettings) -> Result<ExitCode> {
    let timeout = settings.request_timeout();
    let api_base_url = settings
        .api_base_url()
        .wrap_err("invalid api_base_url setting")?;
    let api = ReqwestRegistryApi::new(api_base_url, timeout).wrap_err("build registry client")?;
    let geocoder_url = settings
        .geocoder_url()
        .wrap_err("invalid geocoder_url setting")?;
    let geocoder = NominatimGeocoder::new(geocoder_url, timeout).wrap_err("build geocoder")?;

    let storage_path = settings.storage_path();
    let store = FileKeyValueStore::open(&storage_path)
        .wrap_err_with(|| format!("open session storage at {}", storage_path.display()))?;
    let session = SessionStore::new(Arc::new(store));

    let mut app = App::new(&api, &geocoder, session);
    let mut input = io::stdin().lock();
    let mut out = io::stdout().lock();
    let outcome = app.run(cli.command, &mut input, &mut out).await?;
    Ok(ExitCode::from(outcome.exit_code()))
}
