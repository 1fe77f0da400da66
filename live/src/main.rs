use std::process::ExitCode;

use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardpress::config::{DEFAULT_HOST, DEFAULT_PORT};
use cardpress::error::Result;
use cardpress::{Config, Pipeline, Settings};

use crate::flags::Cardpress;
use crate::watch::FsWatcher;

mod flags;
mod serve;
mod util;
mod watch;

const DEFAULT_LOG_FILTER: &str = "cardpress=info,cardpress_live=info,tower_http=warn";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let flags = Cardpress::from_env_or_exit();
    if flags.version {
        println!("cardpress {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    match run(flags).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(flags: Cardpress) -> Result<ExitCode> {
    let assets = match &flags.path {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    let settings = Settings::discover(&assets)?.merge(flags.settings()?);
    let config = Config::new(&assets, &settings)?;
    let pipeline: Pipeline = Pipeline::new(config);

    let report = pipeline.render();
    if flags.once {
        return Ok(if report.cards.is_ok() { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    let (reload, _) = broadcast::channel(16);
    let (_watcher, changes) = FsWatcher::new(pipeline.config().assets())?;

    let watch_pipeline = pipeline.clone();
    let on_render = reload.clone();
    std::thread::spawn(move || {
        cardpress::watch(&watch_pipeline, changes, |report| {
            if report.wrote_output() {
                let _ = on_render.send(());
            }
        });
    });

    let host = settings.host.as_deref().unwrap_or(DEFAULT_HOST);
    let port = settings.port.unwrap_or(DEFAULT_PORT);
    serve::serve(&format!("{host}:{port}"), pipeline.config().assets(), reload).await?;
    Ok(ExitCode::SUCCESS)
}
