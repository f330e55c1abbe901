use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use log::{error, info};
use pitop_onboarding::{
    config::AppConfig,
    device_client::PitopDeviceClient,
    runtime::{Flow, Outcome, Runtime, RuntimeConfig},
};
use std::{io::Write, sync::Arc};

#[tokio::main]
async fn main() {
    match run().await {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            error!("application error: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<Outcome> {
    initialize();

    let config = AppConfig::get();
    let client =
        Arc::new(PitopDeviceClient::new(&config.device).context("failed to create device client")?);

    let mut path = config.page.path.clone();
    let mut search = config.page.search.clone();
    loop {
        let runtime = Runtime::new(Arc::clone(&client), RuntimeConfig::from(config));
        match runtime
            .run(&path, &search)
            .await
            .context("upgrade page failed")?
        {
            Flow::Reload {
                path: next_path,
                search: next_search,
            } => {
                path = next_path;
                search = next_search;
            }
            Flow::Done(outcome) => {
                info!("upgrade step done: {outcome:?}");
                return Ok(outcome);
            }
        }
    }
}

fn initialize() {
    log_panics::init();

    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|f, record| match record.level() {
        log::Level::Error => {
            eprintln!("{}", record.args());
            Ok(())
        }
        _ => {
            writeln!(f, "{}", record.args())
        }
    });

    builder.target(Target::Stdout).init();

    info!(
        "module version: {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_SHORT_REV")
    );
}
