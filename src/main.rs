use std::fs::File;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use futures::StreamExt;
use reading_resources::Reading;
use reading_resources::core::config::{self, ResolvedConfig, ResourcesConfig};
use reading_resources::core::{ReadinessState, ReadingPreferences, ReadingResourcesService};
use reading_resources::resources::{HttpResourceSource, ResourceSource};
use simplelog::{ConfigBuilder, WriteLogger};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(
    name = "reading-resources",
    about = "Keeps the resource package for the selected Quran reading ready"
)]
struct Args {
    /// Reading to prepare (overrides config and environment)
    #[arg(short, long, value_enum)]
    reading: Option<Reading>,

    /// Keep running; read reading names, `retry` or `quit` from stdin
    #[arg(short, long)]
    watch: bool,
}

fn init_logging(config: &ResolvedConfig) {
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create(&config.log_file) {
        let _ = WriteLogger::init(config.log_level, log_config, log_file);
    }
}

fn build_source(config: &ResolvedConfig) -> Arc<dyn ResourceSource> {
    let source = HttpResourceSource::new(config.base_url.clone(), config.resources_dir.clone());
    match &config.bundle_dir {
        Some(dir) => Arc::new(source.with_bundle_dir(dir.clone())),
        None => Arc::new(source),
    }
}

fn describe(state: &ReadinessState) -> String {
    match state {
        ReadinessState::Ready => "ready".to_string(),
        ReadinessState::Downloading { progress } => {
            format!("downloading {:>3.0}%", progress * 100.0)
        }
        ReadinessState::Error(e) => format!("error: {e}"),
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Ignoring config file: {e}");
            ResourcesConfig::default()
        }
    };
    let config = config::resolve(&file_config, args.reading);
    init_logging(&config);

    log::info!(
        "Reading resources starting: reading={:?}, base_url={}, resources_dir={}",
        config.reading,
        config.base_url,
        config.resources_dir.display()
    );

    let preferences = ReadingPreferences::new(config.reading);
    let service = ReadingResourcesService::new(&preferences, build_source(&config));
    let mut states = service.subscribe();

    if !args.watch {
        while let Some(state) = states.next().await {
            println!("{}: {}", preferences.reading().tag(), describe(&state));
            match state {
                ReadinessState::Ready => return Ok(()),
                ReadinessState::Error(e) => return Err(std::io::Error::other(e)),
                ReadinessState::Downloading { .. } => {}
            }
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            state = states.next() => match state {
                Some(state) => println!("{}: {}", preferences.reading().tag(), describe(&state)),
                None => break,
            },
            line = lines.next_line() => match line? {
                Some(line) => match line.trim() {
                    "" => {}
                    "quit" => break,
                    "retry" => service.retry(),
                    name => match Reading::from_str(name, true) {
                        Ok(reading) => preferences.set_reading(reading),
                        Err(_) => eprintln!("Unknown reading '{name}'"),
                    },
                },
                None => break,
            },
        }
    }

    log::info!("Reading resources shutting down");
    Ok(())
}
