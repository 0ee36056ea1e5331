use std::sync::Arc;
use std::{env, process};

use anyhow::Context;
use ocr_gateway::engine::{OcrEngine, StdioEngine};
use ocr_gateway::fetch::FetchClient;
use ocr_gateway::server;
use ocr_gateway::settings::Settings;
use tracing::info;

const USAGE: &str = "usage: ./ocr-gateway [<port> <engine command>]";

/// Optional positional overrides for the configured port and engine command.
fn get_args() -> Option<(u16, String)> {
    let args: Vec<String> = env::args().collect();
    match args.len() - 1 {
        0 => None,
        2 => {
            let port: u16 = args[1].parse().expect("invalid port");
            Some((port, args[2].clone()))
        }
        _ => {
            println!("{USAGE}");
            process::exit(1);
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut settings = Settings::load().context("failed to load settings")?;
    if let Some((port, command)) = get_args() {
        settings.port = port;
        settings.engine.command = command;
    }

    let engine: Arc<dyn OcrEngine> = Arc::new(
        StdioEngine::spawn(&settings.engine.command, &settings.engine.args)
            .context("failed to start the OCR engine process")?,
    );
    let fetch = FetchClient::new().context("failed to build the fetch client")?;

    let base = format!("http://{}:{}", settings.host, settings.port);
    info!("OCR gateway starting on {base}");
    info!("  POST {base}/api/ocr         - upload image for OCR");
    info!("  POST {base}/api/ocr/base64  - submit base64 encoded image");
    info!("  POST {base}/api/ocr/url     - submit image URL for OCR");
    info!("  GET  {base}/api/health      - health check");
    info!("  GET  {base}/api/version     - version info");
    info!("example: curl -X POST {base}/api/ocr -F \"image=@test.jpg\"");

    server::run(&settings, engine, fetch)
        .await
        .with_context(|| format!("failed to serve on {}:{}", settings.host, settings.port))
}
