use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use reqwest::multipart;
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Parser)]
#[command(name = "showcase-cli")]
#[command(about = "Exercise a running deploy-showcase service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000", env = "SHOWCASE_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Service health, platform and system stats
    Health,
    /// Request counters and latency statistics
    Metrics,
    /// Detected hosting platform
    Platform,
    /// Latency baseline
    Fast,
    /// Simulated slow request (sleep, or outbound HTTP when --url is given)
    Slow {
        #[arg(long)]
        sleep_sec: Option<f64>,
        #[arg(long)]
        url: Option<String>,
    },
    /// Proxy a GET through the service
    External {
        #[arg(long)]
        url: Option<String>,
    },
    /// Download a generated file
    Download {
        #[arg(long, default_value_t = 1024)]
        size: i64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload a local file
    Upload { path: PathBuf },
    /// Send one WebSocket message and print the echo
    Echo { message: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let base = cli.url.trim_end_matches('/').to_string();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => print_response(client.get(format!("{}/health", base)).send().await?).await?,
        Commands::Metrics => print_response(client.get(format!("{}/metrics", base)).send().await?).await?,
        Commands::Platform => print_response(client.get(format!("{}/platform", base)).send().await?).await?,
        Commands::Fast => print_response(client.get(format!("{}/fast", base)).send().await?).await?,
        Commands::Slow { sleep_sec, url } => {
            let body = match url {
                Some(url) => json!({ "mode": "http", "url": url }),
                None => match sleep_sec {
                    Some(secs) => json!({ "mode": "sleep", "sleep_sec": secs }),
                    None => json!({ "mode": "sleep" }),
                },
            };
            let res = client.post(format!("{}/slow", base)).json(&body).send().await?;
            print_response(res).await?;
        }
        Commands::External { url } => {
            let mut req = client.get(format!("{}/external", base));
            if let Some(url) = url {
                req = req.query(&[("url", url)]);
            }
            print_response(req.send().await?).await?;
        }
        Commands::Download { size, output } => {
            let res = client
                .get(format!("{}/download", base))
                .query(&[("size", size)])
                .send()
                .await?;
            let status = res.status();
            let disposition = res
                .headers()
                .get(reqwest::header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let bytes = res.bytes().await?;
            if let Some(path) = output {
                tokio::fs::write(&path, &bytes).await?;
            }
            let summary = json!({
                "status": status.as_u16(),
                "size_bytes": bytes.len(),
                "content_disposition": disposition,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Upload { path } => {
            let data = tokio::fs::read(&path).await?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.bin".to_string());
            let part = multipart::Part::bytes(data)
                .file_name(filename)
                .mime_str("application/octet-stream")?;
            let form = multipart::Form::new().part("file", part);
            let res = client.post(format!("{}/upload", base)).multipart(form).send().await?;
            print_response(res).await?;
        }
        Commands::Echo { message } => {
            let ws_url = format!("{}/ws", base.replacen("http", "ws", 1));
            let (mut socket, _) = connect_async(ws_url.as_str()).await?;
            socket.send(Message::text(message)).await?;
            match socket.next().await {
                Some(Ok(reply)) => println!("{}", reply.to_text()?),
                Some(Err(e)) => return Err(e.into()),
                None => eprintln!("Error: connection closed before echo"),
            }
            socket.close(None).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await?;
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
