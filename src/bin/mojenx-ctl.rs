use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "mojenx-ctl")]
#[command(about = "Remote client for the mojenx HTTP API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8088")]
    url: String,

    #[arg(short, long, env = "MOJENX_TOKEN", hide_env_values = true)]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current torrc
    Status,
    /// Print the raw torrc text
    Read,
    /// Set SocksPort (Tor is reloaded afterwards)
    SetPort { port: u16 },
    /// Set ExitNodes from comma separated country codes, e.g. "tr,de"
    SetCountries { codes: String },
    /// Enable bridges, one quoted bridge line per argument
    SetBridges {
        #[arg(required = true)]
        bridges: Vec<String>,
    },
    /// Turn bridges off and drop the Bridge lines
    DisableBridges,
    /// Reload the Tor service
    Reload,
    /// Restart the Tor service
    Restart,
    /// Exit IP as seen through Tor
    Ip,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.token))?,
    );
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/api/v1/status")),
        Commands::Read => {
            let res = client
                .get(format!("{base}/api/v1/read"))
                .headers(headers)
                .send()
                .await?;
            let body: Value = res.json().await?;
            match body.get("data").and_then(Value::as_str) {
                Some(text) => println!("{text}"),
                None => eprintln!("Error: {body}"),
            }
            return Ok(());
        }
        Commands::SetPort { port } => client
            .post(format!("{base}/api/v1/set-port"))
            .json(&json!({ "Port": port })),
        Commands::SetCountries { codes } => client
            .post(format!("{base}/api/v1/set-countries"))
            .json(&json!({ "Codes": codes })),
        Commands::SetBridges { bridges } => client
            .post(format!("{base}/api/v1/set-bridges"))
            .json(&json!({ "Bridges": bridges })),
        Commands::DisableBridges => client.post(format!("{base}/api/v1/disable-bridges")),
        Commands::Reload => client.post(format!("{base}/api/v1/reload")),
        Commands::Restart => client.post(format!("{base}/api/v1/restart")),
        Commands::Ip => client.get(format!("{base}/api/v1/get-ip")),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{rendered}");
    } else {
        eprintln!("Error: API returned status {status}");
        eprintln!("{rendered}");
        std::process::exit(1);
    }
    Ok(())
}
