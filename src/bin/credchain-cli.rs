use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "credchain-cli")]
#[command(about = "Management CLI for the credential chain service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status and request counts
    Status,
    /// List pending credential requests
    Pending,
    /// Show a single request
    Show { id: String },
    /// Approve a request and issue the credential on-chain
    Approve {
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Approve a request without an on-chain issuance
    ApproveOffChain {
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Reject a request (reason required)
    Reject { id: String, reason: String },
    /// Reconcile a request stuck after a post-broadcast failure
    Reconcile { id: String },
    /// Revoke an issued credential (reason required)
    Revoke { number: String, reason: String },
    /// Resolve a verification payload (public endpoint, no auth)
    Verify { payload: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{}/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Pending => {
            let res = client
                .get(format!("{}/requests?status=pending", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Show { id } => {
            let res = client
                .get(format!("{}/requests/{}", cli.url, id))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Approve { id, notes } => {
            let res = client
                .post(format!("{}/requests/{}/approve", cli.url, id))
                .headers(headers)
                .json(&json!({ "admin_notes": notes }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::ApproveOffChain { id, notes } => {
            let res = client
                .post(format!("{}/requests/{}/approve-off-chain", cli.url, id))
                .headers(headers)
                .json(&json!({ "admin_notes": notes }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Reject { id, reason } => {
            let res = client
                .post(format!("{}/requests/{}/reject", cli.url, id))
                .headers(headers)
                .json(&json!({ "reason": reason }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Reconcile { id } => {
            let res = client
                .post(format!("{}/requests/{}/reconcile", cli.url, id))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Revoke { number, reason } => {
            let res = client
                .post(format!("{}/credentials/{}/revoke", cli.url, number))
                .headers(headers)
                .json(&json!({ "reason": reason }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Verify { payload } => {
            let res = client
                .get(format!("{}/verify/{}", cli.url, payload))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
