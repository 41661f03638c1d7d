use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "orchestrator-cli")]
#[command(about = "Operator CLI for the payment orchestrator", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a deposit
    Deposit {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "EUR")]
        currency: String,
        /// Preferred gateway id
        #[arg(long)]
        gateway: Option<i64>,
    },
    /// Submit a withdrawal
    Withdraw {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "EUR")]
        currency: String,
        /// Preferred gateway id
        #[arg(long)]
        gateway: Option<i64>,
    },
    /// Deliver a gateway status callback
    Callback {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        status: String,
        #[arg(long)]
        gateway: i64,
    },
    /// Show circuit breaker and gateway health
    Status,
    /// Show one transaction
    Transaction { id: i64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Deposit { user, amount, currency, gateway } => {
            client
                .post(format!("{}/deposit", base))
                .json(&request_body(user, &amount, &currency, gateway))
                .send()
                .await?
        }
        Commands::Withdraw { user, amount, currency, gateway } => {
            client
                .post(format!("{}/withdrawal", base))
                .json(&request_body(user, &amount, &currency, gateway))
                .send()
                .await?
        }
        Commands::Callback { id, status, gateway } => {
            client
                .get(format!("{}/callback", base))
                .query(&[
                    ("id", id.to_string()),
                    ("status", status),
                    ("gateway", gateway.to_string()),
                ])
                .send()
                .await?
        }
        Commands::Status => client.get(format!("{}/status", base)).send().await?,
        Commands::Transaction { id } => {
            client
                .get(format!("{}/transactions/{}", base, id))
                .send()
                .await?
        }
    };

    print_response(res).await
}

/// Amounts are sent as strings so the server keeps their exact scale.
fn request_body(user: i64, amount: &str, currency: &str, gateway: Option<i64>) -> Value {
    json!({
        "amount": amount,
        "user_id": user,
        "currency": currency,
        "gateway_id": gateway,
    })
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
