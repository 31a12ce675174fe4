//! CLI binary for the sheetcast posting pipeline.

mod config;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use config::Config;
use sheetcast_llm::GeminiCaptioner;
use sheetcast_publish::{FacebookPublisher, InstagramPublisher};
use sheetcast_sheets::{load_access_token, SheetsClient};
use sheetcast_workflow::{Workflow, DEFAULT_MAX_STEPS};

#[derive(Parser)]
#[command(
    name = "sheetcast",
    version,
    about = "Posts pending spreadsheet rows to Instagram and Facebook"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Drain the pending rows once and exit (the default)
    Run {
        /// Maximum number of workflow steps before aborting. Prevents runaway loops.
        #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: usize,
    },

    /// Verify the Instagram access token and report the account it belongs to
    CheckToken,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command.unwrap_or(Commands::Run {
        max_steps: DEFAULT_MAX_STEPS,
    }) {
        Commands::Run { max_steps } => cmd_run(max_steps).await?,
        Commands::CheckToken => cmd_check_token().await?,
    }

    Ok(())
}

async fn cmd_run(max_steps: usize) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing::debug!(
        spreadsheet = %config.spreadsheet_id,
        sheet = %config.sheet_name,
        facebook_page = %config.facebook_page_id,
        "Configuration loaded"
    );
    let sheets_token = load_access_token(&config.credentials_path)?;

    let workflow = Workflow::new(
        Arc::new(SheetsClient::new(
            sheets_token,
            config.spreadsheet_id,
            config.sheet_name,
        )),
        Arc::new(GeminiCaptioner::new(config.gemini_api_key)),
        Arc::new(InstagramPublisher::new(
            config.instagram_account_id,
            config.instagram_access_token,
        )),
        Arc::new(FacebookPublisher::new(config.facebook_access_token)),
    )
    .with_max_steps(max_steps);

    let report = workflow.run().await?;

    println!(
        "Posted {} row(s), cleared {} row(s) in {} step(s)",
        report.rows_posted, report.rows_cleared, report.steps
    );
    if let Some(error) = report.final_error {
        println!("Run ended with: {error}");
    }
    Ok(())
}

async fn cmd_check_token() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let publisher = InstagramPublisher::new(
        config.instagram_account_id,
        config.instagram_access_token,
    );

    let info = publisher.account_info().await?;
    println!("Token is valid");
    println!("  ID: {}", info.id);
    println!(
        "  Username: {}",
        info.username.as_deref().unwrap_or("(not specified)")
    );
    Ok(())
}
