use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use lanternwave::config::AppConfig;
use lanternwave::core::codex::{
    CloneRequest, CodexOptions, CodexService, JsonExtractor, ResolveRequest,
};
use lanternwave::core::logging;
use lanternwave::database::{CampaignOps, Database, TenantContext};

#[derive(Parser, Debug)]
#[command(author, version, about = "LanternWave Adventure Codex tools", long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import an extraction JSON file as a new template campaign.
    Import {
        file: PathBuf,
        /// Skip relationship resolution after the import.
        #[arg(long)]
        no_resolve: bool,
    },
    /// Resolve encounter name references of a template into join rows.
    Resolve { template: String },
    /// Clone a template into an existing, empty tenant campaign.
    Clone {
        #[arg(long)]
        template: String,
        #[arg(long)]
        campaign: String,
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        actor: String,
    },
    /// Create a tenant campaign from a template.
    Instantiate {
        #[arg(long)]
        template: String,
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        actor: String,
        /// Campaign name; defaults to the template's name.
        #[arg(long)]
        name: Option<String>,
    },
    /// List template campaigns.
    Templates,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    let _log_guard = logging::init(&config.log_dir(), &config.logging.level);
    tracing::info!("LanternWave v{} starting", lanternwave::VERSION);

    let db = Database::with_options(
        &config.data_dir(),
        config.database.max_connections,
        config.database.busy_timeout_ms,
    )
    .await
    .context("Failed to open database")?;

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            ctrl_c_token.cancel();
        }
    });

    let mut options = CodexOptions::from(&config.codex);
    if let Command::Import { no_resolve: true, .. } = &cli.command {
        options.resolve_on_import = false;
    }
    let service = CodexService::from_database(&db, options);

    let result = run(cli.command, &db, &service, &cancel).await;
    db.close().await;
    result
}

async fn run(
    command: Command,
    db: &Database,
    service: &CodexService,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        Command::Import { file, .. } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let outcome = service.ingest(&JsonExtractor, &source, cancel).await?;
            print_json(&outcome)
        }
        Command::Resolve { template } => {
            let request = ResolveRequest {
                template_campaign_id: template,
            };
            let outcome = service.resolve_encounter_relationships(request, cancel).await?;
            print_json(&outcome)
        }
        Command::Clone {
            template,
            campaign,
            tenant,
            actor,
        } => {
            let request = CloneRequest {
                template_campaign_id: template,
                tenant_campaign_id: campaign,
                tenant_id: tenant,
                created_by: actor,
            };
            let outcome = service.clone_adventure_codex_to_tenant(request, cancel).await?;
            print_json(&outcome)
        }
        Command::Instantiate {
            template,
            tenant,
            actor,
            name,
        } => {
            let context = TenantContext::new(tenant, actor);
            let outcome = service
                .instantiate_codex(&template, &context, name, cancel)
                .await?;
            print_json(&outcome)
        }
        Command::Templates => {
            let templates = db.list_templates().await?;
            print_json(&templates)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
