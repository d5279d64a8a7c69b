/// # drillkit CLI interface
///
/// Argument parsing and orchestration for the `drillkit` binary. The
/// workflows themselves (fingerprinting, registration, deletion planning,
/// publishing) live in [`drillkit-core`]; this module loads configuration,
/// builds the HTTP adapters and wires them into those workflows.
///
/// ## Commands
/// - `register <files...>` (alias `draft`): upload and record PDF drills.
/// - `delete <title> [--force]`: remove a drill, its files and orphan tags.
/// - `publish <content-id>`: move a CMS draft to published.
///
/// For programmatic and integration use, call [`run`] with a constructed [`Cli`].
///
/// [`drillkit-core`]: ../../drillkit_core/
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use drillkit_core::delete::{DeletionOutcome, Deleter};
use drillkit_core::inputs::collect_pdf_inputs;
use drillkit_core::publish::publish;
use drillkit_core::register::{
    normalize_description, parse_tags, FileOutcome, RegisterRequest, Registrar,
};
use drillkit_core::thumbnail::ImageMagickRenderer;
use drillkit_core::DrillError;

use crate::cms::MicroCmsClient;
use crate::load_config::{load_config, AppConfig};
use crate::prompt::StdinConfirmer;
use crate::repository::PostgrestRepository;
use crate::revalidate::{revalidate_drills, HttpRevalidator};
use crate::storage::SupabaseStorage;

/// CLI for drillkit: manage PDF drills in storage, the database and the CMS.
#[derive(Parser)]
#[clap(
    name = "drillkit",
    version,
    about = "Upload, register, publish and delete PDF drills"
)]
pub struct Cli {
    /// Optional YAML file whose keys override the environment
    #[clap(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload and register PDF drills (files or directories)
    #[clap(alias = "draft")]
    Register {
        /// PDF files, or directories whose PDFs should be registered
        #[clap(required = true)]
        files: Vec<PathBuf>,
        /// Comma-separated tags
        #[clap(long, default_value = "")]
        tags: String,
        /// Description text
        #[clap(long)]
        desc: Option<String>,
        /// Title override (single file only)
        #[clap(long)]
        title: Option<String>,
    },
    /// Delete a drill by title, with its files and unused tags
    Delete {
        title: String,
        /// Skip the confirmation prompt
        #[clap(long, short = 'f')]
        force: bool,
    },
    /// Publish a draft content record
    Publish { content_id: String },
}

fn http_client() -> Result<reqwest::Client, DrillError> {
    reqwest::Client::builder()
        .user_agent(concat!("drillkit/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DrillError::Config(format!("failed to build HTTP client: {e}")))
}

fn renderer(config: &AppConfig) -> ImageMagickRenderer {
    match &config.thumbnail_command {
        Some(command) => ImageMagickRenderer::new(command.clone()),
        None => ImageMagickRenderer::detect(),
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Register {
            files,
            tags,
            desc,
            title,
        } => register(&config, files, &tags, desc.as_deref(), title).await,
        Commands::Delete { title, force } => delete(&config, &title, force).await,
        Commands::Publish { content_id } => {
            let settings = config.microcms()?;
            let client = MicroCmsClient::new(http_client()?, &settings);
            tracing::info!(command = "publish", content_id = %content_id, "Publishing content");
            publish(&client, &content_id).await?;
            println!("Successfully published content: {content_id}");
            Ok(())
        }
    }
}

async fn register(
    config: &AppConfig,
    files: Vec<PathBuf>,
    tags: &str,
    desc: Option<&str>,
    title: Option<String>,
) -> Result<()> {
    let settings = config.supabase()?;

    let pdf_paths = collect_pdf_inputs(&files)?;
    if pdf_paths.is_empty() {
        tracing::info!("No PDF files found.");
        return Ok(());
    }
    tracing::info!(count = pdf_paths.len(), "Found PDF files");

    if title.is_some() && pdf_paths.len() > 1 {
        return Err(DrillError::InvalidInput(
            "cannot specify --title when registering multiple files".to_string(),
        )
        .into());
    }

    let http = http_client()?;
    let store = SupabaseStorage::new(http.clone(), &settings)?;
    let repo = PostgrestRepository::new(http.clone(), &settings);
    let renderer = renderer(config);

    let request = RegisterRequest {
        pdf_paths,
        tags: parse_tags(tags),
        description: normalize_description(desc),
        title_override: title,
    };
    let report = Registrar::new(&store, &repo, &renderer)
        .register(&request)
        .await?;

    for file in &report.files {
        match &file.outcome {
            FileOutcome::Registered { drill_id, title } => {
                println!("Registered {} as '{title}' (ID: {drill_id})", file.path.display())
            }
            FileOutcome::TagsUpdated { drill_id, title } => println!(
                "Already registered {} as '{title}' (ID: {drill_id}), tags updated",
                file.path.display()
            ),
            FileOutcome::Failed { error } => {
                println!("Failed {}: {error}", file.path.display())
            }
        }
    }
    tracing::info!(
        registered = report.registered(),
        updated = report.updated(),
        failed = report.failed(),
        "Registration batch complete"
    );

    let revalidator = config
        .revalidate()
        .map(|settings| HttpRevalidator::new(http, &settings));
    revalidate_drills(revalidator.as_ref()).await;
    Ok(())
}

async fn delete(config: &AppConfig, title: &str, force: bool) -> Result<()> {
    let settings = config.supabase()?;
    let http = http_client()?;
    let store = SupabaseStorage::new(http.clone(), &settings)?;
    let repo = PostgrestRepository::new(http, &settings);
    let confirmer = StdinConfirmer;

    tracing::info!(command = "delete", title, force, "Deleting drill");
    match Deleter::new(&store, &repo, &confirmer)
        .delete(title, force)
        .await?
    {
        DeletionOutcome::Cancelled => println!("Operation cancelled."),
        DeletionOutcome::Deleted(report) => {
            println!("Successfully deleted drill '{title}' and associated resources.");
            if !report.failed_files.is_empty() || !report.failed_tags.is_empty() {
                tracing::warn!(
                    failed_files = ?report.failed_files,
                    failed_tags = ?report.failed_tags,
                    "Some resources could not be removed"
                );
            }
        }
    }
    Ok(())
}
