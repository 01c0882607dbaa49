use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use super::api_client::ScoringClient;
use super::form::{FormController, FormView, SubmitOutcome};
use super::models::UploadCandidate;
use super::render::run_effects;
use super::service::CoreService;
use super::terminal::{OutputMode, TerminalHost};

#[derive(Debug, Parser)]
#[command(
    name = "cv-match",
    version,
    about = "Checks how well a CV matches a job offer"
)]
pub struct Cli {
    /// Scoring service root, overriding saved settings for this run
    #[arg(long, global = true)]
    pub service_url: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a CV and a job offer and show the match dashboard
    Analyze(AnalyzeArgs),
    /// Check whether the scoring service is up
    Health,
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// CV in PDF format (5MB max)
    #[arg(long)]
    pub cv: PathBuf,

    /// File holding the job offer text, or "-" for stdin
    #[arg(long, conflicts_with = "offer_text", required_unless_present = "offer_text")]
    pub offer: Option<PathBuf>,

    #[arg(long)]
    pub offer_text: Option<String>,

    /// Print the raw analysis result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print the effective settings
    Show,
    /// Save the scoring service root
    SetUrl { url: String },
}

pub async fn execute(service: &CoreService, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Analyze(args) => {
            let client = service.scoring_client().await?;
            let mode = if args.json {
                OutputMode::Json
            } else {
                OutputMode::Dashboard
            };
            let succeeded = analyze_cv(&client, &args, TerminalHost::stdio(mode)).await?;
            Ok(if succeeded {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Health => health(&service.scoring_client().await?).await,
        Command::Settings(SettingsCommand::Show) => {
            let settings = service.get_settings().await;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            println!("(file: {})", service.settings_path().display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Settings(SettingsCommand::SetUrl { url }) => {
            let saved = service.save_service_url(&url).await?;
            println!("Service URL set to {}", saved.service_url);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Runs the upload form once: pick the file, type the offer, submit.
/// Returns false when the failure was already reported to the user.
pub async fn analyze_cv<W: Write, E: Write>(
    client: &ScoringClient,
    args: &AnalyzeArgs,
    host: TerminalHost<W, E>,
) -> anyhow::Result<bool> {
    let job_offer = read_offer(args)?;
    let candidate = UploadCandidate::from_path(&args.cv).await?;

    let mut form = FormController::new(host);
    if form.handle_file(candidate).is_err() {
        return Ok(false);
    }

    form.set_job_offer(job_offer);
    if let Err(err) = form.readiness() {
        form.view_mut().alert(&err.to_string());
        return Ok(false);
    }

    match form.submit(client).await {
        SubmitOutcome::Rendered { dashboard, .. } => {
            run_effects(form.view_mut(), &dashboard.effects).await;
            Ok(true)
        }
        SubmitOutcome::Failed(_) | SubmitOutcome::Ignored => Ok(false),
    }
}

pub async fn health(client: &ScoringClient) -> anyhow::Result<ExitCode> {
    if !client.check_health().await {
        println!("Scoring service at {} is not reachable", client.root_url());
        return Ok(ExitCode::FAILURE);
    }

    let version = client
        .service_info()
        .await
        .and_then(|info| info.version)
        .map(|version| format!(" (version {version})"))
        .unwrap_or_default();
    println!("Scoring service at {} is up{version}", client.root_url());
    Ok(ExitCode::SUCCESS)
}

fn read_offer(args: &AnalyzeArgs) -> anyhow::Result<String> {
    if let Some(text) = &args.offer_text {
        return Ok(text.clone());
    }

    match args.offer.as_deref() {
        Some(path) if path == Path::new("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read job offer from stdin")?;
            Ok(text)
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read job offer file {}", path.display())),
        None => anyhow::bail!("a job offer is required (--offer or --offer-text)"),
    }
}
