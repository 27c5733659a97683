//! `voicecast` — one subcommand per pipeline stage plus `models` and
//! `status` (spec.md §6, §4.10). No interactive menus: every decision
//! arrives as a flag or a file, never stdin, since the caller driving this
//! tool is expected to be an LLM session as much as a human operator.

use std::fs;
use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use voicecast_config::{AppConfig, ClusterAlgorithmChoice};
use voicecast_core::atomic_io::{read_json_opt, write_json_atomic};
use voicecast_core::ids::{ClusterId, MessageId};
use voicecast_core::model::{
    EnrichedMessage, FilteredMessage, Phase, PersonaRegistry, RawEmail, RawLinkedInPost,
    RawMessage, RejectionRecord, UserFeedback, ValidationPair, ValidationResult,
};
use voicecast_core::{DataPaths, PipelineError};
use voicecast_fetch::{holdout_split, persist_split, JsonFileMessageSource, RawMessageSource};
use voicecast_state::state_store_for;

#[derive(Debug, Parser)]
#[command(
    name = "voicecast",
    version,
    about = "Mines your own authored writing into portable, model-agnostic persona prompts"
)]
struct Cli {
    /// Override the data directory (defaults to $VOICECAST_DATA, then ~/Documents/voicecast).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = "config/default.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch raw emails from a JSON-file source and split off a held-out validation set.
    FetchEmails {
        /// Directory containing emails.json. Defaults to <data_dir>/incoming.
        #[arg(long)]
        source_dir: Option<PathBuf>,
        #[arg(long)]
        holdout: Option<f64>,
    },
    /// Fetch raw LinkedIn posts from a JSON-file source.
    FetchLinkedin {
        #[arg(long)]
        source_dir: Option<PathBuf>,
    },
    /// Run the quality filter over raw_samples/.
    Filter,
    /// Attach recipient/audience/thread context to filtered_samples/.
    Enrich,
    /// Embed enriched message bodies.
    Embed,
    /// Cluster the embedding matrix into persona groups.
    Cluster {
        #[arg(long, value_parser = ["density", "partitional"])]
        algorithm: Option<String>,
        #[arg(long)]
        k: Option<usize>,
        #[arg(long = "min-cluster")]
        min_cluster: Option<usize>,
    },
    /// Expose one cluster's members to the caller-LLM for analysis.
    #[command(name = "prepare-batch")]
    PrepareBatch {
        #[arg(long)]
        cluster: i32,
        /// Print required-vs-have coverage counts instead of the batch body.
        #[arg(long)]
        coverage: bool,
    },
    /// Fold a completed batch file back into the persona registry.
    #[command(name = "ingest-batch")]
    IngestBatch {
        batch_file: PathBuf,
        #[arg(long)]
        target_coverage: Option<f64>,
        #[arg(long)]
        force: bool,
    },
    /// Build the single unified LinkedIn persona.
    Linkedin,
    /// Held-out blind validation (phase 1 automatic, phase 2 interactive feedback).
    Validate {
        #[arg(long)]
        auto: bool,
        /// Print the worst-scoring pairs first, for operator review.
        #[arg(long)]
        review: bool,
        /// Record a verdict for one pair id; requires --sounds-like-me.
        #[arg(long)]
        feedback: Option<String>,
        #[arg(long = "sounds-like-me")]
        sounds_like_me: Option<bool>,
        #[arg(long)]
        notes: Option<String>,
        /// Print suggestion records synthesized from recorded feedback.
        #[arg(long)]
        suggestions: bool,
        /// Compute and print without writing any artefact.
        #[arg(long)]
        dry_run: bool,
    },
    /// List or select the OpenRouter model used by the validator.
    Models {
        #[arg(long = "list-models")]
        list_models: bool,
        #[arg(long = "set-model")]
        set_model: Option<String>,
    },
    /// Report current phase and artefact consistency.
    Status {
        /// Verify artefacts on disk agree with the recorded phase.
        #[arg(long)]
        check: bool,
        /// Print per-stage counts.
        #[arg(long)]
        all: bool,
        /// Advance past validation into generation/complete.
        #[arg(long)]
        finalize: bool,
        /// Bypass the phase-2-feedback-required gate on --finalize.
        #[arg(long)]
        force: bool,
    },
}

fn user_domain(cfg: &AppConfig) -> String {
    if let Some(domain) = cfg.user.internal_domains.first() {
        return domain.clone();
    }
    cfg.user
        .email_address
        .split('@')
        .nth(1)
        .unwrap_or("example.com")
        .to_string()
}

fn load_registry(paths: &DataPaths) -> Result<PersonaRegistry> {
    Ok(read_json_opt(&paths.persona_registry_file())?.unwrap_or_default())
}

fn load_filtered(paths: &DataPaths) -> Result<Vec<FilteredMessage>> {
    Ok(read_json_opt(&paths.filtered_samples_dir().join("emails.json"))?.unwrap_or_default())
}

fn load_enriched(paths: &DataPaths) -> Result<Vec<EnrichedMessage>> {
    Ok(read_json_opt(&paths.enriched_samples_dir().join("emails.json"))?.unwrap_or_default())
}

fn embed_inputs(messages: &[EnrichedMessage]) -> Vec<(MessageId, String)> {
    messages
        .iter()
        .map(|m| {
            let body = match &m.filtered.raw {
                RawMessage::Email(email) => voicecast_filter::strip_quotes(&email.body),
                RawMessage::LinkedInPost(post) => post.text.clone(),
            };
            (m.filtered.id.clone(), body)
        })
        .collect()
}

async fn run_fetch_emails(
    paths: &DataPaths,
    cfg: &AppConfig,
    source_dir: Option<PathBuf>,
    holdout: Option<f64>,
) -> Result<(), PipelineError> {
    let store = state_store_for(paths.root());
    store.require_phase(Phase::Preprocessing)?;

    let dir = source_dir.unwrap_or_else(|| paths.root().join("incoming"));
    let source = JsonFileMessageSource::in_dir(&dir);
    let emails: Vec<RawEmail> = source.fetch_emails()?;
    if emails.is_empty() {
        warn!(dir = %dir.display(), "no emails found at source directory");
    }

    let ratio = holdout.unwrap_or(cfg.validation.holdout_ratio);
    let split = holdout_split(emails, ratio, cfg.cluster.seed);

    fs::create_dir_all(paths.raw_samples_dir()).map_err(|e| anyhow::anyhow!(e))?;
    fs::create_dir_all(paths.validation_set_dir()).map_err(|e| anyhow::anyhow!(e))?;
    persist_split(&split, &paths.raw_samples_dir(), &paths.validation_set_dir())?;

    info!(
        training = split.training.len(),
        held_out = split.held_out.len(),
        "fetched and split email corpus"
    );
    store.transition(Phase::Preprocessing, Default::default())?;
    Ok(())
}

async fn run_fetch_linkedin(paths: &DataPaths, source_dir: Option<PathBuf>) -> Result<(), PipelineError> {
    let store = state_store_for(paths.root());
    store.require_phase(Phase::Preprocessing)?;

    let dir = source_dir.unwrap_or_else(|| paths.root().join("incoming"));
    let source = JsonFileMessageSource::in_dir(&dir);
    let posts: Vec<RawLinkedInPost> = source.fetch_linkedin_posts()?;
    if posts.is_empty() {
        warn!(dir = %dir.display(), "no LinkedIn posts found at source directory");
    }

    fs::create_dir_all(paths.raw_samples_dir()).map_err(|e| anyhow::anyhow!(e))?;
    write_json_atomic(&paths.raw_samples_dir().join("linkedin_posts.json"), &posts)?;

    info!(count = posts.len(), "fetched LinkedIn posts");
    store.transition(Phase::Preprocessing, Default::default())?;
    Ok(())
}

fn run_filter(paths: &DataPaths, cfg: &AppConfig) -> Result<(), PipelineError> {
    let store = state_store_for(paths.root());
    store.require_phase(Phase::Preprocessing)?;

    let raw: Vec<RawEmail> =
        read_json_opt(&paths.raw_samples_dir().join("emails.json"))?.unwrap_or_default();

    let mut accepted = Vec::new();
    let mut rejected: Vec<RejectionRecord> = Vec::new();
    for email in &raw {
        match voicecast_filter::filter_email(email, &cfg.user.email_address, &cfg.filter) {
            voicecast_filter::FilterOutcome::Accepted(m) => accepted.push(m),
            voicecast_filter::FilterOutcome::Rejected(r) => rejected.push(r),
        }
    }

    fs::create_dir_all(paths.filtered_samples_dir()).map_err(|e| anyhow::anyhow!(e))?;
    write_json_atomic(&paths.filtered_samples_dir().join("emails.json"), &accepted)?;
    write_json_atomic(&paths.filtered_samples_dir().join("rejections.json"), &rejected)?;

    info!(accepted = accepted.len(), rejected = rejected.len(), "filtered raw email corpus");
    store.transition(Phase::Preprocessing, Default::default())?;
    Ok(())
}

fn run_enrich(paths: &DataPaths, cfg: &AppConfig) -> Result<(), PipelineError> {
    let store = state_store_for(paths.root());
    store.require_phase(Phase::Preprocessing)?;

    let filtered = load_filtered(paths)?;
    let domain = user_domain(cfg);
    let enriched: Vec<EnrichedMessage> = filtered
        .into_iter()
        .map(|m| voicecast_enrich::enrich(m, &domain, &cfg.enrich))
        .collect();

    fs::create_dir_all(paths.enriched_samples_dir()).map_err(|e| anyhow::anyhow!(e))?;
    write_json_atomic(&paths.enriched_samples_dir().join("emails.json"), &enriched)?;

    info!(count = enriched.len(), "enriched filtered corpus with message context");
    store.mark_complete(Phase::Preprocessing, Default::default())?;
    store.transition(Phase::Analysis, Default::default())?;
    Ok(())
}

fn run_embed(paths: &DataPaths, cfg: &AppConfig) -> Result<(), PipelineError> {
    let store = state_store_for(paths.root());
    store.require_phase(Phase::Analysis)?;

    let enriched = load_enriched(paths)?;
    let inputs = embed_inputs(&enriched);

    fs::create_dir_all(paths.embeddings_dir()).map_err(|e| anyhow::anyhow!(e))?;
    let matrix = voicecast_embed::load_or_regenerate(
        &inputs,
        &cfg.embed,
        &paths.embedding_matrix_file(),
        &paths.embedding_index_file(),
    )?;

    info!(rows = matrix.rows.len(), model = %matrix.index.model_id, "embedded enriched corpus");
    store.transition(Phase::Analysis, Default::default())?;
    Ok(())
}

fn run_cluster(
    paths: &DataPaths,
    cfg: &AppConfig,
    algorithm: Option<String>,
    k: Option<usize>,
    min_cluster: Option<usize>,
) -> Result<(), PipelineError> {
    let store = state_store_for(paths.root());
    store.require_phase(Phase::Analysis)?;

    let enriched = load_enriched(paths)?;
    let inputs = embed_inputs(&enriched);
    let matrix = voicecast_embed::load_or_regenerate(
        &inputs,
        &cfg.embed,
        &paths.embedding_matrix_file(),
        &paths.embedding_index_file(),
    )?;

    let mut cluster_cfg = cfg.cluster.clone();
    if let Some(algorithm) = algorithm {
        cluster_cfg.algorithm = match algorithm.as_str() {
            "density" => ClusterAlgorithmChoice::Density,
            "partitional" => ClusterAlgorithmChoice::Partitional,
            other => {
                return Err(PipelineError::Config(format!("unknown clustering algorithm: {other}")))
            }
        };
    }
    if let Some(k) = k {
        cluster_cfg.k = Some(k);
    }
    if let Some(min_cluster) = min_cluster {
        cluster_cfg.min_cluster_size = min_cluster;
    }

    let run = voicecast_cluster::run_clustering(&matrix.index.ids, &matrix.rows, &cluster_cfg);
    write_json_atomic(&paths.clusters_file(), &run)?;

    info!(
        clusters = run.clusters.len(),
        noise_ratio = run.noise_ratio,
        algorithm = ?run.algorithm,
        "clustered embedding matrix"
    );
    store.transition(Phase::Analysis, Default::default())?;
    Ok(())
}

fn run_prepare_batch(paths: &DataPaths, cfg: &AppConfig, cluster_id: i32, coverage_only: bool) -> Result<(), PipelineError> {
    let store = state_store_for(paths.root());
    store.require_phase(Phase::Analysis)?;

    let run: voicecast_core::model::ClusterRun = read_json_opt(&paths.clusters_file())?
        .ok_or_else(|| PipelineError::Config("clusters.json is missing; run `cluster` first".to_string()))?;
    let cluster = voicecast_batch::find_cluster(&run.clusters, ClusterId(cluster_id))
        .ok_or_else(|| PipelineError::Config(format!("no such cluster: {cluster_id}")))?;
    let enriched = load_enriched(paths)?;
    let registry = load_registry(paths)?;

    if coverage_only {
        let (have, required) = voicecast_batch::coverage_report(cluster, &registry, &cfg.batch);
        println!("cluster {cluster_id}: {have}/{required} members analysed");
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    voicecast_batch::prepare_batch(&mut handle, cluster, &enriched, &registry, &cfg.batch)
        .context("writing batch to stdout")?;
    Ok(())
}

fn run_ingest_batch(
    paths: &DataPaths,
    cfg: &AppConfig,
    batch_file: &std::path::Path,
    target_coverage: Option<f64>,
    force: bool,
) -> Result<(), PipelineError> {
    let store = state_store_for(paths.root());
    store.require_phase(Phase::Analysis)?;

    let bytes = fs::read(batch_file).map_err(|e| anyhow::anyhow!(e))?;
    let batch = voicecast_batch::parse_batch(&bytes)?;
    let run: voicecast_core::model::ClusterRun = read_json_opt(&paths.clusters_file())?
        .ok_or_else(|| PipelineError::Config("clusters.json is missing; run `cluster` first".to_string()))?;
    let registry = load_registry(paths)?;

    let mut batch_cfg = cfg.batch.clone();
    if let Some(target) = target_coverage {
        batch_cfg.target_coverage = target;
    }

    let cluster_id = batch.cluster_id;
    let updated = voicecast_batch::ingest(batch, registry, &run, &batch_cfg, force)?;
    write_json_atomic(&paths.persona_registry_file(), &updated)?;

    info!(cluster_id = %cluster_id, "ingested batch into persona registry");
    store.transition(Phase::Analysis, Default::default())?;
    Ok(())
}

fn run_linkedin(paths: &DataPaths, cfg: &AppConfig) -> Result<(), PipelineError> {
    let store = state_store_for(paths.root());
    store.require_phase(Phase::LinkedIn)?;

    let posts: Vec<RawLinkedInPost> =
        read_json_opt(&paths.raw_samples_dir().join("linkedin_posts.json"))?.unwrap_or_default();
    if posts.is_empty() {
        warn!("no LinkedIn posts on disk; run `fetch-linkedin` first");
    }

    let persona = voicecast_linkedin::unify(&posts, &cfg.linkedin);
    write_json_atomic(&paths.linkedin_persona_file(), &persona)?;

    info!(sample_size = persona.sample_size, confidence = persona.confidence, "unified LinkedIn persona");
    store.transition(Phase::LinkedIn, Default::default())?;
    Ok(())
}

async fn run_validate(
    paths: &DataPaths,
    cfg: &AppConfig,
    auto: bool,
    review: bool,
    feedback_pair: Option<String>,
    sounds_like_me: Option<bool>,
    notes: Option<String>,
    suggestions: bool,
    dry_run: bool,
) -> Result<(), PipelineError> {
    let store = state_store_for(paths.root());
    store.require_phase(Phase::Validation)?;

    let registry = load_registry(paths)?;

    if auto {
        let held_out: Vec<RawEmail> =
            match read_json_opt(&paths.validation_set_dir().join("emails.json"))? {
                Some(held_out) if !held_out.is_empty() => held_out,
                _ => {
                    warn!("no held-out validation set on disk; skipping phase 1");
                    return Ok(());
                }
            };

        let domain = user_domain(cfg);
        let pairs: Vec<ValidationPair> =
            match read_json_opt(&paths.validation_pairs_file())? {
                Some(pairs) => pairs,
                None => voicecast_validate::extract_pairs(&held_out, &registry, &domain, &cfg.enrich),
            };

        let selected_model = read_json_opt::<voicecast_validate::model_select::SelectedModel>(
            &paths.openrouter_model_file(),
        )?;
        let api_key_present = std::env::var("OPENROUTER_API_KEY").map(|v| !v.is_empty()).unwrap_or(false);

        let router;
        let (router_ref, model_ref) = if api_key_present {
            if let Some(selected) = &selected_model {
                router = voicecast_llm::LlmRouter::default();
                (Some(&router), Some(selected.model_id.as_str()))
            } else {
                warn!("OPENROUTER_API_KEY set but no model selected; run `models --set-model`; falling back to template composition");
                (None, None)
            }
        } else {
            info!("no OPENROUTER_API_KEY configured; composing replies from persona templates");
            (None, None)
        };

        let report = voicecast_validate::run_phase1(&pairs, &registry, router_ref, model_ref, &cfg.validation).await;

        println!(
            "validation phase 1: {} pairs, average overall {:.3}",
            report.results.len(),
            report.average_overall
        );
        for (persona, average) in &report.per_persona_average {
            println!("  {persona}: {average:.3}");
        }

        if !dry_run {
            write_json_atomic(&paths.validation_pairs_file(), &pairs)?;
            write_json_atomic(&paths.validation_results_file(), &report.results)?;
            write_json_atomic(&paths.validation_report_file(), &report)?;
            store.mark_complete(Phase::Validation, Default::default())?;
        }
    }

    if review {
        let results: Vec<ValidationResult> =
            read_json_opt(&paths.validation_results_file())?.unwrap_or_default();
        let ranked = voicecast_validate::feedback::ranked_mismatches(&results);
        for result in &ranked {
            println!(
                "{} overall={:.3} tone={:.3} greeting={:.3} closing={:.3}",
                result.pair_id, result.overall, result.tone_match, result.greeting_match, result.closing_match
            );
        }
    }

    if let Some(pair_id) = feedback_pair {
        let sounds_like_me = sounds_like_me.ok_or_else(|| {
            PipelineError::Config("--feedback requires --sounds-like-me true|false".to_string())
        })?;
        let mut existing: Vec<UserFeedback> =
            read_json_opt(&paths.validation_feedback_file())?.unwrap_or_default();
        voicecast_validate::feedback::record_feedback(&mut existing, &pair_id, sounds_like_me, notes);
        if !dry_run {
            write_json_atomic(&paths.validation_feedback_file(), &existing)?;
        }
        println!("recorded feedback for {pair_id}: sounds_like_me={sounds_like_me}");
    }

    if suggestions {
        let pairs: Vec<ValidationPair> = read_json_opt(&paths.validation_pairs_file())?.unwrap_or_default();
        let results: Vec<ValidationResult> = read_json_opt(&paths.validation_results_file())?.unwrap_or_default();
        let feedback: Vec<UserFeedback> = read_json_opt(&paths.validation_feedback_file())?.unwrap_or_default();
        let records = voicecast_validate::feedback::build_suggestions(&pairs, &results, &feedback, &registry.personas);
        for record in &records {
            println!(
                "[{}] {}: \"{}\" -> \"{}\" ({})",
                record.persona_name, record.field, record.current_value, record.suggested_value, record.rationale
            );
        }
    }

    Ok(())
}

async fn run_models(paths: &DataPaths, list_models: bool, set_model: Option<String>) -> Result<()> {
    if list_models {
        let models = voicecast_validate::model_select::list_models().await?;
        for model in &models {
            println!("{model}");
        }
    }

    if let Some(model_id) = set_model {
        voicecast_validate::model_select::persist_selected_model(&paths.openrouter_model_file(), &model_id)?;
        println!("selected model: {model_id}");
    }

    if !list_models && set_model.is_none() {
        match voicecast_validate::model_select::load_selected_model(&paths.openrouter_model_file())? {
            Some(selected) => println!("current model: {}", selected.model_id),
            None => println!("no model selected; run `models --list-models` then `models --set-model <id>`"),
        }
    }

    Ok(())
}

fn run_status(paths: &DataPaths, check: bool, all: bool, finalize: bool, force: bool) -> Result<(), PipelineError> {
    let store = state_store_for(paths.root());
    let state = store.load()?;
    println!("phase: {}", state.current_phase.as_str());

    if check {
        let expectations: &[(Phase, &str, PathBuf)] = &[
            (Phase::Preprocessing, "filtered_samples/emails.json", paths.filtered_samples_dir().join("emails.json")),
            (Phase::Analysis, "clusters.json", paths.clusters_file()),
            (Phase::Validation, "validation_report.json", paths.validation_report_file()),
        ];
        for (phase, label, path) in expectations {
            if state.current_phase >= *phase && !path.exists() {
                println!("inconsistent: phase is {} but {label} is missing; re-run the stage that produces it", state.current_phase.as_str());
            }
        }
    }

    if all {
        let raw: Vec<RawEmail> = read_json_opt(&paths.raw_samples_dir().join("emails.json"))?.unwrap_or_default();
        let filtered: Vec<FilteredMessage> = load_filtered(paths).map_err(PipelineError::from)?;
        let enriched: Vec<EnrichedMessage> = load_enriched(paths).map_err(PipelineError::from)?;
        let registry = load_registry(paths).map_err(PipelineError::from)?;
        println!("raw emails: {}", raw.len());
        println!("filtered: {}", filtered.len());
        println!("enriched: {}", enriched.len());
        println!("personas: {}", registry.personas.len());
        println!("ingested messages: {}", registry.ingested.len());
    }

    if finalize {
        if !paths.validation_feedback_file().exists() && !force {
            return Err(PipelineError::Phase {
                current_phase: state.current_phase.as_str().to_string(),
                required_phase: "validation feedback recorded (or pass --force)".to_string(),
            });
        }
        let advanced = store.transition(Phase::Generation, Default::default())?;
        store.transition(Phase::Complete, Default::default())?;
        println!("advanced from {} to complete", advanced.current_phase.as_str());
    }

    println!("stop here and start a new session once the next stage's context budget matters to you.");
    Ok(())
}

fn exit_with(err: PipelineError) -> ExitCode {
    eprintln!("error: {err:#}");
    ExitCode::from(err.exit_code() as u8)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let paths = match &cli.data_dir {
        Some(dir) => DataPaths::new(dir.clone()),
        None => DataPaths::from_env(),
    };
    if let Err(e) = fs::create_dir_all(paths.root()) {
        return exit_with(PipelineError::Config(format!("creating data directory: {e}")));
    }

    let cfg = match AppConfig::load_from(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => return exit_with(PipelineError::Config(format!("loading config: {e:#}"))),
    };

    let result: Result<(), PipelineError> = match cli.command {
        Commands::FetchEmails { source_dir, holdout } => run_fetch_emails(&paths, &cfg, source_dir, holdout).await,
        Commands::FetchLinkedin { source_dir } => run_fetch_linkedin(&paths, source_dir).await,
        Commands::Filter => run_filter(&paths, &cfg),
        Commands::Enrich => run_enrich(&paths, &cfg),
        Commands::Embed => run_embed(&paths, &cfg),
        Commands::Cluster { algorithm, k, min_cluster } => run_cluster(&paths, &cfg, algorithm, k, min_cluster),
        Commands::PrepareBatch { cluster, coverage } => run_prepare_batch(&paths, &cfg, cluster, coverage),
        Commands::IngestBatch { batch_file, target_coverage, force } => {
            run_ingest_batch(&paths, &cfg, &batch_file, target_coverage, force)
        }
        Commands::Linkedin => run_linkedin(&paths, &cfg),
        Commands::Validate { auto, review, feedback, sounds_like_me, notes, suggestions, dry_run } => {
            run_validate(&paths, &cfg, auto, review, feedback, sounds_like_me, notes, suggestions, dry_run).await
        }
        Commands::Models { list_models, set_model } => run_models(&paths, list_models, set_model).await.map_err(PipelineError::from),
        Commands::Status { check, all, finalize, force } => run_status(&paths, check, all, finalize, force),
    };

    match result {
        Ok(()) => {
            let _ = io::stdout().flush();
            ExitCode::SUCCESS
        }
        Err(e) => exit_with(e),
    }
}
