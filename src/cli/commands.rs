use clap::{Parser, Subcommand};
use crate::cli::error::{user_error, validate_project_name, validate_score};
use crate::cli::launch::{CliLauncher, CliNavigator};
use crate::cli::output::{format_board, format_lead_table, format_stage_list, get_terminal_width, is_tty};
use crate::config::Config;
use crate::db::DbConnection;
use crate::filter::{parse_filter, FilterState};
use crate::models::{LeadRecord, StageDefinition, StageRegistry};
use crate::pipeline::{
    change_filters, lock_store, DragTransitionController, LeadService, Notification,
    OptimisticMutationCoordinator, PipelineStore, ProjectDirectory, QuickAction,
    QuickActionDispatcher, SharedStore,
};
use crate::repo::{LeadRepo, NewLead, ProjectRepo, SqliteLeadService};
use crate::utils::fuzzy;
use anyhow::{Context, Result};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "leadboard")]
#[command(about = "Leadboard - Sales pipeline board with optimistic stage transitions")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List pipeline stages
    Stages,
    /// Project directory commands
    Projects {
        #[command(subcommand)]
        subcommand: ProjectCommands,
    },
    /// Import leads from a JSON array
    Import {
        /// Path to the JSON file
        file: std::path::PathBuf,
    },
    /// List leads
    List {
        /// Filter arguments (e.g., "priority=high project=skyline asha")
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        filter: Vec<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show the pipeline board
    Board {
        /// Filter arguments (e.g., "priority=critical source=website")
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        filter: Vec<String>,
        /// Output the snapshot in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Move a lead to another stage
    Move {
        /// Lead ID or unique ID prefix
        lead: String,
        /// Target stage id or label
        stage: String,
    },
    /// Run a quick action on a lead (view, edit, call, email, message)
    Action {
        /// Action name
        action: String,
        /// Lead ID or unique ID prefix
        lead: String,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Add a project
    Add {
        name: String,
    },
    /// List projects
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// Everything a command needs after startup
struct App {
    config: Config,
    registry: StageRegistry,
    service: Arc<SqliteLeadService>,
}

fn init_logging(config: &Config) {
    let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
    // A second init (e.g. from tests) is harmless
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn open_app() -> Result<App> {
    let config = Config::load()?;
    init_logging(&config);

    let registry = StageRegistry::default()
        .with_success_stage(&config.success_stage)
        .map_err(|e| anyhow::anyhow!("Invalid pipeline.success_stage: {}", e))?;
    let conn = DbConnection::connect(&config.data_location)?;
    log::debug!("Using database {}", config.data_location.display());

    Ok(App {
        config,
        registry,
        service: Arc::new(SqliteLeadService::new(conn)),
    })
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let app = open_app()?;

    match cli.command {
        Commands::Stages => {
            print!("{}", format_stage_list(&app.registry));
            Ok(())
        }
        Commands::Projects { subcommand } => handle_projects(&app, subcommand),
        Commands::Import { file } => handle_import(&app, &file),
        Commands::List { filter, json } => handle_list(&app, &filter, json),
        Commands::Board { filter, json } => handle_board(&app, &filter, json),
        Commands::Move { lead, stage } => handle_move(&app, &lead, &stage),
        Commands::Action { action, lead } => handle_action(&app, &action, &lead),
    }
}

fn handle_projects(app: &App, subcommand: ProjectCommands) -> Result<()> {
    match subcommand {
        ProjectCommands::Add { name } => {
            if let Err(e) = validate_project_name(&name) {
                user_error(&e);
            }
            let conn = app.service.connection();
            if ProjectRepo::get_by_name(&conn, &name)?.is_some() {
                user_error(&format!("Project '{}' already exists", name));
            }
            ProjectRepo::create(&conn, &name)?;
            println!("Created project '{}'", name);
            Ok(())
        }
        ProjectCommands::List { json } => {
            let projects = runtime()?.block_on(app.service.list_projects())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else if projects.is_empty() {
                println!("No projects found.");
            } else {
                for project in projects {
                    println!("{}", project.name);
                }
            }
            Ok(())
        }
    }
}

fn handle_import(app: &App, file: &std::path::Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Could not read import file: {}", file.display()))?;
    let leads: Vec<NewLead> = match serde_json::from_str(&content) {
        Ok(leads) => leads,
        Err(e) => user_error(&format!("Invalid import file {}: {}", file.display(), e)),
    };

    for lead in &leads {
        if let Err(e) = validate_score(lead.score) {
            user_error(&e);
        }
        if !app.registry.contains(&lead.stage) {
            log::warn!(
                "Lead '{}' has unknown stage '{}'; it will show as uncategorized",
                lead.first_name,
                lead.stage
            );
        }
    }

    let conn = app.service.connection();
    let tx = conn.unchecked_transaction()?;
    for lead in &leads {
        LeadRepo::create(&tx, lead)?;
    }
    tx.commit()?;
    println!("Imported {} lead(s)", leads.len());
    Ok(())
}

fn parse_filter_args(tokens: &[String]) -> FilterState {
    match parse_filter(tokens) {
        Ok(filters) => filters,
        Err(e) => user_error(&e),
    }
}

/// Build a store and load it under `filters`
async fn load_store(app: &App, filters: FilterState) -> SharedStore {
    let store = PipelineStore::new(app.registry.clone(), app.config.on_fetch_error).shared();
    let service: &dyn LeadService = app.service.as_ref();
    if let Err(err) = change_filters(&store, service, filters).await {
        log::warn!("Initial load failed: {}", err);
    }
    store
}

fn handle_list(app: &App, filter: &[String], json: bool) -> Result<()> {
    let filters = parse_filter_args(filter);
    let store = runtime()?.block_on(load_store(app, filters));
    let store = lock_store(&store);
    if let Some(err) = store.error() {
        return Err(anyhow::Error::new(err.clone()).context("Could not load leads"));
    }

    let visible = store.visible_records();
    if json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
    } else {
        print!("{}", format_lead_table(&visible, store.registry()));
    }
    Ok(())
}

fn handle_board(app: &App, filter: &[String], json: bool) -> Result<()> {
    let filters = parse_filter_args(filter);
    let store = runtime()?.block_on(load_store(app, filters));
    let store = lock_store(&store);

    if json {
        let board = serde_json::json!({
            "filters": store.filters(),
            "snapshot": store.snapshot(),
            "error": store.error().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&board)?);
    } else {
        print!("{}", format_board(&store, get_terminal_width(), is_tty()));
    }
    Ok(())
}

/// Find a lead by full id or unique prefix
fn resolve_lead<'a>(store: &'a PipelineStore, input: &str) -> &'a LeadRecord {
    if let Some(lead) = store.record(input) {
        return lead;
    }
    let matches = store.find_by_prefix(input);
    match matches.as_slice() {
        [lead] => lead,
        [] => user_error(&format!("Lead '{}' not found", input)),
        _ => user_error(&format!(
            "Lead id '{}' is ambiguous ({} matches). Use more characters.",
            input,
            matches.len()
        )),
    }
}

fn resolve_stage<'a>(registry: &'a StageRegistry, input: &str) -> &'a StageDefinition {
    if let Some(stage) = registry.resolve(input) {
        return stage;
    }
    let ids: Vec<&str> = registry.stages().iter().map(|s| s.id.as_str()).collect();
    let near = fuzzy::find_near_matches(input, &ids, 3);
    if near.is_empty() {
        user_error(&format!("Unknown stage '{}'. Run 'leadboard stages' to list stages.", input));
    }
    let names: Vec<String> = near.into_iter().map(|(name, _)| name).collect();
    user_error(&format!("Unknown stage '{}'. Did you mean: {}?", input, names.join(", ")));
}

fn handle_move(app: &App, lead_input: &str, stage_input: &str) -> Result<()> {
    let target = resolve_stage(&app.registry, stage_input).clone();
    runtime()?.block_on(move_lead(app, lead_input, &target))
}

async fn move_lead(app: &App, lead_input: &str, target: &StageDefinition) -> Result<()> {
    let store = load_store(app, FilterState::default()).await;
    let (record_id, short_id, source_stage) = {
        let guard = lock_store(&store);
        if let Some(err) = guard.error() {
            return Err(anyhow::Error::new(err.clone()).context("Could not load leads"));
        }
        let lead = resolve_lead(&guard, lead_input);
        (lead.id.clone(), lead.short_id().to_string(), lead.stage.clone())
    };

    // Replay the move as a drag gesture
    let mut controller = DragTransitionController::new();
    controller.start(&record_id, &source_stage);
    controller.hover(&target.id);
    let Some(request) = controller.drop_on(&target.id) else {
        println!("Lead {} is already in {}", short_id, target.label);
        return Ok(());
    };

    let service: Arc<dyn LeadService> = app.service.clone();
    let (coordinator, mut notifications) = OptimisticMutationCoordinator::new(Arc::clone(&store), service);
    let Some(handle) = coordinator.request_transition(request) else {
        user_error(&format!("Lead '{}' not found", lead_input));
    };
    handle.await.context("Stage transition task failed")?;

    match notifications.recv().await {
        Some(notification @ Notification::TransitionConfirmed { .. }) => {
            println!("{}", notification.message());
            Ok(())
        }
        Some(notification) => Err(transition_error(&notification)),
        None => Ok(()),
    }
}

/// Keep the service error in the chain so storage failures stay internal
fn transition_error(notification: &Notification) -> anyhow::Error {
    match notification {
        Notification::TransitionFailed { error, .. } => {
            anyhow::Error::new(error.clone()).context(notification.message())
        }
        Notification::TransitionConfirmed { .. } => anyhow::anyhow!(notification.message()),
    }
}

fn handle_action(app: &App, action_input: &str, lead_input: &str) -> Result<()> {
    let Some(action) = QuickAction::from_str(action_input) else {
        user_error(&format!(
            "Unknown action '{}'. Valid actions: view, edit, call, email, message",
            action_input
        ));
    };

    let store = runtime()?.block_on(load_store(app, FilterState::default()));
    let store = lock_store(&store);
    if let Some(err) = store.error() {
        return Err(anyhow::Error::new(err.clone()).context("Could not load leads"));
    }
    let lead = resolve_lead(&store, lead_input);

    let history = if action == QuickAction::View {
        LeadRepo::stage_history(&app.service.connection(), &lead.id)?
    } else {
        Vec::new()
    };
    let navigator = CliNavigator::new(store.records(), store.registry()).with_history(&lead.id, history);
    let launcher = CliLauncher::new(app.config.opener.clone());
    QuickActionDispatcher::new(&navigator, &launcher).dispatch(action, lead);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::error::is_internal_error;
    use crate::pipeline::ServiceError;

    fn failed(error: ServiceError) -> Notification {
        Notification::TransitionFailed {
            record_id: "alpha001".to_string(),
            from_stage: "new".to_string(),
            to_stage: "booked".to_string(),
            error,
            resynced: true,
        }
    }

    #[test]
    fn test_storage_failure_on_move_is_internal() {
        let err = transition_error(&failed(ServiceError::Storage("disk I/O error".to_string())));
        assert!(is_internal_error(&err));
        assert!(format!("{:#}", err).contains("Could not move lead to booked"));
        assert!(format!("{:#}", err).contains("disk I/O error"));
    }

    #[test]
    fn test_rejected_move_is_user_error() {
        let err = transition_error(&failed(ServiceError::Rejected("stage locked".to_string())));
        assert!(!is_internal_error(&err));
        assert!(err.to_string().contains("Could not move lead to booked"));
    }
}
