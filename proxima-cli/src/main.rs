mod config;
mod reconcile;

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use proxima_core::diagnostics::{Diagnostics, Severity};
use proxima_core::differ::Diff;
use proxima_core::provider::Provider;
use proxima_core::registry::Registry;
use proxima_core::resource::Resource;
use proxima_core::schema::ResourceSchema;
use proxima_provider_pve::resources::all_schemas;
use proxima_provider_pve::{PveConfig, PveProvider};
use proxima_state::{BackendConfig, LockInfo, StateBackend, StateFile, create_backend};

#[derive(Parser)]
#[command(name = "proxima")]
#[command(about = "Declarative firewall aliases and SDN mappings for Proxmox VE", long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Path to the state file
    #[arg(long, global = true, default_value = "proxima.state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Cluster API endpoint, e.g. https://pve.example.com:8006
    #[arg(long, global = true, env = "PROXMOX_VE_ENDPOINT")]
    endpoint: Option<String>,

    /// API token in user@realm!tokenid=secret form
    #[arg(long, global = true, env = "PROXMOX_VE_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Skip TLS certificate verification
    #[arg(
        long,
        global = true,
        env = "PROXMOX_VE_INSECURE",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    insecure: bool,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// IPAM used to look up SDN mappings
    #[arg(long, global = true, default_value = proxima_provider_pve::client::DEFAULT_IPAM)]
    ipam: String,
}

impl ConnectionArgs {
    fn pve_config(&self) -> Result<PveConfig, String> {
        let endpoint = self
            .endpoint
            .clone()
            .ok_or("No endpoint given (use --endpoint or PROXMOX_VE_ENDPOINT)")?;
        let api_token = self
            .api_token
            .clone()
            .ok_or("No API token given (use --api-token or PROXMOX_VE_API_TOKEN)")?;

        Ok(PveConfig {
            endpoint,
            api_token,
            insecure: self.insecure,
            timeout_secs: self.timeout,
            ipam: self.ipam.clone(),
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file
    Validate {
        /// Path to configuration file
        #[arg(default_value = "proxima.json")]
        file: PathBuf,
    },
    /// Show execution plan without applying changes
    Plan {
        /// Path to configuration file
        #[arg(default_value = "proxima.json")]
        file: PathBuf,
    },
    /// Apply changes to reach the desired state
    Apply {
        /// Path to configuration file
        #[arg(default_value = "proxima.json")]
        file: PathBuf,
    },
    /// Destroy every resource recorded in state
    Destroy {
        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
    /// Update state from the cluster without changing anything remotely
    Refresh,
    /// Release a state lock left behind by an interrupted run
    ForceUnlock {
        /// Lock ID reported by the locked-state error
        lock_id: String,
    },
    /// Show resource schemas
    Schema {
        /// Resource type to show; all types when omitted
        resource_type: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Validate { file } => run_validate(file),
        Commands::Plan { file } => run_plan(&cli, file).await,
        Commands::Apply { file } => run_apply(&cli, file).await,
        Commands::Destroy { auto_approve } => run_destroy(&cli, *auto_approve).await,
        Commands::Refresh => run_refresh(&cli).await,
        Commands::ForceUnlock { lock_id } => run_force_unlock(&cli.state, lock_id).await,
        Commands::Schema { resource_type } => run_schema(resource_type.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn get_schemas() -> HashMap<String, ResourceSchema> {
    all_schemas()
        .into_iter()
        .map(|schema| (schema.resource_type.clone(), schema))
        .collect()
}

async fn open_backend(state: &Path) -> Result<Box<dyn StateBackend>, String> {
    let backend_config = BackendConfig::local(state.to_string_lossy());
    create_backend(&backend_config)
        .await
        .map_err(|e| format!("Failed to open state: {}", e))
}

/// Provider connection, handler registry and state backend for one run
struct Session {
    provider_name: &'static str,
    registry: Registry,
    backend: Box<dyn StateBackend>,
}

impl Session {
    async fn open(cli: &Cli) -> Result<Self, String> {
        let config = cli.connection.pve_config()?;
        let provider = PveProvider::new(&config).map_err(|e| e.to_string())?;
        let registry = Registry::from_provider(&provider);
        let backend = open_backend(&cli.state).await?;

        Ok(Self {
            provider_name: provider.name(),
            registry,
            backend,
        })
    }

    async fn read_state(&self) -> Result<StateFile, String> {
        self.backend
            .read_state()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| format!("Failed to read state: {}", e))
    }

    async fn write_state(&self, state: &mut StateFile) -> Result<(), String> {
        state.increment_serial();
        self.backend
            .write_state(state)
            .await
            .map_err(|e| format!("Failed to write state: {}", e))
    }

    async fn lock(&self, operation: &str) -> Result<LockInfo, String> {
        self.backend
            .acquire_lock(operation)
            .await
            .map_err(|e| e.to_string())
    }

    async fn unlock(&self, lock: &LockInfo) {
        if let Err(e) = self.backend.release_lock(lock).await {
            log::warn!("failed to release state lock {}: {}", lock.id, e);
        }
    }

    /// Refresh tracked records, printing drift and failures
    async fn refresh(&self, state: &mut StateFile) {
        for refreshed in reconcile::refresh(&self.registry, state).await {
            if refreshed.drifted {
                println!(
                    "  {} {} no longer exists remotely",
                    "!".yellow().bold(),
                    refreshed.id
                );
            }
            print_diagnostics(&refreshed.id.to_string(), &refreshed.diagnostics);
        }
    }
}

fn load_and_validate(file: &Path) -> Result<Vec<Resource>, String> {
    let resources = config::load(file)?;
    config::validate_resources(&resources, &get_schemas())?;
    Ok(resources)
}

fn run_validate(file: &Path) -> Result<(), String> {
    println!("{}", "Validating...".cyan());

    let resources = load_and_validate(file)?;

    println!(
        "{}",
        format!("✓ {} resources validated successfully.", resources.len())
            .green()
            .bold()
    );
    for resource in &resources {
        println!("  • {}", resource.id);
    }

    Ok(())
}

async fn run_plan(cli: &Cli, file: &Path) -> Result<(), String> {
    let desired = load_and_validate(file)?;
    let session = Session::open(cli).await?;

    // Plan never writes state, so the refresh result is discarded
    let mut state = session.read_state().await?;
    session.refresh(&mut state).await;

    print_plan(&reconcile::plan(&desired, &state));
    Ok(())
}

async fn run_apply(cli: &Cli, file: &Path) -> Result<(), String> {
    let desired = load_and_validate(file)?;
    let session = Session::open(cli).await?;

    let lock = session.lock("apply").await?;
    let result = apply_changes(&session, &desired).await;
    session.unlock(&lock).await;
    result
}

async fn apply_changes(session: &Session, desired: &[Resource]) -> Result<(), String> {
    let mut state = session.read_state().await?;
    session.refresh(&mut state).await;
    session.write_state(&mut state).await?;

    let diffs: Vec<Diff> = reconcile::plan(desired, &state)
        .into_iter()
        .filter(Diff::is_change)
        .collect();
    if diffs.is_empty() {
        println!("{}", "No changes needed.".green());
        return Ok(());
    }

    print_plan(&diffs);
    println!();
    println!("{}", "Applying changes...".cyan().bold());
    println!();

    let (success_count, failure_count) = apply_all(session, &mut state, &diffs).await?;

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Apply complete! {} changes applied.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Apply failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

async fn run_destroy(cli: &Cli, auto_approve: bool) -> Result<(), String> {
    let session = Session::open(cli).await?;

    let lock = session.lock("destroy").await?;
    let result = destroy_all(&session, auto_approve).await;
    session.unlock(&lock).await;
    result
}

async fn destroy_all(session: &Session, auto_approve: bool) -> Result<(), String> {
    let mut state = session.read_state().await?;
    session.refresh(&mut state).await;
    session.write_state(&mut state).await?;

    let diffs = reconcile::destroy_plan(&state);
    if diffs.is_empty() {
        println!("{}", "No resources recorded in state.".yellow());
        return Ok(());
    }

    print_plan(&diffs);
    println!();

    if !auto_approve && !confirm_destroy()? {
        println!("{}", "Destroy cancelled.".yellow());
        return Ok(());
    }

    println!("{}", "Destroying resources...".red().bold());
    println!();

    let (success_count, failure_count) = apply_all(session, &mut state, &diffs).await?;

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Destroy complete! {} resources destroyed.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Destroy failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

async fn run_refresh(cli: &Cli) -> Result<(), String> {
    let session = Session::open(cli).await?;

    let lock = session.lock("refresh").await?;
    let result = refresh_state(&session).await;
    session.unlock(&lock).await;
    result
}

async fn refresh_state(session: &Session) -> Result<(), String> {
    let mut state = session.read_state().await?;
    let before = state.resources.len();

    println!("{}", "Refreshing state...".cyan());
    session.refresh(&mut state).await;
    session.write_state(&mut state).await?;

    println!(
        "{}",
        format!(
            "Refresh complete! {} resources tracked, {} dropped.",
            state.resources.len(),
            before - state.resources.len()
        )
        .green()
        .bold()
    );
    Ok(())
}

async fn run_force_unlock(state: &Path, lock_id: &str) -> Result<(), String> {
    let backend = open_backend(state).await?;
    backend
        .force_unlock(lock_id)
        .await
        .map_err(|e| format!("Failed to unlock state: {}", e))?;

    println!(
        "{}",
        format!("✓ State lock {} released.", lock_id).green().bold()
    );
    Ok(())
}

/// Apply diffs in order, writing state after every step
async fn apply_all(
    session: &Session,
    state: &mut StateFile,
    diffs: &[Diff],
) -> Result<(usize, usize), String> {
    let mut success_count = 0;
    let mut failure_count = 0;

    for diff in diffs {
        let diagnostics =
            reconcile::apply_diff(&session.registry, state, session.provider_name, diff).await;
        session.write_state(state).await?;

        if diagnostics.has_errors() {
            println!("  {} {}", "✗".red(), format_diff(diff));
            failure_count += 1;
        } else {
            println!("  {} {}", "✓".green(), format_diff(diff));
            success_count += 1;
        }
        print_diagnostics(&diff_target(diff), &diagnostics);
    }

    Ok((success_count, failure_count))
}

fn confirm_destroy() -> Result<bool, String> {
    println!(
        "{}",
        "Do you really want to destroy all resources?"
            .yellow()
            .bold()
    );
    println!(
        "  {}",
        "This action cannot be undone. Type 'yes' to confirm.".yellow()
    );
    print!("\n  Enter a value: ");
    std::io::stdout().flush().map_err(|e| e.to_string())?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| e.to_string())?;
    println!();

    Ok(input.trim() == "yes")
}

fn run_schema(resource_type: Option<&str>) -> Result<(), String> {
    let schemas = get_schemas();
    let mut types: Vec<&String> = match resource_type {
        Some(t) => {
            let (name, _) = schemas
                .get_key_value(t)
                .ok_or_else(|| format!("Unknown resource type: {}", t))?;
            vec![name]
        }
        None => schemas.keys().collect(),
    };
    types.sort();

    for (i, name) in types.into_iter().enumerate() {
        let schema = &schemas[name];
        if i > 0 {
            println!();
        }
        println!("{}", schema.resource_type.cyan().bold());
        if let Some(description) = &schema.description {
            println!("  {}", description);
        }
        for attr_name in schema.attribute_names() {
            let attr = &schema.attributes[attr_name];
            let flag = if attr.computed {
                "computed".normal()
            } else if attr.required {
                "required".yellow()
            } else {
                "optional".normal()
            };
            print!("  {} ({}, {})", attr_name.bold(), attr.attr_type, flag);
            match &attr.description {
                Some(description) => println!(" - {}", description),
                None => println!(),
            }
        }
    }

    Ok(())
}

fn print_plan(diffs: &[Diff]) {
    let changes: Vec<&Diff> = diffs.iter().filter(|d| d.is_change()).collect();
    if changes.is_empty() {
        println!("{}", "No changes. Infrastructure is up-to-date.".green());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    let (mut create, mut update, mut delete) = (0, 0, 0);
    for diff in changes {
        match diff {
            Diff::Create(_) => create += 1,
            Diff::Update { .. } => update += 1,
            Diff::Delete { .. } => delete += 1,
            Diff::NoChange(_) => {}
        }
        println!("  {}", format_diff(diff));
    }

    println!();
    println!(
        "Plan: {} to create, {} to update, {} to delete.",
        create.to_string().green(),
        update.to_string().yellow(),
        delete.to_string().red()
    );
}

fn diff_target(diff: &Diff) -> String {
    match diff {
        Diff::Create(resource) => resource.id.to_string(),
        Diff::Update { id, .. } | Diff::Delete { id, .. } | Diff::NoChange(id) => id.to_string(),
    }
}

fn format_diff(diff: &Diff) -> String {
    match diff {
        Diff::Create(resource) => format!("{} {}", "+".green().bold(), resource.id),
        Diff::Update {
            id,
            identifier,
            changed_attributes,
            ..
        } => format!(
            "{} {} ({}) [{}]",
            "~".yellow().bold(),
            id,
            identifier,
            changed_attributes.join(", ")
        ),
        Diff::Delete { id, identifier } => {
            format!("{} {} ({})", "-".red().bold(), id, identifier)
        }
        Diff::NoChange(id) => format!("  {}", id),
    }
}

fn print_diagnostics(target: &str, diagnostics: &Diagnostics) {
    for diag in diagnostics.iter() {
        let label = match diag.severity {
            Severity::Error => "error:".red().bold(),
            Severity::Warning => "warning:".yellow().bold(),
        };
        println!("      {} {}: {}", label, target, diag.summary);
        if let Some(detail) = &diag.detail {
            println!("        {}", detail.dimmed());
        }
    }
}
