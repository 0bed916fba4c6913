use crate::infra::{build_orchestrator, build_registry, read_payload};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use underwriter::config::{AppConfig, UnderwritingConfig};
use underwriter::error::AppError;
use underwriter::underwriting::{Domain, RuleRegistry, RuleSet, RuleSetError};

#[derive(Parser, Debug)]
#[command(
    name = "Underwriter",
    about = "Run underwriting decisions over HTTP or from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Decide a single application and print the decision as JSON
    Decide(DecideArgs),
    /// Load and validate the rule set of every domain
    CheckRules(RuleArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct DecideArgs {
    /// Line of business: auto, life, mortgage or travel
    #[arg(long)]
    pub(crate) domain: String,
    /// Product code used for configuration lookup
    #[arg(long)]
    pub(crate) product: String,
    #[arg(long, default_value = "default")]
    pub(crate) client_id: String,
    /// JSON application file; stdin is read when omitted
    #[arg(long)]
    pub(crate) payload: Option<PathBuf>,
    /// Override the configuration directory
    #[arg(long)]
    pub(crate) config_dir: Option<PathBuf>,
    /// Load rule sets from this directory instead of the bundled ones
    #[arg(long)]
    pub(crate) rules_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RuleArgs {
    /// Load rule sets from this directory instead of the bundled ones
    #[arg(long)]
    pub(crate) rules_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Decide(args) => run_decide(args),
        Command::CheckRules(args) => run_check_rules(args),
    }
}

fn underwriting_config(
    config_dir: Option<PathBuf>,
    rules_dir: Option<PathBuf>,
) -> Result<UnderwritingConfig, AppError> {
    let mut underwriting = AppConfig::load()?.underwriting;
    if let Some(dir) = config_dir {
        underwriting.config_dir = dir;
    }
    if rules_dir.is_some() {
        underwriting.rules_dir = rules_dir;
    }
    Ok(underwriting)
}

fn run_decide(args: DecideArgs) -> Result<(), AppError> {
    let DecideArgs {
        domain,
        product,
        client_id,
        payload,
        config_dir,
        rules_dir,
    } = args;

    let underwriting = underwriting_config(config_dir, rules_dir)?;
    let registry = build_registry(&underwriting);
    let orchestrator = build_orchestrator(&underwriting, Arc::clone(&registry));

    let body = read_payload(payload.as_deref())?;
    let decision = orchestrator.decide(&domain, &product, &client_id, &body);
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn run_check_rules(args: RuleArgs) -> Result<(), AppError> {
    let underwriting = underwriting_config(None, args.rules_dir)?;
    check_rules(underwriting.rules_dir.as_deref())
}

/// Validate each domain's rule set. A rules directory is checked on its own, without
/// the bundled fallback the server applies.
pub(crate) fn check_rules(rules_dir: Option<&Path>) -> Result<(), AppError> {
    let outcomes: Vec<(Domain, Result<Arc<RuleSet>, RuleSetError>)> = match rules_dir {
        Some(dir) => RuleRegistry::validate_directory(dir)
            .into_iter()
            .map(|(domain, outcome)| (domain, outcome.map(Arc::new)))
            .collect(),
        None => RuleRegistry::bundled().preload(),
    };

    let mut first_error = None;
    for (domain, outcome) in outcomes {
        match outcome {
            Ok(rule_set) => println!(
                "{domain}: {} rules (version {})",
                rule_set.rules.len(),
                rule_set.version
            ),
            Err(err) => {
                println!("{domain}: {err}");
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(AppError::from(err)),
        None => Ok(()),
    }
}
