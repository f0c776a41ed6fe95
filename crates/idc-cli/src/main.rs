use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use idc_adapter_aws::AwsDirectory;
use idc_core::Settings;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::reconcile::ResourceType;

#[derive(Parser, Debug)]
#[command(name = "idc", version, about = "IAM Identity Center reconciler")]
struct Cli {
    /// Tool settings file (default region, diff policy, wait delay)
    #[arg(long, env = "IDC_CONFIG", default_value = "idc.yaml", global = true)]
    config: PathBuf,

    /// Region used when the parameters do not name one
    #[arg(long, env = "AWS_REGION", global = true)]
    region: Option<String>,

    /// Log filter; RUST_LOG takes precedence when set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Report what would change without calling mutating APIs
    #[arg(long, default_value_t = false, global = true)]
    check: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile an Identity Store user.
    User(ParamsSource),

    /// Reconcile an Identity Store group.
    Group(ParamsSource),

    /// Reconcile a permission set with its managed and inline policies.
    PermissionSet(ParamsSource),

    /// Reconcile an account assignment.
    Assignment(ParamsSource),

    /// List the users of the identity store behind an instance.
    ListUsers(ParamsSource),
}

#[derive(Args, Debug)]
struct ParamsSource {
    /// YAML or JSON parameter file; stdin when omitted or "-"
    params: Option<PathBuf>,
}

impl Command {
    fn params(&self) -> Option<&PathBuf> {
        match self {
            Command::User(src)
            | Command::Group(src)
            | Command::PermissionSet(src)
            | Command::Assignment(src)
            | Command::ListUsers(src) => src.params.as_ref(),
        }
    }

    fn resource_type(&self) -> Option<ResourceType> {
        match self {
            Command::User(_) => Some(ResourceType::User),
            Command::Group(_) => Some(ResourceType::Group),
            Command::PermissionSet(_) => Some(ResourceType::PermissionSet),
            Command::Assignment(_) => Some(ResourceType::Assignment),
            Command::ListUsers(_) => None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "invocation failed");
            println!(
                "{}",
                json!({ "failed": true, "msg": commands::failure_message(&err) })
            );
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<String> {
    let mut settings = Settings::load_or_default(&cli.config)?;
    if cli.region.is_some() {
        settings.region = cli.region.clone();
    }

    let mut raw = commands::params::read_params(cli.cmd.params().map(PathBuf::as_path))?;
    if cli.check {
        commands::params::force_check_mode(&mut raw);
    }

    let region = commands::params::requested_region(&raw).or_else(|| settings.region.clone());
    let directory = AwsDirectory::connect(region).await;

    let output = match cli.cmd.resource_type() {
        Some(resource) => {
            let result = commands::reconcile::execute(&directory, resource, &raw, &settings).await?;
            serde_json::to_value(result)?
        }
        None => serde_json::to_value(commands::list_users::execute(&directory, &raw).await?)?,
    };

    serde_json::to_string_pretty(&output).context("rendering result")
}
