use clap::{ArgAction, Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr, miette};
use std::path::PathBuf;
use std::sync::Arc;
use thumbmap_builder::{Context, Outcome, build};
use thumbmap_cache::{Repository, Site};
use thumbmap_config::Config;
use thumbmap_storage::BackendHandle;
use thumbmap_storage::backend::{LocalBackend, ReadOnlyBackend};
use time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "thumbmap", version, about = "Incremental thumbhash map builder for documentation sites")]
struct Cli {
    /// Configuration file (toml, yaml or json).
    #[arg(short, long, env = "THUMBMAP_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,
    /// Site source root, overriding the configured one.
    #[arg(short, long, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Do everything except write the map.
    #[arg(long)]
    dry_run: bool,
    /// Increase log verbosity (-v debug, -vv trace). Ignored when RUST_LOG is set.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate or refresh the thumbhash map.
    Build,
    /// Print the stored record for an image reference as JSON.
    Lookup {
        /// Any of the keys an image is published under, e.g. `/public/a%20b.png`.
        reference: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref()).map_err(report)?;
    if let Some(root) = cli.root {
        config.root = root;
    }
    let cwd = std::env::current_dir().into_diagnostic()?;
    let root = config.root_in(&cwd);
    let root = std::fs::canonicalize(&root)
        .into_diagnostic()
        .wrap_err_with(|| format!("site root {} is not accessible", root.display()))?;

    let cache_backend: BackendHandle =
        Arc::new(LocalBackend::new("cache", config.cache_dir_in(&root)).map_err(report)?);
    let cache_backend: BackendHandle = if cli.dry_run {
        tracing::info!("Dry run; the cache map will not be written");
        Arc::new(ReadOnlyBackend::new(cache_backend))
    } else {
        cache_backend
    };
    let repository = Repository::with_default_path(cache_backend);

    match cli.command {
        Command::Build => {
            let site: BackendHandle = Arc::new(LocalBackend::new("site", &root).map_err(report)?);
            let ctx = context(&config, root);
            if let Outcome::Built(summary) = build(&ctx, &site, &repository).await.map_err(report)? {
                tracing::debug!(failed = summary.failures.len(), "Build finished");
            }
        },
        Command::Lookup { reference } => {
            let map = repository.read().await.map_err(report)?;
            let record = map.lookup(&reference).ok_or_else(|| miette!("no thumbhash recorded for {reference}"))?;
            println!("{}", serde_json::to_string_pretty(record).into_diagnostic()?);
        },
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn context(config: &Config, root: PathBuf) -> Context {
    Context {
        site: Site::new(root, config.assets_dir.as_str(), config.base.as_str()),
        content_roots: config.content_roots.clone(),
        extensions: config.extensions.clone(),
        ignore: config.ignore.clone(),
        policy: config.policy,
        concurrency: config.concurrency,
        enabled: config.enabled,
        fresh_for: Duration::seconds(i64::try_from(config.fresh_for).unwrap_or(i64::MAX)),
    }
}

/// Render an error tree, including where each layer was raised.
fn report<E>(err: exn::Exn<E>) -> miette::Report
where
    E: std::error::Error + Send + Sync + 'static,
{
    miette!("{err:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use thumbmap_cache::FreshnessPolicy;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_lookup() {
        let cli = Cli::try_parse_from(["thumbmap", "--dry-run", "-vv", "--root", "site", "lookup", "/public/a%20b.png"])
            .unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert!(matches!(cli.command, Command::Lookup { reference } if reference == "/public/a%20b.png"));
    }

    #[test]
    fn test_context_from_config() {
        let config = Config {
            base: "/docs/".to_string(),
            policy: FreshnessPolicy::Content,
            fresh_for: 120,
            ..Config::default()
        };
        let ctx = context(&config, PathBuf::from("/srv/docs"));
        assert_eq!(ctx.site.locate("public/a.png").url_with_base, "/docs/assets/public/a.png");
        assert_eq!(ctx.policy, FreshnessPolicy::Content);
        assert_eq!(ctx.fresh_for, Duration::minutes(2));
        assert_eq!(ctx.content_roots, config.content_roots);
        assert!(ctx.enabled);
    }
}
