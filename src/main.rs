mod cli;

use anyhow::{Context, Result};
use binrc::config::{load_settings, load_tables, Overrides};
use binrc::{Cache, CacheStore, HttpFetcher, Resolver};
use clap::Parser;
use cli::{Cli, Commands};
use console::style;

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli);

    if let Err(e) = run(cli) {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Version => {
            println!("binrc {}", cli::get_version());
        }

        Commands::List => {
            let cache = build_cache(&cli)?;
            list_installed(cache.store());
        }

        Commands::Install { project, release } => {
            let cache = build_cache(&cli)?;
            let version = release.as_deref().unwrap_or("");
            let installed = cache
                .get_or_install(project, version)
                .with_context(|| format!("Failed to install {}", project))?;
            println!("{}", installed.path.display());
        }
    }

    Ok(())
}

fn build_cache(cli: &Cli) -> Result<Cache> {
    let settings = load_settings(&Overrides {
        cache_path: cli.cache_path.clone(),
        templates: cli.templates.clone(),
        release_host: cli.release_host.clone(),
    })?;
    let (templates, aliases) = load_tables(&settings)?;

    let fetcher = HttpFetcher::new()
        .context("Could not create HTTP client")?
        .with_progress(!cli.quiet);

    Ok(Cache::new(
        Resolver::new(templates, aliases),
        CacheStore::new(&settings.store_root),
        Box::new(fetcher),
    )
    .with_release_host(&settings.release_host))
}

fn setup_logging(cli: &Cli) {
    use std::io::IsTerminal;
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}

fn list_installed(store: &CacheStore) {
    let installed = store.installed();
    println!("--- Installed binrc Binaries ---");
    if installed.is_empty() {
        println!("  No binaries installed yet.");
        return;
    }

    for binary in installed {
        println!(
            "  - {} ({})",
            style(&binary.full_name).bold(),
            style(&binary.version).green()
        );
        println!("    Path:    {}", binary.path.display());
    }
    println!("--------------------------------");
}
