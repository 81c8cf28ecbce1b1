use anyhow::Context;
use cadence_engine::{
    ActionRunner, CadenceConfig, ConfigLoader, OutputDir, PageReport, RunnerBackend, StoryRunner,
};
use cadence_h::{HeadlessSurface, LaunchOptions};
use cadence_parser::{PagesConfig, load_pages_file, presets};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cadence", version, about = "Scripted, paced browser interactions")]
struct Args {
    /// Settings file (default: $CADENCE_CONFIG, ./cadence.yaml, then ~/.cadence/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and validate a pages file, then print it as normalized JSON
    Check {
        file: PathBuf,
    },
    /// Play a pages file against headless Chromium
    Run {
        file: PathBuf,

        /// Launch browser in visible mode (not headless)
        #[arg(long)]
        visible: bool,

        /// Action runner to use, overrides the settings file
        #[arg(long, value_enum)]
        backend: Option<Backend>,

        /// Output directory for screenshots, overrides the settings file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the built-in page names usable in page strings
    Presets,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Basic,
    Input,
}

impl From<Backend> for RunnerBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Basic => RunnerBackend::Basic,
            Backend::Input => RunnerBackend::Input,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout only carries results.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Check { file } => {
            let pages = load(&file)?;
            println!("{}", serde_json::to_string_pretty(&pages)?);
        }
        Command::Run {
            file,
            visible,
            backend,
            out,
        } => {
            let mut config = load_config(args.config.as_deref()).await?;
            if let Some(backend) = backend {
                config.runner.backend = backend.into();
            }
            if let Some(out) = out {
                config.output.dir = out;
            }
            config.browser.visible |= visible;

            let pages = load(&file)?;
            let reports = run(&config, &pages).await?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Command::Presets => {
            for name in presets::names() {
                if let Some(preset) = presets::lookup(name) {
                    println!("{:<14} {:>4}s  {}", name, preset.duration.as_secs(), preset.url);
                }
            }
        }
    }
    Ok(())
}

fn load(file: &Path) -> anyhow::Result<PagesConfig> {
    load_pages_file(file).with_context(|| format!("Invalid pages file {}", file.display()))
}

async fn load_config(path: Option<&Path>) -> anyhow::Result<CadenceConfig> {
    let config = match path {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    Ok(config)
}

async fn run(config: &CadenceConfig, pages: &PagesConfig) -> anyhow::Result<Vec<PageReport>> {
    let output = Arc::new(OutputDir::new(config.output.dir.clone()));
    let runner = ActionRunner::for_backend(config.runner.backend);
    let story = StoryRunner::new(runner, config.runner.settings(), output.clone());

    let mut surface = HeadlessSurface::new(LaunchOptions {
        visible: config.browser.visible,
        chrome_bin: config.browser.chrome_bin.clone(),
    });
    surface
        .launch()
        .await
        .context("Failed to launch Chromium")?;

    let result = story.run_pages(&mut surface, pages.pages()).await;
    surface.close().await?;

    for warning in output.warnings() {
        eprintln!("warning: {}", warning);
    }
    let reports = result?;
    info!(
        "Played {} page(s) with {}",
        reports.len(),
        story.runner().name()
    );
    Ok(reports)
}
