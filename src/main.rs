use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use versionflow::bump::BumpPart;
use versionflow::config::{self, Config};
use versionflow::engines::{DefaultEngines, Engines};
use versionflow::ui;
use versionflow::workflow::FlowKind;
use versionflow::{VersionFlowError, VersionFlowProcessor, VersionFlowRepo};

#[derive(clap::Parser)]
#[command(
    name = "versionflow",
    version,
    about = "Check and drive git-flow releases against a bumpversion version file"
)]
struct Args {
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Repository directory (defaults to the current directory)"
    )]
    repo_dir: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "Version file, relative to the repository directory (default .bumpversion.cfg)"
    )]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_name = "FILE", help = "Custom settings file path")]
    settings: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Log engine calls to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Initialise the repository to use versionflow, creating whatever is missing
    Init,
    /// Check that the repository is ready for a release, changing nothing
    Check,
    /// Create a release with the patch number bumped
    Patch(ReleaseArgs),
    /// Create a release with the minor number bumped
    Minor(ReleaseArgs),
    /// Create a release with the major number bumped
    Major(ReleaseArgs),
    /// Describe the current commit in terms of the nearest tag
    Describe,
}

#[derive(clap::Args)]
struct ReleaseArgs {
    #[arg(long, help = "Release from the main branch as a hotfix")]
    hotfix: bool,
}

impl ReleaseArgs {
    fn kind(&self) -> FlowKind {
        if self.hotfix {
            FlowKind::Hotfix
        } else {
            FlowKind::Release
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(err) = run(args) {
        match err.downcast_ref::<VersionFlowError>() {
            Some(err) => ui::report_error(err),
            None => ui::display_abort(&format!("{:#}", err)),
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(args: Args) -> Result<()> {
    let repo_dir = switch_repo_dir(args.repo_dir.as_deref())?;
    let settings = config::load_settings(args.settings.as_deref(), &repo_dir)
        .context("Error loading settings")?;
    let config = Config::new(repo_dir, args.config.as_deref(), settings);
    log::debug!("{:?}", config);

    match args.command {
        Commands::Init => {
            VersionFlowRepo::create_checked(&config, true)?;
            ui::display_success("versionflow is initialised");
        }
        Commands::Check => {
            VersionFlowRepo::create_checked(&config, false)?;
            ui::display_success("versionflow state is OK");
        }
        Commands::Patch(release) => release_with(&config, BumpPart::Patch, &release)?,
        Commands::Minor(release) => release_with(&config, BumpPart::Minor, &release)?,
        Commands::Major(release) => release_with(&config, BumpPart::Major, &release)?,
        Commands::Describe => {
            let engines = DefaultEngines::new(&config.settings);
            let repo = engines
                .open_repository(&config.repo_dir)?
                .ok_or(VersionFlowError::NoRepo)?;
            println!("{}", repo.describe()?);
        }
    }

    Ok(())
}

fn release_with(config: &Config, part: BumpPart, release: &ReleaseArgs) -> Result<()> {
    let mut processor = VersionFlowProcessor::from_config(config, part, release.kind())?;
    processor.process()?;
    Ok(())
}

/// Resolve the repository directory, switching the process into it when
/// one was given
fn switch_repo_dir(repo_dir: Option<&Path>) -> Result<PathBuf> {
    let Some(path) = repo_dir else {
        return Ok(std::env::current_dir()?);
    };

    if !path.is_dir() {
        bail!("Directory '{}' does not exist.", path.display());
    }

    let path = path.canonicalize()?;
    println!("Switching dir to {}", path.display());
    std::env::set_current_dir(&path)?;

    Ok(path)
}
