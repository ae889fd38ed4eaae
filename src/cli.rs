use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::bootstrap::{self, Collaborators, Overrides, SetupOutcome, SetupPlan, Variant};
use crate::config::{LoadedSetupConfig, load_setup_config};
use crate::utils::download::HttpDownloader;
use crate::utils::process::{DryRunRunner, ProcessRunner, SystemRunner};
use crate::utils::prompt::{Confirm, Fixed, StdinPrompt};
use crate::validators::premake::{self, PremakeValidator};
use crate::validators::python::{self, PythonValidator};
use crate::validators::vulkan::{self, VulkanValidator};
use crate::validators::{RuntimeValidator, SkipRuntime};

/// Root CLI for devsetup
#[derive(Parser, Debug)]
#[command(name = "devsetup", version)]
#[command(about = "Validate developer tooling and generate project files")]
pub struct Cli {
    /// Project root (defaults to the parent of the current directory)
    #[arg(long, env = "DEVSETUP_ROOT")]
    pub root: Option<PathBuf>,

    /// Setup flavor: target format and whether submodules are synced
    #[arg(long, value_enum)]
    pub variant: Option<Variant>,

    /// Project format passed to the generator (e.g. vs2022)
    #[arg(long)]
    pub target: Option<String>,

    /// Skip `git submodule update --init --recursive`
    #[arg(long)]
    pub no_submodules: bool,

    /// Answer yes to every install/download prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Print external commands instead of running them
    #[arg(long)]
    pub dry_run: bool,
}

/// Dispatch after parse
pub fn run() {
    let cli = Cli::parse();

    match setup(&cli) {
        Ok(SetupOutcome::Completed { generated }) => {
            log::debug!("setup finished, project files generated: {generated}");
        }
        Ok(SetupOutcome::GeneratorMissing) => {
            log::debug!("setup finished without a project-file generator");
        }
        Err(e) => {
            eprintln!("error (setup): {e:#}");
            std::process::exit(1);
        }
    }
}

fn setup(cli: &Cli) -> Result<SetupOutcome> {
    let cwd = std::env::current_dir().context("resolving current directory")?;
    let root = bootstrap::plan::resolve_root(cli.root.as_deref(), &cwd)?;

    let config = load_setup_config(&root)?;
    let data = config.as_ref().map(|c| c.data.clone()).unwrap_or_default();
    if let Some(LoadedSetupConfig { path, .. }) = &config {
        println!("Using setup config {}", path.display());
    }

    let overrides = Overrides {
        variant: cli.variant,
        target: cli.target.clone(),
        no_submodules: cli.no_submodules,
    };
    let plan = SetupPlan::resolve(root, &data, &overrides);
    log::debug!("{plan:?}");

    let prompt: Box<dyn Confirm> = if cli.yes || cli.dry_run {
        Box::new(Fixed(true))
    } else {
        Box::new(StdinPrompt)
    };
    let spawner: Box<dyn ProcessRunner> = if cli.dry_run {
        Box::new(DryRunRunner)
    } else {
        Box::new(SystemRunner)
    };
    let confirm = prompt.as_ref();
    let runner = spawner.as_ref();

    let min_version = match data.python.min_version.as_deref() {
        Some(raw) => python::parse_min_version(raw)
            .with_context(|| format!("invalid python.min_version `{raw}`"))?,
        None => python::DEFAULT_MIN_VERSION,
    };
    let python = PythonValidator {
        explicit: std::env::var("DEVSETUP_PYTHON")
            .ok()
            .filter(|v| !v.trim().is_empty()),
        min_version,
        packages: data.python.packages.clone(),
        workdir: plan.root.clone(),
        confirm,
        runner,
    };
    let runtime: &dyn RuntimeValidator = if data.python.enabled {
        &python
    } else {
        &SkipRuntime
    };

    let generator = PremakeValidator {
        binary: plan.generator_binary.clone(),
        version: data
            .generator
            .version
            .clone()
            .unwrap_or_else(|| premake::DEFAULT_VERSION.to_string()),
        dry_run: cli.dry_run,
        confirm,
        downloader: &HttpDownloader,
    };

    let graphics = VulkanValidator {
        sdk_path: std::env::var_os("VULKAN_SDK").map(PathBuf::from),
        required_version: data
            .vulkan
            .required_version
            .clone()
            .unwrap_or_else(|| vulkan::DEFAULT_REQUIRED_VERSION.to_string()),
        debug_libs: data.vulkan.debug_libs.clone(),
    };

    let tools = Collaborators {
        runtime,
        generator: &generator,
        graphics: &graphics,
        runner,
    };

    let outcome = bootstrap::run(&plan, &tools, std::env::consts::OS, &mut io::stdout())?;
    Ok(outcome)
}
