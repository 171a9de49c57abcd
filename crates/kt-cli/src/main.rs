//! kt: convert annotated CAD assemblies into MJCF models

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use kt_core::{
    ConvertOptions, Project, TranslationMode, build_kinematic_tree, convert_to_mjcf,
    resolve_model_name,
};

/// Assembly to MJCF converter
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    cmd: Command,

    /// Log more (-v for debug, -vv for trace); RUST_LOG takes precedence
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a project into an MJCF model directory
    Convert {
        #[clap(flatten)]
        settings: Settings,

        /// Output directory (replaced on success)
        #[clap(short, long)]
        out: PathBuf,
    },
    /// Build and validate the kinematic tree without writing anything
    Check {
        #[clap(flatten)]
        settings: Settings,
    },
    /// Print the effective options as RON
    Config {
        #[clap(flatten)]
        settings: Settings,
    },
}

#[derive(Args)]
struct Settings {
    /// Project file (.ron or .json)
    project: PathBuf,

    /// RON file with conversion options
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Regular expression selecting base links (matched at the start of names)
    #[clap(long)]
    base_pattern: Option<String>,

    /// Linear scale from CAD units to output units
    #[clap(long)]
    scale: Option<f64>,

    /// Emit prismatic joints as slide joints
    #[clap(long)]
    allow_prismatic: bool,

    /// Emit joint friction as frictionloss
    #[clap(long)]
    emit_friction: bool,

    /// Express body translations in the parent body frame
    #[clap(long)]
    parent_frame_translation: bool,

    /// Leave out the floor plane and light
    #[clap(long)]
    no_floor: bool,

    /// Model name (defaults to the top-level assembly label)
    #[clap(long)]
    model_name: Option<String>,
}

impl Settings {
    /// Config file (or defaults) with command-line overrides applied
    fn options(&self) -> Result<ConvertOptions> {
        let mut options = match &self.config {
            Some(path) => ConvertOptions::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ConvertOptions::default(),
        };
        self.apply(&mut options);
        options.project_dir = Some(self.project_dir().to_path_buf());
        Ok(options)
    }

    fn project_dir(&self) -> &Path {
        match self.project.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn apply(&self, options: &mut ConvertOptions) {
        if let Some(pattern) = &self.base_pattern {
            options.base_link_pattern = pattern.clone();
        }
        if let Some(scale) = self.scale {
            options.pos_scale_factor = scale;
        }
        if let Some(name) = &self.model_name {
            options.model_name = Some(name.clone());
        }
        if self.allow_prismatic {
            options.allow_prismatic = true;
        }
        if self.emit_friction {
            options.emit_friction = true;
        }
        if self.parent_frame_translation {
            options.translation_mode = TranslationMode::ParentFrame;
        }
        if self.no_floor {
            options.floor = false;
        }
    }

    fn load_assembly(&self) -> Result<kt_core::Assembly> {
        Project::load_assembly(&self.project)
            .with_context(|| format!("failed to load project {}", self.project.display()))
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default = match verbose {
        0 => "kt_core=info,kt_cli=info",
        1 => "kt_core=debug,kt_cli=debug",
        _ => "kt_core=trace,kt_cli=trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cmd: Command) -> Result<()> {
    match cmd {
        Command::Convert { settings, out } => {
            let mut options = settings.options()?;
            options.output_dir = out;
            let assembly = settings.load_assembly()?;
            tracing::info!(
                "Converting {} into {}",
                settings.project.display(),
                options.output_dir.display()
            );
            let summary = convert_to_mjcf(&assembly, &options).context("conversion failed")?;
            println!(
                "Wrote {} ({} bodies, {} actuators, {} meshes)",
                summary.model_path.display(),
                summary.body_count,
                summary.actuator_count,
                summary.mesh_count
            );
        }
        Command::Check { settings } => {
            let options = settings.options()?;
            let assembly = settings.load_assembly()?;
            tracing::info!("Checking {}", settings.project.display());
            let tree = build_kinematic_tree(&assembly, &options).context("check failed")?;
            let name = resolve_model_name(&assembly, &options).context("check failed")?;
            println!("Model '{name}': {} bodies", tree.len());
            print!("{}", tree.outline());
        }
        Command::Config { settings } => {
            let options = settings.options()?;
            tracing::debug!("Effective options: {:?}", options);
            let text = ron::ser::to_string_pretty(&options, ron::ser::PrettyConfig::default())
                .context("failed to serialize options")?;
            println!("{text}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli.cmd)
}
