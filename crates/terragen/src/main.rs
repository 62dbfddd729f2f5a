//! Command-line entry point for the terrain and sky generator.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use terragen::{Generator, OutputPaths, Settings, image_io};

#[derive(Parser)]
#[command(about = "Generate terrain and sky demisphere textures")]
struct CliArgs {
    /// Generation settings.
    #[arg(long, default_value = "settings.toml")]
    settings: PathBuf,

    /// Grayscale template whose side is `2^t + 1`; generation is untemplated
    /// when the file does not exist.
    #[arg(long, default_value = "template.png")]
    template: PathBuf,

    /// Directory the generated files are written to.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

fn run(args: &CliArgs) -> terragen::Result<()> {
    let settings = Settings::load(&args.settings)?;
    tracing::info!(
        seed = settings.generation_options.seed,
        terrain_width = settings.generation_options.terrain_width(),
        "loaded {}",
        args.settings.display()
    );

    let wants_terrain = settings.launch_options.generate_terrain_heightmap;
    let template = if wants_terrain && args.template.exists() {
        Some(image_io::load_template(
            &args.template,
            settings.generation_options.max_terrain_height,
        )?)
    } else {
        if wants_terrain {
            tracing::warn!(
                "template {} not found, terrain will be untemplated",
                args.template.display()
            );
        }
        None
    };

    let paths = OutputPaths::in_dir(&args.output_dir);
    let report = Generator::new(settings, template).run(&paths)?;
    for path in &report.written {
        tracing::info!("wrote {}", path.display());
    }
    if let Some(erosion) = report.erosion {
        tracing::info!(
            droplets = erosion.droplets,
            eroded = erosion.eroded,
            deposited = erosion.deposited,
            "erosion summary"
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("generation failed: {e}");
            ExitCode::FAILURE
        }
    }
}
