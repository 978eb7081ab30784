use clap::{Parser, Subcommand};
use std::path::PathBuf;
use anyhow::{Context, Result};
use sentoc::Config;

#[derive(Parser)]
#[command(name = "sentoc")]
#[command(about = "Sento binding compiler")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate binding classes for compiled classes
    Generate {
        /// Directory with the compiled application classes
        #[arg(short, long, value_name = "DIR")]
        input: PathBuf,

        /// Output directory for generated and patched classes
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Directories with reference classes (platform stubs, runtime, libraries)
        #[arg(long, value_name = "PATHS")]
        classpath: Option<String>,

        /// Class file major version of generated classes
        #[arg(long, value_name = "VERSION")]
        target: Option<u16>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { input, output, classpath, target, verbose } => {
            init_logging(*verbose);
            generate(input, output, classpath.as_deref(), *target)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn generate(input: &PathBuf, output: &PathBuf, classpath: Option<&str>, target: Option<u16>) -> Result<()> {
    if !input.is_dir() {
        anyhow::bail!("input directory {} doesn't exist", input.display());
    }

    let mut config = Config::default();
    if let Some(version) = target {
        config = config.with_major_version(version);
    }

    let report = sentoc::generate_with_classpath(input, output, classpath, &config)
        .with_context(|| format!("generating bindings for {}", input.display()))?;
    log::info!("{} -> {}: {}", input.display(), output.display(), report);

    Ok(())
}
