use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "uitestgen")]
#[command(about = "Index UI test repositories and split generated test code into files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Enable verbose debug output")]
    verbose: bool,

    #[arg(long, global = true, help = "Perform a dry run without writing files")]
    dry_run: bool,

    #[arg(
        long,
        global = true,
        default_value = cli::DEFAULT_INDEX_PATH,
        help = "Where the repository index is stored"
    )]
    index_path: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Index a test repository (reuses a stored index unless --force)")]
    Index {
        #[arg(help = "Repository root")]
        repository: PathBuf,

        #[arg(long, help = "Re-index even if a stored index exists")]
        force: bool,

        #[arg(long, help = "Repository URL recorded in the index")]
        url: Option<String>,

        #[arg(long = "include", help = "Include glob (repeatable, default **/*.py)")]
        include: Vec<String>,

        #[arg(long = "exclude", help = "Additional exclude glob (repeatable)")]
        exclude: Vec<String>,

        #[arg(long, help = "Read files on a single thread")]
        sequential: bool,
    },

    #[command(about = "Show the stored index")]
    Show {
        #[arg(long, help = "Also print the prompt context rendered from the index")]
        context: bool,
    },

    #[command(about = "Split raw generated responses into page object and test files")]
    Split {
        #[arg(required = true, help = "Files holding raw model output")]
        responses: Vec<PathBuf>,

        #[arg(long, default_value = "generated", help = "Output directory")]
        out_dir: PathBuf,
    },

    #[command(about = "Generate code for a prompt with an external generator command")]
    Generate {
        #[arg(help = "File holding the task prompt")]
        prompt_file: PathBuf,

        #[arg(long, help = "Generator command, receives JSON on stdin")]
        generator: String,

        #[arg(long = "generator-arg", help = "Argument for the generator command (repeatable)")]
        generator_args: Vec<String>,

        #[arg(long, help = "Model name passed to the generator")]
        model: Option<String>,

        #[arg(long, default_value_t = 300, help = "Generator timeout in seconds")]
        timeout: u64,

        #[arg(long, help = "Cache folder for generator replies")]
        cache_dir: Option<String>,

        #[arg(long, help = "Always call the generator")]
        no_cache: bool,

        #[arg(long, help = "Base name for the written files (defaults to the prompt file stem)")]
        name: Option<String>,

        #[arg(long, default_value = "generated", help = "Output directory")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli::Config {
        verbose: cli.verbose,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Index {
            repository,
            force,
            url,
            include,
            exclude,
            sequential,
        } => {
            let options = cli::IndexOptions {
                repository,
                force,
                url,
                include,
                exclude,
                parallel: !sequential,
            };
            cli::index(options, &cli.index_path, &config)?;
        }
        Commands::Show { context } => {
            cli::show(&cli.index_path, context)?;
        }
        Commands::Split { responses, out_dir } => {
            cli::split(responses, &out_dir, &cli.index_path, &config)?;
        }
        Commands::Generate {
            prompt_file,
            generator,
            generator_args,
            model,
            timeout,
            cache_dir,
            no_cache,
            name,
            out_dir,
        } => {
            let options = cli::GenerateOptions {
                prompt_file,
                generator,
                generator_args,
                model,
                timeout_secs: timeout,
                cache_dir,
                no_cache,
                name,
                out_dir,
            };
            cli::generate(options, &cli.index_path, &config).await?;
        }
    }

    Ok(())
}
