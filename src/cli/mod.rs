use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

mod progress;

use progress::ProgressIndicator;
use uitestgen::config::{IndexerConfig, PartitionConfig};
use uitestgen::contexts::{
    CachedGenerator, ContentNormalizer, GenerationPipeline, IndexPipeline, LocalRepository,
    ProcessGenerator, ResponsePartitioner, ResponseProcessor, TextGenerator, load_existing,
    render_repository_context,
};
use uitestgen::data::{GeneratedSections, RepositoryIndex};
use uitestgen::index_store;

#[derive(Clone, Copy)]
pub struct Config {
    pub verbose: bool,
    pub dry_run: bool,
}

pub const DEFAULT_INDEX_PATH: &str = ".uitestgen/index.json";

pub struct IndexOptions {
    pub repository: PathBuf,
    pub force: bool,
    pub url: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub parallel: bool,
}

pub struct GenerateOptions {
    pub prompt_file: PathBuf,
    pub generator: String,
    pub generator_args: Vec<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub cache_dir: Option<String>,
    pub no_cache: bool,
    pub name: Option<String>,
    pub out_dir: PathBuf,
}

pub fn index(options: IndexOptions, index_path: &Path, config: &Config) -> Result<()> {
    let mut indexer = IndexerConfig {
        repository_url: options.url,
        parallel: options.parallel,
        ..IndexerConfig::default()
    };
    if !options.include.is_empty() {
        indexer.include_patterns = options.include;
    }
    indexer.exclude_patterns.extend(options.exclude);

    let pipeline = IndexPipeline::new(indexer).with_dry_run(config.dry_run);
    let source = LocalRepository::new(&options.repository);
    let index = pipeline
        .run(&source, index_path, options.force)
        .with_context(|| format!("Failed to index {}", options.repository.display()))?;

    println!("{}", index.summary());
    if config.verbose {
        print_patterns(&index);
    }
    Ok(())
}

pub fn show(index_path: &Path, context: bool) -> Result<()> {
    let index = match index_store::try_load(index_path) {
        Ok(Some(index)) => index,
        Ok(None) => bail!(
            "No index at {}. Run `uitestgen index <repository>` first",
            index_path.display()
        ),
        Err(e) => return Err(e).context("Stored index cannot be used"),
    };

    println!("{}", index.summary());
    print_patterns(&index);
    if context {
        println!("\n{}", render_repository_context(&index));
    }
    Ok(())
}

pub fn split(responses: Vec<PathBuf>, out_dir: &Path, index_path: &Path, config: &Config) -> Result<()> {
    let processor = response_processor(index_path);
    let mut progress = ProgressIndicator::new(responses.len());

    for response in &responses {
        let name = file_stem(response);
        progress.start_item(&name);

        let outcome = fs::read_to_string(response)
            .with_context(|| format!("Failed to read {}", response.display()))
            .and_then(|raw| processor.process(&raw).map_err(anyhow::Error::from))
            .and_then(|sections| write_sections(&sections, out_dir, &name, config));

        match outcome {
            Ok(written) => {
                for path in written {
                    println!("  wrote {}", path.display());
                }
                progress.complete_item(&name, true);
            }
            Err(e) => {
                eprintln!("  failed: {:#}", e);
                progress.complete_item(&name, false);
            }
        }
    }

    progress.finish();
    if progress.failed() > 0 {
        bail!("{} of {} response(s) could not be split", progress.failed(), responses.len());
    }
    Ok(())
}

pub async fn generate(options: GenerateOptions, index_path: &Path, config: &Config) -> Result<()> {
    let task = fs::read_to_string(&options.prompt_file)
        .with_context(|| format!("Failed to read {}", options.prompt_file.display()))?;

    let prompt = match load_existing(index_path) {
        Some(index) => format!("{}\n\n{}", render_repository_context(&index), task),
        None => {
            warn!(path = %index_path.display(), "no usable index, prompting without repository context");
            task
        }
    };

    let mut generator = ProcessGenerator::new(&options.generator)
        .args(options.generator_args.iter().cloned())
        .timeout(Duration::from_secs(options.timeout_secs));
    if let Some(model) = &options.model {
        generator = generator.model(model.clone());
    }

    let processor = response_processor(index_path);
    let sections = if options.no_cache {
        run_pipeline(GenerationPipeline::new(generator, processor), &prompt).await?
    } else {
        let cached = CachedGenerator::with_file_cache(generator, options.cache_dir.clone());
        run_pipeline(GenerationPipeline::new(cached, processor), &prompt).await?
    };

    let name = options
        .name
        .clone()
        .unwrap_or_else(|| file_stem(&options.prompt_file));
    for path in write_sections(&sections, &options.out_dir, &name, config)? {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

async fn run_pipeline<G: TextGenerator>(
    pipeline: GenerationPipeline<G>,
    prompt: &str,
) -> Result<GeneratedSections> {
    pipeline
        .run(prompt)
        .await
        .context("Generation was rejected")
}

/// Uses the naming conventions of the stored index when there is one.
fn response_processor(index_path: &Path) -> ResponseProcessor {
    let partition = load_existing(index_path)
        .map(|index| PartitionConfig::from_naming(&index.naming_patterns))
        .unwrap_or_default();
    ResponseProcessor::new(
        ResponsePartitioner::new(partition),
        ContentNormalizer::default(),
    )
}

/// Writes `{name}_page.py` and `test_{name}.py`, each led by the shared imports.
fn write_sections(
    sections: &GeneratedSections,
    out_dir: &Path,
    name: &str,
    config: &Config,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !sections.component.trim().is_empty() {
        files.push((
            out_dir.join(format!("{}_page.py", name)),
            with_imports(&sections.imports, &sections.component),
        ));
    }
    if !sections.test.trim().is_empty() {
        files.push((
            out_dir.join(format!("test_{}.py", name)),
            with_imports(&sections.imports, &sections.test),
        ));
    }

    info!(tier = ?sections.tier, files = files.len(), "sections ready");

    if config.dry_run {
        for (path, content) in &files {
            println!("[DRY RUN] Would write {} ({} lines)", path.display(), content.lines().count());
        }
        return Ok(Vec::new());
    }

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let mut written = Vec::new();
    for (path, content) in files {
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

fn with_imports(imports: &str, body: &str) -> String {
    let body = body.trim_end();
    if imports.trim().is_empty() {
        format!("{}\n", body)
    } else {
        format!("{}\n\n\n{}\n", imports.trim_end(), body)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "generated".to_string())
}

fn print_patterns(index: &RepositoryIndex) {
    let naming = &index.naming_patterns;
    let code = &index.code_patterns;
    println!(
        "Naming: files {}, classes {}, functions {}, test prefix '{}', page object suffix '{}'",
        naming.file_naming,
        naming.class_naming,
        naming.function_naming,
        naming.test_prefix,
        naming.component_suffix
    );
    println!(
        "UI helpers: {}, reporting: {}, base page: {}, browser launcher: {}",
        code.uses_ui_helpers,
        code.uses_reporting,
        code.base_component_type.as_deref().unwrap_or("-"),
        code.browser_launcher.as_deref().unwrap_or("-")
    );
    if !code.common_imports.is_empty() {
        println!("Common imports: {}", code.common_imports.join(", "));
    }
}
