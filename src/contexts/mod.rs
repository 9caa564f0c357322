mod classifier;
mod code_fence;
mod content_normalizer;
mod file_cache;
mod generation;
mod index_pipeline;
mod path_filter;
mod pattern_extractor;
mod prompt_context;
mod repository_indexer;
mod response_partitioner;
mod structure_analyzer;
mod template_selector;

pub use classifier::FileClassifier;
pub use code_fence::extract_code;
pub use content_normalizer::{ContentNormalizer, normalize_imports, validate_syntax};
pub use file_cache::{DEFAULT_CACHE_FOLDER, FileCache};
pub use generation::{
    CachedGenerator, GenerationFuture, GenerationPipeline, ProcessGenerator, ResponseProcessor,
    TextGenerator, sha256_hex,
};
pub use index_pipeline::{IndexPipeline, LocalRepository, RepositorySource, is_indexed, load_existing};
pub use path_filter::PathFilter;
pub use pattern_extractor::{
    PatternExtractor, class_naming_style, file_naming_style, function_naming_style,
};
pub use prompt_context::render_repository_context;
pub use repository_indexer::{
    RepositoryIndexer, decode_ignoring_invalid, fingerprint, index_repository,
};
pub use response_partitioner::{ResponsePartitioner, is_import_line};
pub use structure_analyzer::{StructureAnalyzer, analyze_structure};
pub use template_selector::{TemplateSelector, first_lines};
