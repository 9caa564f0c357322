mod cache;
mod index;
pub mod portable_path;
mod sections;

pub use cache::Cache;
pub use index::{
    Category, CodePatterns, INDEX_SCHEMA_VERSION, IndexedFile, NamingPattern, NamingStyle,
    ProjectStructure, RepositoryIndex, TemplateInfo,
};
pub use sections::{GeneratedSections, Partition, PartitionTier, SectionKind};
