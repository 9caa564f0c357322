//! The text generation collaborator and the pipeline that turns its replies into sections.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use super::code_fence::extract_code;
use super::content_normalizer::ContentNormalizer;
use super::file_cache::FileCache;
use super::response_partitioner::ResponsePartitioner;
use crate::data::{Cache, GeneratedSections, SectionKind};
use crate::error::{GenerationError, Result};

/// Boxed future returned by [`TextGenerator::generate`], keeping the trait object safe.
pub type GenerationFuture<'a> =
    Pin<Box<dyn Future<Output = std::result::Result<String, GenerationError>> + Send + 'a>>;

/// Produces text for a prompt.
pub trait TextGenerator: Send + Sync {
    /// Stable name of the backend and model; replies are cached per identity.
    fn identity(&self) -> String;

    /// Generates a reply for `prompt`.
    ///
    /// # Errors
    ///
    /// `Timeout` and `Transient` may succeed on a retry, `Fatal` will not.
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerationFuture<'a>;
}

/// Hex SHA-256 of a string.
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenerationReply {
    success: bool,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error: Option<String>,
    /// Set by runners that know the failure is temporary (rate limits, overload)
    #[serde(default)]
    retryable: bool,
}

/// Runs an external command per prompt.
///
/// The command receives `{"prompt": ..., "model": ...}` on stdin and must print
/// `{"success": bool, "output": ..., "error": ...}` on stdout.
#[derive(Debug, Clone)]
pub struct ProcessGenerator {
    program: String,
    args: Vec<String>,
    model: Option<String>,
    timeout: Duration,
}

impl ProcessGenerator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            model: None,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run_once(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let request = serde_json::to_string(&GenerationRequest {
            prompt,
            model: self.model.as_deref(),
        })
        .map_err(|e| GenerationError::Fatal(format!("failed to serialize request: {}", e)))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                GenerationError::Fatal(format!("failed to spawn '{}': {}", self.program, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(request.as_bytes()).await.map_err(|e| {
                GenerationError::Transient(format!("failed to write request: {}", e))
            })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| GenerationError::Transient(format!("failed to read reply: {}", e)))?;

        if !output.status.success() {
            return Err(GenerationError::Transient(format!(
                "generator exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let reply: GenerationReply = serde_json::from_slice(&output.stdout)
            .map_err(|e| GenerationError::Fatal(format!("unreadable reply: {}", e)))?;

        if !reply.success {
            let message = reply.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(if reply.retryable {
                GenerationError::Transient(message)
            } else {
                GenerationError::Fatal(message)
            });
        }

        reply
            .output
            .ok_or_else(|| GenerationError::Fatal("reply has no output".to_string()))
    }
}

impl TextGenerator for ProcessGenerator {
    fn identity(&self) -> String {
        let mut identity = self.program.clone();
        for arg in &self.args {
            identity.push(' ');
            identity.push_str(arg);
        }
        if let Some(model) = &self.model {
            identity.push_str(" model=");
            identity.push_str(model);
        }
        identity
    }

    fn generate<'a>(&'a self, prompt: &'a str) -> GenerationFuture<'a> {
        Box::pin(async move {
            debug!(program = %self.program, prompt_len = prompt.len(), "running generator");
            match tokio::time::timeout(self.timeout, self.run_once(prompt)).await {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout),
            }
        })
    }
}

/// Serves repeated prompts from a cache.
///
/// Keys are the SHA-256 of the prompt. Only successful replies are stored.
pub struct CachedGenerator<G, C> {
    inner: G,
    cache: C,
}

impl<G: TextGenerator> CachedGenerator<G, FileCache> {
    /// Caches under `{folder}/{sha256(identity)}/`, so each backend and model gets its own space.
    pub fn with_file_cache(inner: G, folder: Option<String>) -> Self {
        let namespace = sha256_hex(&inner.identity());
        Self {
            cache: FileCache::new(folder, namespace),
            inner,
        }
    }
}

impl<G: TextGenerator, C: Cache> CachedGenerator<G, C> {
    pub fn new(inner: G, cache: C) -> Self {
        Self { inner, cache }
    }
}

impl<G: TextGenerator, C: Cache> TextGenerator for CachedGenerator<G, C> {
    fn identity(&self) -> String {
        self.inner.identity()
    }

    fn generate<'a>(&'a self, prompt: &'a str) -> GenerationFuture<'a> {
        Box::pin(async move {
            let key = sha256_hex(prompt);
            if let Some(cached) = self.cache.get(&key) {
                debug!(key = %key, "generation cache hit");
                return Ok(cached);
            }

            let output = self.inner.generate(prompt).await?;
            self.cache.set(&key, &output);
            Ok(output)
        })
    }
}

/// Turns a raw model reply into validated, import-normalized sections.
#[derive(Debug, Clone, Default)]
pub struct ResponseProcessor {
    partitioner: ResponsePartitioner,
    normalizer: ContentNormalizer,
}

impl ResponseProcessor {
    pub fn new(partitioner: ResponsePartitioner, normalizer: ContentNormalizer) -> Self {
        Self {
            partitioner,
            normalizer,
        }
    }

    /// # Errors
    ///
    /// `Error::SyntaxInvalid` when a non-empty section does not parse.
    pub fn process(&self, raw: &str) -> Result<GeneratedSections> {
        let code = extract_code(raw, self.partitioner.config());
        let partition = self.partitioner.partition(&code);

        for (kind, text) in [
            (SectionKind::Imports, &partition.imports),
            (SectionKind::Component, &partition.component),
            (SectionKind::Test, &partition.test),
        ] {
            if !text.trim().is_empty() {
                self.normalizer.validate(kind, text)?;
            }
        }

        Ok(GeneratedSections {
            imports: self.normalizer.normalize_imports(&partition.imports),
            component: self.normalizer.normalize_imports(&partition.component),
            test: self.normalizer.normalize_imports(&partition.test),
            tier: partition.tier,
        })
    }
}

/// A generator followed by a [`ResponseProcessor`].
pub struct GenerationPipeline<G> {
    generator: G,
    processor: ResponseProcessor,
}

impl<G: TextGenerator> GenerationPipeline<G> {
    pub fn new(generator: G, processor: ResponseProcessor) -> Self {
        Self {
            generator,
            processor,
        }
    }

    /// Generates code for `prompt` and splits it into checked sections.
    ///
    /// # Errors
    ///
    /// `Error::Generation` when the generator fails and `Error::SyntaxInvalid` when a
    /// non-empty section does not parse. Neither is retried here.
    pub async fn run(&self, prompt: &str) -> Result<GeneratedSections> {
        info!(generator = %self.generator.identity(), "generating code");
        let raw = self.generator.generate(prompt).await?;
        self.processor.process(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PartitionTier;
    use crate::error::Error;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedGenerator {
        reply: std::result::Result<String, GenerationError>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn identity(&self) -> String {
            "scripted".to_string()
        }

        fn generate<'a>(&'a self, _prompt: &'a str) -> GenerationFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.reply.clone();
            Box::pin(async move { reply })
        }
    }

    #[derive(Default)]
    struct MemoryCache {
        entries: Mutex<Vec<(String, String)>>,
    }

    impl Cache for MemoryCache {
        fn get(&self, key: &str) -> Option<String> {
            let entries = self.entries.lock().unwrap();
            entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        }

        fn set(&self, key: &str, value: &str) {
            self.entries
                .lock()
                .unwrap()
                .push((key.to_string(), value.to_string()));
        }
    }

    fn pipeline<G: TextGenerator>(generator: G) -> GenerationPipeline<G> {
        GenerationPipeline::new(generator, ResponseProcessor::default())
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(sha256_hex("a"), sha256_hex("a"));
        assert_ne!(sha256_hex("a"), sha256_hex("b"));
        assert_eq!(sha256_hex("").len(), 64);
    }

    #[tokio::test]
    async fn test_pipeline_splits_fenced_reply() {
        let reply = "Sure!\n```python\nimport pytest\nimport pytest\n# === PAGE OBJECT ===\nclass LoginPage:\n    pass\n# === TEST FUNCTION ===\nimport allure\nimport os\n\ndef test_login():\n    pass\n```\n";
        let sections = pipeline(ScriptedGenerator::replying(reply))
            .run("write a login test")
            .await
            .unwrap();
        assert_eq!(sections.tier, PartitionTier::Markers);
        assert_eq!(sections.imports, "import pytest");
        assert_eq!(sections.component, "class LoginPage:\n    pass");
        assert_eq!(
            sections.test,
            "import os\nimport allure\n\ndef test_login():\n    pass"
        );
    }

    #[tokio::test]
    async fn test_pipeline_rejects_invalid_section() {
        let reply = "=== PAGE OBJECT ===\nclass LoginPage(:\n    pass\n=== TEST FUNCTION ===\ndef test_x():\n    pass\n";
        let result = pipeline(ScriptedGenerator::replying(reply)).run("p").await;
        assert!(matches!(
            result,
            Err(Error::SyntaxInvalid {
                section: SectionKind::Component
            })
        ));
    }

    #[tokio::test]
    async fn test_pipeline_surfaces_generation_errors() {
        let generator = ScriptedGenerator {
            reply: Err(GenerationError::Timeout),
            calls: AtomicUsize::new(0),
        };
        let result = pipeline(generator).run("p").await;
        assert!(matches!(
            result,
            Err(Error::Generation(GenerationError::Timeout))
        ));
    }

    #[tokio::test]
    async fn test_cached_generator_reuses_replies() {
        let cached = CachedGenerator::new(ScriptedGenerator::replying("x = 1"), MemoryCache::default());
        assert_eq!(cached.generate("prompt").await.unwrap(), "x = 1");
        assert_eq!(cached.generate("prompt").await.unwrap(), "x = 1");
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);

        cached.generate("other prompt").await.unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cached_generator_does_not_store_failures() {
        let generator = ScriptedGenerator {
            reply: Err(GenerationError::Transient("busy".to_string())),
            calls: AtomicUsize::new(0),
        };
        let cached = CachedGenerator::new(generator, MemoryCache::default());
        assert!(cached.generate("p").await.is_err());
        assert!(cached.generate("p").await.is_err());
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
        assert!(cached.cache.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_cache_is_scoped_by_identity() {
        let dir = tempfile::tempdir().unwrap();
        let folder = Some(dir.path().to_string_lossy().into_owned());
        let cached = CachedGenerator::with_file_cache(ScriptedGenerator::replying("x = 1"), folder);
        cached.generate("prompt").await.unwrap();

        let expected = dir
            .path()
            .join(sha256_hex("scripted"))
            .join(format!("{}.cache", sha256_hex("prompt")));
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "x = 1");
    }

    #[tokio::test]
    async fn test_process_spawn_failure_is_fatal() {
        let generator = ProcessGenerator::new("uitestgen-no-such-generator-binary");
        let result = generator.generate("p").await;
        assert!(matches!(result, Err(GenerationError::Fatal(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_reply_is_parsed() {
        let generator = ProcessGenerator::new("sh").args([
            "-c",
            r#"cat >/dev/null; printf '%s' '{"success": true, "output": "x = 1"}'"#,
        ]);
        assert_eq!(generator.generate("p").await.unwrap(), "x = 1");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_failures_are_classified() {
        let crashed = ProcessGenerator::new("sh").args(["-c", "cat >/dev/null; exit 3"]);
        assert!(matches!(
            crashed.generate("p").await,
            Err(GenerationError::Transient(_))
        ));

        let refused = ProcessGenerator::new("sh").args([
            "-c",
            r#"cat >/dev/null; printf '%s' '{"success": false, "error": "unknown model"}'"#,
        ]);
        assert_eq!(
            refused.generate("p").await,
            Err(GenerationError::Fatal("unknown model".to_string()))
        );

        let slow = ProcessGenerator::new("sh")
            .args(["-c", "sleep 5"])
            .timeout(Duration::from_millis(100));
        assert_eq!(slow.generate("p").await, Err(GenerationError::Timeout));
    }

    #[test]
    fn test_process_identity_includes_model() {
        let generator = ProcessGenerator::new("python3")
            .args(["runner.py"])
            .model("qwen2.5-coder");
        assert_eq!(generator.identity(), "python3 runner.py model=qwen2.5-coder");
    }
}
