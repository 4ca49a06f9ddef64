use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::builder::build_source;
use crate::config::{load_config, should_include_file, StubConfig};
use crate::errors::{Result, StubError};
use crate::render::{RenderedStub, StubRenderer};
use crate::types::SourceFile;
use crate::verify::verify_stub;

/// Outcome of compiling one source location.
#[derive(Debug)]
pub struct SourceOutcome {
    /// The location as given to the generator.
    pub location: String,
    /// Paths of the written stubs, or the error that stopped this source.
    pub result: Result<Vec<PathBuf>>,
}

impl SourceOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Result of a stub generation run.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// One entry per input location, in input order.
    pub outcomes: Vec<SourceOutcome>,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

impl GenerationReport {
    /// Number of source locations processed.
    pub fn source_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Total number of stub files written.
    pub fn stub_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(Vec::len)
            .sum()
    }

    /// Number of sources that failed.
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }

    /// Failed locations with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &StubError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.location.as_str(), e)))
    }
}

/// Drives the parse, build, render and write pipeline over a set of sources.
pub struct StubGenerator {
    config: StubConfig,
    project_root: PathBuf,
    output_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

impl StubGenerator {
    /// Creates a generator for `project_root` with an explicit configuration.
    pub fn new(project_root: &Path, config: StubConfig) -> Self {
        let output_dir = config.output_path(project_root);
        Self {
            config,
            project_root: project_root.to_path_buf(),
            output_dir,
        }
    }

    /// Creates a generator using the configuration stored under
    /// `project_root`, or the defaults when there is none.
    pub fn open(project_root: &Path) -> Result<Self> {
        let config = load_config(project_root)?;
        Ok(Self::new(project_root, config))
    }

    /// Overrides the configured output directory.
    pub fn with_output_dir(mut self, output_dir: &Path) -> Self {
        self.output_dir = output_dir.to_path_buf();
        self
    }

    pub fn config(&self) -> &StubConfig {
        &self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

impl StubGenerator {
    /// Generates stubs for every source found by `scan_sources`.
    pub fn generate_all(&self) -> Result<GenerationReport> {
        let sources = self.scan_sources();
        self.generate(&sources)
    }

    /// Generates stubs for the given source locations, one at a time.
    ///
    /// A source that fails to read, parse, build or write is logged and
    /// recorded in the report; the run goes on with the next one. Only a
    /// fatal error (a renderer invariant violation) aborts the run.
    pub fn generate(&self, locations: &[PathBuf]) -> Result<GenerationReport> {
        let start = Instant::now();
        info!(
            sources = locations.len(),
            output = %self.output_dir.display(),
            "generating stubs"
        );

        let mut outcomes = Vec::with_capacity(locations.len());
        for location in locations {
            let label = self.label(location);
            let result = match self.generate_source(location) {
                Err(e) if e.is_fatal() => {
                    error!(source = %label, error = %e, "aborting stub generation");
                    return Err(e);
                }
                result => result,
            };
            match &result {
                Ok(paths) => debug!(source = %label, stubs = paths.len(), "compiled source"),
                Err(e) => warn!(source = %label, error = %e, "skipping source"),
            }
            outcomes.push(SourceOutcome {
                location: label,
                result,
            });
        }

        let report = GenerationReport {
            outcomes,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            sources = report.source_count(),
            stubs = report.stub_count(),
            failures = report.failure_count(),
            duration_ms = report.duration_ms,
            "stub generation finished"
        );
        Ok(report)
    }

    /// Compiles one source into stub files and returns their paths.
    ///
    /// All classes are rendered before anything is written. If a write
    /// fails, the stubs already written for this source are removed.
    pub fn generate_source(&self, location: &Path) -> Result<Vec<PathBuf>> {
        let (model, stubs) = self.render_source(location)?;

        let mut written: Vec<PathBuf> = Vec::with_capacity(stubs.len());
        for (class, stub) in model.classes.iter().zip(&stubs) {
            let path = self
                .output_dir
                .join(model.stub_path(class, &self.config.output_extension));
            if let Err(e) = write_stub(&path, &stub.text) {
                for done in &written {
                    let _ = fs::remove_file(done);
                }
                return Err(e);
            }
            written.push(path);
        }
        Ok(written)
    }

    /// Parses, builds and renders one source without writing anything.
    pub fn render_source(&self, location: &Path) -> Result<(SourceFile, Vec<RenderedStub>)> {
        let model = self.build_model(location)?;
        let stubs = StubRenderer::new(&model, self.config.render_options()).render_all()?;
        if self.config.verify_output {
            for stub in &stubs {
                verify_stub(&stub.class_name, &stub.text)?;
            }
        }
        Ok((model, stubs))
    }

    /// Reads and builds the model of one source.
    pub fn build_model(&self, location: &Path) -> Result<SourceFile> {
        let label = self.label(location);
        let source = self.read_source(location, &label)?;
        let model = build_source(&label, &source)?;
        debug!(
            source = %label,
            kind = model.kind.as_str(),
            classes = model.classes.len(),
            "built source model"
        );
        Ok(model)
    }

    fn read_source(&self, location: &Path, label: &str) -> Result<String> {
        let metadata = fs::metadata(location).map_err(|e| StubError::File {
            message: format!("cannot stat source: {}", e),
            path: label.to_string(),
        })?;
        if metadata.len() > self.config.max_file_size {
            return Err(StubError::File {
                message: format!(
                    "source is {} bytes, larger than max_file_size ({})",
                    metadata.len(),
                    self.config.max_file_size
                ),
                path: label.to_string(),
            });
        }
        fs::read_to_string(location).map_err(|e| StubError::File {
            message: format!("cannot read source: {}", e),
            path: label.to_string(),
        })
    }

    /// The location relative to the project root when it lies inside it.
    fn label(&self, location: &Path) -> String {
        location
            .strip_prefix(&self.project_root)
            .unwrap_or(location)
            .to_string_lossy()
            .to_string()
    }
}

/// Writes one stub, creating parent directories as needed.
fn write_stub(path: &Path, text: &str) -> Result<()> {
    let to_error = |e: std::io::Error| StubError::File {
        message: format!("cannot write stub: {}", e),
        path: path.display().to_string(),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(to_error)?;
    }
    fs::write(path, text).map_err(to_error)
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

impl StubGenerator {
    /// Finds the sources under the configured source directories that pass
    /// the include/exclude patterns, sorted for a stable order.
    ///
    /// Missing source directories are skipped.
    pub fn scan_sources(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for dir in &self.config.source_dirs {
            let root = self.project_root.join(dir);
            if !root.is_dir() {
                debug!(dir = %root.display(), "source directory does not exist");
                continue;
            }
            for entry in WalkDir::new(&root).sort_by_file_name() {
                let entry = match entry {
                    Ok(e) => e,
                    Err(_) => continue,
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if let Ok(relative) = path.strip_prefix(&root) {
                    let rel_str = relative.to_string_lossy().replace('\\', "/");
                    if should_include_file(&rel_str, &self.config) {
                        files.push(path.to_path_buf());
                    }
                }
            }
        }
        files
    }
}
