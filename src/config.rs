use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, StubError};
use crate::render::RenderOptions;

/// Name of the configuration file stored inside the `.stubgen` directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Name of the hidden directory holding stubgen metadata.
pub const STUBGEN_DIR: &str = ".stubgen";

/// Configuration for stub generation in one project.
///
/// Controls where sources are found, which of them are compiled into stubs,
/// and where the stubs go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StubConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Source roots, relative to the project root. Package paths start here.
    pub source_dirs: Vec<String>,
    /// Glob patterns (relative to a source root) for files to compile.
    pub include: Vec<String>,
    /// Glob patterns for files to skip. Exclude patterns win.
    pub exclude: Vec<String>,
    /// Output directory, relative to the project root unless absolute.
    pub output_dir: String,
    /// Extension of generated files.
    pub output_extension: String,
    /// Maximum source size in bytes; larger files are skipped.
    pub max_file_size: u64,
    /// Whether stubs import the packages Groovy imports implicitly.
    pub default_imports: bool,
    /// Whether each stub is parsed as Java before it is written.
    pub verify_output: bool,
    /// Whether any failed source fails the whole run.
    pub strict: bool,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            version: 1,
            source_dirs: vec!["src/main/groovy".to_string()],
            include: vec![
                "**/*.groovy".to_string(),
                "**/*.gvy".to_string(),
                "**/*.gy".to_string(),
                "**/*.gsh".to_string(),
            ],
            exclude: vec![
                "**/.*/**".to_string(),
                "build/**".to_string(),
                "target/**".to_string(),
            ],
            output_dir: "target/generated-sources/groovy-stubs".to_string(),
            output_extension: "java".to_string(),
            max_file_size: 1_048_576,
            default_imports: true,
            verify_output: false,
            strict: false,
        }
    }
}

impl StubConfig {
    /// Renderer options derived from this configuration.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            default_imports: self.default_imports,
        }
    }

    /// The output directory resolved against `project_root`.
    pub fn output_path(&self, project_root: &Path) -> PathBuf {
        let out = Path::new(&self.output_dir);
        if out.is_absolute() {
            out.to_path_buf()
        } else {
            project_root.join(out)
        }
    }
}

/// Returns the path to the `.stubgen` directory within the given project root.
pub fn get_stubgen_dir(project_root: &Path) -> PathBuf {
    project_root.join(STUBGEN_DIR)
}

/// Returns the path to `config.json` within the `.stubgen` directory.
pub fn get_config_path(project_root: &Path) -> PathBuf {
    get_stubgen_dir(project_root).join(CONFIG_FILENAME)
}

/// Loads the configuration from disk.
///
/// If the configuration file does not exist, returns the default configuration.
pub fn load_config(project_root: &Path) -> Result<StubConfig> {
    let config_path = get_config_path(project_root);

    if !config_path.exists() {
        return Ok(StubConfig::default());
    }

    let contents = fs::read_to_string(&config_path).map_err(|e| StubError::Config {
        message: format!(
            "failed to read config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    let config: StubConfig = serde_json::from_str(&contents).map_err(|e| StubError::Config {
        message: format!(
            "failed to parse config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    Ok(config)
}

/// Saves the configuration to disk using an atomic write.
///
/// Writes to a temporary file first and then renames it into place.
pub fn save_config(project_root: &Path, config: &StubConfig) -> Result<()> {
    let stubgen_dir = get_stubgen_dir(project_root);
    fs::create_dir_all(&stubgen_dir).map_err(|e| StubError::Config {
        message: format!(
            "failed to create stubgen directory '{}': {}",
            stubgen_dir.display(),
            e
        ),
    })?;

    let config_path = get_config_path(project_root);
    let tmp_path = config_path.with_extension("tmp");

    let json = serde_json::to_string_pretty(config).map_err(|e| StubError::Config {
        message: format!("failed to serialize config: {}", e),
    })?;

    fs::write(&tmp_path, &json).map_err(|e| StubError::Config {
        message: format!(
            "failed to write temporary config file '{}': {}",
            tmp_path.display(),
            e
        ),
    })?;

    fs::rename(&tmp_path, &config_path).map_err(|e| StubError::Config {
        message: format!(
            "failed to rename temporary config file '{}' to '{}': {}",
            tmp_path.display(),
            config_path.display(),
            e
        ),
    })?;

    Ok(())
}

/// Determines whether a source file should be compiled, based on the
/// include and exclude glob patterns.
///
/// `file_path` is relative to its source root. Exclude patterns take
/// precedence; otherwise at least one include pattern must match.
pub fn should_include_file(file_path: &str, config: &StubConfig) -> bool {
    let match_opts = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    for pattern_str in &config.exclude {
        if let Ok(pattern) = Pattern::new(pattern_str) {
            if pattern.matches_with(file_path, match_opts) {
                return false;
            }
        }
    }

    for pattern_str in &config.include {
        if let Ok(pattern) = Pattern::new(pattern_str) {
            if pattern.matches_with(file_path, match_opts) {
                return true;
            }
        }
    }

    false
}
