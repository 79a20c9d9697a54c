//! Configuration types for vault-to-HTML conversion.
//!
//! All run behaviour is controlled through [`SiteConfig`], built via its
//! [`SiteConfigBuilder`] or loaded from a YAML file (`obs-blog.yaml` by
//! default):
//!
//! ```yaml
//! input: ~/Documents/Vault
//! output: site
//! concurrency: 8
//! syntax_highlighting: true
//! highlight_theme: base16-ocean.dark
//! hard_breaks: true
//! toc_marker: "[TOC]"
//! ```
//!
//! Only `input` and `output` are required. A leading `~` in either path is
//! expanded to the home directory.

use crate::error::Obs2HtmlError;
use crate::pipeline::render::{is_bundled_theme, RenderOptions, BUNDLED_THEMES};
use crate::progress::ProgressCallback;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "obs-blog.yaml";

/// Default number of files processed at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Configuration for one vault conversion.
///
/// Built via [`SiteConfig::builder()`] or [`SiteConfig::from_yaml_file`].
///
/// # Example
/// ```rust
/// use obsidian2html::SiteConfig;
///
/// let config = SiteConfig::builder()
///     .input("vault")
///     .output("site")
///     .concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SiteConfig {
    /// Root of the Obsidian vault to read.
    pub input: PathBuf,

    /// Root of the HTML tree to write. Created if missing.
    pub output: PathBuf,

    /// Files converted or copied at once. Default: 8.
    ///
    /// Conversion is CPU-bound and copying is I/O-bound; a handful in flight
    /// keeps both busy without opening hundreds of files at a time.
    pub concurrency: usize,

    /// Markdown rendering options shared by every note.
    pub render: RenderOptions,

    /// Optional per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for SiteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteConfig")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("concurrency", &self.concurrency)
            .field("render", &self.render)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

/// On-disk shape of the YAML configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    input: Option<String>,
    output: Option<String>,
    concurrency: Option<usize>,
    syntax_highlighting: Option<bool>,
    highlight_theme: Option<String>,
    hard_breaks: Option<bool>,
    toc_marker: Option<String>,
}

impl SiteConfig {
    /// Create a new builder for `SiteConfig`.
    pub fn builder() -> SiteConfigBuilder {
        SiteConfigBuilder {
            input: None,
            output: None,
            concurrency: DEFAULT_CONCURRENCY,
            render: RenderOptions::default(),
            progress_callback: None,
        }
    }

    /// Load a builder pre-filled from a YAML file.
    ///
    /// Returns a builder rather than a config so callers (the CLI) can still
    /// override individual fields before validation.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<SiteConfigBuilder, Obs2HtmlError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Obs2HtmlError::ConfigNotFound {
                path: path.to_path_buf(),
            },
            _ => Obs2HtmlError::ConfigParse {
                path: path.to_path_buf(),
                detail: e.to_string(),
            },
        })?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_yaml_str(&text, path)
    }

    /// Parse YAML text; `origin` is only used in error messages.
    pub fn from_yaml_str(text: &str, origin: &Path) -> Result<SiteConfigBuilder, Obs2HtmlError> {
        let parse_err = |detail: String| Obs2HtmlError::ConfigParse {
            path: origin.to_path_buf(),
            detail,
        };

        // An empty file deserialises to `null`; treat it as an empty mapping
        // so the error names the missing key instead.
        let file: ConfigFile = if text.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string()))?
        };

        let mut builder = Self::builder();
        if let Some(input) = file.input {
            builder = builder.input(expand_home(&input));
        }
        if let Some(output) = file.output {
            builder = builder.output(expand_home(&output));
        }
        if let Some(n) = file.concurrency {
            builder.concurrency = n;
        }
        if let Some(v) = file.syntax_highlighting {
            builder = builder.syntax_highlighting(v);
        }
        if let Some(theme) = file.highlight_theme {
            builder = builder.highlight_theme(theme);
        }
        if let Some(v) = file.hard_breaks {
            builder = builder.hard_breaks(v);
        }
        if let Some(marker) = file.toc_marker {
            builder = builder.toc_marker(marker);
        }
        Ok(builder)
    }
}

fn expand_home(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Builder for [`SiteConfig`].
pub struct SiteConfigBuilder {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    concurrency: usize,
    render: RenderOptions,
    progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for SiteConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteConfigBuilder")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("concurrency", &self.concurrency)
            .field("render", &self.render)
            .finish_non_exhaustive()
    }
}

impl SiteConfigBuilder {
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn syntax_highlighting(mut self, v: bool) -> Self {
        self.render.syntax_highlighting = v;
        self
    }

    pub fn highlight_theme(mut self, theme: impl Into<String>) -> Self {
        self.render.highlight_theme = theme.into();
        self
    }

    pub fn hard_breaks(mut self, v: bool) -> Self {
        self.render.hard_breaks = v;
        self
    }

    pub fn toc_marker(mut self, marker: impl Into<String>) -> Self {
        self.render.toc_marker = marker.into();
        self
    }

    pub fn render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SiteConfig, Obs2HtmlError> {
        let input = self
            .input
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| Obs2HtmlError::InvalidConfig("'input' directory is required".into()))?;
        let output = self
            .output
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| Obs2HtmlError::InvalidConfig("'output' directory is required".into()))?;

        if self.concurrency == 0 {
            return Err(Obs2HtmlError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        validate_render(&self.render)?;

        Ok(SiteConfig {
            input,
            output,
            concurrency: self.concurrency,
            render: self.render,
            progress_callback: self.progress_callback,
        })
    }

    /// Validate and return only the rendering options.
    ///
    /// For single-note conversion, where no input or output tree is needed.
    pub fn build_render_options(self) -> Result<RenderOptions, Obs2HtmlError> {
        validate_render(&self.render)?;
        Ok(self.render)
    }
}

fn validate_render(render: &RenderOptions) -> Result<(), Obs2HtmlError> {
    if render.syntax_highlighting && !is_bundled_theme(&render.highlight_theme) {
        return Err(Obs2HtmlError::InvalidConfig(format!(
            "Unknown highlight theme '{}'; available: {}",
            render.highlight_theme,
            BUNDLED_THEMES.join(", ")
        )));
    }
    if render.toc_marker.trim().is_empty() {
        return Err(Obs2HtmlError::InvalidConfig(
            "TOC marker must not be empty".into(),
        ));
    }
    Ok(())
}
