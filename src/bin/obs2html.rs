//! CLI binary for obsidian2html.
//!
//! A thin shim over the library crate that merges the YAML config with CLI
//! flags into a `SiteConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use obsidian2html::{
    convert_note, convert_tree, ConversionProgressCallback, FileKind, ProgressCallback,
    SiteConfig, SiteConfigBuilder, DEFAULT_CONFIG_FILE,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one live bar for the whole vault, plus a log
/// line for every file that fails. Successful files only advance the bar; a
/// vault has far too many of them to list.
struct CliProgressCallback {
    bar: ProgressBar,
    notes: AtomicUsize,
    assets: AtomicUsize,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose bar length is set by `on_batch_start`.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning vault…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            notes: AtomicUsize::new(0),
            assets: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>5}/{len} files  \
             ⏱ {elapsed_precise}  {wide_msg:.dim}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.activate_bar(total_files);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_files} files…"))
        ));
    }

    fn on_file_start(&self, path: &Path, _index: usize, _total: usize) {
        self.bar.set_message(path.display().to_string());
    }

    fn on_file_complete(&self, _path: &Path, kind: FileKind, _bytes_written: u64) {
        match kind {
            FileKind::Markdown => self.notes.fetch_add(1, Ordering::SeqCst),
            FileKind::Asset => self.assets.fetch_add(1, Ordering::SeqCst),
        };
        self.bar.inc(1);
    }

    fn on_file_error(&self, path: &Path, error: String) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(100) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error,
        };

        self.bar.println(format!(
            "  {} {}  {}",
            red("✗"),
            path.display(),
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = total_files.saturating_sub(success_count);
        self.bar.finish_and_clear();

        let breakdown = dim(&format!(
            "({} notes, {} assets)",
            self.notes.load(Ordering::SeqCst),
            self.assets.load(Ordering::SeqCst)
        ));
        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully {}",
                green("✔"),
                bold(&success_count.to_string()),
                breakdown
            );
        } else {
            eprintln!(
                "{} {}/{} files converted {}  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_files,
                breakdown,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert the vault described by ./obs-blog.yaml
  obs2html

  # No config file: name both directories
  obs2html -i ~/Documents/Vault -o site

  # Another config file, fewer workers
  obs2html --config blog.yaml -c 2

  # One note to stdout
  obs2html "Daily/2024-05-01.md" > page.html

  # Machine-readable report
  obs2html --json > report.json

CONFIG FILE (obs-blog.yaml):
  input: ~/Documents/Vault      # required unless --input is given
  output: site                  # required unless --output is given
  concurrency: 8
  syntax_highlighting: true
  highlight_theme: base16-ocean.dark
  hard_breaks: true
  toc_marker: "[TOC]"

THEMES:
  base16-ocean.dark (default), base16-eighties.dark, base16-mocha.dark,
  base16-ocean.light, InspiredGitHub, Solarized (dark), Solarized (light)

ENVIRONMENT VARIABLES:
  RUST_LOG               Log filter, overrides -v / -q (e.g. obsidian2html=debug)
  OBS2HTML_CONFIG        Config file path
  OBS2HTML_INPUT         Vault directory
  OBS2HTML_OUTPUT        Output directory
"#;

/// Convert an Obsidian vault to static HTML.
#[derive(Parser, Debug)]
#[command(
    name = "obs2html",
    version,
    about = "Convert an Obsidian vault to static HTML",
    long_about = "Convert an Obsidian vault into a tree of standalone HTML pages. Front-matter, \
wiki-links, tags and callouts are translated; every other file is copied alongside.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Convert this single note and print the HTML document to stdout.
    note: Option<PathBuf>,

    /// YAML config file. Default: ./obs-blog.yaml when present.
    #[arg(long, env = "OBS2HTML_CONFIG")]
    config: Option<PathBuf>,

    /// Vault directory (overrides `input` in the config file).
    #[arg(short, long, env = "OBS2HTML_INPUT")]
    input: Option<PathBuf>,

    /// Output directory (overrides `output` in the config file).
    #[arg(short, long, env = "OBS2HTML_OUTPUT")]
    output: Option<PathBuf>,

    /// Number of files converted at once.
    #[arg(short, long, env = "OBS2HTML_CONCURRENCY",
          value_parser = clap::value_parser!(u32).range(1..=256))]
    concurrency: Option<u32>,

    /// syntect theme for fenced code blocks.
    #[arg(long, env = "OBS2HTML_THEME")]
    theme: Option<String>,

    /// Leave fenced code blocks unhighlighted.
    #[arg(long, env = "OBS2HTML_NO_HIGHLIGHT")]
    no_highlight: bool,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "OBS2HTML_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "OBS2HTML_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OBS2HTML_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "OBS2HTML_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.note.is_none();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let builder = load_builder(&cli)?;

    // ── Single-note mode ─────────────────────────────────────────────────
    if let Some(ref note) = cli.note {
        let options = builder
            .build_render_options()
            .context("Invalid configuration")?;
        let html = convert_note(note, &options)
            .await
            .with_context(|| format!("Failed to convert {}", note.display()))?;

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(html.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure a trailing newline on stdout.
        if !html.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        return Ok(());
    }

    // ── Vault mode ───────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let mut builder = builder;
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().with_context(|| {
        format!(
            "Invalid configuration (pass --input and --output, or create {})",
            DEFAULT_CONFIG_FILE
        )
    })?;

    let report = convert_tree(&config).await.context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    }

    // Per-file failures are reported, never fatal.
    if !cli.quiet && !show_progress {
        for failure in report.failures() {
            if let Some(ref err) = failure.error {
                eprintln!("  {} {}", red("✗"), err);
            }
        }
    }

    if !cli.quiet {
        let stats = &report.stats;
        eprintln!(
            "{}  {} notes, {} assets, {} failed  {}ms  →  {}",
            if stats.failed == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.converted,
            stats.copied,
            stats.failed,
            stats.total_duration_ms,
            bold(&report.output.display().to_string()),
        );
    }

    Ok(())
}

/// Start from the config file, if any, then apply CLI overrides.
///
/// An explicit `--config` must exist; the default file is optional.
fn load_builder(cli: &Cli) -> Result<SiteConfigBuilder> {
    let mut builder = match cli.config {
        Some(ref path) => SiteConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            SiteConfig::from_yaml_file(DEFAULT_CONFIG_FILE)
                .with_context(|| format!("Failed to load config {}", DEFAULT_CONFIG_FILE))?
        }
        None => SiteConfig::builder(),
    };

    if let Some(ref input) = cli.input {
        builder = builder.input(input);
    }
    if let Some(ref output) = cli.output {
        builder = builder.output(output);
    }
    if let Some(n) = cli.concurrency {
        builder = builder.concurrency(n as usize);
    }
    if let Some(ref theme) = cli.theme {
        builder = builder.highlight_theme(theme.as_str());
    }
    if cli.no_highlight {
        builder = builder.syntax_highlighting(false);
    }

    Ok(builder)
}
