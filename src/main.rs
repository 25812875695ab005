//! # Kill Bull (killbull)
//!
//! A CLI tool that strips markdown structure from text: list markers, headers,
//! blockquotes, code fences, horizontal rules and indentation. Everything else
//! (including blank lines) is kept exactly as it was.
//!
//! ## Overview
//!
//! `killbull` takes text from the clipboard, stdin or files, strikes the
//! selected categories line by line and puts the result back where it came
//! from: the clipboard, stdout, or (with `--in-place`) the file. Which
//! categories are struck comes from the rc file, the `--kill`/`--spare`
//! flags, and finally an optional `--mode` alias that swaps in a complete
//! preset.
//!
//! ## Flow
//!
//! ```text
//! Source (clipboard | stdin | file)
//!   → rc file + flags → Mode Resolution
//!   → Line Transformation (whole text computed first)
//!   → Sink (clipboard | stdout | file) or diff / dry-run / JSON report
//!   → one-line summary on stderr
//! ```
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | General error (file not found, permission denied, I/O or clipboard error) |
//! | 2 | Invalid command-line arguments |
//! | 3 | Dry-run mode: changes would be made |
//! | 4 | Parse error (invalid UTF-8 or binary input) |
//! | 5 | No text found (empty or whitespace-only input) |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod mode;
mod report;
mod targets;
mod transform;

use anyhow::{Context, Result, anyhow};
use arboard::Clipboard;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};
use mode::{Mode, ModeInfo};
use report::Notification;
use rich_rust::terminal;
use rich_rust::{ColorSystem, Console};
use serde::{Deserialize, Serialize};
use similar::TextDiff;
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use targets::{Category, Targets};
use transform::{Tally, Transformed};

// ─────────────────────────────────────────────────────────────────────────────
// Exit Codes and Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Semantic exit codes for scripting
mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// General error (I/O, clipboard, config file)
    pub const ERROR: i32 = 1;
    /// Invalid command-line arguments
    pub const INVALID_ARGS: i32 = 2;
    /// Dry-run mode: the text would change
    pub const WOULD_CHANGE: i32 = 3;
    /// Binary, oversized or non-UTF-8 input
    pub const PARSE_ERROR: i32 = 4;
    /// Input was empty or whitespace-only
    pub const NO_TEXT: i32 = 5;
}

/// Declare a message-carrying error whose only job is to pick an exit code.
macro_rules! marker_error {
    ($name:ident) => {
        #[derive(Debug)]
        struct $name(String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::error::Error for $name {}
    };
}

marker_error!(ArgError);
marker_error!(ParseError);
marker_error!(NoTextError);

#[derive(Debug)]
struct RunOutcome {
    dry_run: bool,
    would_change: bool,
}

fn error_chain_has<T: std::error::Error + 'static>(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<T>())
}

fn exit_code_for_error(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| {
            if cause.is::<ArgError>() {
                Some(exit_codes::INVALID_ARGS)
            } else if cause.is::<ParseError>() {
                Some(exit_codes::PARSE_ERROR)
            } else if cause.is::<NoTextError>() {
                Some(exit_codes::NO_TEXT)
            } else {
                None
            }
        })
        .unwrap_or(exit_codes::ERROR)
}

// ─────────────────────────────────────────────────────────────────────────────
// CLI Arguments
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
enum ColorMode {
    /// Colour when the terminal supports it
    Auto,
    /// Always emit colour
    Always,
    /// Never emit colour
    Never,
}

const AFTER_HELP: &str = "\
MODES (any prefix, e.g. -m a, -m str, -m h):
  all, structure, lists, headers, quotes, code, rules, indentation

EXIT CODES:
  0  Success
  1  General error (file not found, permission denied, I/O or clipboard error)
  2  Invalid command-line arguments
  3  Dry-run mode: changes would be made
  4  Parse error (invalid UTF-8 or binary input)
  5  No text found
";

/// Kill Bull: strips bullets, headers, quotes, code fences and other markdown structure
#[derive(Parser, Debug)]
#[command(name = "killbull", version, about, long_about = None, after_help = AFTER_HELP)]
struct Args {
    /// Input file(s). Reads from stdin when none are given
    #[arg(value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Preset alias (all, structure, lists, headers, quotes, code, rules, indentation; any prefix)
    #[arg(short = 'm', long, value_name = "ALIAS")]
    mode: Option<String>,

    /// Categories to strike (comma-separated)
    #[arg(short = 'k', long, value_enum, value_delimiter = ',', value_name = "CATEGORIES")]
    kill: Vec<Category>,

    /// Categories to leave alone (comma-separated)
    #[arg(short = 's', long, value_enum, value_delimiter = ',', value_name = "CATEGORIES")]
    spare: Vec<Category>,

    /// Read from the system clipboard and write the result back to it
    #[arg(short = 'c', long, conflicts_with_all = ["inputs", "in_place"])]
    clipboard: bool,

    /// Rewrite the input file(s) in place
    #[arg(short = 'i', long)]
    in_place: bool,

    /// Copy each file aside before rewriting it
    #[arg(long, requires = "in_place")]
    backup: bool,

    /// Suffix appended to backup file names [default: .bak]
    #[arg(long, value_name = "EXT", requires = "backup")]
    backup_ext: Option<String>,

    /// Print a unified diff instead of the text
    #[arg(short = 'd', long)]
    diff: bool,

    /// Write nothing; exit 3 if the text would change
    #[arg(short = 'n', long, conflicts_with = "in_place")]
    dry_run: bool,

    /// Print a JSON report per input
    #[arg(long, conflicts_with_all = ["verbose", "diff"])]
    json: bool,

    /// Explain what was struck
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Do not print the summary line
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,

    /// Colour for verbose output [default: auto]
    #[arg(long, value_enum, value_name = "WHEN")]
    color: Option<ColorMode>,

    /// Use this rc file instead of searching for one
    #[arg(long = "config", value_name = "FILE", conflicts_with = "no_config")]
    config_file: Option<PathBuf>,

    /// Ignore rc files
    #[arg(long = "no-config")]
    no_config: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage the .killbullrc file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List mode presets and what they strike
    Modes,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a commented .killbullrc
    Init {
        /// Write to the home directory instead of the current one
        #[arg(long)]
        global: bool,
    },
    /// Print the effective configuration as TOML
    Show,
    /// Print the path of the rc file in effect
    Path,
}

fn validate_args(args: &Args) -> Result<()> {
    if let Some(category) = args.kill.iter().find(|c| args.spare.contains(*c)) {
        return Err(ArgError(format!("'{}' cannot be both killed and spared", category)).into());
    }

    if args.in_place && args.inputs.is_empty() {
        return Err(ArgError("--in-place requires at least one input file".to_string()).into());
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Names tried in every directory, most specific first
const RC_FILENAMES: &[&str] = &[".killbullrc", ".killbullrc.toml", "killbullrc.toml"];

/// Contents of a `.killbullrc`. Every key is optional and unknown keys are
/// ignored, so older files keep loading.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct RcFile {
    spare_bullets: Option<bool>,
    spare_numbers: Option<bool>,
    spare_letters: Option<bool>,
    kill_headers: Option<bool>,
    kill_quotes: Option<bool>,
    kill_code: Option<bool>,
    kill_rules: Option<bool>,
    kill_indentation: Option<bool>,
    mode: Option<String>,
    verbose: Option<bool>,
    quiet: Option<bool>,
    color: Option<ColorMode>,
    json: Option<bool>,
    backup: Option<bool>,
    backup_ext: Option<String>,
}

impl RcFile {
    fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn toggles(&self) -> [(Option<bool>, Category); Category::COUNT] {
        [
            (self.spare_bullets, Category::Bullets),
            (self.spare_numbers, Category::Numbers),
            (self.spare_letters, Category::Letters),
            (self.kill_headers, Category::Headers),
            (self.kill_quotes, Category::Quotes),
            (self.kill_code, Category::Code),
            (self.kill_rules, Category::Rules),
            (self.kill_indentation, Category::Indentation),
        ]
    }

    /// List keys say "spare", structural keys say "kill".
    fn apply_toggles(&self, targets: &mut Targets) {
        for (value, category) in self.toggles() {
            if let Some(value) = value {
                targets.set(category, value != category.is_list());
            }
        }
    }

    /// The rc file that would reproduce `config`.
    fn effective(config: &Config) -> Self {
        let t = &config.targets;
        Self {
            spare_bullets: Some(t.spare_bullets),
            spare_numbers: Some(t.spare_numbers),
            spare_letters: Some(t.spare_letters),
            kill_headers: Some(t.kill_headers),
            kill_quotes: Some(t.kill_quotes),
            kill_code: Some(t.kill_code),
            kill_rules: Some(t.kill_rules),
            kill_indentation: Some(t.kill_indentation),
            mode: config.mode.mode.map(|mode| mode.aliases()[0].to_string()),
            verbose: Some(config.verbose),
            quiet: Some(config.quiet),
            color: Some(config.color),
            json: Some(config.json),
            backup: Some(config.backup),
            backup_ext: Some(config.backup_ext.clone()),
        }
    }
}

/// First rc file found walking up from `start`, then in the home directory.
fn search_rc_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(Path::to_path_buf)
        .chain(dirs::home_dir())
        .flat_map(|dir| RC_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

fn locate_rc_file(args: &Args) -> Result<Option<PathBuf>> {
    if args.no_config {
        return Ok(None);
    }

    if let Some(path) = &args.config_file {
        if !path.is_file() {
            return Err(anyhow!("Config file not found: {}", path.display()));
        }
        return Ok(Some(path.clone()));
    }

    let cwd = std::env::current_dir().unwrap_or_default();
    let start = args
        .inputs
        .first()
        .and_then(|input| input.parent())
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()))
        .unwrap_or(cwd);

    Ok(search_rc_file(&start))
}

/// Everything a run needs, after the rc file and the command line are merged
#[derive(Debug)]
struct Config {
    targets: Targets,
    mode: ModeInfo,
    clipboard: bool,
    in_place: bool,
    diff: bool,
    dry_run: bool,
    json: bool,
    verbose: bool,
    quiet: bool,
    color: ColorMode,
    backup: bool,
    backup_ext: String,
}

impl Config {
    fn load(args: &Args) -> Result<Self> {
        let rc = locate_rc_file(args)?
            .map(|path| RcFile::read(&path))
            .transpose()?;
        Ok(Self::new(args, rc.as_ref()))
    }

    /// Flags given on the command line win over the rc file.
    fn new(args: &Args, rc: Option<&RcFile>) -> Self {
        let fallback = RcFile::default();
        let file = rc.unwrap_or(&fallback);
        let (targets, mode) = effective_targets(args, rc);

        Self {
            targets,
            mode,
            clipboard: args.clipboard,
            in_place: args.in_place,
            diff: args.diff,
            dry_run: args.dry_run,
            json: args.json || file.json.unwrap_or(false),
            verbose: args.verbose || file.verbose.unwrap_or(false),
            quiet: args.quiet || file.quiet.unwrap_or(false),
            color: args.color.or(file.color).unwrap_or(ColorMode::Auto),
            backup: args.backup || file.backup.unwrap_or(false),
            backup_ext: args
                .backup_ext
                .clone()
                .or_else(|| file.backup_ext.clone())
                .unwrap_or_else(|| ".bak".to_string()),
        }
    }
}

/// Layer the toggles: built-in defaults, rc file, `--kill`/`--spare`, then the
/// mode preset (command-line alias first, rc file alias otherwise).
fn effective_targets(args: &Args, rc: Option<&RcFile>) -> (Targets, ModeInfo) {
    let mut base = Targets::default();

    if let Some(rc) = rc {
        rc.apply_toggles(&mut base);
    }
    for &category in &args.kill {
        base.set(category, true);
    }
    for &category in &args.spare {
        base.set(category, false);
    }

    let alias = args
        .mode
        .as_deref()
        .or_else(|| rc.and_then(|rc| rc.mode.as_deref()))
        .unwrap_or("");

    mode::resolve(alias, base)
}

const DEFAULT_CONFIG: &str = r#"# .killbullrc - killbull configuration file

# List markers: true keeps them, false strips them
spare_bullets = false
spare_numbers = true
spare_letters = true

# Structural markup: true strips it
kill_headers = false
kill_quotes = false
kill_code = false
kill_rules = false
kill_indentation = false

# Default preset alias (all, structure, lists, headers, quotes, code, rules,
# indentation; any prefix). Overrides every toggle above when set.
# mode = "structure"

# verbose = false
# quiet = false
# color = "auto"
# json = false

# For --in-place
# backup = false
# backup_ext = ".bak"
"#;

fn run_config_command(args: &Args, action: &ConfigAction) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;

    match action {
        ConfigAction::Init { global } => {
            let dir = if *global {
                dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?
            } else {
                cwd
            };
            let path = dir.join(RC_FILENAMES[0]);

            // create_new refuses to clobber an existing file
            fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .and_then(|mut file| file.write_all(DEFAULT_CONFIG.as_bytes()))
                .with_context(|| format!("Failed to create config file: {}", path.display()))?;

            eprintln!("Created config file: {}", path.display());
        }
        ConfigAction::Show => {
            let config = Config::load(args)?;
            let rendered = toml::to_string(&RcFile::effective(&config))
                .context("Failed to render configuration")?;
            print!("{}", rendered);

            match locate_rc_file(args)? {
                Some(path) => eprintln!("# loaded from {}", path.display()),
                None => eprintln!("# no config file found, built-in defaults"),
            }
        }
        ConfigAction::Path => {
            let path = locate_rc_file(args)?.ok_or_else(|| anyhow!("No config file found"))?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

/// One row per preset: alias, reported name, struck categories
fn format_modes_table() -> String {
    Mode::PRIORITY
        .iter()
        .map(|mode| {
            let struck = mode
                .targets()
                .struck()
                .iter()
                .map(|category| category.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{:<12} {:<10} {}\n", mode.aliases()[0], mode.name(), struck)
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Console
// ─────────────────────────────────────────────────────────────────────────────

/// rich_rust markup, or plain text when colour is off
struct Styles {
    color: bool,
}

impl Styles {
    fn paint(&self, tag: &str, text: impl fmt::Display) -> String {
        if self.color {
            format!("[{}]{}[/]", tag, text)
        } else {
            text.to_string()
        }
    }
}

/// `NO_COLOR` beats `FORCE_COLOR`; both only matter for `--color auto`.
fn console_for(color: ColorMode) -> (Console, Styles) {
    let forced = match color {
        ColorMode::Never => return (Console::new(), Styles { color: false }),
        ColorMode::Auto if std::env::var_os("NO_COLOR").is_some() => {
            return (Console::new(), Styles { color: false });
        }
        ColorMode::Auto => std::env::var_os("FORCE_COLOR").is_some(),
        ColorMode::Always => true,
    };

    if forced {
        let console = Console::builder()
            .force_terminal(true)
            .color_system(terminal::detect_color_system().unwrap_or(ColorSystem::Standard))
            .build();
        (console, Styles { color: true })
    } else {
        let console = Console::new();
        let color = console.is_color_enabled();
        (console, Styles { color })
    }
}

/// `category count` pairs in first-seen order
fn format_tally(tally: &Tally) -> String {
    if tally.categories().is_empty() {
        return "none".to_string();
    }
    tally
        .categories()
        .iter()
        .map(|category| format!("{} {}", category, tally.count(*category)))
        .collect::<Vec<_>>()
        .join(", ")
}

// ─────────────────────────────────────────────────────────────────────────────
// Sources
// ─────────────────────────────────────────────────────────────────────────────

/// Reject anything bigger; the whole text is held in memory twice.
const MAX_INPUT_BYTES: u64 = 100 * 1024 * 1024;

/// Where text comes from, and by default where it goes back to
#[derive(Debug, Clone)]
enum Source {
    Clipboard,
    Stdin,
    File(PathBuf),
}

impl Source {
    fn label(&self) -> String {
        match self {
            Source::Clipboard => "clipboard".to_string(),
            Source::Stdin => "stdin".to_string(),
            Source::File(path) => path.display().to_string(),
        }
    }

    fn read(&self) -> Result<String> {
        match self {
            Source::Clipboard => Clipboard::new()
                .context("Failed to open clipboard")?
                .get_text()
                .context("Failed to read text from clipboard"),
            Source::Stdin => {
                let mut buf = Vec::new();
                io::stdin()
                    .read_to_end(&mut buf)
                    .context("Failed to read stdin")?;
                decode_text(buf, "stdin")
            }
            Source::File(path) => read_file(path),
        }
    }
}

fn sources(args: &Args) -> Vec<Source> {
    if args.clipboard {
        vec![Source::Clipboard]
    } else if args.inputs.is_empty() {
        vec![Source::Stdin]
    } else {
        args.inputs.iter().cloned().map(Source::File).collect()
    }
}

fn read_file(path: &Path) -> Result<String> {
    let size = fs::metadata(path)
        .with_context(|| format!("Failed to read {}", path.display()))?
        .len();
    if size > MAX_INPUT_BYTES {
        return Err(ParseError(format!(
            "{} is {} MB, over the {} MB limit",
            path.display(),
            size >> 20,
            MAX_INPUT_BYTES >> 20
        ))
        .into());
    }

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    decode_text(bytes, &path.display().to_string())
}

/// Text or a ParseError: NUL bytes mean binary, and UTF-8 must be valid.
fn decode_text(bytes: Vec<u8>, label: &str) -> Result<String> {
    if bytes.contains(&0) {
        return Err(ParseError(format!("Input appears to be binary: {}", label)).into());
    }

    String::from_utf8(bytes).map_err(|err| {
        let at = err.utf8_error().valid_up_to();
        ParseError(format!("Invalid UTF-8 at byte position {} in {}", at, label)).into()
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Striking and Sinks
// ─────────────────────────────────────────────────────────────────────────────

/// One input after the engine ran over it
struct Struck {
    source: Source,
    original: String,
    result: Transformed,
    elapsed: Duration,
}

impl Struck {
    fn new(source: Source, original: String, targets: &Targets) -> Self {
        let started = Instant::now();
        let result = transform::transform(&original, targets);
        Self {
            source,
            original,
            result,
            elapsed: started.elapsed(),
        }
    }

    fn changed(&self) -> bool {
        self.original != self.result.text
    }
}

/// Aggregate over every input of a run
#[derive(Default)]
struct Totals {
    inputs: usize,
    changed: usize,
    lines: usize,
    tally: Tally,
    elapsed: Duration,
}

impl Totals {
    fn add(&mut self, struck: &Struck) {
        self.inputs += 1;
        self.changed += usize::from(struck.changed());
        self.lines += struck.result.lines;
        self.tally.merge(&struck.result.tally);
        self.elapsed += struck.elapsed;
    }

    fn lines_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.lines as f64 / secs
        } else {
            self.lines as f64
        }
    }
}

#[derive(Serialize)]
struct Measure {
    lines: usize,
    bytes: usize,
}

#[derive(Serialize)]
struct JsonMode<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    status: &'static str,
    source: String,
    mode: JsonMode<'a>,
    targets: Vec<Category>,
    input: Measure,
    output: Measure,
    changed: bool,
    lines_struck: usize,
    categories: &'a [Category],
    notification: Notification,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

fn backup_path(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(ext);
    PathBuf::from(name)
}

fn render_diff(struck: &Struck, proposed: bool) -> String {
    if !struck.changed() {
        return String::new();
    }
    let label = struck.source.label();
    let new_header = if proposed {
        format!("b/{} (proposed)", label)
    } else {
        format!("b/{}", label)
    };

    TextDiff::from_lines(&struck.original, &struck.result.text)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{}", label), &new_header)
        .to_string()
}

/// Put the stripped text back: into the file (in-place), onto the clipboard,
/// or onto stdout, under a `==> name <==` banner when several inputs share it.
fn deliver(config: &Config, struck: &Struck, banner: bool) -> Result<()> {
    let text = &struck.result.text;

    match &struck.source {
        Source::File(path) if config.in_place => {
            if config.backup {
                let backup = backup_path(path, &config.backup_ext);
                fs::copy(path, &backup)
                    .with_context(|| format!("Failed to create backup at {}", backup.display()))?;
            }
            fs::write(path, text)
                .with_context(|| format!("Failed to write to file: {}", path.display()))
        }
        Source::Clipboard => Clipboard::new()
            .context("Failed to open clipboard")?
            .set_text(text.clone())
            .context("Failed to write text to clipboard"),
        _ => {
            let mut stdout = io::stdout().lock();
            if banner {
                writeln!(stdout, "==> {} <==", struck.source.label())?;
                write!(stdout, "{}", text)?;
                if !text.ends_with('\n') {
                    writeln!(stdout)?;
                }
                writeln!(stdout)?;
            } else {
                stdout.write_all(text.as_bytes())?;
            }
            stdout.flush()?;
            Ok(())
        }
    }
}

fn emit_json(config: &Config, struck: &Struck) -> Result<()> {
    let writes_back = config.in_place || matches!(struck.source, Source::Clipboard);
    let result = &struck.result;

    let report = JsonReport {
        version: "1.0",
        status: if config.dry_run { "dry_run" } else { "success" },
        source: struck.source.label(),
        mode: JsonMode {
            name: &config.mode.name,
            description: &config.mode.description,
        },
        targets: config.targets.struck(),
        input: Measure {
            lines: result.lines,
            bytes: struck.original.len(),
        },
        output: Measure {
            lines: result.lines,
            bytes: result.text.len(),
        },
        changed: struck.changed(),
        lines_struck: result.killed(),
        categories: result.categories(),
        notification: report::notification(&config.mode, &result.tally, config.clipboard),
        content: (!config.dry_run && !writes_back).then_some(result.text.as_str()),
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize JSON output")?
    );

    if writes_back && !config.dry_run {
        deliver(config, struck, false)?;
    }
    Ok(())
}

fn emit(config: &Config, struck: &Struck, banner: bool) -> Result<()> {
    if config.json {
        emit_json(config, struck)
    } else if config.diff {
        print!("{}", render_diff(struck, config.dry_run));
        Ok(())
    } else if config.dry_run {
        Ok(())
    } else {
        deliver(config, struck, banner)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reporting
// ─────────────────────────────────────────────────────────────────────────────

fn log_struck(console: &Console, styles: &Styles, struck: &Struck, dry_run: bool) {
    let verdict = match (struck.changed(), dry_run) {
        (true, true) => "would change",
        (true, false) => "changed",
        (false, _) => "unchanged",
    };
    console.print(&format!(
        "{} {} ({} lines; struck: {})",
        styles.paint("bold", struck.source.label()),
        verdict,
        struck.result.lines,
        styles.paint("yellow", format_tally(&struck.result.tally))
    ));
}

fn print_summary(console: &Console, styles: &Styles, totals: &Totals, failed: usize) {
    let rows = [
        (
            "Inputs",
            format!("{} read, {} changed", totals.inputs, totals.changed),
        ),
        (
            "Lines",
            format!("{} scanned, {} struck", totals.lines, totals.tally.killed()),
        ),
        ("Targets", format_tally(&totals.tally)),
        (
            "Time",
            format!(
                "{:.2}ms ({:.0} lines/sec)",
                totals.elapsed.as_secs_f64() * 1000.0,
                totals.lines_per_second()
            ),
        ),
    ];

    console.print("");
    console.print(&styles.paint("bold cyan", "Summary"));
    for (label, value) in rows {
        console.print(&format!(
            "  {} {}",
            styles.paint("bold blue", format!("{}:", label)),
            value
        ));
    }
    if failed > 0 {
        console.print(&format!("  {} {}", styles.paint("bold red", "Errors:"), failed));
    }
}

/// The one-line summary on stderr, unless silenced
fn announce(config: &Config, tally: &Tally) {
    if config.quiet || config.json {
        return;
    }
    let note = report::notification(&config.mode, tally, config.clipboard);
    if note.message.is_empty() {
        eprintln!("{}", note.title);
    } else {
        eprintln!("{}: {}", note.title, note.message);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry Point
// ─────────────────────────────────────────────────────────────────────────────

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_codes::SUCCESS,
                _ => exit_codes::INVALID_ARGS,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    let result = match &args.command {
        Some(Commands::Config { action }) => run_config_command(&args, action).map(|()| None),
        Some(Commands::Modes) => {
            print!("{}", format_modes_table());
            Ok(None)
        }
        None => run(&args).map(Some),
    };

    let code = match result {
        Ok(Some(RunOutcome {
            dry_run: true,
            would_change: true,
        })) => exit_codes::WOULD_CHANGE,
        Ok(_) => exit_codes::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            exit_code_for_error(&err)
        }
    };
    std::process::exit(code);
}

fn run(args: &Args) -> Result<RunOutcome> {
    validate_args(args)?;
    let config = Config::load(args)?;
    let (console, styles) = console_for(config.color);

    if config.verbose {
        let struck = config
            .targets
            .struck()
            .iter()
            .map(|category| category.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        console.print(&styles.paint(
            "dim",
            format!("Mode: {} ({})", config.mode.name, config.mode.description),
        ));
        console.print(&styles.paint(
            "dim",
            format!("Targets: {}", if struck.is_empty() { "none" } else { struck.as_str() }),
        ));
    }

    let sources = sources(args);
    let single = sources.len() == 1;
    let banner = !single && !config.in_place;
    let mut totals = Totals::default();
    let mut failures: Vec<(String, anyhow::Error)> = Vec::new();

    for source in sources {
        let label = source.label();
        let text = match source.read() {
            Ok(text) => text,
            Err(err) if single => return Err(err),
            Err(err) => {
                eprintln!("Error processing {}: {:#}", label, err);
                failures.push((label, err));
                continue;
            }
        };

        // Nothing is written anywhere for blank input
        if text.trim().is_empty() {
            if single {
                return Err(NoTextError(format!("No text found in {}", label)).into());
            }
            if !config.quiet {
                eprintln!("Skipping {}: no text found", label);
            }
            continue;
        }

        let struck = Struck::new(source, text, &config.targets);
        if config.verbose {
            log_struck(&console, &styles, &struck, config.dry_run);
        }
        emit(&config, &struck, banner)?;
        totals.add(&struck);
    }

    if config.verbose {
        print_summary(&console, &styles, &totals, failures.len());
    }
    announce(&config, &totals.tally);

    if !failures.is_empty() {
        let names = failures
            .iter()
            .map(|(label, _)| label.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let message = format!("{} input(s) failed: {}", failures.len(), names);
        if failures.iter().any(|(_, err)| error_chain_has::<ParseError>(err)) {
            return Err(ParseError(message).into());
        }
        return Err(anyhow!(message));
    }

    Ok(RunOutcome {
        dry_run: config.dry_run,
        would_change: totals.changed > 0,
    })
}
