//! Mode aliases: a short free-form argument that swaps the configured toggles
//! for a named preset.
//!
//! Matching is prefix based. An alias selects a preset when it is a non-empty
//! prefix of one of the preset's candidate words, so `h`, `head` and `headers`
//! all select [`Mode::Headers`]. Presets are tried in [`Mode::PRIORITY`]
//! order and the first match wins.

use crate::targets::{Category, Targets};

/// A built-in preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Strike every category
    All,
    /// Strike structural markup, spare list markers
    Structure,
    /// Strike list markers only
    Lists,
    /// Silent: headers only
    Headers,
    /// Silent: blockquotes only
    Quotes,
    /// Silent: code fences and inline code only
    Code,
    /// Silent: horizontal rules only
    Rules,
    /// Silent: leading whitespace only
    Indentation,
}

/// Noun and verb used when a silent preset reports its kills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SilentStrike {
    pub singular: &'static str,
    pub plural: &'static str,
    pub verb: &'static str,
}

impl Mode {
    /// Match order when resolving an alias.
    pub const PRIORITY: [Mode; 8] = [
        Mode::All,
        Mode::Structure,
        Mode::Lists,
        Mode::Headers,
        Mode::Quotes,
        Mode::Code,
        Mode::Rules,
        Mode::Indentation,
    ];

    /// Words an alias may abbreviate.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::All => &["all"],
            Self::Structure => &["structure"],
            Self::Lists => &["lists"],
            Self::Headers => &["headers"],
            Self::Quotes => &["quotes"],
            Self::Code => &["code"],
            Self::Rules => &["rules"],
            Self::Indentation => &["indentation"],
        }
    }

    /// Complete toggle set for this preset.
    pub fn targets(self) -> Targets {
        const LISTS: [Category; 3] = [Category::Bullets, Category::Numbers, Category::Letters];
        match self {
            Self::All => Targets::everything(),
            Self::Structure => Targets::only(&[
                Category::Headers,
                Category::Quotes,
                Category::Code,
                Category::Rules,
                Category::Indentation,
            ]),
            Self::Lists => Targets::only(&LISTS),
            Self::Headers => Targets::only(&[Category::Headers]),
            Self::Quotes => Targets::only(&[Category::Quotes]),
            Self::Code => Targets::only(&[Category::Code]),
            Self::Rules => Targets::only(&[Category::Rules]),
            Self::Indentation => Targets::only(&[Category::Indentation]),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Structure => "Structure",
            Self::Lists => "Lists",
            _ => "Silent",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::All => "items destroyed",
            Self::Structure => "structural elements destroyed",
            Self::Lists => "list elements eliminated",
            Self::Headers => "header",
            Self::Quotes => "blockquote",
            Self::Code => "code block",
            Self::Rules => "ruler",
            Self::Indentation => "indentation",
        }
    }

    /// Reporting vocabulary for single-target presets, `None` for aggregates.
    pub fn silent_strike(self) -> Option<SilentStrike> {
        let (singular, plural, verb) = match self {
            Self::All | Self::Structure | Self::Lists => return None,
            Self::Headers => ("header", "headers", "slashed"),
            Self::Quotes => ("blockquote", "blockquotes", "eliminated"),
            Self::Code => ("code block", "code blocks", "obliterated"),
            Self::Rules => ("ruler", "rulers", "chopped"),
            Self::Indentation => ("indentation", "indentations", "destroyed"),
        };
        Some(SilentStrike {
            singular,
            plural,
            verb,
        })
    }

    fn matches(self, alias: &str) -> bool {
        !alias.is_empty()
            && self
                .aliases()
                .iter()
                .any(|candidate| candidate.starts_with(alias))
    }
}

/// What a resolved alias means, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeInfo {
    /// Selected preset, `None` when the configured toggles are used as-is
    pub mode: Option<Mode>,
    pub name: String,
    pub description: String,
}

impl ModeInfo {
    fn custom(description: String) -> Self {
        Self {
            mode: None,
            name: "Custom".to_string(),
            description,
        }
    }

    fn preset(mode: Mode) -> Self {
        Self {
            mode: Some(mode),
            name: mode.name().to_string(),
            description: mode.description().to_string(),
        }
    }
}

/// Resolve `alias` against `base`.
///
/// Blank aliases and unrecognised aliases both return `base` untouched; the
/// latter is surfaced only through the returned description.
pub fn resolve(alias: &str, base: Targets) -> (Targets, ModeInfo) {
    let input = alias.trim().to_lowercase();
    if input.is_empty() {
        return (base, ModeInfo::custom("Using preferences".to_string()));
    }

    match Mode::PRIORITY.into_iter().find(|mode| mode.matches(&input)) {
        Some(mode) => (mode.targets(), ModeInfo::preset(mode)),
        None => (base, ModeInfo::custom(format!("Unknown mode: {}", alias))),
    }
}
