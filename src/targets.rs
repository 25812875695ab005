//! Categories of structural markup and the toggles that decide which of them
//! get struck.

use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// A named class of markup the engine can detect and remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Unordered list markers (`-`, `*`, `+`, `•`, ...)
    Bullets,
    /// Numbered list markers (`1.`, `2)`, `(3)`)
    Numbers,
    /// Lettered list markers (`a.`, `B)`, `(c)`)
    Letters,
    /// ATX headers (`#` through `######`)
    Headers,
    /// Blockquote markers (`>` through `>>>`)
    Quotes,
    /// Code fences and inline-code lines
    Code,
    /// Horizontal rules (`---`, `***`)
    Rules,
    /// Leading whitespace
    Indentation,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 8;

    /// Every category, in report order.
    pub const ALL: [Category; Category::COUNT] = [
        Category::Bullets,
        Category::Numbers,
        Category::Letters,
        Category::Headers,
        Category::Quotes,
        Category::Code,
        Category::Rules,
        Category::Indentation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bullets => "bullets",
            Self::Numbers => "numbers",
            Self::Letters => "letters",
            Self::Headers => "headers",
            Self::Quotes => "quotes",
            Self::Code => "code",
            Self::Rules => "rules",
            Self::Indentation => "indentation",
        }
    }

    /// Position of this category in [`Category::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// List categories are configured through `spare_*` keys, the rest
    /// through `kill_*` keys.
    pub fn is_list(self) -> bool {
        matches!(self, Self::Bullets | Self::Numbers | Self::Letters)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The eight independent toggles controlling a run.
///
/// List categories are expressed as "spare" toggles and structural categories
/// as "kill" toggles, mirroring how the rc file names them. Any combination is
/// valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Targets {
    pub spare_bullets: bool,
    pub spare_numbers: bool,
    pub spare_letters: bool,
    pub kill_headers: bool,
    pub kill_quotes: bool,
    pub kill_code: bool,
    pub kill_rules: bool,
    pub kill_indentation: bool,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            spare_bullets: false,
            spare_numbers: true,
            spare_letters: true,
            kill_headers: false,
            kill_quotes: false,
            kill_code: false,
            kill_rules: false,
            kill_indentation: false,
        }
    }
}

impl Targets {
    /// Whether lines of `category` are rewritten.
    pub fn strikes(&self, category: Category) -> bool {
        match category {
            Category::Bullets => !self.spare_bullets,
            Category::Numbers => !self.spare_numbers,
            Category::Letters => !self.spare_letters,
            Category::Headers => self.kill_headers,
            Category::Quotes => self.kill_quotes,
            Category::Code => self.kill_code,
            Category::Rules => self.kill_rules,
            Category::Indentation => self.kill_indentation,
        }
    }

    /// Turn striking of `category` on or off.
    pub fn set(&mut self, category: Category, strike: bool) {
        match category {
            Category::Bullets => self.spare_bullets = !strike,
            Category::Numbers => self.spare_numbers = !strike,
            Category::Letters => self.spare_letters = !strike,
            Category::Headers => self.kill_headers = strike,
            Category::Quotes => self.kill_quotes = strike,
            Category::Code => self.kill_code = strike,
            Category::Rules => self.kill_rules = strike,
            Category::Indentation => self.kill_indentation = strike,
        }
    }

    /// Categories currently struck, in report order.
    pub fn struck(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|category| self.strikes(*category))
            .collect()
    }

    /// Toggles with every category struck.
    pub fn everything() -> Self {
        Self::only(&Category::ALL)
    }

    /// Toggles striking exactly `categories` and sparing the rest.
    pub fn only(categories: &[Category]) -> Self {
        let mut targets = Self::default();
        for category in Category::ALL {
            targets.set(category, categories.contains(&category));
        }
        targets
    }
}
