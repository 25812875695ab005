//! Line classification and rewriting.
//!
//! The buffer is split on `\n` after line endings are normalised, and each
//! line is run through the rules below in order. The first rule that fires
//! rewrites the line; a line no rule touches is passed through verbatim, so the
//! output always has exactly as many lines as the input.
//!
//! ```text
//! fence marker / inline code / fenced body   (code)
//! bullet → number → letter                   (list markers)
//! header → quote → rule                      (structural markers)
//! leading whitespace                         (indentation)
//! ```
//!
//! Fenced-block membership is the only state carried between lines.

use crate::targets::{Category, Targets};
use once_cell::sync::Lazy;
use regex::Regex;

// ─────────────────────────────────────────────────────────────────────────────
// Patterns
// ─────────────────────────────────────────────────────────────────────────────

const FENCE: &str = "```";

static INLINE_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*`(\S.*)$").unwrap());
static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)[•\-*+‣◦▪▫⁃]\s+(.*)$").unwrap());
static NUMBER_DOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[0-9]+[.)]\s").unwrap());
static NUMBER_PAREN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\([0-9]+\)\s").unwrap());
static LETTER_DOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[a-zA-Z][.)]\s").unwrap());
static LETTER_PAREN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\([a-zA-Z]\)\s").unwrap());
static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#{1,6}\s").unwrap());
static QUOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*>{1,3}\s").unwrap());
static RULE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*]+\s*$").unwrap());

/// How a matched marker is removed.
#[derive(Debug, Clone, Copy)]
enum Rewrite {
    /// Keep the captured content, tab-prefixed when the marker was nested
    Bullet,
    /// Drop the marker and trim, tab-prefixed when the marker was nested
    ListMarker,
    /// Drop the marker and any whitespace after it
    Structural,
}

struct MarkerRule {
    category: Category,
    pattern: &'static Lazy<Regex>,
    rewrite: Rewrite,
}

/// Marker rules in precedence order. Disabled categories are skipped, so a
/// line can fall through to a later rule.
static MARKER_RULES: [MarkerRule; 8] = [
    MarkerRule {
        category: Category::Bullets,
        pattern: &BULLET_RE,
        rewrite: Rewrite::Bullet,
    },
    MarkerRule {
        category: Category::Numbers,
        pattern: &NUMBER_DOT_RE,
        rewrite: Rewrite::ListMarker,
    },
    MarkerRule {
        category: Category::Numbers,
        pattern: &NUMBER_PAREN_RE,
        rewrite: Rewrite::ListMarker,
    },
    MarkerRule {
        category: Category::Letters,
        pattern: &LETTER_DOT_RE,
        rewrite: Rewrite::ListMarker,
    },
    MarkerRule {
        category: Category::Letters,
        pattern: &LETTER_PAREN_RE,
        rewrite: Rewrite::ListMarker,
    },
    MarkerRule {
        category: Category::Headers,
        pattern: &HEADER_RE,
        rewrite: Rewrite::Structural,
    },
    MarkerRule {
        category: Category::Quotes,
        pattern: &QUOTE_RE,
        rewrite: Rewrite::Structural,
    },
    MarkerRule {
        category: Category::Rules,
        pattern: &RULE_RE,
        rewrite: Rewrite::Structural,
    },
];

impl MarkerRule {
    fn apply(&self, line: &str, targets: &Targets) -> Option<String> {
        match self.rewrite {
            Rewrite::Bullet => {
                let caps = self.pattern.captures(line)?;
                let nested = caps.get(1).is_some_and(|indent| !indent.as_str().is_empty());
                let content = caps.get(2).map_or("", |m| m.as_str());
                Some(format!("{}{}", nesting_prefix(nested, targets), content))
            }
            Rewrite::ListMarker => {
                if !self.pattern.is_match(line) {
                    return None;
                }
                let nested = line.starts_with(char::is_whitespace);
                let rest = self.pattern.replace(line, "");
                Some(format!("{}{}", nesting_prefix(nested, targets), rest.trim()))
            }
            Rewrite::Structural => {
                if !self.pattern.is_match(line) {
                    return None;
                }
                Some(self.pattern.replace(line, "").trim_start().to_string())
            }
        }
    }
}

/// A single tab marks former nesting unless indentation is being killed.
fn nesting_prefix(nested: bool, targets: &Targets) -> &'static str {
    if nested && !targets.kill_indentation {
        "\t"
    } else {
        ""
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fenced Code Blocks
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of feeding one line to the fence tracker.
#[derive(Debug, PartialEq, Eq)]
enum Fence {
    /// A fence line; holds the text left after the marker is removed
    Marker(String),
    /// Strictly between an opening and a closing fence
    Body,
    Outside,
}

/// Single forward pass over the buffer, tracking whether the current line sits
/// inside a fenced block.
///
/// An opening marker only opens a block when a closing fence (a line that is
/// exactly ```` ``` ```` once trimmed) exists somewhere after it. Unclosed
/// markers are still stripped.
struct FenceTracker {
    inside: bool,
    last_closing: Option<usize>,
}

impl FenceTracker {
    fn new(lines: &[&str]) -> Self {
        Self {
            inside: false,
            last_closing: lines.iter().rposition(|line| is_closing_fence(line)),
        }
    }

    fn step(&mut self, index: usize, line: &str) -> Fence {
        if self.inside {
            if is_closing_fence(line) {
                self.inside = false;
                return Fence::Marker(strip_fence(line).unwrap_or_default());
            }
            return Fence::Body;
        }

        match strip_fence(line) {
            Some(rest) => {
                self.inside = self.last_closing.is_some_and(|closing| closing > index);
                Fence::Marker(rest)
            }
            None => Fence::Outside,
        }
    }
}

fn is_closing_fence(line: &str) -> bool {
    line.trim() == FENCE
}

fn strip_fence(line: &str) -> Option<String> {
    line.trim_start().strip_prefix(FENCE).map(str::to_string)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tally
// ─────────────────────────────────────────────────────────────────────────────

/// Per-category strike counts that remember the order in which categories
/// were first hit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    counts: [usize; Category::COUNT],
    order: Vec<Category>,
}

impl Tally {
    fn record(&mut self, category: Category) {
        let slot = &mut self.counts[category.index()];
        if *slot == 0 {
            self.order.push(category);
        }
        *slot += 1;
    }

    /// Total lines struck.
    pub fn killed(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Distinct categories struck, in first-seen order.
    pub fn categories(&self) -> &[Category] {
        &self.order
    }

    pub fn count(&self, category: Category) -> usize {
        self.counts[category.index()]
    }

    /// Fold another run into this one, keeping first-seen order.
    pub fn merge(&mut self, other: &Tally) {
        for &category in other.categories() {
            if self.counts[category.index()] == 0 {
                self.order.push(category);
            }
            self.counts[category.index()] += other.count(category);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transformation
// ─────────────────────────────────────────────────────────────────────────────

/// Rewritten buffer plus what was struck.
#[derive(Debug, Clone)]
pub struct Transformed {
    /// Rewritten text, lines joined with `\n`
    pub text: String,
    /// Number of lines in the normalised input (and therefore the output)
    pub lines: usize,
    pub tally: Tally,
}

impl Transformed {
    pub fn killed(&self) -> usize {
        self.tally.killed()
    }

    pub fn categories(&self) -> &[Category] {
        self.tally.categories()
    }
}

/// Convert `\r\n` and lone `\r` to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Strip the categories `targets` selects from every line of `text`.
///
/// Never fails: a line no enabled rule matches is passed through.
pub fn transform(text: &str, targets: &Targets) -> Transformed {
    let normalized = normalize_line_endings(text);
    let lines: Vec<&str> = normalized.split('\n').collect();

    let mut fences = targets.kill_code.then(|| FenceTracker::new(&lines));
    let mut tally = Tally::default();
    let mut output = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        match strike_line(index, line, targets, fences.as_mut()) {
            Some((category, rewritten)) => {
                tally.record(category);
                output.push(rewritten);
            }
            None => output.push((*line).to_string()),
        }
    }

    Transformed {
        text: output.join("\n"),
        lines: lines.len(),
        tally,
    }
}

/// Apply the first matching rule to one line. `None` means pass through.
fn strike_line(
    index: usize,
    line: &str,
    targets: &Targets,
    fences: Option<&mut FenceTracker>,
) -> Option<(Category, String)> {
    if let Some(fences) = fences {
        match fences.step(index, line) {
            Fence::Marker(rest) => return Some((Category::Code, rest)),
            Fence::Body => return None,
            Fence::Outside => {
                if let Some(caps) = INLINE_CODE_RE.captures(line) {
                    return Some((Category::Code, caps[1].to_string()));
                }
            }
        }
    }

    for rule in MARKER_RULES.iter() {
        if !targets.strikes(rule.category) {
            continue;
        }
        if let Some(rewritten) = rule.apply(line, targets) {
            return Some((rule.category, rewritten));
        }
    }

    if targets.kill_indentation && line.starts_with(char::is_whitespace) {
        return Some((Category::Indentation, line.trim_start().to_string()));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strike(text: &str, categories: &[Category]) -> Transformed {
        transform(text, &Targets::only(categories))
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    #[test]
    fn test_bullets_stripped() {
        let result = strike("- item one\n- item two", &[Category::Bullets]);
        assert_eq!(result.text, "item one\nitem two");
        assert_eq!(result.killed(), 2);
        assert_eq!(result.categories(), &[Category::Bullets]);
    }

    #[test]
    fn test_headers_stripped() {
        let result = strike("# Title\nBody text", &[Category::Headers]);
        assert_eq!(result.text, "Title\nBody text");
        assert_eq!(result.killed(), 1);
        assert_eq!(result.categories(), &[Category::Headers]);
    }

    #[test]
    fn test_nested_bullet_keeps_tab() {
        let result = strike("   - nested", &[Category::Bullets]);
        assert_eq!(result.text, "\tnested");
        assert_eq!(result.killed(), 1);
    }

    #[test]
    fn test_nothing_enabled_passes_through() {
        let input = "plain paragraph\n\nanother line";
        let result = strike(input, &[]);
        assert_eq!(result.text, input);
        assert_eq!(result.killed(), 0);
        assert!(result.categories().is_empty());
    }

    // =========================================================================
    // List markers
    // =========================================================================

    #[test]
    fn test_every_bullet_character() {
        for bullet in ['•', '-', '*', '+', '‣', '◦', '▪', '▫', '⁃'] {
            let result = strike(&format!("{bullet} entry"), &[Category::Bullets]);
            assert_eq!(result.text, "entry", "bullet {bullet:?}");
        }
    }

    #[test]
    fn test_bullet_requires_whitespace_after_marker() {
        let result = strike("-dash\n*emphasis*", &[Category::Bullets]);
        assert_eq!(result.text, "-dash\n*emphasis*");
        assert_eq!(result.killed(), 0);
    }

    #[test]
    fn test_nested_bullet_without_tab_when_killing_indentation() {
        let result = strike("\t\t- deep", &[Category::Bullets, Category::Indentation]);
        assert_eq!(result.text, "deep");
        assert_eq!(result.categories(), &[Category::Bullets]);
    }

    #[test]
    fn test_numbers_stripped_and_trimmed() {
        let input = "1. first\n2) second  \n(3) third\n  10. nested";
        let result = strike(input, &[Category::Numbers]);
        assert_eq!(result.text, "first\nsecond\nthird\n\tnested");
        assert_eq!(result.killed(), 4);
        assert_eq!(result.categories(), &[Category::Numbers]);
    }

    #[test]
    fn test_letters_stripped() {
        let input = "a. alpha\nB) bravo\n(c) charlie\n    (D) delta";
        let result = strike(input, &[Category::Letters]);
        assert_eq!(result.text, "alpha\nbravo\ncharlie\n\tdelta");
        assert_eq!(result.killed(), 4);
    }

    #[test]
    fn test_letter_marker_needs_single_letter() {
        let result = strike("ab. not a marker\nA.not either", &[Category::Letters]);
        assert_eq!(result.killed(), 0);
    }

    #[test]
    fn test_spared_numbers_untouched() {
        let result = strike("1. keep\n- drop", &[Category::Bullets]);
        assert_eq!(result.text, "1. keep\ndrop");
    }

    #[test]
    fn test_non_ascii_digits_are_not_numbers() {
        let result = strike("١. arabic-indic", &[Category::Numbers]);
        assert_eq!(result.killed(), 0);
    }

    // =========================================================================
    // Structural markers
    // =========================================================================

    #[test]
    fn test_header_levels() {
        let input = "# one\n###### six\n####### seven\n#hashtag";
        let result = strike(input, &[Category::Headers]);
        assert_eq!(result.text, "one\nsix\n####### seven\n#hashtag");
        assert_eq!(result.killed(), 2);
    }

    #[test]
    fn test_quotes_stripped() {
        let input = "> quoted\n>> twice\n  >>>   thrice\n>>>> four";
        let result = strike(input, &[Category::Quotes]);
        assert_eq!(result.text, "quoted\ntwice\nthrice\n>>>> four");
        assert_eq!(result.killed(), 3);
    }

    #[test]
    fn test_rules_become_empty_lines() {
        let input = "above\n---\n***\n  -*-  \nbelow";
        let result = strike(input, &[Category::Rules]);
        assert_eq!(result.text, "above\n\n\n\nbelow");
        assert_eq!(result.killed(), 3);
        assert_eq!(result.text.split('\n').count(), 5);
    }

    #[test]
    fn test_spared_marker_falls_through_to_indentation() {
        let result = strike("   - item\n  # title", &[Category::Indentation]);
        assert_eq!(result.text, "- item\n# title");
        assert_eq!(result.categories(), &[Category::Indentation]);
    }

    #[test]
    fn test_bullet_wins_over_rule() {
        let result = strike("- - -", &[Category::Bullets, Category::Rules]);
        assert_eq!(result.text, "- -");
        assert_eq!(result.categories(), &[Category::Bullets]);
    }

    // =========================================================================
    // Indentation
    // =========================================================================

    #[test]
    fn test_indentation_stripped() {
        let input = "    code-ish\n\tTabbed\nflush";
        let result = strike(input, &[Category::Indentation]);
        assert_eq!(result.text, "code-ish\nTabbed\nflush");
        assert_eq!(result.killed(), 2);
        assert_eq!(result.categories(), &[Category::Indentation]);
    }

    #[test]
    fn test_indentation_empties_whitespace_only_line() {
        let result = strike("a\n   \nb", &[Category::Indentation]);
        assert_eq!(result.text, "a\n\nb");
        assert_eq!(result.killed(), 1);
    }

    #[test]
    fn test_structural_match_not_double_counted_as_indentation() {
        let result = strike("   # Header", &[Category::Headers, Category::Indentation]);
        assert_eq!(result.text, "Header");
        assert_eq!(result.killed(), 1);
        assert_eq!(result.categories(), &[Category::Headers]);
    }

    // =========================================================================
    // Code
    // =========================================================================

    #[test]
    fn test_fence_pair_keeps_body() {
        let input = "intro\n```rust\n- not a bullet\n    # not a header\n`tick\n```\noutro";
        let result = transform(input, &Targets::everything());
        assert_eq!(
            result.text,
            "intro\nrust\n- not a bullet\n    # not a header\n`tick\n\noutro"
        );
        assert_eq!(result.tally.count(Category::Code), 2);
    }

    #[test]
    fn test_unclosed_fence_strips_marker_only() {
        let result = strike("```\n- item", &[Category::Code, Category::Bullets]);
        assert_eq!(result.text, "\nitem");
        assert_eq!(result.categories(), &[Category::Code, Category::Bullets]);
    }

    #[test]
    fn test_multiple_fence_pairs_tracked() {
        let input = "```\na\n```\n- between\n```\nb\n```";
        let result = strike(input, &[Category::Code, Category::Bullets]);
        assert_eq!(result.text, "\na\n\nbetween\n\nb\n");
        assert_eq!(result.tally.count(Category::Code), 4);
        assert_eq!(result.tally.count(Category::Bullets), 1);
    }

    #[test]
    fn test_fence_with_language_tag_inside_block_is_body() {
        let input = "```\n```js\n```";
        let result = strike(input, &[Category::Code]);
        assert_eq!(result.text, "\n```js\n");
    }

    #[test]
    fn test_inline_code_inside_fence_is_body() {
        let result = strike("```\n`x\n  `y`\n```", &[Category::Code]);
        assert_eq!(result.text, "\n`x\n  `y`\n");
        assert_eq!(result.killed(), 2);
    }

    #[test]
    fn test_indented_fence() {
        let result = strike("  ```\n  body\n  ```", &[Category::Code]);
        assert_eq!(result.text, "\n  body\n");
        assert_eq!(result.killed(), 2);
    }

    #[test]
    fn test_inline_code_line() {
        let input = "`cargo build`\n` spaced\n  `indented";
        let result = strike(input, &[Category::Code]);
        assert_eq!(result.text, "cargo build`\n` spaced\nindented");
        assert_eq!(result.killed(), 2);
    }

    #[test]
    fn test_fences_ignored_without_code_kill() {
        let input = "```\n- item\n```";
        let result = strike(input, &[Category::Bullets]);
        assert_eq!(result.text, "```\nitem\n```");
    }

    // =========================================================================
    // Buffer properties
    // =========================================================================

    #[test]
    fn test_line_endings_normalized() {
        let result = strike("- a\r\n- b\r- c", &[Category::Bullets]);
        assert_eq!(result.text, "a\nb\nc");
        assert_eq!(result.lines, 3);
    }

    #[test]
    fn test_line_count_preserved() {
        let input = "# h\n\n- a\n\n\n> q\n---\n```\nx\n```\n   indented\n";
        let result = transform(input, &Targets::everything());
        assert_eq!(result.text.split('\n').count(), input.split('\n').count());
        assert_eq!(result.lines, input.split('\n').count());
    }

    #[test]
    fn test_blank_lines_preserved() {
        let input = "- a\n\n\n- b\n";
        let result = transform(input, &Targets::everything());
        assert_eq!(result.text, "a\n\n\nb\n");
    }

    #[test]
    fn test_unmatched_text_idempotent() {
        let input = "Just prose.\r\nWith two lines.";
        let targets = Targets::everything();
        let once = transform(input, &targets);
        let twice = transform(&once.text, &targets);
        assert_eq!(once.text, "Just prose.\nWith two lines.");
        assert_eq!(twice.text, once.text);
        assert_eq!(once.killed(), 0);
    }

    #[test]
    fn test_category_independence() {
        let input = "# head\n> quote\n- bullet\nplain";
        let with_quotes = strike(input, &[Category::Headers, Category::Quotes]);
        let without_quotes = strike(input, &[Category::Headers]);
        let changed: Vec<_> = with_quotes
            .text
            .split('\n')
            .zip(without_quotes.text.split('\n'))
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(changed, vec![1]);
    }

    #[test]
    fn test_categories_in_first_seen_order() {
        let input = "> q\n# h\n- b\n> q2";
        let result = transform(input, &Targets::everything());
        assert_eq!(
            result.categories(),
            &[Category::Quotes, Category::Headers, Category::Bullets]
        );
        assert_eq!(result.tally.count(Category::Quotes), 2);
        assert_eq!(result.killed(), 4);
    }

    // =========================================================================
    // Tally
    // =========================================================================

    #[test]
    fn test_tally_merge_keeps_order_and_sums() {
        let mut first = strike("# h\n- b", &[Category::Headers, Category::Bullets]);
        let second = strike("> q\n# h2", &[Category::Headers, Category::Quotes]);
        first.tally.merge(&second.tally);
        assert_eq!(
            first.tally.categories(),
            &[Category::Headers, Category::Bullets, Category::Quotes]
        );
        assert_eq!(first.tally.count(Category::Headers), 2);
        assert_eq!(first.tally.killed(), 4);
    }
}
