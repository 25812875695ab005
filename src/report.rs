//! One-line run summary shown after a strike.

use crate::mode::{ModeInfo, SilentStrike};
use crate::transform::Tally;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

/// Build the summary for a finished run.
///
/// Preset modes report against their own description; silent presets use
/// their pluralised noun and verb. Without a preset the message is the
/// generic "targets eliminated" form.
pub fn notification(info: &ModeInfo, tally: &Tally, from_clipboard: bool) -> Notification {
    let killed = tally.killed();
    let categories = tally
        .categories()
        .iter()
        .map(|category| category.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    if let Some(mode) = info.mode {
        let title = match mode.silent_strike() {
            Some(strike) => silent_strike_title(killed, strike),
            None => format!("{} {}", killed, info.description),
        };
        let message = if categories.is_empty() {
            "No matches found".to_string()
        } else {
            categories
        };
        return Notification { title, message };
    }

    if killed > 0 {
        Notification {
            title: format!("{} targets eliminated", killed),
            message: categories,
        }
    } else {
        let title = if from_clipboard {
            "Clipboard scanned, no targets"
        } else {
            "No targets found"
        };
        Notification {
            title: title.to_string(),
            message: String::new(),
        }
    }
}

fn silent_strike_title(count: usize, strike: SilentStrike) -> String {
    if count == 0 {
        return "Silent Strike: No targets found".to_string();
    }
    let noun = if count == 1 {
        strike.singular
    } else {
        strike.plural
    };
    format!("Silent Strike: {} {} {}", count, noun, strike.verb)
}
