use std::fmt::Write as _;

use tracing::warn;

use crate::housekeeping::MAX_MESSAGE_CHARS;
use crate::store::EventRecord;

const DEREGISTERED_PREFIX: &str = "\nDeregistered players: ";

/// Builds the roster message body for an event.
pub fn render_roster(record: &EventRecord) -> String {
    render_roster_limited(record, MAX_MESSAGE_CHARS)
}

/// Renders the roster in at most `limit` characters. Lists that do not fit
/// end with a `+N more` tail.
fn render_roster_limited(record: &EventRecord, limit: usize) -> String {
    let header = format!(
        "{}{}:\n",
        record.event_message,
        record.event_status.label()
    );
    let subscribers: Vec<String> = record
        .subscribed_users
        .names()
        .enumerate()
        .map(|(position, username)| format!("{}. {}\n", position + 1, username))
        .collect();
    let deregistered: Vec<&str> = record.unsubscribed_users.names().collect();

    let footer = deregistered_footer(&deregistered, usize::MAX);
    let full_chars = char_count(&header)
        + subscribers.iter().map(|line| char_count(line)).sum::<usize>()
        + char_count(&footer);
    if full_chars <= limit {
        return header + &subscribers.concat() + &footer;
    }

    warn!(
        "roster for '{}' needs {full_chars} characters, truncating to {limit}",
        record.event_name
    );
    let footer = deregistered_footer(&deregistered, limit / 2);
    let reserve = char_count(&format!("+{} more\n", subscribers.len()));
    let budget = limit
        .saturating_sub(char_count(&header))
        .saturating_sub(char_count(&footer))
        .saturating_sub(reserve);

    let mut content = header;
    let mut used = 0;
    let mut shown = 0;
    for line in &subscribers {
        let line_chars = char_count(line);
        if used + line_chars > budget {
            break;
        }
        content.push_str(line);
        used += line_chars;
        shown += 1;
    }
    if shown < subscribers.len() {
        let _ = writeln!(content, "+{} more", subscribers.len() - shown);
    }
    content.push_str(&footer);
    content
}

fn deregistered_footer(names: &[&str], budget: usize) -> String {
    if names.is_empty() {
        return String::new();
    }
    let full = format!("{DEREGISTERED_PREFIX}{}\n", names.join(", "));
    if char_count(&full) <= budget {
        return full;
    }

    let reserve = char_count(DEREGISTERED_PREFIX) + char_count(&format!(" +{} more\n", names.len()));
    let mut listed = String::new();
    let mut shown = 0;
    for name in names {
        let piece = if shown == 0 {
            name.to_string()
        } else {
            format!(", {name}")
        };
        if reserve + char_count(&listed) + char_count(&piece) > budget {
            break;
        }
        listed.push_str(&piece);
        shown += 1;
    }
    format!(
        "{DEREGISTERED_PREFIX}{listed} +{} more\n",
        names.len() - shown
    )
}

fn char_count(text: &str) -> usize {
    text.chars().count()
}
