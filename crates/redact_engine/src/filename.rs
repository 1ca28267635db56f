/// `{file_id}_tokenized.txt`, with the id made safe for any filesystem.
pub fn tokenized_filename(file_id: &str) -> String {
    format!("{}_tokenized.txt", sanitize_component(file_id))
}

/// `pii_results_{file_id}_{date}.json`; `date` is expected as `YYYY-MM-DD`.
pub fn report_filename(file_id: &str, date: &str) -> String {
    format!(
        "pii_results_{}_{}.json",
        sanitize_component(file_id),
        sanitize_component(date)
    )
}

fn sanitize_component(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim_matches(&['_', ' ', '.'][..]);

    let mut compacted = String::with_capacity(trimmed.len());
    let mut prev_underscore = false;
    for c in trimmed.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }
    if compacted.is_empty() {
        compacted.push_str("document");
    }
    if compacted.chars().count() > 80 {
        compacted = compacted.chars().take(80).collect();
    }
    if is_reserved_windows_name(&compacted) {
        compacted.push('_');
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(
        c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
