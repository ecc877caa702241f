const MAX_NAME_LEN: usize = 120;
const FALLBACK_NAME: &str = "subtitle.srt";

/// Reduces a service-provided artifact name to a safe file name inside the output directory.
///
/// Directory components are dropped, characters Windows forbids become `_`,
/// runs of `_` collapse, and reserved device names get a trailing `_`.
pub fn sanitize_artifact_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);
    if cleaned.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }

    if compacted.len() > MAX_NAME_LEN {
        let cut = (0..=MAX_NAME_LEN)
            .rev()
            .find(|idx| compacted.is_char_boundary(*idx))
            .unwrap_or(0);
        compacted.truncate(cut);
    }
    let stem_len = compacted.find('.').unwrap_or(compacted.len());
    if is_reserved_windows_name(&compacted[..stem_len]) {
        compacted.insert(stem_len, '_');
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
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
