use once_cell::sync::Lazy;
use regex::Regex;

static NAMED_SECRET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(api[_-]?key|token|secret|password)\s*[:=]\s*["']?([A-Za-z0-9_\-\.]{6,})["']?"#)
        .expect("valid regex")
});

static TOKEN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9_\-\.]{8,}").expect("valid regex"),
        Regex::new(r"\bpat[A-Za-z0-9]{14}\.[A-Za-z0-9]{16,}\b").expect("valid regex"),
        Regex::new(r"\bkey[A-Za-z0-9]{14}\b").expect("valid regex"),
    ]
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionResult {
    pub content: String,
    pub redaction_count: usize,
}

pub fn redact(input: &str) -> RedactionResult {
    if input.is_empty() {
        return RedactionResult {
            content: String::new(),
            redaction_count: 0,
        };
    }

    let mut redaction_count = NAMED_SECRET.find_iter(input).count();
    let mut result = NAMED_SECRET
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let key = caps
                .get(1)
                .map(|m| m.as_str())
                .unwrap_or("secret")
                .to_ascii_lowercase();
            format!("{}=[REDACTED]", key)
        })
        .to_string();

    for pattern in TOKEN_PATTERNS.iter() {
        let matches = pattern.find_iter(&result).count();
        if matches == 0 {
            continue;
        }
        redaction_count += matches;
        result = pattern.replace_all(&result, "[REDACTED]").to_string();
    }

    RedactionResult {
        content: result,
        redaction_count,
    }
}

pub fn redact_error(error: &impl std::fmt::Display) -> String {
    redact(&error.to_string()).content
}
