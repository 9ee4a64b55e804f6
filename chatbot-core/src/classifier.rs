use regex::Regex;
use std::sync::LazyLock;

use crate::extract::extract_city;

static CALC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(?:calculate|calc|compute)\b\s*:?\s*(.*)$").unwrap()
});

static GREETING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:hi|hello|hey)\b").unwrap());

static IDENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:who\s+are\s+you|what\s+are\s+you|your\s+name)\b").unwrap()
});

static HELP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bhelp\b").unwrap());

/// What the user is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Weather { city: String },
    Calculation { expression: String },
    Smalltalk(SmalltalkKind),
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmalltalkKind {
    Greeting,
    Identity,
    Help,
}

impl SmalltalkKind {
    pub fn reply(&self) -> &'static str {
        match self {
            SmalltalkKind::Greeting => "Hey! Ask me for the weather: e.g., 'weather in Tokyo'.",
            SmalltalkKind::Identity => {
                "I'm a small chat bot. I can look up the current weather ('weather in Paris') \
                 or do some math ('calc 2 + 2')."
            }
            SmalltalkKind::Help => {
                "I can fetch current weather via Open-Meteo. Try 'weather in <city>', \
                 or 'calc <expression>' for math."
            }
        }
    }
}

/// Classify a message. Weather wins over calculation, calculation over smalltalk.
pub fn classify(text: &str) -> Intent {
    let text = text.trim();

    if let Some(city) = extract_city(text) {
        return Intent::Weather { city };
    }

    if let Some(caps) = CALC_RE.captures(text) {
        let expression = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
        return Intent::Calculation { expression };
    }

    match smalltalk_kind(text) {
        Some(kind) => Intent::Smalltalk(kind),
        None => Intent::Fallback,
    }
}

/// Smalltalk keyword check on its own, used when another branch came up empty.
pub fn smalltalk_kind(text: &str) -> Option<SmalltalkKind> {
    if GREETING_RE.is_match(text) {
        Some(SmalltalkKind::Greeting)
    } else if IDENTITY_RE.is_match(text) {
        Some(SmalltalkKind::Identity)
    } else if HELP_RE.is_match(text) {
        Some(SmalltalkKind::Help)
    } else {
        None
    }
}
