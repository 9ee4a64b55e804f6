use regex::Regex;
use std::sync::LazyLock;

/// "weather in/at/for <place>"
static WEATHER_PLACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)weather\s+(?:in|at|for)\s+([a-z\s'.-]{2,})").unwrap()
});

/// Bare "in/at <place>", only trusted when "weather" appears elsewhere.
static BARE_PLACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:in|at)\s+([a-z\s'.-]{2,})\b").unwrap());

/// Pull a city name out of a weather question.
pub fn extract_city(text: &str) -> Option<String> {
    if let Some(city) = capture(&WEATHER_PLACE_RE, text) {
        return Some(city);
    }
    if text.to_lowercase().contains("weather") {
        return capture(&BARE_PLACE_RE, text);
    }
    None
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    let city = re.captures(text)?.get(1)?.as_str().trim();
    (!city.is_empty()).then(|| city.to_string())
}
