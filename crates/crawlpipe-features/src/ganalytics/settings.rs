//! Traffic sources reported individually

/// Search engines with their own `visits.organic.<source>` bucket
pub const ORGANIC_SOURCES: [&str; 8] = [
    "google", "bing", "yahoo", "ask", "aol", "yandex", "baidu", "naver",
];

/// Social networks with their own `visits.social.<network>` bucket
pub const SOCIAL_SOURCES: [&str; 7] = [
    "facebook",
    "twitter",
    "pinterest",
    "linkedin",
    "reddit",
    "google+",
    "tumblr",
];

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Field groups as `(group id, label)`
pub fn groups() -> Vec<(String, String)> {
    let mut groups = vec![("visits.organic.all".to_string(), "Organic Visits".to_string())];
    groups.extend(ORGANIC_SOURCES.iter().map(|s| {
        (
            format!("visits.organic.{s}"),
            format!("Organic Visits from {}", capitalize(s)),
        )
    }));
    groups.push(("visits.social.all".to_string(), "Social Visits".to_string()));
    groups.extend(SOCIAL_SOURCES.iter().map(|s| {
        (
            format!("visits.social.{s}"),
            format!("Social Visits from {}", capitalize(s)),
        )
    }));
    groups
}
