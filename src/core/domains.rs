//! Candidate domain generation from a free-form company name.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const LEGAL_SUFFIXES: [&str; 9] = [
    " inc",
    " corp",
    " llc",
    " ltd",
    " limited",
    " gmbh",
    " co",
    " company",
    " corporation",
];

const TLDS: [&str; 5] = ["com", "org", "io", "co", "net"];

/// Public suffixes made of two labels that we want to keep whole.
const TWO_LEVEL_SUFFIXES: [&str; 12] = [
    "co.uk", "org.uk", "ac.uk", "gov.uk", "com.au", "net.au", "org.au", "co.jp", "co.nz",
    "com.br", "co.in", "com.cn",
];

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("valid regex"))
}

/// Lowercase, strip legal suffixes and punctuation.
pub fn clean_company_name(company_name: &str) -> String {
    let mut clean_name = company_name.trim().to_lowercase();

    for suffix in LEGAL_SUFFIXES {
        if let Some(stripped) = clean_name.strip_suffix(suffix) {
            clean_name = stripped.to_string();
        }
    }

    non_word_re().replace_all(&clean_name, "").into_owned()
}

/// Guess the domains a company is likely to own, most plausible first.
///
/// The raw input is kept too, so a user typing `stripe.com` gets that exact
/// domain tried.
pub fn generate_company_domains(company_name: &str) -> Vec<String> {
    let clean_name = clean_company_name(company_name);
    let name_parts: Vec<&str> = clean_name.split_whitespace().collect();

    let mut stems = Vec::new();
    stems.push(name_parts.concat());
    stems.push(name_parts.join("-"));

    if let [init @ .., last] = name_parts.as_slice() {
        if !init.is_empty() {
            let initials: String = init.iter().filter_map(|part| part.chars().next()).collect();
            stems.push(format!("{}{}", initials, last));

            let acronym: String = name_parts
                .iter()
                .filter_map(|part| part.chars().next())
                .collect();
            stems.push(acronym);
        }
    }

    let mut domains = Vec::new();
    for stem in stems.iter().filter(|stem| !stem.is_empty()) {
        for tld in TLDS {
            domains.push(format!("{}.{}", stem, tld));
        }
    }

    let raw = company_name.trim();
    if !raw.is_empty() {
        domains.push(raw.to_string());
    }

    if clean_name.contains("google") {
        domains.push("google.com".to_string());
    } else if clean_name.contains("microsoft") {
        domains.push("microsoft.com".to_string());
    } else if clean_name.contains("amazon") {
        domains.push("amazon.com".to_string());
    } else if clean_name.contains("facebook") || clean_name.contains("meta") {
        domains.push("facebook.com".to_string());
        domains.push("meta.com".to_string());
    } else if clean_name.contains("apple") {
        domains.push("apple.com".to_string());
    }

    let mut seen = HashSet::new();
    domains.retain(|domain| seen.insert(domain.clone()));
    domains
}

/// Reduce a host or URL-ish string to `label.suffix`.
///
/// `https://www.shop.example.co.uk/about` becomes `example.co.uk`. Returns
/// `None` when there is no dotted suffix to keep, e.g. for `"Acme Corp"`.
pub fn registrable_domain(input: &str) -> Option<String> {
    let trimmed = input.trim().to_lowercase();
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(&trimmed);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = host.rsplit_once('@').map(|(_, h)| h).unwrap_or(host);
    let host = host.split(':').next().unwrap_or_default().trim_end_matches('.');

    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return None;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return None;
    }
    if labels.last().is_some_and(|tld| tld.chars().all(|c| c.is_ascii_digit())) {
        // bare IPv4
        return None;
    }

    let last_two = labels[labels.len() - 2..].join(".");
    if labels.len() >= 3 && TWO_LEVEL_SUFFIXES.contains(&last_two.as_str()) {
        return Some(labels[labels.len() - 3..].join("."));
    }
    if TWO_LEVEL_SUFFIXES.contains(&last_two.as_str()) {
        return None;
    }

    Some(last_two)
}

/// Simple Icons slugs: no spaces, hyphenated, initials. Only `[a-z0-9-]` survives.
pub fn simple_icons_slugs(company_name: &str) -> Vec<String> {
    let lower = company_name.trim().to_lowercase();
    let variations = [
        lower.replace(' ', ""),
        lower.replace(' ', "-"),
        lower
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .collect::<String>(),
    ];

    let mut seen = HashSet::new();
    variations
        .iter()
        .map(|slug| {
            slug.chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect::<String>()
        })
        .filter(|slug| !slug.is_empty() && seen.insert(slug.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_company_name_strips_suffix_and_punctuation() {
        assert_eq!(clean_company_name("Acme, Inc"), "acme");
        assert_eq!(clean_company_name("Foo Bar Corporation"), "foo bar");
        assert_eq!(clean_company_name("AT&T"), "att");
    }

    #[test]
    fn test_single_word_domains() {
        let domains = generate_company_domains("Stripe");
        assert_eq!(
            domains,
            vec![
                "stripe.com",
                "stripe.org",
                "stripe.io",
                "stripe.co",
                "stripe.net",
                "Stripe",
            ]
        );
    }

    #[test]
    fn test_multi_word_domains_include_acronyms() {
        let domains = generate_company_domains("General Electric Company");
        assert!(domains.contains(&"generalelectric.com".to_string()));
        assert!(domains.contains(&"general-electric.com".to_string()));
        assert!(domains.contains(&"gelectric.com".to_string()));
        assert!(domains.contains(&"ge.com".to_string()));
        assert_eq!(domains[0], "generalelectric.com");
        assert_eq!(domains.last().unwrap(), "General Electric Company");
    }

    #[test]
    fn test_well_known_overrides() {
        let domains = generate_company_domains("Meta Platforms");
        assert!(domains.contains(&"facebook.com".to_string()));
        assert!(domains.contains(&"meta.com".to_string()));

        let domains = generate_company_domains("Google LLC");
        assert_eq!(domains.iter().filter(|d| *d == "google.com").count(), 1);
    }

    #[test]
    fn test_punctuation_only_name_yields_no_stems() {
        assert_eq!(generate_company_domains("!!!"), vec!["!!!"]);
        assert!(generate_company_domains("   ").is_empty());
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("www.example.com").as_deref(), Some("example.com"));
        assert_eq!(
            registrable_domain("https://shop.example.co.uk/about?x=1").as_deref(),
            Some("example.co.uk")
        );
        assert_eq!(registrable_domain("example.com:8443").as_deref(), Some("example.com"));
        assert_eq!(registrable_domain("Acme Corp"), None);
        assert_eq!(registrable_domain("localhost"), None);
        assert_eq!(registrable_domain("co.uk"), None);
        assert_eq!(registrable_domain("10.0.0.1"), None);
    }

    #[test]
    fn test_simple_icons_slugs() {
        assert_eq!(simple_icons_slugs("GitHub"), vec!["github", "g"]);
        assert_eq!(
            simple_icons_slugs("Hacker News"),
            vec!["hackernews", "hacker-news", "hn"]
        );
    }
}
