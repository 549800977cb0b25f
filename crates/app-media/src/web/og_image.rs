use app_helpers::html::decode_entities;
use once_cell::sync::Lazy;
use regex::Regex;

static PROPERTY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)<meta\b[^>]*?\bproperty\s*=\s*["']og:image["'][^>]*?\bcontent\s*=\s*"(?P<url>[^"]*)""#,
    )
    .expect("Invalid regex")
});

static CONTENT_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)<meta\b[^>]*?\bcontent\s*=\s*"(?P<url>[^"]*)"[^>]*?\bproperty\s*=\s*["']og:image["']"#,
    )
    .expect("Invalid regex")
});

/// Pull the `og:image` URL out of raw HTML.
///
/// A plain pattern match, not a parser: good enough for the markup
/// social sites serve to crawlers and nothing more.
#[must_use]
pub fn find_og_image(html: &str) -> Option<String> {
    [&*PROPERTY_FIRST, &*CONTENT_FIRST]
        .into_iter()
        .find_map(|re| re.captures(html))
        .and_then(|x| x.name("url"))
        .map(|x| decode_entities(x.as_str().trim()).into_owned())
        .filter(|x| !x.is_empty())
}
