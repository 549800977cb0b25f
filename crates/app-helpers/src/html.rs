use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#(?P<dec>[0-9]{1,7})|#[xX](?P<hex>[0-9a-fA-F]{1,6})|(?P<name>[a-zA-Z]+));")
        .expect("Invalid regex")
});

/// Decode the HTML entities that show up in attribute values.
///
/// Unknown named entities and invalid code points are left untouched.
#[must_use]
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    ENTITY.replace_all(s, |caps: &Captures| {
        let decoded = if let Some(dec) = caps.name("dec") {
            dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
        } else if let Some(hex) = caps.name("hex") {
            u32::from_str_radix(hex.as_str(), 16)
                .ok()
                .and_then(char::from_u32)
        } else {
            caps.name("name").and_then(|x| named_entity(x.as_str()))
        };

        decoded.map_or_else(|| caps[0].to_string(), String::from)
    })
}

fn named_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_query_ampersands() {
        assert_eq!(
            decode_entities("https://cdn.example.com/a.jpg?stp=dst&amp;_nc_ht=x&amp;oh=1"),
            "https://cdn.example.com/a.jpg?stp=dst&_nc_ht=x&oh=1"
        );
    }

    #[test]
    fn decodes_numeric_references() {
        assert_eq!(decode_entities("&#39;a&#x2F;b&#X2f;"), "'a/b/");
    }

    #[test]
    fn leaves_unknown_entities() {
        assert_eq!(decode_entities("&bogus; &#xFFFFFF; &"), "&bogus; &#xFFFFFF; &");
    }

    #[test]
    fn borrows_when_nothing_to_decode() {
        assert!(matches!(decode_entities("plain"), Cow::Borrowed(_)));
    }
}
