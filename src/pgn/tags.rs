use serde::{Deserialize, Serialize};

/// The seven mandatory PGN tags, in the order they are written.
pub const SEVEN_TAG_ROSTER: [&str; 7] =
    ["Event", "Site", "Date", "Round", "White", "Black", "Result"];

/// Value written for a roster tag the game does not carry.
pub const UNKNOWN_VALUE: &str = "?";

/// PGN tag pairs in insertion order. Setting an existing key replaces its
/// value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags(Vec<(String, String)>);

impl Tags {
    pub fn new() -> Self {
        Tags(Vec::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Callers check the key with `is_valid_key` first. Control characters in
    /// the value become spaces, since a tag pair must fit on one line.
    pub(crate) fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = one_line(&value.into());
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Tag names are letters, digits and underscores.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn one_line(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

pub(crate) fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '"' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let mut tags = Tags::new();
        tags.set("White", "Morphy");
        tags.set("ECO", "C41");
        tags.set("White", "Anderssen");
        let pairs: Vec<_> = tags.iter().collect();
        assert_eq!(pairs, [("White", "Anderssen"), ("ECO", "C41")]);
        assert_eq!(tags.remove("ECO").as_deref(), Some("C41"));
        assert_eq!(tags.get("ECO"), None);
    }

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape(r#"The "Immortal" \ Game"#), r#"The \"Immortal\" \\ Game"#);
        assert_eq!(escape("two\nlines"), "two lines");
    }

    #[test]
    fn values_are_kept_on_one_line() {
        let mut tags = Tags::new();
        tags.set("Annotator", "line one\r\nline\ttwo");
        assert_eq!(tags.get("Annotator"), Some("line one  line two"));
    }

    #[test]
    fn key_rules() {
        assert!(is_valid_key("PlyCount"));
        assert!(is_valid_key("White_Elo2"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("Opening Name"));
        assert!(!is_valid_key("Event]"));
    }
}
