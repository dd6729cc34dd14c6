use std::sync::Arc;

use crate::{locale::Locale, zone::Zone};

/// The kind of value a formatter converts to text.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum FormatKind {
    /// Instants, zoned datetimes and civil datetimes.
    DateTime,
    /// Integers and decimal numbers.
    Number,
}

/// A value identifying a formatting configuration.
///
/// Equality and hashing are structural. The zone and locale participate by
/// their canonical forms, so two keys built from semantically identical
/// zones and locales are always equal. This is what makes it correct to
/// hand out one cached formatter for every equal key.
///
/// The key keeps the zone itself, not just its name, so a formatter is
/// built from exactly the rules the key was made with.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FormatKey {
    kind: FormatKind,
    pattern: Box<str>,
    zone: Option<Zone>,
    locale: Arc<str>,
}

impl FormatKey {
    /// Create a key for a datetime formatter.
    pub fn new(pattern: &str, zone: &Zone, locale: &Locale) -> FormatKey {
        FormatKey {
            kind: FormatKind::DateTime,
            pattern: Box::from(pattern),
            zone: Some(zone.clone()),
            locale: Arc::clone(locale.canonical()),
        }
    }

    /// Create a key for a number formatter.
    ///
    /// Number formatting doesn't depend on a time zone, so the zone is left
    /// empty. This avoids building one number formatter per zone.
    pub fn number(pattern: &str, locale: &Locale) -> FormatKey {
        FormatKey {
            kind: FormatKind::Number,
            pattern: Box::from(pattern),
            zone: None,
            locale: Arc::clone(locale.canonical()),
        }
    }

    pub fn kind(&self) -> FormatKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The canonical time zone. This is empty for number keys.
    pub fn zone(&self) -> &str {
        self.zone.as_ref().map_or("", |zone| zone.canonical())
    }

    /// The time zone of a datetime key.
    pub fn time_zone(&self) -> Option<&Zone> {
        self.zone.as_ref()
    }

    /// The canonical locale.
    pub fn locale(&self) -> &str {
        &self.locale
    }
}

impl std::fmt::Display for FormatKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.kind {
            FormatKind::DateTime => write!(
                f,
                "datetime `{}` in {} for {}",
                self.pattern,
                self.zone(),
                self.locale
            ),
            FormatKind::Number => {
                write!(f, "number `{}` for {}", self.pattern, self.locale)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn key(pattern: &str, zone: &str, locale: &str) -> FormatKey {
        FormatKey::new(
            pattern,
            &Zone::parse(zone).unwrap(),
            &Locale::parse(locale).unwrap(),
        )
    }

    #[test]
    fn equal_after_canonicalization() {
        let k1 = key("yyyy-MM-dd", "UTC", "en_US");
        let k2 = key("yyyy-MM-dd", "UTC", "en-us");
        assert_eq!(k1, k2);

        let mut set = HashSet::new();
        set.insert(k1);
        assert!(!set.insert(k2));
    }

    #[test]
    fn distinct_configurations() {
        let base = key("yyyy-MM-dd", "UTC", "en");
        assert_ne!(base, key("yyyy-MM-dd HH", "UTC", "en"));
        assert_ne!(base, key("yyyy-MM-dd", "Europe/Paris", "en"));
        assert_ne!(base, key("yyyy-MM-dd", "UTC", "fr"));
    }

    #[test]
    fn number_keys_ignore_zone() {
        let en = Locale::parse("en").unwrap();
        let k = FormatKey::number("#,##0", &en);
        assert_eq!(k.kind(), FormatKind::Number);
        assert_eq!(k.zone(), "");
        assert!(k.time_zone().is_none());
        assert_ne!(k, FormatKey::new("#,##0", &Zone::utc(), &en));
    }
}
