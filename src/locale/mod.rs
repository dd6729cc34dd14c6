use std::sync::Arc;

use icu_locale::Locale as IcuLocale;

use crate::error::{Error, Result};

pub use self::names::{Names, NumberSymbols};

mod names;

/// A wrapper around an ICU4X locale along with its canonical textual form.
///
/// Parsing accepts both BCP 47 (`en-US`) and Java style (`en_US`) subtag
/// separators, and normalizes casing. The canonical form only includes the
/// language identifier (language, script, region and variants). Unicode
/// extensions are dropped since nothing in this crate consults them.
#[derive(Clone, Debug)]
pub struct Locale {
    icu: IcuLocale,
    canonical: Arc<str>,
}

impl Locale {
    /// Create a locale that is "unknown." Its canonical form is `und`.
    pub fn unknown() -> Locale {
        Locale::from_icu(IcuLocale::UNKNOWN)
    }

    /// The `en` locale. This is the default fallback locale.
    pub fn english() -> Locale {
        Locale::from_icu(icu_locale::locale!("en"))
    }

    /// Parse a locale from a BCP 47 or Java style string.
    pub fn parse(s: &str) -> Result<Locale> {
        let normalized = s.trim().replace('_', "-");
        let icu = normalized.parse::<IcuLocale>().map_err(|err| {
            Error::argument(format!("invalid locale `{s}`: {err}"))
        })?;
        Ok(Locale::from_icu(icu))
    }

    fn from_icu(icu: IcuLocale) -> Locale {
        let canonical = Arc::from(icu.id.to_string());
        Locale { icu, canonical }
    }

    /// Returns the canonical form of this locale.
    pub fn canonical(&self) -> &Arc<str> {
        &self.canonical
    }

    /// Returns true when this is the `und` locale.
    pub fn is_unknown(&self) -> bool {
        self.icu.id.language.is_unknown()
    }

    /// Returns the language subtag, e.g., `en` for `en-US`.
    pub fn language(&self) -> &str {
        self.canonical.split('-').next().unwrap_or("und")
    }

    /// Returns the chain of progressively more general locales, starting
    /// with this one.
    ///
    /// For example, `zh-Hant-TW` yields `zh-Hant-TW`, `zh-Hant` and `zh`.
    /// The unknown locale yields nothing, since it is the root that every
    /// chain implicitly ends in.
    pub fn fallback_chain(&self) -> Vec<Locale> {
        if self.is_unknown() {
            return vec![];
        }
        let subtags: Vec<&str> = self.canonical.split('-').collect();
        let mut chain = vec![];
        for len in (1..=subtags.len()).rev() {
            let candidate = subtags[..len].join("-");
            // Every prefix of a valid language identifier that ends on a
            // subtag boundary is itself valid, except in a few pathological
            // cases (like a bare variant). We skip those.
            match candidate.parse::<IcuLocale>() {
                Ok(icu) => chain.push(Locale::from_icu(icu)),
                Err(err) => {
                    log::trace!(
                        "skipping fallback `{candidate}` for `{self}`: {err}"
                    );
                }
            }
        }
        chain
    }

    /// Returns the suffix used for resource file names, e.g., `en_US`.
    pub fn file_suffix(&self) -> String {
        self.canonical.replace('-', "_")
    }

    /// Returns localized month and weekday names for this locale.
    pub fn names(&self) -> &'static Names {
        Names::for_language(self.language())
    }

    /// Returns the decimal and grouping separators for this locale.
    pub fn number_symbols(&self) -> &'static NumberSymbols {
        NumberSymbols::for_language(self.language())
    }
}

impl Eq for Locale {}

impl PartialEq for Locale {
    fn eq(&self, rhs: &Locale) -> bool {
        self.canonical == rhs.canonical
    }
}

impl std::hash::Hash for Locale {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl std::str::FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Locale> {
        Locale::parse(s)
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(s: &str) -> Vec<String> {
        Locale::parse(s)
            .unwrap()
            .fallback_chain()
            .iter()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn canonical_separators() {
        let java = Locale::parse("en_US").unwrap();
        let bcp47 = Locale::parse("en-US").unwrap();
        assert_eq!(java, bcp47);
        assert_eq!(&**java.canonical(), "en-US");
    }

    #[test]
    fn canonical_casing() {
        let locale = Locale::parse("EN-us").unwrap();
        assert_eq!(locale.to_string(), "en-US");
    }

    #[test]
    fn fallback_chains() {
        assert_eq!(chain("fr-CA"), vec!["fr-CA", "fr"]);
        assert_eq!(chain("zh-Hant-TW"), vec!["zh-Hant-TW", "zh-Hant", "zh"]);
        assert_eq!(chain("en"), vec!["en"]);
        assert!(chain("und").is_empty());
    }

    #[test]
    fn file_suffix() {
        assert_eq!(Locale::parse("pt-BR").unwrap().file_suffix(), "pt_BR");
    }

    #[test]
    fn invalid() {
        assert!(Locale::parse("not a locale").is_err());
    }
}
