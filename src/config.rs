use std::time::Duration;

use crate::{
    error::{Error, Result},
    locale::Locale,
};

/// Which kind of formatter store each execution context uses.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CacheStrategy {
    /// One concurrent store visible to every context.
    #[default]
    Shared,
    /// One private store per context, disposed of when the context retires.
    Confined,
}

impl std::str::FromStr for CacheStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<CacheStrategy> {
        match s {
            "shared" => Ok(CacheStrategy::Shared),
            "confined" | "context-confined" => Ok(CacheStrategy::Confined),
            unk => Err(Error::argument(format!(
                "unrecognized cache strategy `{unk}` \
                 (expected `shared` or `confined`)"
            ))),
        }
    }
}

impl std::fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            CacheStrategy::Shared => f.write_str("shared"),
            CacheStrategy::Confined => f.write_str("confined"),
        }
    }
}

/// The recognized configuration options for loading bundles and choosing
/// a cache strategy.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use loctext::{CacheStrategy, Config, Locale};
///
/// let config = Config::new()
///     .default_locale(Locale::parse("de")?)
///     .strict_missing_message(true)
///     .cache_strategy(CacheStrategy::Confined)
///     .reload_interval(Some(Duration::from_secs(30)));
/// assert_eq!(config.get_default_locale().canonical().as_ref(), "de");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    default_locale: Locale,
    strict_missing_message: bool,
    cache_strategy: CacheStrategy,
    reload_interval: Option<Duration>,
}

impl Config {
    /// Create a configuration with the defaults: default locale `en`,
    /// lenient missing messages, a shared cache and no periodic reload.
    pub fn new() -> Config {
        Config::default()
    }

    /// Set the locale used when no message matches the requested locale's
    /// fallback chain.
    pub fn default_locale(self, locale: Locale) -> Config {
        Config { default_locale: locale, ..self }
    }

    /// When enabled, a message key that can't be resolved is an error
    /// instead of being rendered as the literal key.
    pub fn strict_missing_message(self, yes: bool) -> Config {
        Config { strict_missing_message: yes, ..self }
    }

    /// Choose whether `ContextCache::new` hands every context the shared
    /// store or a private one.
    pub fn cache_strategy(self, strategy: CacheStrategy) -> Config {
        Config { cache_strategy: strategy, ..self }
    }

    /// Set how often a directory-backed bundle is re-read from disk.
    /// `None` disables periodic reloading.
    pub fn reload_interval(self, interval: Option<Duration>) -> Config {
        Config { reload_interval: interval, ..self }
    }

    pub fn get_default_locale(&self) -> &Locale {
        &self.default_locale
    }

    pub fn get_strict_missing_message(&self) -> bool {
        self.strict_missing_message
    }

    pub fn get_cache_strategy(&self) -> CacheStrategy {
        self.cache_strategy
    }

    pub fn get_reload_interval(&self) -> Option<Duration> {
        self.reload_interval
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            default_locale: Locale::english(),
            strict_missing_message: false,
            cache_strategy: CacheStrategy::Shared,
            reload_interval: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::new();
        assert_eq!(config.get_default_locale().canonical().as_ref(), "en");
        assert!(!config.get_strict_missing_message());
        assert_eq!(config.get_cache_strategy(), CacheStrategy::Shared);
        assert_eq!(config.get_reload_interval(), None);
    }

    #[test]
    fn strategy_parse() {
        assert_eq!(
            "confined".parse::<CacheStrategy>().unwrap(),
            CacheStrategy::Confined
        );
        assert_eq!(
            "context-confined".parse::<CacheStrategy>().unwrap(),
            CacheStrategy::Confined
        );
        assert!("global".parse::<CacheStrategy>().is_err());
    }
}
