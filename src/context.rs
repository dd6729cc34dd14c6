use crate::{
    bundle::MessageBundle,
    cache::FormatterCache,
    error::Result,
    formatter::{
        DEFAULT_DATE_PATTERN, DEFAULT_DATE_TIME_PATTERN, DEFAULT_TIME_PATTERN,
    },
    locale::Locale,
    message::{Args, FormatEnv},
    value::Value,
    zone::Zone,
};

/// The formatting capabilities handed to a renderer for one render.
///
/// A context binds a time zone, a locale, a message bundle and a formatter
/// store. It is cheap to build and meant to be thrown away once the render
/// is done. It stores nothing itself: every operation derives a format key
/// from its arguments and this context's zone and locale, and asks the
/// store for the matching formatter.
///
/// # Example
///
/// ```
/// use loctext::{
///     Args, BundleSource, Config, Locale, MessageBundle, RenderContext,
///     SharedCache, Value, Zone,
/// };
///
/// let source = BundleSource::embedded([(
///     "messages_en.properties",
///     "greeting = Hello, {0}!",
/// )]);
/// let bundle = MessageBundle::load(&source, "messages", &Config::new())?;
/// let cache = SharedCache::new();
/// let cx = RenderContext::new(
///     Zone::utc(),
///     Locale::parse("fr-CA")?,
///     &bundle,
///     &cache,
/// );
///
/// let ts: jiff::Timestamp = "2024-06-15T12:30:45Z".parse()?;
/// assert_eq!(cx.format_date_time(&Value::from(ts))?, "2024-06-15 12:30:45");
/// assert_eq!(cx.message("greeting", &Args::new().arg("Ann"))?, "Hello, Ann!");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct RenderContext<'a> {
    zone: Zone,
    locale: Locale,
    bundle: &'a MessageBundle,
    cache: &'a dyn FormatterCache,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        zone: Zone,
        locale: Locale,
        bundle: &'a MessageBundle,
        cache: &'a dyn FormatterCache,
    ) -> RenderContext<'a> {
        RenderContext { zone, locale, bundle, cache }
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn bundle(&self) -> &'a MessageBundle {
        self.bundle
    }

    /// Returns the zone, locale and formatter store of this context.
    pub fn env(&self) -> FormatEnv<'_> {
        FormatEnv { zone: &self.zone, locale: &self.locale, cache: self.cache }
    }

    /// Format a datetime as `yyyy-MM-dd HH:mm:ss`.
    pub fn format_date_time(&self, value: &Value) -> Result<String> {
        self.format_date_time_with(value, DEFAULT_DATE_TIME_PATTERN)
    }

    /// Format a datetime with a caller supplied pattern.
    pub fn format_date_time_with(
        &self,
        value: &Value,
        pattern: &str,
    ) -> Result<String> {
        let mut out = String::new();
        self.env().date_time(pattern, value, &mut out)?;
        Ok(out)
    }

    /// Format the date of a datetime as `yyyy-MM-dd`.
    pub fn format_date(&self, value: &Value) -> Result<String> {
        self.format_date_time_with(value, DEFAULT_DATE_PATTERN)
    }

    /// Format the time of a datetime as `HH:mm:ss`.
    pub fn format_time(&self, value: &Value) -> Result<String> {
        self.format_date_time_with(value, DEFAULT_TIME_PATTERN)
    }

    /// Format a number with a decimal pattern or named style. The empty
    /// pattern means `#,##0.###`.
    pub fn format_number(
        &self,
        value: &Value,
        pattern: &str,
    ) -> Result<String> {
        let mut out = String::new();
        self.env().number(pattern, value, &mut out)?;
        Ok(out)
    }

    /// Format any value using the default for its type.
    pub fn format_value(&self, value: &Value) -> Result<String> {
        let mut out = String::new();
        self.env().plain(value, &mut out)?;
        Ok(out)
    }

    /// Resolve a message in this context's locale and substitute `args`.
    pub fn message(&self, key: &str, args: &Args) -> Result<String> {
        self.bundle.format(&self.locale, key, args, &self.env())
    }
}

impl<'a> std::fmt::Debug for RenderContext<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("zone", &self.zone)
            .field("locale", &self.locale)
            .field("bundle", &self.bundle.base_name())
            .finish_non_exhaustive()
    }
}
