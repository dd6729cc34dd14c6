/*!
Message patterns and the arguments substituted into them.

A message pattern is literal text with placeholders:

* `{0}` and `{name}` substitute a positional or named argument. Strings are
  inserted as is, numbers use the locale's default number format and
  datetimes use `yyyy-MM-dd HH:mm:ss`.
* `{0,number}`, `{0,number,integer}`, `{0,number,percent}` and
  `{0,number,#,##0.00}` format a number.
* `{0,date}` and `{0,time}` format a datetime, optionally followed by one of
  the styles `short`, `medium`, `long` and `full` or by a custom datetime
  pattern such as `{0,date,EEE d MMM}`.

A single quote starts or ends a quoted section in which braces are taken
literally. Two consecutive single quotes are always one literal quote. So
`'{0}'` renders as `{0}` and `it''s` renders as `it's`.

A placeholder whose argument wasn't supplied is rendered verbatim.
*/

use std::collections::BTreeMap;

use crate::{
    cache::FormatterCache,
    error::Result,
    formatter::{
        DEFAULT_DATE_PATTERN, DEFAULT_DATE_TIME_PATTERN, DEFAULT_TIME_PATTERN,
    },
    key::FormatKey,
    locale::Locale,
    value::Value,
    zone::Zone,
};

/// The arguments substituted into a message pattern.
///
/// # Example
///
/// ```
/// use loctext::Args;
///
/// let args = Args::new().arg("Ann").arg(3).named("city", "Paris");
/// assert_eq!(args.positional().len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    named: BTreeMap<String, Value>,
}

impl Args {
    /// Create an empty set of arguments.
    pub fn new() -> Args {
        Args::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Args {
        self.positional.push(value.into());
        self
    }

    /// Add a named argument, replacing any previous one with the same name.
    pub fn named(mut self, name: &str, value: impl Into<Value>) -> Args {
        self.named.insert(name.to_string(), value.into());
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }

    fn lookup(&self, arg: &ArgRef) -> Option<&Value> {
        match *arg {
            ArgRef::Index(i) => self.positional.get(i),
            ArgRef::Name(ref name) => self.named.get(name),
        }
    }
}

impl From<Vec<Value>> for Args {
    fn from(positional: Vec<Value>) -> Args {
        Args { positional, named: BTreeMap::new() }
    }
}

/// A parsed message pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct MessagePattern {
    source: String,
    segments: Vec<Segment>,
}

#[derive(Clone, Debug, PartialEq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

#[derive(Clone, Debug, PartialEq)]
struct Placeholder {
    arg: ArgRef,
    kind: Kind,
    /// The placeholder as written, including braces.
    raw: String,
}

#[derive(Clone, Debug, PartialEq)]
enum ArgRef {
    Index(usize),
    Name(String),
}

#[derive(Clone, Debug, PartialEq)]
enum Kind {
    Plain,
    Number(String),
    Date(String),
    Time(String),
}

impl MessagePattern {
    /// Parse a message pattern.
    ///
    /// This returns a plain error message on failure. Callers attach the
    /// context (which bundle, which key) that makes it useful.
    pub fn parse(source: &str) -> std::result::Result<MessagePattern, String> {
        let mut segments = vec![];
        let mut literal = String::new();
        let mut quoted = false;
        let mut chars = source.char_indices().peekable();
        while let Some((start, ch)) = chars.next() {
            match ch {
                '\'' if chars.peek().is_some_and(|&(_, c)| c == '\'') => {
                    chars.next();
                    literal.push('\'');
                }
                '\'' => quoted = !quoted,
                '{' if !quoted => {
                    let mut end = None;
                    for (i, c) in chars.by_ref() {
                        match c {
                            '}' => {
                                end = Some(i);
                                break;
                            }
                            '{' => {
                                return Err(format!(
                                    "nested `{{` at offset {i} is not \
                                     supported"
                                ));
                            }
                            _ => {}
                        }
                    }
                    let Some(end) = end else {
                        return Err(format!(
                            "unterminated placeholder starting at \
                             offset {start}"
                        ));
                    };
                    let raw = &source[start..=end];
                    let placeholder =
                        parse_placeholder(&source[start + 1..end]).map_err(
                            |msg| format!("placeholder `{raw}`: {msg}"),
                        )?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(
                            &mut literal,
                        )));
                    }
                    segments.push(Segment::Placeholder(Placeholder {
                        raw: raw.to_string(),
                        ..placeholder
                    }));
                }
                _ => literal.push(ch),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(MessagePattern { source: source.to_string(), segments })
    }

    /// Returns the pattern as it was written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true when this pattern has no placeholders.
    pub fn is_literal(&self) -> bool {
        self.segments.iter().all(|s| matches!(*s, Segment::Literal(_)))
    }

    /// Substitute the given arguments into this pattern.
    ///
    /// Dates and numbers are formatted with formatters taken from the
    /// store in `env`, configured with its zone and locale.
    pub fn format(
        &self,
        args: &Args,
        env: &FormatEnv<'_>,
        out: &mut String,
    ) -> Result<()> {
        for segment in self.segments.iter() {
            let ph = match *segment {
                Segment::Literal(ref text) => {
                    out.push_str(text);
                    continue;
                }
                Segment::Placeholder(ref ph) => ph,
            };
            let Some(value) = args.lookup(&ph.arg) else {
                out.push_str(&ph.raw);
                continue;
            };
            match ph.kind {
                Kind::Plain => env.plain(value, out)?,
                Kind::Number(ref style) => env.number(style, value, out)?,
                Kind::Date(ref style) => {
                    env.date_time(date_style(style), value, out)?
                }
                Kind::Time(ref style) => {
                    env.date_time(time_style(style), value, out)?
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for MessagePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Everything needed to turn a typed value into text: a zone, a locale and
/// the store formatters come from.
#[derive(Clone, Copy)]
pub struct FormatEnv<'a> {
    pub zone: &'a Zone,
    pub locale: &'a Locale,
    pub cache: &'a dyn FormatterCache,
}

impl<'a> FormatEnv<'a> {
    /// Format a datetime value with the given pattern.
    pub fn date_time(
        &self,
        pattern: &str,
        value: &Value,
        out: &mut String,
    ) -> Result<()> {
        let key = FormatKey::new(pattern, self.zone, self.locale);
        self.cache.get(&key)?.format_to(value, out)
    }

    /// Format a number value with the given pattern or named style.
    pub fn number(
        &self,
        pattern: &str,
        value: &Value,
        out: &mut String,
    ) -> Result<()> {
        let key = FormatKey::number(pattern, self.locale);
        self.cache.get(&key)?.format_to(value, out)
    }

    /// Format a value using the default for its type.
    pub fn plain(&self, value: &Value, out: &mut String) -> Result<()> {
        match *value {
            Value::Str(ref s) => {
                out.push_str(s);
                Ok(())
            }
            Value::Int(_) | Value::Float(_) => self.number("", value, out),
            _ => self.date_time(DEFAULT_DATE_TIME_PATTERN, value, out),
        }
    }
}

impl<'a> std::fmt::Debug for FormatEnv<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FormatEnv")
            .field("zone", self.zone)
            .field("locale", self.locale)
            .field("cache_len", &self.cache.len())
            .finish()
    }
}

fn parse_placeholder(body: &str) -> std::result::Result<Placeholder, String> {
    let mut parts = body.splitn(3, ',');
    let name = parts.next().unwrap_or("").trim();
    let ty = parts.next().map(str::trim);
    let arg = if name.is_empty() {
        return Err("missing argument name".to_string());
    } else if name.bytes().all(|b| b.is_ascii_digit()) {
        let index = name
            .parse::<usize>()
            .map_err(|err| format!("invalid argument index: {err}"))?;
        ArgRef::Index(index)
    } else if name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        ArgRef::Name(name.to_string())
    } else {
        return Err(format!("invalid argument name `{name}`"));
    };
    let mut style = || parts.next().unwrap_or("").trim().to_string();
    let kind = match ty {
        None => Kind::Plain,
        Some("number") => Kind::Number(style()),
        Some("date") => Kind::Date(style()),
        Some("time") => Kind::Time(style()),
        Some(unk) => return Err(format!("unknown format type `{unk}`")),
    };
    Ok(Placeholder { arg, kind, raw: String::new() })
}

fn date_style(style: &str) -> &str {
    match style {
        "" | "short" => DEFAULT_DATE_PATTERN,
        "medium" => "d MMM yyyy",
        "long" => "d MMMM yyyy",
        "full" => "EEEE, d MMMM yyyy",
        custom => custom,
    }
}

fn time_style(style: &str) -> &str {
    match style {
        "" | "medium" => DEFAULT_TIME_PATTERN,
        "short" => "HH:mm",
        "long" | "full" => "HH:mm:ss z",
        custom => custom,
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        cache::{LocalCache, SharedCache},
        error::Error,
    };

    use super::*;

    fn render(pattern: &str, locale: &str, args: Args) -> String {
        let cache = SharedCache::new();
        let env = FormatEnv {
            zone: &Zone::utc(),
            locale: &Locale::parse(locale).unwrap(),
            cache: &cache,
        };
        let mut out = String::new();
        MessagePattern::parse(pattern)
            .unwrap()
            .format(&args, &env, &mut out)
            .unwrap();
        out
    }

    fn instant(s: &str) -> Value {
        Value::Timestamp(s.parse().unwrap())
    }

    #[test]
    fn positional_and_named() {
        let args = Args::new().arg("Ann");
        assert_eq!(render("Hello, {0}!", "en", args), "Hello, Ann!");

        let args = Args::new().named("user", "Bo").arg(3);
        assert_eq!(
            render("{user} has {0} new messages", "en", args),
            "Bo has 3 new messages",
        );
    }

    #[test]
    fn typed_placeholders() {
        let ts = instant("2024-06-15T12:30:45Z");
        let args = Args::new().arg(ts).arg(1234.5).arg(0.25);
        assert_eq!(
            render(
                "{0,date,long} at {0,time,short}: {1,number} ({2,number,percent})",
                "en",
                args.clone(),
            ),
            "15 June 2024 at 12:30: 1,234.5 (25%)",
        );
        assert_eq!(
            render("{0,date,full} {1,number,#,##0.00}", "de", args),
            "Samstag, 15 Juni 2024 1.234,50",
        );
    }

    #[test]
    fn plain_values_use_defaults() {
        let args = Args::new().arg(instant("2024-01-01T00:00:00Z")).arg(98765);
        assert_eq!(
            render("{0} / {1}", "fr", args),
            "2024-01-01 00:00:00 / 98\u{202F}765",
        );
    }

    #[test]
    fn quoting() {
        let args = Args::new().arg("x");
        assert_eq!(render("'{0}' is {0}", "en", args.clone()), "{0} is x");
        assert_eq!(render("it''s {0}", "en", args.clone()), "it's x");
        assert_eq!(render("'it''s' {0}", "en", args), "it's x");
    }

    #[test]
    fn missing_arguments_are_verbatim() {
        let args = Args::new().arg("a");
        assert_eq!(
            render("{0} {1} {name} {2,number}", "en", args),
            "a {1} {name} {2,number}",
        );
    }

    #[test]
    fn malformed() {
        assert!(MessagePattern::parse("Hello {0").is_err());
        assert!(MessagePattern::parse("Hello {}").is_err());
        assert!(MessagePattern::parse("{0,choice,1#x}").is_err());
        assert!(MessagePattern::parse("{0,{1}}").is_err());
        assert!(MessagePattern::parse("{a b}").is_err());
        // Quoted braces don't need to balance.
        assert!(MessagePattern::parse("'{' {0}").is_ok());
    }

    #[test]
    fn wrong_argument_type() {
        let cache = LocalCache::new();
        let env = FormatEnv {
            zone: &Zone::utc(),
            locale: &Locale::english(),
            cache: &cache,
        };
        let pattern = MessagePattern::parse("{0,number}").unwrap();
        let mut out = String::new();
        let err = pattern
            .format(&Args::new().arg("not a number"), &env, &mut out)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }), "{err:?}");
    }

    #[test]
    fn formatters_come_from_cache() {
        let cache = SharedCache::new();
        let env = FormatEnv {
            zone: &Zone::utc(),
            locale: &Locale::english(),
            cache: &cache,
        };
        let pattern = MessagePattern::parse("{0,date} {0,date} {1}").unwrap();
        let args = Args::new().arg(instant("2024-01-01T00:00:00Z")).arg(1);
        let mut out = String::new();
        pattern.format(&args, &env, &mut out).unwrap();
        assert_eq!(out, "2024-01-01 2024-01-01 1");
        assert_eq!(cache.len(), 2);
    }
}
