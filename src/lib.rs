/*!
Locale and time zone aware text formatting with reusable formatters.

Building a formatter (compiling a datetime or number pattern and resolving
its time zone and locale) is comparatively expensive, while using one is
cheap and has no side effects. This crate caches formatters by a
`FormatKey` of pattern, zone and locale, and exposes them to renderers
through a short-lived `RenderContext`.

The main pieces are:

* [`Formatter`], an immutable datetime or number formatter built from a
  [`FormatKey`].
* [`FormatterCache`], with a [`SharedCache`] visible to every thread and a
  [`LocalCache`] confined to one execution context. [`ContextCache`] picks
  one based on a [`CacheStrategy`].
* [`MessageBundle`], localized message patterns loaded from `.properties`
  files with locale fallback, and [`ReloadableBundle`] for swapping in
  fresh copies.
* [`RenderContext`], which binds a zone, a locale, a bundle and a cache for
  one render, and the [`Renderer`] and [`OutputSink`] traits that a
  template engine plugs into. [`TemplateSet`] is a minimal engine.

# Example

```
use loctext::{FormatKey, FormatterCache, Locale, SharedCache, Value, Zone};

let cache = SharedCache::new();
let key = FormatKey::new(
    "yyyy-MM-dd HH:mm:ss",
    &Zone::parse("UTC")?,
    &Locale::parse("en")?,
);
let formatter = cache.get(&key)?;

let ts: jiff::Timestamp = "2024-01-01T00:00:00Z".parse()?;
assert_eq!(formatter.format(&Value::from(ts))?, "2024-01-01 00:00:00");

// The same formatter is handed out again for an equal key.
let ts: jiff::Timestamp = "2024-06-15T12:30:45Z".parse()?;
assert_eq!(cache.get(&key)?.format(&Value::from(ts))?, "2024-06-15 12:30:45");

# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

pub use crate::{
    bundle::{BundleSource, MessageBundle, ReloadableBundle},
    cache::{ContextCache, FormatterCache, LocalCache, SharedCache},
    config::{CacheStrategy, Config},
    context::RenderContext,
    error::{Error, Result},
    formatter::{
        DEFAULT_DATE_PATTERN, DEFAULT_DATE_TIME_PATTERN, DEFAULT_TIME_PATTERN,
        Formatter,
    },
    key::{FormatKey, FormatKind},
    locale::Locale,
    message::{Args, FormatEnv, MessagePattern},
    render::{Discard, IoSink, OutputSink, Params, Renderer},
    template::TemplateSet,
    value::Value,
    zone::Zone,
};

mod bundle;
mod cache;
mod config;
mod context;
mod error;
mod formatter;
mod key;
mod locale;
mod message;
mod render;
mod template;
mod value;
mod zone;
