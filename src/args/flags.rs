use std::{num::NonZero, path::PathBuf, time::Duration};

use {
    anyhow::Context,
    loctext::{
        BundleSource, CacheStrategy, Config, Locale, MessageBundle,
        ReloadableBundle, Zone,
    },
};

use crate::args::{self, Configurable, Usage};

/// The flags that say where a message bundle lives and how it behaves.
///
/// Every command that reads messages uses this.
#[derive(Clone, Debug)]
pub struct Bundle {
    dir: Option<PathBuf>,
    base: String,
    config: Config,
}

impl Bundle {
    pub const DIR: Usage = Usage::flag(
        "-d, --dir <path>",
        "The directory containing `.properties` message files.",
        r#"
The directory containing `.properties` message files.

Files are named `<base>.properties` for the root messages and
`<base>_<locale>.properties` for each locale, where the locale uses
underscores, e.g., `messages_fr_CA.properties`. Files for other base names are
ignored.

This flag is required.
"#,
    );

    pub const BASE: Usage = Usage::flag(
        "-b, --base <name>",
        "The base name of the message files (default: messages).",
        r#"
The base name of the message files (default: messages).

Only files whose names start with this base name are loaded from the directory
given by -d/--dir.
"#,
    );

    pub const DEFAULT_LOCALE: Usage = Usage::flag(
        "--default-locale <locale>",
        "The locale to fall back to when a message is missing (default: en).",
        r#"
The locale to fall back to when a message is missing (default: en).

When a message isn't found in the requested locale or any of its parents (for
example, `fr-CA` then `fr`), this locale and its parents are tried next. The
root file, `<base>.properties`, is always tried last.
"#,
    );

    pub const STRICT: Usage = Usage::flag(
        "--strict",
        "Fail when a message cannot be found in any fallback locale.",
        r#"
Fail when a message cannot be found in any fallback locale.

By default, a missing message is replaced by its key and a warning is logged.
With this flag, a missing message is an error instead.
"#,
    );

    pub const RELOAD_INTERVAL: Usage = Usage::flag(
        "--reload-interval <duration>",
        "Reload message files when they are older than this.",
        r#"
Reload message files when they are older than this.

The duration may be given in a friendly format, like `30s` or `5m`, or as an
ISO 8601 duration, like `PT30S`. When set, long running commands re-read the
message directory whenever the interval has elapsed. Renders already in
progress keep using the messages they started with. If a reload fails, a
warning is logged and the previous messages stay in use.

By default, messages are loaded once.
"#,
    );

    /// Returns the bundle configuration built from the flags.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Record the formatter store strategy chosen by a command that runs
    /// several workers.
    pub fn set_cache_strategy(&mut self, strategy: CacheStrategy) {
        self.config = self.config.clone().cache_strategy(strategy);
    }

    /// Returns the directory given to `-d/--dir`, or an error if it wasn't
    /// given.
    pub fn source(&self) -> anyhow::Result<BundleSource> {
        let Some(ref dir) = self.dir else {
            anyhow::bail!("a message directory must be given with -d/--dir")
        };
        Ok(BundleSource::directory(dir))
    }

    /// Load the bundle once.
    pub fn load(&self) -> anyhow::Result<MessageBundle> {
        let source = self.source()?;
        let bundle = MessageBundle::load(&source, &self.base, &self.config)?;
        Ok(bundle)
    }

    /// Load the bundle such that it can be reloaded while in use.
    pub fn load_reloadable(&self) -> anyhow::Result<ReloadableBundle> {
        let source = self.source()?;
        let bundle =
            ReloadableBundle::new(source, &self.base, self.config.clone())?;
        Ok(bundle)
    }
}

impl Default for Bundle {
    fn default() -> Bundle {
        Bundle {
            dir: None,
            base: "messages".to_string(),
            config: Config::new(),
        }
    }
}

impl Configurable for Bundle {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Short('d') | lexopt::Arg::Long("dir") => {
                self.dir = Some(PathBuf::from(p.value().context("-d/--dir")?));
            }
            lexopt::Arg::Short('b') | lexopt::Arg::Long("base") => {
                self.base = args::parse(p, "-b/--base")?;
            }
            lexopt::Arg::Long("default-locale") => {
                let locale: Locale = args::parse(p, "--default-locale")?;
                self.config = self.config.clone().default_locale(locale);
            }
            lexopt::Arg::Long("strict") => {
                self.config = self.config.clone().strict_missing_message(true);
            }
            lexopt::Arg::Long("reload-interval") => {
                let interval: ReloadInterval =
                    args::parse(p, "--reload-interval")?;
                self.config =
                    self.config.clone().reload_interval(Some(interval.0));
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        &[
            Bundle::DIR,
            Bundle::BASE,
            Bundle::DEFAULT_LOCALE,
            Bundle::STRICT,
            Bundle::RELOAD_INTERVAL,
        ]
    }
}

/// The flags that choose the locale and time zone to format in.
#[derive(Clone, Debug, Default)]
pub struct Target {
    locale: Option<Locale>,
    zone: Option<Zone>,
}

impl Target {
    pub const LOCALE: Usage = Usage::flag(
        "-l, --locale <locale>",
        "The locale to format in.",
        r#"
The locale to format in.

This accepts BCP 47 language tags like `en-US` or `fr-CA`. Underscores are
accepted too, so `pt_BR` works.

When absent, the `LOCTEXT_LOCALE` environment variable is used. If that isn't
set either, English is used.
"#,
    );

    pub const ZONE: Usage = Usage::flag(
        "-z, --zone <zone>",
        "The time zone to format datetimes in.",
        r#"
The time zone to format datetimes in.

This accepts IANA time zone identifiers like `America/New_York` or `UTC`.
Instants are converted into this time zone before formatting. Civil datetimes
(those without an offset) are interpreted as wall clock times in this zone.

When absent, the system time zone is used. This respects the `TZ` environment
variable.
"#,
    );

    pub fn locale(&self) -> Locale {
        self.locale.clone().unwrap_or_else(|| crate::LOCALE.clone())
    }

    pub fn zone(&self) -> Zone {
        self.zone.clone().unwrap_or_else(Zone::system)
    }
}

impl Configurable for Target {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Short('l') | lexopt::Arg::Long("locale") => {
                self.locale = Some(args::parse(p, "-l/--locale")?);
            }
            lexopt::Arg::Short('z') | lexopt::Arg::Long("zone") => {
                self.zone = Some(args::parse(p, "-z/--zone")?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        &[Target::LOCALE, Target::ZONE]
    }
}

/// A duration given to `--reload-interval`.
#[derive(Clone, Copy, Debug)]
pub struct ReloadInterval(Duration);

impl std::str::FromStr for ReloadInterval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<ReloadInterval> {
        let duration: jiff::SignedDuration = s
            .parse()
            .with_context(|| format!("failed to parse `{s}` as a duration"))?;
        let duration = Duration::try_from(duration).with_context(|| {
            format!("reload interval `{s}` must not be negative")
        })?;
        Ok(ReloadInterval(duration))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Threads {
    count: Option<NonZero<usize>>,
}

impl Threads {
    pub const USAGE: Usage = Usage::flag(
        "-j, --threads <number>",
        "Control the number of threads used by this command.",
        r#"
Control the number of threads used by this command.

When not set, this command will query your system to determine the number of
available cores to use. With `1`, everything runs on the main thread.
"#,
    );

    /// Return the number of threads this command should use.
    ///
    /// If no flag was given, then the number of cores is queried here. If that
    /// fails, then a warning is logged and `1` is returned.
    pub fn get(&self) -> NonZero<usize> {
        if let Some(threads) = self.count {
            return threads;
        }
        match std::thread::available_parallelism() {
            Ok(available) => available,
            Err(err) => {
                log::warn!(
                    "failed to query available parallelism, \
                     falling back to single threaded mode: {err}",
                );
                NonZero::<usize>::MIN
            }
        }
    }
}

impl std::str::FromStr for Threads {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Threads> {
        let count: usize = s
            .parse()
            .with_context(|| format!("failed to parse `{s}` as an integer"))?;
        let count = NonZero::new(count).ok_or_else(|| {
            anyhow::anyhow!("number of threads must be greater than 0")
        })?;
        Ok(Threads { count: Some(count) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_interval() {
        let d: ReloadInterval = "30s".parse().unwrap();
        assert_eq!(d.0, Duration::from_secs(30));
        let d: ReloadInterval = "PT1M".parse().unwrap();
        assert_eq!(d.0, Duration::from_secs(60));
        assert!("-5s".parse::<ReloadInterval>().is_err());
        assert!("soon".parse::<ReloadInterval>().is_err());
    }

    #[test]
    fn bundle_cache_strategy() {
        let mut bundle = Bundle::default();
        assert_eq!(bundle.config().get_cache_strategy(), CacheStrategy::Shared);
        bundle.set_cache_strategy(CacheStrategy::Confined);
        assert_eq!(
            bundle.config().get_cache_strategy(),
            CacheStrategy::Confined,
        );
    }

    #[test]
    fn threads() {
        let t: Threads = "3".parse().unwrap();
        assert_eq!(t.get().get(), 3);
        assert!("0".parse::<Threads>().is_err());
        assert!("x".parse::<Threads>().is_err());
    }
}
