/*!
Localized message bundles.

A bundle is loaded once from a set of `.properties` files sharing a base
name. For base name `messages`, the file `messages.properties` holds the
root (locale independent) messages, and `messages_fr.properties`,
`messages_fr_CA.properties` and so on hold the messages for a locale.

Once loaded, a bundle is never mutated. Reloading means loading a new bundle
and swapping it in, which is what `ReloadableBundle` does.
*/

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    config::Config,
    error::{Error, Result},
    locale::Locale,
    message::{Args, FormatEnv, MessagePattern},
};

pub use self::reload::ReloadableBundle;

mod properties;
mod reload;

/// The file extension of resource files.
const EXTENSION: &str = "properties";

/// Where the resource files of a bundle come from.
#[derive(Clone, Debug)]
pub enum BundleSource {
    /// A directory on the file system. Only files directly inside of it are
    /// considered.
    Directory(PathBuf),
    /// File names paired with their contents, e.g., from `include_str!`.
    Embedded(Vec<(String, String)>),
}

impl BundleSource {
    /// Create a source from a directory.
    pub fn directory(path: impl Into<PathBuf>) -> BundleSource {
        BundleSource::Directory(path.into())
    }

    /// Create a source from in-memory files.
    pub fn embedded<N, C>(
        files: impl IntoIterator<Item = (N, C)>,
    ) -> BundleSource
    where
        N: Into<String>,
        C: Into<String>,
    {
        let files =
            files.into_iter().map(|(n, c)| (n.into(), c.into())).collect();
        BundleSource::Embedded(files)
    }

    /// Returns true when this source can change after it has been read.
    pub fn is_reloadable(&self) -> bool {
        matches!(*self, BundleSource::Directory(_))
    }

    /// Read every resource file for the given base name, returning each
    /// file's name and contents.
    fn read(&self, base_name: &str) -> Result<Vec<(String, String)>> {
        match *self {
            BundleSource::Embedded(ref files) => Ok(files
                .iter()
                .filter(|(name, _)| classify(base_name, name).is_some())
                .cloned()
                .collect()),
            BundleSource::Directory(ref dir) => read_dir(base_name, dir),
        }
    }
}

impl std::fmt::Display for BundleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            BundleSource::Directory(ref dir) => write!(f, "{}", dir.display()),
            BundleSource::Embedded(_) => f.write_str("<embedded>"),
        }
    }
}

fn read_dir(base_name: &str, dir: &Path) -> Result<Vec<(String, String)>> {
    let entries = std::fs::read_dir(dir).map_err(|err| {
        Error::load_io(base_name, dir.display(), "unreadable directory", err)
    })?;
    let mut files = vec![];
    for result in entries {
        let entry = result.map_err(|err| {
            Error::load_io(base_name, dir.display(), "unreadable entry", err)
        })?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            log::debug!(
                "skipping non-UTF-8 file name {:?}",
                entry.file_name()
            );
            continue;
        };
        if classify(base_name, &name).is_none() {
            continue;
        }
        let path = entry.path();
        let bytes = std::fs::read(&path).map_err(|err| {
            Error::load_io(base_name, path.display(), "unreadable file", err)
        })?;
        let contents = String::from_utf8(bytes).map_err(|err| {
            Error::load(
                base_name,
                path.display(),
                format!("file is not valid UTF-8: {err}"),
            )
        })?;
        files.push((name, contents));
    }
    Ok(files)
}

/// Returns the locale part of a resource file name: the empty string for
/// the root file, `fr_CA` for `<base>_fr_CA.properties`, or `None` when the
/// name doesn't belong to this base name.
fn locale_suffix<'n>(base_name: &str, file_name: &'n str) -> Option<&'n str> {
    let stem = file_name.strip_suffix(EXTENSION)?.strip_suffix('.')?;
    let rest = stem.strip_prefix(base_name)?;
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix('_').filter(|suffix| !suffix.is_empty())
}

/// What a resource file holds for a base name.
enum FileKind {
    /// `<base>.properties`.
    Root,
    /// `<base>_<locale>.properties`.
    Locale(Locale),
}

/// Classify a file name for a base name. Files belonging to other base
/// names are `None`, and so are files whose suffix is not a locale, like
/// `messages_v2.properties` next to `messages_en.properties`.
fn classify(base_name: &str, file_name: &str) -> Option<FileKind> {
    let suffix = locale_suffix(base_name, file_name)?;
    if suffix.is_empty() {
        return Some(FileKind::Root);
    }
    match Locale::parse(suffix) {
        // Languages in practice have two or three letter codes. Longer
        // subtags are syntactically valid but are almost always words.
        Ok(locale) if (2..=3).contains(&locale.language().len()) => {
            Some(FileKind::Locale(locale))
        }
        _ => {
            log::debug!(
                "skipping `{file_name}` for bundle `{base_name}`: \
                 `{suffix}` is not a locale",
            );
            None
        }
    }
}

/// The messages of one locale.
type Table = BTreeMap<String, MessagePattern>;

/// An immutable, locale indexed mapping from message keys to patterns.
///
/// Resolving a key tries the requested locale and each more general locale
/// (`fr-CA`, then `fr`), then the default locale and its more general
/// locales, and finally the root messages. When nothing matches, a strict
/// bundle reports an error while a lenient one returns the key itself.
#[derive(Debug)]
pub struct MessageBundle {
    base_name: String,
    /// Tables keyed by canonical locale. The root table has the empty key.
    tables: BTreeMap<Arc<str>, Table>,
    default_locale: Locale,
    strict: bool,
}

impl MessageBundle {
    /// Load every resource file for `base_name` from `source`.
    ///
    /// This fails when the source can't be read, when it contains no files
    /// for the base name, or when any file is malformed. A partially loaded
    /// bundle is never returned.
    pub fn load(
        source: &BundleSource,
        base_name: &str,
        config: &Config,
    ) -> Result<MessageBundle> {
        let files = source.read(base_name)?;
        let mut tables = BTreeMap::new();
        for (name, contents) in files.iter() {
            let canonical: Arc<str> = match classify(base_name, name) {
                None => continue,
                Some(FileKind::Root) => Arc::from(""),
                Some(FileKind::Locale(locale)) => {
                    Arc::clone(locale.canonical())
                }
            };
            let pairs = properties::parse(contents)
                .map_err(|msg| Error::load(base_name, name, msg))?;
            let table: &mut Table = tables.entry(canonical).or_default();
            for (key, text) in pairs {
                let pattern = MessagePattern::parse(&text).map_err(|msg| {
                    Error::load(
                        base_name,
                        name,
                        format!("malformed message `{key}`: {msg}"),
                    )
                })?;
                table.insert(key, pattern);
            }
        }
        if tables.is_empty() {
            return Err(Error::load(
                base_name,
                source,
                format!(
                    "no `{base_name}.{EXTENSION}` or \
                     `{base_name}_<locale>.{EXTENSION}` files found",
                ),
            ));
        }
        log::info!(
            "loaded bundle `{base_name}` from {source} with {} locale \
             table(s) and {} message(s)",
            tables.len(),
            tables.values().map(|t| t.len()).sum::<usize>(),
        );
        Ok(MessageBundle {
            base_name: base_name.to_string(),
            tables,
            default_locale: config.get_default_locale().clone(),
            strict: config.get_strict_missing_message(),
        })
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Returns the canonical locales that have a table, in sorted order.
    /// The root table is the empty string.
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|k| &**k)
    }

    /// Returns every message key defined in any table, in sorted order.
    pub fn keys(&self) -> BTreeSet<&str> {
        self.tables.values().flat_map(|t| t.keys()).map(|k| &**k).collect()
    }

    /// Returns the chain of canonical locales consulted for `locale`, ending
    /// with the root.
    pub fn resolution_chain(&self, locale: &Locale) -> Vec<Arc<str>> {
        let mut chain: Vec<Arc<str>> = vec![];
        let requested = locale.fallback_chain();
        let default = self.default_locale.fallback_chain();
        for loc in requested.iter().chain(default.iter()) {
            if !chain.iter().any(|c| c == loc.canonical()) {
                chain.push(Arc::clone(loc.canonical()));
            }
        }
        chain.push(Arc::from(""));
        chain
    }

    /// Find the pattern for `key`, returning the canonical locale of the
    /// table it was found in.
    pub fn lookup(
        &self,
        locale: &Locale,
        key: &str,
    ) -> Option<(&str, &MessagePattern)> {
        self.resolution_chain(locale).into_iter().find_map(|loc| {
            let (loc, table) = self.tables.get_key_value(&loc)?;
            table.get(key).map(|pattern| (&**loc, pattern))
        })
    }

    /// Resolve `key` to its pattern text.
    ///
    /// When no pattern exists anywhere in the chain, a strict bundle returns
    /// a `MissingMessage` error and a lenient one returns `key`.
    pub fn resolve<'a>(
        &'a self,
        locale: &Locale,
        key: &'a str,
    ) -> Result<&'a str> {
        match self.lookup(locale, key) {
            Some((_, pattern)) => Ok(pattern.as_str()),
            None => self.missing(locale, key).map(|()| key),
        }
    }

    /// Resolve `key` and substitute `args` into its pattern.
    ///
    /// Dates and numbers among the arguments are formatted with formatters
    /// taken from the store in `env`. When the key is missing in lenient
    /// mode, the key itself is the result.
    pub fn format(
        &self,
        locale: &Locale,
        key: &str,
        args: &Args,
        env: &FormatEnv<'_>,
    ) -> Result<String> {
        let mut out = String::new();
        self.format_to(locale, key, args, env, &mut out)?;
        Ok(out)
    }

    /// Like `format`, but appends to `out`.
    pub fn format_to(
        &self,
        locale: &Locale,
        key: &str,
        args: &Args,
        env: &FormatEnv<'_>,
        out: &mut String,
    ) -> Result<()> {
        match self.lookup(locale, key) {
            Some((_, pattern)) => pattern.format(args, env, out),
            None => {
                self.missing(locale, key)?;
                out.push_str(key);
                Ok(())
            }
        }
    }

    /// Returns the keys that, for `locale`, only resolve through the default
    /// locale or the root messages (or not at all).
    ///
    /// An empty result means every known key is translated for `locale` or
    /// one of its more general locales.
    pub fn untranslated(&self, locale: &Locale) -> Vec<&str> {
        let own: Vec<&Table> = locale
            .fallback_chain()
            .iter()
            .filter_map(|loc| self.tables.get(loc.canonical()))
            .collect();
        self.keys()
            .into_iter()
            .filter(|key| !own.iter().any(|table| table.contains_key(*key)))
            .collect()
    }

    fn missing(&self, locale: &Locale, key: &str) -> Result<()> {
        if self.strict {
            return Err(Error::MissingMessage {
                locale: locale.to_string(),
                key: key.to_string(),
            });
        }
        log::warn!(
            "no message for `{key}` in bundle `{}` for locale `{locale}`, \
             using the key as text",
            self.base_name,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{cache::SharedCache, zone::Zone};

    use super::*;

    fn locale(s: &str) -> Locale {
        Locale::parse(s).unwrap()
    }

    fn greeting_source() -> BundleSource {
        BundleSource::embedded([
            ("messages_en.properties", "greeting = Hello, {0}!\n"),
            ("messages_fr.properties", "farewell = Au revoir, {0} !\n"),
            ("messages.properties", "brand = loctext\n"),
            ("other_en.properties", "greeting = Not me\n"),
        ])
    }

    fn format(bundle: &MessageBundle, loc: &str, key: &str) -> Result<String> {
        let cache = SharedCache::new();
        let env = FormatEnv {
            zone: &Zone::utc(),
            locale: &locale(loc),
            cache: &cache,
        };
        bundle.format(&locale(loc), key, &Args::new().arg("Ann"), &env)
    }

    #[test]
    fn format_with_default_fallback() {
        let bundle =
            MessageBundle::load(&greeting_source(), "messages", &Config::new())
                .unwrap();
        assert_eq!(format(&bundle, "en", "greeting").unwrap(), "Hello, Ann!");
        assert_eq!(format(&bundle, "fr", "greeting").unwrap(), "Hello, Ann!");
        assert_eq!(
            format(&bundle, "fr-CA", "farewell").unwrap(),
            "Au revoir, Ann !"
        );
        assert_eq!(format(&bundle, "ja", "brand").unwrap(), "loctext");
    }

    #[test]
    fn strict_and_lenient_missing() {
        let lenient =
            MessageBundle::load(&greeting_source(), "messages", &Config::new())
                .unwrap();
        assert_eq!(lenient.resolve(&locale("de"), "nope").unwrap(), "nope");
        assert_eq!(format(&lenient, "de", "nope").unwrap(), "nope");

        let config = Config::new().strict_missing_message(true);
        let strict =
            MessageBundle::load(&greeting_source(), "messages", &config)
                .unwrap();
        let err = strict.resolve(&locale("de"), "nope").unwrap_err();
        assert!(err.is_missing_message(), "{err:?}");
        // The default locale still rescues a strict lookup.
        assert_eq!(format(&strict, "fr", "greeting").unwrap(), "Hello, Ann!");
    }

    #[test]
    fn strict_without_default_match() {
        let source = BundleSource::embedded([(
            "messages_en.properties",
            "greeting = Hello, {0}!\n",
        )]);
        let config = Config::new()
            .strict_missing_message(true)
            .default_locale(locale("de"));
        let bundle = MessageBundle::load(&source, "messages", &config).unwrap();
        let err = format(&bundle, "fr", "greeting").unwrap_err();
        assert!(err.is_missing_message());
    }

    #[test]
    fn general_locale_serves_specific_request() {
        let source = BundleSource::embedded([
            ("app_pt.properties", "yes = Sim\n"),
            ("app_pt_BR.properties", "no = Não\n"),
        ]);
        let bundle = MessageBundle::load(&source, "app", &Config::new()).unwrap();
        let (loc, pattern) = bundle.lookup(&locale("pt-BR"), "yes").unwrap();
        assert_eq!((loc, pattern.as_str()), ("pt", "Sim"));
        let (loc, _) = bundle.lookup(&locale("pt_BR"), "no").unwrap();
        assert_eq!(loc, "pt-BR");
        assert!(bundle.lookup(&locale("pt"), "no").is_none());
    }

    #[test]
    fn resolution_chain_dedupes() {
        let config = Config::new().default_locale(locale("en-GB"));
        let bundle =
            MessageBundle::load(&greeting_source(), "messages", &config)
                .unwrap();
        let chain: Vec<String> = bundle
            .resolution_chain(&locale("en-US"))
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(chain, vec!["en-US", "en", "en-GB", ""]);
    }

    #[test]
    fn untranslated_keys() {
        let bundle =
            MessageBundle::load(&greeting_source(), "messages", &Config::new())
                .unwrap();
        assert_eq!(bundle.untranslated(&locale("fr-CA")), vec!["brand", "greeting"]);
        assert_eq!(bundle.untranslated(&locale("en")), vec!["brand", "farewell"]);
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("messages_de.properties"),
            "greeting = Hallo, {0}!\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("README"), "ignored").unwrap();
        let source = BundleSource::directory(dir.path());
        let bundle =
            MessageBundle::load(&source, "messages", &Config::new()).unwrap();
        assert_eq!(bundle.locales().collect::<Vec<_>>(), vec!["de"]);
        assert_eq!(format(&bundle, "de-AT", "greeting").unwrap(), "Hallo, Ann!");
    }

    #[test]
    fn load_failures() {
        let config = Config::new();
        let is_load = |r: Result<MessageBundle>| {
            matches!(r, Err(Error::ResourceLoad { .. }))
        };

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let source = BundleSource::directory(&missing);
        assert!(is_load(MessageBundle::load(&source, "messages", &config)));

        let source = BundleSource::directory(dir.path());
        assert!(is_load(MessageBundle::load(&source, "messages", &config)));

        std::fs::write(
            dir.path().join("messages_en.properties"),
            b"greeting = \xFF\n",
        )
        .unwrap();
        assert!(is_load(MessageBundle::load(&source, "messages", &config)));

        let source = BundleSource::embedded([(
            "messages_en.properties",
            "greeting = Hello, {0\n",
        )]);
        assert!(is_load(MessageBundle::load(&source, "messages", &config)));

        let source = BundleSource::embedded([(
            "messages_not a locale.properties",
            "greeting = Hello\n",
        )]);
        assert!(is_load(MessageBundle::load(&source, "messages", &config)));
    }

    /// Files that share the base name but don't name a locale belong to
    /// something else and are left alone, even when they are unreadable.
    #[test]
    fn unrelated_suffixes_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, contents: &[u8]| {
            std::fs::write(dir.path().join(name), contents).unwrap();
        };
        write("messages_en.properties", b"greeting = Hello, {0}!\n");
        write("messages_de.properties", b"greeting = Hallo, {0}!\n");
        write("messages_v2.properties", b"greeting = \xFF\n");
        write("messages_errors.properties", b"oops = {0\n");

        let source = BundleSource::directory(dir.path());
        let bundle =
            MessageBundle::load(&source, "messages", &Config::new()).unwrap();
        assert_eq!(bundle.locales().collect::<Vec<_>>(), vec!["de", "en"]);
        assert_eq!(format(&bundle, "de", "greeting").unwrap(), "Hallo, Ann!");

        let source = BundleSource::embedded([
            ("messages.properties", "brand = loctext\n"),
            ("messages_v2.properties", "brand = {\n"),
        ]);
        let bundle =
            MessageBundle::load(&source, "messages", &Config::new()).unwrap();
        assert_eq!(bundle.locales().collect::<Vec<_>>(), vec![""]);
    }

    #[test]
    fn file_name_suffixes() {
        assert_eq!(locale_suffix("m", "m.properties"), Some(""));
        assert_eq!(locale_suffix("m", "m_fr_CA.properties"), Some("fr_CA"));
        assert_eq!(locale_suffix("m", "m_.properties"), None);
        assert_eq!(locale_suffix("m", "mx_fr.properties"), None);
        assert_eq!(locale_suffix("m", "m_fr.txt"), None);
    }
}
