use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use arc_swap::ArcSwap;

use crate::{
    bundle::{BundleSource, MessageBundle},
    config::Config,
    error::Result,
};

/// A message bundle that can be replaced while it is being read.
///
/// Readers get a snapshot with `current` and keep using it for as long as
/// they like. A reload builds a complete new bundle and atomically swaps it
/// in. Snapshots taken before the swap are unaffected.
///
/// When the configuration has a reload interval and the source is a
/// directory, `current` re-reads the source once the interval has elapsed.
/// Only one caller performs a periodic reload at a time. Everyone else keeps
/// reading the previous snapshot in the meantime.
#[derive(Debug)]
pub struct ReloadableBundle {
    source: BundleSource,
    base_name: String,
    config: Config,
    current: ArcSwap<MessageBundle>,
    last_load: Mutex<Instant>,
}

impl ReloadableBundle {
    /// Load the bundle for the first time.
    ///
    /// Unlike a periodic reload, a failure here is returned.
    pub fn new(
        source: BundleSource,
        base_name: &str,
        config: Config,
    ) -> Result<ReloadableBundle> {
        let bundle = MessageBundle::load(&source, base_name, &config)?;
        Ok(ReloadableBundle {
            source,
            base_name: base_name.to_string(),
            config,
            current: ArcSwap::from_pointee(bundle),
            last_load: Mutex::new(Instant::now()),
        })
    }

    /// Returns a snapshot of the current bundle, reloading it first when
    /// the reload interval has elapsed.
    ///
    /// A failed periodic reload is logged and the previous snapshot stays
    /// in place.
    pub fn current(&self) -> Arc<MessageBundle> {
        if let Some(interval) = self.interval() {
            self.maybe_reload(interval);
        }
        self.current.load_full()
    }

    /// Reload the bundle from its source now, returning any error.
    ///
    /// On failure the previous snapshot stays in place.
    pub fn reload(&self) -> Result<()> {
        let bundle =
            MessageBundle::load(&self.source, &self.base_name, &self.config)?;
        self.current.store(Arc::new(bundle));
        if let Ok(mut last) = self.last_load.lock() {
            *last = Instant::now();
        }
        Ok(())
    }

    pub fn source(&self) -> &BundleSource {
        &self.source
    }

    fn interval(&self) -> Option<Duration> {
        if !self.source.is_reloadable() {
            return None;
        }
        self.config.get_reload_interval()
    }

    fn maybe_reload(&self, interval: Duration) {
        // Someone else is already checking or reloading.
        let Ok(mut last) = self.last_load.try_lock() else { return };
        if last.elapsed() < interval {
            return;
        }
        *last = Instant::now();
        match MessageBundle::load(&self.source, &self.base_name, &self.config)
        {
            Ok(bundle) => {
                log::info!(
                    "reloaded bundle `{}` from {}",
                    self.base_name,
                    self.source,
                );
                self.current.store(Arc::new(bundle));
            }
            Err(err) => {
                log::warn!(
                    "reloading bundle `{}` failed, keeping previous \
                     messages: {err}",
                    self.base_name,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::locale::Locale;

    use super::*;

    fn resolve(bundle: &MessageBundle, key: &str) -> String {
        let en = Locale::english();
        bundle.resolve(&en, key).unwrap().to_string()
    }

    #[test]
    fn periodic_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages_en.properties");
        std::fs::write(&path, "greeting = Hello\n").unwrap();

        let config = Config::new().reload_interval(Some(Duration::ZERO));
        let source = BundleSource::directory(dir.path());
        let bundle = ReloadableBundle::new(source, "messages", config).unwrap();
        let before = bundle.current();
        assert_eq!(resolve(&before, "greeting"), "Hello");

        std::fs::write(&path, "greeting = Howdy\n").unwrap();
        assert_eq!(resolve(&bundle.current(), "greeting"), "Howdy");
        // Old snapshots never change.
        assert_eq!(resolve(&before, "greeting"), "Hello");
    }

    #[test]
    fn failed_reload_keeps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages_en.properties");
        std::fs::write(&path, "greeting = Hello\n").unwrap();

        let config = Config::new().reload_interval(Some(Duration::ZERO));
        let source = BundleSource::directory(dir.path());
        let bundle = ReloadableBundle::new(source, "messages", config).unwrap();

        std::fs::write(&path, "greeting = Hello {0\n").unwrap();
        assert_eq!(resolve(&bundle.current(), "greeting"), "Hello");
        assert!(bundle.reload().is_err());
        assert_eq!(resolve(&bundle.current(), "greeting"), "Hello");
    }

    #[test]
    fn no_interval_means_no_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages_en.properties");
        std::fs::write(&path, "greeting = Hello\n").unwrap();

        let source = BundleSource::directory(dir.path());
        let bundle =
            ReloadableBundle::new(source, "messages", Config::new()).unwrap();
        std::fs::write(&path, "greeting = Howdy\n").unwrap();
        assert_eq!(resolve(&bundle.current(), "greeting"), "Hello");

        bundle.reload().unwrap();
        assert_eq!(resolve(&bundle.current(), "greeting"), "Howdy");
    }
}
