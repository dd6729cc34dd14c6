use std::sync::{Arc, LazyLock, Mutex};

use jiff::fmt::{StdFmtWrite, temporal};

use crate::error::{Error, Result};

static PARSER: temporal::DateTimeParser = temporal::DateTimeParser::new();
static PRINTER: temporal::DateTimePrinter = temporal::DateTimePrinter::new();

/// A time zone along with its canonical textual form.
///
/// The canonical form is what participates in formatter cache keys. It is
/// computed once when the zone is created, so that building a key is just a
/// reference count bump. Two zones that print the same way (for example,
/// `utc` and `UTC`) compare equal. Zones without a name that the time zone
/// database recognizes are numbered by their rules, and print as
/// `<unnamed zone N>`.
#[derive(Clone, Debug)]
pub struct Zone {
    tz: jiff::tz::TimeZone,
    canonical: Arc<str>,
}

impl Zone {
    /// The UTC time zone.
    pub fn utc() -> Zone {
        Zone::from(jiff::tz::TimeZone::UTC)
    }

    /// The time zone of the system, as detected by Jiff. (It honors the
    /// `TZ` environment variable.)
    pub fn system() -> Zone {
        static SYSTEM: LazyLock<Zone> =
            LazyLock::new(|| Zone::from(jiff::tz::TimeZone::system()));
        SYSTEM.clone()
    }

    /// Parse an IANA time zone identifier (`America/New_York`), a fixed
    /// offset (`+05:30`), a POSIX time zone string or the special string
    /// `system`.
    pub fn parse(s: &str) -> Result<Zone> {
        if s == "system" {
            return Ok(Zone::system());
        }
        let tz = PARSER.parse_time_zone(s).map_err(|err| {
            Error::argument(format!("invalid time zone `{s}`: {err}"))
        })?;
        Ok(Zone::from(tz))
    }

    /// Returns the underlying Jiff time zone.
    pub fn get(&self) -> &jiff::tz::TimeZone {
        &self.tz
    }

    /// Returns the canonical form of this time zone.
    pub fn canonical(&self) -> &Arc<str> {
        &self.canonical
    }
}

impl From<jiff::tz::TimeZone> for Zone {
    fn from(tz: jiff::tz::TimeZone) -> Zone {
        let canonical = match name(&tz) {
            Some(name) => Arc::from(name),
            None => Arc::from(format!("<unnamed zone {}>", unnamed_id(&tz))),
        };
        Zone { tz, canonical }
    }
}

/// Returns a name that identifies this zone's rules, if one exists.
///
/// A TZif zone can carry any name at all (or none, as with a copied
/// `/etc/localtime`), so its name is only trusted when the time zone
/// database maps it to the same rules.
fn name(tz: &jiff::tz::TimeZone) -> Option<String> {
    if let Some(name) = tz.iana_name() {
        let known = *tz == jiff::tz::TimeZone::UTC
            || jiff::tz::TimeZone::get(name).is_ok_and(|db| db == *tz);
        return known.then(|| name.to_string());
    }
    let mut buf = String::new();
    PRINTER.print_time_zone(tz, StdFmtWrite(&mut buf)).ok()?;
    (!buf.is_empty()).then_some(buf)
}

/// Returns a process wide number for a zone without a usable name. Equal
/// zones get the same number.
fn unnamed_id(tz: &jiff::tz::TimeZone) -> usize {
    static UNNAMED: Mutex<Vec<jiff::tz::TimeZone>> = Mutex::new(Vec::new());

    let mut unnamed = UNNAMED.lock().unwrap_or_else(|err| err.into_inner());
    if let Some(i) = unnamed.iter().position(|known| known == tz) {
        return i + 1;
    }
    unnamed.push(tz.clone());
    log::debug!("time zone {tz:?} has no name, using #{}", unnamed.len());
    unnamed.len()
}

impl Eq for Zone {}

impl PartialEq for Zone {
    fn eq(&self, rhs: &Zone) -> bool {
        self.canonical == rhs.canonical
    }
}

impl std::hash::Hash for Zone {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl std::str::FromStr for Zone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Zone> {
        Zone::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_iana() {
        let zone = Zone::parse("America/New_York").unwrap();
        assert_eq!(&**zone.canonical(), "America/New_York");
    }

    #[test]
    fn canonical_utc() {
        assert_eq!(Zone::parse("UTC").unwrap(), Zone::utc());
        assert_eq!(&**Zone::utc().canonical(), "UTC");
    }

    #[test]
    fn canonical_offset() {
        let zone = Zone::parse("+05:30").unwrap();
        assert_eq!(&**zone.canonical(), "+05:30");
    }

    /// Builds a TZif file with no transitions and a single local time type.
    fn tzif(abbrev: &str, offset: i32, posix: &str) -> Vec<u8> {
        let mut data = vec![];
        for _ in 0..2 {
            data.extend_from_slice(b"TZif2");
            data.extend_from_slice(&[0; 15]);
            let charcnt = u32::try_from(abbrev.len() + 1).unwrap();
            // isutcnt, isstdcnt, leapcnt, timecnt, typecnt, charcnt
            for count in [0, 0, 0, 0, 1, charcnt] {
                data.extend_from_slice(&u32::to_be_bytes(count));
            }
            data.extend_from_slice(&offset.to_be_bytes());
            data.extend_from_slice(&[0, 0]);
            data.extend_from_slice(abbrev.as_bytes());
            data.push(0);
        }
        data.extend_from_slice(format!("\n{posix}\n").as_bytes());
        data
    }

    #[test]
    fn unnamed_zones() {
        let tokyo = tzif("JST", 9 * 60 * 60, "JST-9");
        let new_york = tzif("EST", -5 * 60 * 60, "EST5");

        let t1 = Zone::from(jiff::tz::TimeZone::tzif("", &tokyo).unwrap());
        let t2 = Zone::from(jiff::tz::TimeZone::tzif("", &tokyo).unwrap());
        let ny = Zone::from(jiff::tz::TimeZone::tzif("", &new_york).unwrap());
        assert_eq!(t1, t2);
        assert_ne!(t1, ny);
        assert!(t1.canonical().starts_with("<unnamed zone "), "{t1}");

        // A name the database doesn't know, or knows with other rules, is
        // not trusted either.
        let local =
            Zone::from(jiff::tz::TimeZone::tzif("Local", &tokyo).unwrap());
        assert!(local.canonical().starts_with("<unnamed zone "), "{local}");
        let fake = jiff::tz::TimeZone::tzif("Asia/Tokyo", &new_york).unwrap();
        let fake = Zone::from(fake);
        assert!(fake.canonical().starts_with("<unnamed zone "), "{fake}");
        assert_ne!(fake, Zone::parse("Asia/Tokyo").unwrap());
    }

    #[test]
    fn invalid() {
        assert!(Zone::parse("Not/A_Zone").is_err());
    }
}
