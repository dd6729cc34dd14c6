use crate::{
    error::{Error, Result},
    key::{FormatKey, FormatKind},
    locale::Locale,
    value::Value,
};

use self::{date::DateTimeFormat, number::NumberFormat};

mod date;
mod number;

/// The pattern used when a datetime is formatted without an explicit one.
pub const DEFAULT_DATE_TIME_PATTERN: &str = "yyyy-MM-dd HH:mm:ss";
/// The pattern used for `date` placeholders without a style.
pub const DEFAULT_DATE_PATTERN: &str = "yyyy-MM-dd";
/// The pattern used for `time` placeholders without a style.
pub const DEFAULT_TIME_PATTERN: &str = "HH:mm:ss";

/// An immutable object that converts values to text according to the
/// configuration in a `FormatKey`.
///
/// Building a formatter compiles its pattern and resolves its time zone
/// and locale, which is comparatively expensive. Formatting is a pure read
/// of that configuration plus the input value, so a formatter can be shared
/// between any number of threads without synchronization. Two formatters
/// built from equal keys always produce identical output.
#[derive(Debug)]
pub struct Formatter {
    key: FormatKey,
    imp: Imp,
}

#[derive(Debug)]
enum Imp {
    DateTime(DateTimeFormat),
    Number(NumberFormat),
}

impl Formatter {
    /// Build a formatter for the given key.
    ///
    /// This fails when the pattern is malformed, or when the key's locale
    /// can no longer be resolved.
    pub fn new(key: &FormatKey) -> Result<Formatter> {
        let locale = Locale::parse(key.locale()).map_err(|err| {
            Error::construction(key.pattern(), err.to_string())
        })?;
        let imp = match key.kind() {
            FormatKind::DateTime => {
                let Some(zone) = key.time_zone() else {
                    return Err(Error::construction(
                        key.pattern(),
                        "datetime key has no time zone",
                    ));
                };
                Imp::DateTime(DateTimeFormat::new(
                    key.pattern(),
                    zone.get().clone(),
                    locale.names(),
                )?)
            }
            FormatKind::Number => Imp::Number(NumberFormat::new(
                key.pattern(),
                locale.number_symbols(),
            )?),
        };
        log::trace!("built formatter for {key}");
        Ok(Formatter { key: key.clone(), imp })
    }

    /// Returns the key this formatter was built from.
    pub fn key(&self) -> &FormatKey {
        &self.key
    }

    /// Format the given value.
    pub fn format(&self, value: &Value) -> Result<String> {
        let mut out = String::new();
        self.format_to(value, &mut out)?;
        Ok(out)
    }

    /// Format the given value by appending it to `out`.
    ///
    /// When this returns an error, `out` may contain a partially formatted
    /// value.
    pub fn format_to(&self, value: &Value, out: &mut String) -> Result<()> {
        match self.imp {
            Imp::DateTime(ref imp) => imp.format(value, out),
            Imp::Number(ref imp) => imp.format(value, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::{Timestamp, tz::TimeZone};

    use crate::zone::Zone;

    use super::*;

    fn en() -> Locale {
        Locale::parse("en").unwrap()
    }

    #[test]
    fn formats_instants_reused_across_inputs() {
        let key = FormatKey::new("yyyy-MM-dd HH:mm:ss", &Zone::utc(), &en());
        let formatter = Formatter::new(&key).unwrap();

        let ts: Timestamp = "2024-01-01T00:00:00Z".parse().unwrap();
        assert_eq!(formatter.format(&ts.into()).unwrap(), "2024-01-01 00:00:00");

        let ts: Timestamp = "2024-06-15T12:30:45Z".parse().unwrap();
        assert_eq!(formatter.format(&ts.into()).unwrap(), "2024-06-15 12:30:45");
    }

    #[test]
    fn formats_in_key_zone() {
        let zone = Zone::parse("Asia/Tokyo").unwrap();
        let key = FormatKey::new(DEFAULT_DATE_TIME_PATTERN, &zone, &en());
        let formatter = Formatter::new(&key).unwrap();
        let got = formatter.format(&Value::from("2024-01-01T00:00:00Z")).unwrap();
        assert_eq!(got, "2024-01-01 09:00:00");
    }

    #[test]
    fn number_formatter() {
        let de = Locale::parse("de-DE").unwrap();
        let formatter = Formatter::new(&FormatKey::number("", &de)).unwrap();
        assert_eq!(formatter.format(&Value::Float(1234.5)).unwrap(), "1.234,5");
        assert!(formatter.format(&Value::from("x")).is_err());
    }

    #[test]
    fn construction_errors() {
        let key = FormatKey::new("yyyy-qq", &Zone::utc(), &en());
        let err = Formatter::new(&key).unwrap_err();
        assert!(matches!(err, Error::FormatConstruction { .. }), "{err:?}");

        let key = FormatKey::number("#x#", &en());
        assert!(Formatter::new(&key).is_err());
    }

    /// Zones without a database name still format by their own rules, and
    /// two different ones never share a key.
    #[test]
    fn unnamed_zones() {
        let tokyo = tzif("JST", 9 * 60 * 60, "JST-9");
        let new_york = tzif("EST", -5 * 60 * 60, "EST5");
        let tokyo = Zone::from(TimeZone::tzif("", &tokyo).unwrap());
        let new_york =
            Zone::from(TimeZone::tzif("Local", &new_york).unwrap());

        let k1 = FormatKey::new("HH z", &tokyo, &en());
        let k2 = FormatKey::new("HH z", &new_york, &en());
        assert_ne!(k1, k2);

        let value = Value::from("2024-01-01T00:00:00Z");
        let f1 = Formatter::new(&k1).unwrap();
        let f2 = Formatter::new(&k2).unwrap();
        assert_eq!(f1.format(&value).unwrap(), "09 JST");
        assert_eq!(f2.format(&value).unwrap(), "19 EST");
    }

    /// Builds a TZif file with no transitions and a single local time type.
    fn tzif(abbrev: &str, offset: i32, posix: &str) -> Vec<u8> {
        let mut data = vec![];
        for _ in 0..2 {
            data.extend_from_slice(b"TZif2");
            data.extend_from_slice(&[0; 15]);
            let charcnt = u32::try_from(abbrev.len() + 1).unwrap();
            for count in [0, 0, 0, 0, 1, charcnt] {
                data.extend_from_slice(&count.to_be_bytes());
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
    fn equal_keys_give_equal_output() {
        let zone = Zone::parse("America/New_York").unwrap();
        let key = FormatKey::new("EEE d MMM yyyy HH:mm z", &zone, &en());
        let (f1, f2) = (Formatter::new(&key).unwrap(), Formatter::new(&key).unwrap());
        for ts in ["2024-03-10T06:59:59Z", "2024-03-10T07:00:00Z", "1999-12-31T23:59:59Z"] {
            let value = Value::from(ts);
            assert_eq!(f1.format(&value).unwrap(), f2.format(&value).unwrap());
        }
    }
}
