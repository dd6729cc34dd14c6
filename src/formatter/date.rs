use std::fmt::Write;

use jiff::{Zoned, fmt::strtime::BrokenDownTime, tz::TimeZone};

use crate::{
    error::{Error, Result},
    locale::Names,
    value::Value,
};

/// A compiled datetime pattern bound to a time zone and a set of localized
/// names.
#[derive(Debug)]
pub(crate) struct DateTimeFormat {
    items: Vec<Item>,
    tz: TimeZone,
    names: &'static Names,
}

/// A single field (or literal) of a compiled datetime pattern.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Item {
    Literal(Box<str>),
    Year { width: usize },
    TwoDigitYear,
    Month { width: usize },
    MonthName { short: bool },
    Day { width: usize },
    DayOfYear { width: usize },
    WeekdayName { short: bool },
    AmPm,
    /// 0-23.
    Hour { width: usize },
    /// 1-24.
    HourOneBased { width: usize },
    /// 1-12.
    ClockHour { width: usize },
    /// 0-11.
    ClockHourZeroBased { width: usize },
    Minute { width: usize },
    Second { width: usize },
    Fraction { digits: usize },
    ZoneAbbreviation,
    ZoneId,
    Offset(OffsetStyle),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum OffsetStyle {
    /// `+HHMM`.
    Basic,
    /// `GMT+HH:MM`, or just `GMT` for a zero offset.
    Gmt,
    /// `+HH` when minutes are zero, otherwise `+HHMM`.
    IsoHour { zulu: bool },
    /// `+HHMM`.
    IsoBasic { zulu: bool },
    /// `+HH:MM`.
    IsoExtended { zulu: bool },
}

impl DateTimeFormat {
    pub(crate) fn new(
        pattern: &str,
        tz: TimeZone,
        names: &'static Names,
    ) -> Result<DateTimeFormat> {
        let items = compile(pattern)?;
        Ok(DateTimeFormat { items, tz, names })
    }

    pub(crate) fn format(
        &self,
        value: &Value,
        out: &mut String,
    ) -> Result<()> {
        let zdt = value.to_zoned(&self.tz)?;
        for item in self.items.iter() {
            self.format_item(item, &zdt, out)?;
        }
        Ok(())
    }

    fn format_item(
        &self,
        item: &Item,
        zdt: &Zoned,
        out: &mut String,
    ) -> Result<()> {
        match *item {
            Item::Literal(ref s) => out.push_str(s),
            Item::Year { width } => push_num(out, zdt.year(), width),
            Item::TwoDigitYear => {
                push_num(out, i64::from(zdt.year()).rem_euclid(100), 2)
            }
            Item::Month { width } => push_num(out, zdt.month(), width),
            Item::MonthName { short } => {
                let index = usize::try_from(zdt.month() - 1).unwrap_or(0);
                let names = if short {
                    &self.names.months_short
                } else {
                    &self.names.months
                };
                out.push_str(names[index]);
            }
            Item::Day { width } => push_num(out, zdt.day(), width),
            Item::DayOfYear { width } => {
                push_num(out, zdt.day_of_year(), width)
            }
            Item::WeekdayName { short } => {
                let index = usize::try_from(
                    zdt.weekday().to_monday_zero_offset(),
                )
                .unwrap_or(0);
                let names = if short {
                    &self.names.weekdays_short
                } else {
                    &self.names.weekdays
                };
                out.push_str(names[index]);
            }
            Item::AmPm => {
                let marker = if zdt.hour() < 12 {
                    self.names.am
                } else {
                    self.names.pm
                };
                out.push_str(marker);
            }
            Item::Hour { width } => push_num(out, zdt.hour(), width),
            Item::HourOneBased { width } => {
                let hour = if zdt.hour() == 0 { 24 } else { zdt.hour() };
                push_num(out, hour, width)
            }
            Item::ClockHour { width } => {
                let hour = match zdt.hour() % 12 {
                    0 => 12,
                    hour => hour,
                };
                push_num(out, hour, width)
            }
            Item::ClockHourZeroBased { width } => {
                push_num(out, zdt.hour() % 12, width)
            }
            Item::Minute { width } => push_num(out, zdt.minute(), width),
            Item::Second { width } => push_num(out, zdt.second(), width),
            Item::Fraction { digits } => {
                let nanos = i64::from(zdt.subsec_nanosecond());
                let exp = u32::try_from(9 - digits).unwrap_or(0);
                push_num(out, nanos / 10i64.pow(exp), digits)
            }
            Item::ZoneAbbreviation => {
                let tm = BrokenDownTime::from(zdt);
                let abbrev = tm.to_string("%Z").map_err(|err| {
                    Error::argument(format!(
                        "failed to find time zone abbreviation: {err}"
                    ))
                })?;
                out.push_str(&abbrev);
            }
            Item::ZoneId => match zdt.time_zone().iana_name() {
                Some(name) => out.push_str(name),
                None => push_offset(
                    out,
                    zdt.offset().seconds(),
                    OffsetStyle::IsoExtended { zulu: false },
                ),
            },
            Item::Offset(style) => {
                push_offset(out, zdt.offset().seconds(), style)
            }
        }
        Ok(())
    }
}

/// Compiles a datetime pattern like `yyyy-MM-dd HH:mm:ss` into a sequence
/// of items.
///
/// ASCII letters are pattern fields, where the number of repetitions
/// selects the width or form. Text between single quotes is literal and
/// `''` is a literal single quote. Every other character is literal.
fn compile(pattern: &str) -> Result<Vec<Item>> {
    let mut items = vec![];
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\'' {
            if chars.next_if_eq(&'\'').is_some() {
                literal.push('\'');
                continue;
            }
            let mut closed = false;
            while let Some(ch) = chars.next() {
                if ch == '\'' {
                    if chars.next_if_eq(&'\'').is_some() {
                        literal.push('\'');
                        continue;
                    }
                    closed = true;
                    break;
                }
                literal.push(ch);
            }
            if !closed {
                return Err(Error::construction(
                    pattern,
                    "unterminated quoted literal",
                ));
            }
            continue;
        }
        if !ch.is_ascii_alphabetic() {
            literal.push(ch);
            continue;
        }
        let mut count = 1;
        while chars.next_if_eq(&ch).is_some() {
            count += 1;
        }
        if !literal.is_empty() {
            items.push(Item::Literal(Box::from(std::mem::take(&mut literal))));
        }
        items.push(field(pattern, ch, count)?);
    }
    if !literal.is_empty() {
        items.push(Item::Literal(Box::from(literal)));
    }
    Ok(items)
}

fn field(pattern: &str, letter: char, count: usize) -> Result<Item> {
    let too_many = || {
        Error::construction(
            pattern,
            format!(
                "too many pattern letters: `{letter}` repeated {count} times"
            ),
        )
    };
    let numeric =
        |max: usize| if count > max { Err(too_many()) } else { Ok(count) };
    let item = match letter {
        'y' | 'u' if count == 2 => Item::TwoDigitYear,
        'y' | 'u' => Item::Year { width: count },
        'M' | 'L' => match count {
            1 | 2 => Item::Month { width: count },
            3 => Item::MonthName { short: true },
            4 => Item::MonthName { short: false },
            _ => return Err(too_many()),
        },
        'd' => Item::Day { width: numeric(2)? },
        'D' => Item::DayOfYear { width: numeric(3)? },
        'E' => match count {
            1..=3 => Item::WeekdayName { short: true },
            4 => Item::WeekdayName { short: false },
            _ => return Err(too_many()),
        },
        'a' => {
            numeric(1)?;
            Item::AmPm
        }
        'H' => Item::Hour { width: numeric(2)? },
        'k' => Item::HourOneBased { width: numeric(2)? },
        'h' => Item::ClockHour { width: numeric(2)? },
        'K' => Item::ClockHourZeroBased { width: numeric(2)? },
        'm' => Item::Minute { width: numeric(2)? },
        's' => Item::Second { width: numeric(2)? },
        'S' => Item::Fraction { digits: numeric(9)? },
        'z' => {
            numeric(4)?;
            Item::ZoneAbbreviation
        }
        'V' if count == 2 => Item::ZoneId,
        'V' => {
            return Err(Error::construction(
                pattern,
                "pattern letter `V` must be repeated exactly twice",
            ));
        }
        'Z' => match count {
            1..=3 => Item::Offset(OffsetStyle::Basic),
            4 => Item::Offset(OffsetStyle::Gmt),
            5 => Item::Offset(OffsetStyle::IsoExtended { zulu: true }),
            _ => return Err(too_many()),
        },
        'X' | 'x' => {
            let zulu = letter == 'X';
            match count {
                1 => Item::Offset(OffsetStyle::IsoHour { zulu }),
                2 => Item::Offset(OffsetStyle::IsoBasic { zulu }),
                3 => Item::Offset(OffsetStyle::IsoExtended { zulu }),
                _ => return Err(too_many()),
            }
        }
        _ => {
            return Err(Error::construction(
                pattern,
                format!("unknown pattern letter `{letter}`"),
            ));
        }
    };
    Ok(item)
}

fn push_num(out: &mut String, n: impl Into<i64>, width: usize) {
    let n = n.into();
    // Writing to a `String` never fails.
    let _ = write!(out, "{n:0width$}");
}

fn push_offset(out: &mut String, seconds: i32, style: OffsetStyle) {
    let sign = if seconds < 0 { '-' } else { '+' };
    let total_minutes = seconds.unsigned_abs() / 60;
    let (hours, minutes) = (total_minutes / 60, total_minutes % 60);
    let _ = match style {
        OffsetStyle::IsoHour { zulu: true }
        | OffsetStyle::IsoBasic { zulu: true }
        | OffsetStyle::IsoExtended { zulu: true }
            if total_minutes == 0 =>
        {
            write!(out, "Z")
        }
        OffsetStyle::Gmt if total_minutes == 0 => write!(out, "GMT"),
        OffsetStyle::Gmt => write!(out, "GMT{sign}{hours:02}:{minutes:02}"),
        OffsetStyle::Basic | OffsetStyle::IsoBasic { .. } => {
            write!(out, "{sign}{hours:02}{minutes:02}")
        }
        OffsetStyle::IsoHour { .. } if minutes == 0 => {
            write!(out, "{sign}{hours:02}")
        }
        OffsetStyle::IsoHour { .. } => {
            write!(out, "{sign}{hours:02}{minutes:02}")
        }
        OffsetStyle::IsoExtended { .. } => {
            write!(out, "{sign}{hours:02}:{minutes:02}")
        }
    };
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use crate::locale::Names;

    use super::*;

    fn fmt(pattern: &str, tz: &str, language: &str, ts: &str) -> String {
        let tz = TimeZone::get(tz).unwrap();
        let names = Names::for_language(language);
        let format = DateTimeFormat::new(pattern, tz, names).unwrap();
        let ts: Timestamp = ts.parse().unwrap();
        let mut out = String::new();
        format.format(&Value::from(ts), &mut out).unwrap();
        out
    }

    #[test]
    fn numeric_fields() {
        let got = fmt("yyyy-MM-dd HH:mm:ss", "UTC", "en", "2024-06-15T12:30:45Z");
        assert_eq!(got, "2024-06-15 12:30:45");

        let got = fmt("y/M/d H:m:s", "UTC", "en", "2024-01-02T03:04:05Z");
        assert_eq!(got, "2024/1/2 3:4:5");

        let got = fmt("yy DDD", "UTC", "en", "2024-02-01T00:00:00Z");
        assert_eq!(got, "24 032");
    }

    #[test]
    fn clock_hours() {
        let got = fmt("h:mm a", "UTC", "en", "2024-06-15T00:05:00Z");
        assert_eq!(got, "12:05 AM");
        let got = fmt("hh:mm a|K|k", "UTC", "en", "2024-06-15T13:05:00Z");
        assert_eq!(got, "01:05 PM|1|13");
        let got = fmt("k", "UTC", "en", "2024-06-15T00:00:00Z");
        assert_eq!(got, "24");
    }

    #[test]
    fn fractions() {
        let got = fmt("ss.SSS", "UTC", "en", "2024-06-15T00:00:07.123456789Z");
        assert_eq!(got, "07.123");
        let got = fmt("SSSSSSSSS", "UTC", "en", "2024-06-15T00:00:07.000000042Z");
        assert_eq!(got, "000000042");
    }

    #[test]
    fn names_are_localized() {
        let ts = "2024-06-15T12:00:00Z";
        assert_eq!(
            fmt("EEEE, d MMMM yyyy", "UTC", "en", ts),
            "Saturday, 15 June 2024"
        );
        assert_eq!(fmt("EEEE, d. MMMM yyyy", "UTC", "de", ts), "Samstag, 15. Juni 2024");
        assert_eq!(fmt("EEE d MMM", "UTC", "fr", ts), "sam. 15 juin");
        // Languages without a table get English names.
        assert_eq!(fmt("MMM", "UTC", "ja", ts), "Jun");
    }

    #[test]
    fn zones_and_offsets() {
        let ts = "2024-07-20T20:30:55Z";
        let ny = "America/New_York";
        assert_eq!(fmt("HH:mm z", ny, "en", ts), "16:30 EDT");
        assert_eq!(fmt("Z|ZZZZ|ZZZZZ", ny, "en", ts), "-0400|GMT-04:00|-04:00");
        assert_eq!(fmt("X|XX|XXX", ny, "en", ts), "-04|-0400|-04:00");
        assert_eq!(fmt("X|xxx|ZZZZ", "UTC", "en", ts), "Z|+00:00|GMT");
        assert_eq!(fmt("VV", ny, "en", ts), "America/New_York");
        assert_eq!(fmt("x", "Asia/Kolkata", "en", ts), "+0530");
    }

    #[test]
    fn literals() {
        let got = fmt("'at' HH 'o''clock' ''", "UTC", "en", "2024-06-15T09:00:00Z");
        assert_eq!(got, "at 09 o'clock '");
        let got = fmt("yyyy%MM", "UTC", "en", "2024-06-15T09:00:00Z");
        assert_eq!(got, "2024%06");
    }

    #[test]
    fn malformed() {
        assert!(compile("yyyy-MM-dd 'oops").is_err());
        assert!(compile("yyyy-qq").is_err());
        assert!(compile("ddd").is_err());
        assert!(compile("V").is_err());
        assert!(compile("MMMMM").is_err());
        assert!(compile("").unwrap().is_empty());
    }
}
