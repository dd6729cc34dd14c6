use jiff::{Timestamp, Zoned, civil, tz::TimeZone};

use crate::error::{Error, Result};

/// A business value that can be handed to a formatter, a message or a
/// template.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Timestamp(Timestamp),
    Zoned(Zoned),
    DateTime(civil::DateTime),
}

/// A number extracted from a `Value`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Value {
    /// Guess the type of a value given as a string on the command line.
    ///
    /// Integers and decimals become numbers, RFC 3339 and RFC 9557
    /// timestamps become instants. Anything else is kept as a string.
    pub fn infer(s: &str) -> Value {
        if let Ok(n) = s.parse::<i64>() {
            return Value::Int(n);
        }
        if let Ok(n) = s.parse::<f64>() {
            if n.is_finite() {
                return Value::Float(n);
            }
        }
        if let Ok(zdt) = s.parse::<Zoned>() {
            return Value::Zoned(zdt);
        }
        if let Ok(ts) = s.parse::<Timestamp>() {
            return Value::Timestamp(ts);
        }
        Value::Str(s.to_string())
    }

    /// Convert a JSON value into a business value.
    ///
    /// Strings stay strings (they are only interpreted as datetimes when
    /// a datetime formatter asks for it). Booleans and `null` become their
    /// textual forms. Arrays and objects are rejected.
    pub fn from_json(json: &serde_json::Value) -> Result<Value> {
        use serde_json::Value as Json;

        match *json {
            Json::Null => Ok(Value::Str(String::new())),
            Json::Bool(b) => Ok(Value::Str(b.to_string())),
            Json::Number(ref n) => {
                if let Some(n) = n.as_i64() {
                    Ok(Value::Int(n))
                } else if let Some(n) = n.as_f64() {
                    Ok(Value::Float(n))
                } else {
                    Err(Error::argument(format!(
                        "number `{n}` is out of range"
                    )))
                }
            }
            Json::String(ref s) => Ok(Value::Str(s.clone())),
            Json::Array(_) | Json::Object(_) => Err(Error::argument(
                "arrays and objects are not supported as values",
            )),
        }
    }

    /// Interpret this value as a datetime in the given time zone.
    ///
    /// Instants and zoned datetimes are converted into the zone. Civil
    /// datetimes are interpreted as wall clock time in the zone. Integers
    /// are milliseconds since the Unix epoch.
    pub(crate) fn to_zoned(&self, tz: &TimeZone) -> Result<Zoned> {
        match *self {
            Value::Timestamp(ts) => Ok(ts.to_zoned(tz.clone())),
            Value::Zoned(ref zdt) => Ok(zdt.with_time_zone(tz.clone())),
            Value::DateTime(dt) => dt.to_zoned(tz.clone()).map_err(|err| {
                Error::argument(format!(
                    "civil datetime `{dt}` is not valid in time zone: {err}"
                ))
            }),
            Value::Int(millis) => Timestamp::from_millisecond(millis)
                .map(|ts| ts.to_zoned(tz.clone()))
                .map_err(|err| {
                    Error::argument(format!(
                        "`{millis}` is not a valid epoch millisecond: {err}"
                    ))
                }),
            Value::Float(n) => Err(Error::argument(format!(
                "decimal `{n}` cannot be formatted as a datetime"
            ))),
            Value::Str(ref s) => {
                if let Ok(ts) = s.parse::<Timestamp>() {
                    return Ok(ts.to_zoned(tz.clone()));
                }
                if let Ok(zdt) = s.parse::<Zoned>() {
                    return Ok(zdt.with_time_zone(tz.clone()));
                }
                let dt = s.parse::<civil::DateTime>().map_err(|_| {
                    Error::argument(format!(
                        "`{s}` is not a valid timestamp or datetime"
                    ))
                })?;
                Value::DateTime(dt).to_zoned(tz)
            }
        }
    }

    /// Interpret this value as a number.
    pub(crate) fn to_number(&self) -> Result<Number> {
        match *self {
            Value::Int(n) => Ok(Number::Int(n)),
            Value::Float(n) => Ok(Number::Float(n)),
            Value::Str(ref s) => {
                if let Ok(n) = s.trim().parse::<i64>() {
                    return Ok(Number::Int(n));
                }
                s.trim().parse::<f64>().map(Number::Float).map_err(|_| {
                    Error::argument(format!("`{s}` is not a valid number"))
                })
            }
            _ => Err(Error::argument(format!(
                "datetime `{self}` cannot be formatted as a number"
            ))),
        }
    }

    /// Returns true if this value is an instant or datetime.
    pub fn is_datetime(&self) -> bool {
        matches!(
            *self,
            Value::Timestamp(_) | Value::Zoned(_) | Value::DateTime(_)
        )
    }

    /// Returns true if this value is an integer or decimal.
    pub fn is_number(&self) -> bool {
        matches!(*self, Value::Int(_) | Value::Float(_))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Value::Str(ref s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Timestamp(ts) => write!(f, "{ts}"),
            Value::Zoned(ref zdt) => write!(f, "{zdt}"),
            Value::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Value {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Value {
        Value::Float(n)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Value {
        Value::Timestamp(ts)
    }
}

impl From<Zoned> for Value {
    fn from(zdt: Zoned) -> Value {
        Value::Zoned(zdt)
    }
}

impl From<civil::DateTime> for Value {
    fn from(dt: civil::DateTime) -> Value {
        Value::DateTime(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer() {
        assert_eq!(Value::infer("42"), Value::Int(42));
        assert_eq!(Value::infer("1.5"), Value::Float(1.5));
        assert_eq!(Value::infer("Ann"), Value::from("Ann"));
        assert!(Value::infer("2024-01-01T00:00:00Z").is_datetime());
        assert_eq!(Value::infer("inf"), Value::from("inf"));
    }

    #[test]
    fn epoch_millis_to_zoned() {
        let zdt = Value::Int(1_704_067_200_000)
            .to_zoned(&TimeZone::UTC)
            .unwrap();
        assert_eq!(zdt.timestamp().to_string(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn civil_string_is_wall_clock() {
        let tz = TimeZone::get("America/New_York").unwrap();
        let zdt = Value::from("2024-07-04T09:00:00").to_zoned(&tz).unwrap();
        assert_eq!(zdt.hour(), 9);
        assert_eq!(zdt.offset().seconds(), -4 * 60 * 60);
    }

    #[test]
    fn numbers() {
        assert_eq!(Value::from(" 7 ").to_number().unwrap(), Number::Int(7));
        assert!(Value::from("seven").to_number().is_err());
        let ts: Timestamp = "2024-01-01T00:00:00Z".parse().unwrap();
        assert!(Value::from(ts).to_number().is_err());
    }

    #[test]
    fn json() {
        let json = serde_json::json!({"a": 1, "b": 2.5, "c": "x", "d": [1]});
        assert_eq!(Value::from_json(&json["a"]).unwrap(), Value::Int(1));
        assert_eq!(Value::from_json(&json["b"]).unwrap(), Value::Float(2.5));
        assert_eq!(Value::from_json(&json["c"]).unwrap(), Value::from("x"));
        assert!(Value::from_json(&json["d"]).is_err());
    }
}
