use crate::{
    error::{Error, Result},
    locale::NumberSymbols,
    value::{Number, Value},
};

/// A compiled decimal pattern like `#,##0.###` bound to locale symbols.
#[derive(Debug)]
pub(crate) struct NumberFormat {
    grouping: bool,
    min_int: usize,
    min_frac: usize,
    max_frac: usize,
    percent: bool,
    symbols: &'static NumberSymbols,
}

impl NumberFormat {
    /// Compile a decimal pattern.
    ///
    /// Besides explicit patterns made of `#`, `0`, `,`, `.` and a trailing
    /// `%`, this accepts the named styles `integer` and `percent`. The
    /// empty pattern means `#,##0.###`.
    pub(crate) fn new(
        pattern: &str,
        symbols: &'static NumberSymbols,
    ) -> Result<NumberFormat> {
        let expanded = match pattern.trim() {
            "" | "number" => "#,##0.###",
            "integer" => "#,##0",
            "percent" => "#,##0%",
            other => other,
        };
        let (body, percent) = match expanded.strip_suffix('%') {
            Some(body) => (body, true),
            None => (expanded, false),
        };
        if body.is_empty() {
            return Err(Error::construction(pattern, "empty number pattern"));
        }
        if let Some(bad) =
            body.chars().find(|&c| !matches!(c, '#' | '0' | ',' | '.'))
        {
            return Err(Error::construction(
                pattern,
                format!("unsupported character `{bad}` in number pattern"),
            ));
        }
        let (int, frac) = match body.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (body, ""),
        };
        if frac.contains(['.', ',']) {
            return Err(Error::construction(
                pattern,
                "fraction part may only contain `0` and `#`",
            ));
        }
        let min_frac = frac.chars().take_while(|&c| c == '0').count();
        if frac[min_frac..].contains('0') {
            return Err(Error::construction(
                pattern,
                "`0` may not follow `#` in the fraction part",
            ));
        }
        Ok(NumberFormat {
            grouping: int.contains(','),
            min_int: int.chars().filter(|&c| c == '0').count(),
            min_frac,
            max_frac: frac.len(),
            percent,
            symbols,
        })
    }

    pub(crate) fn format(
        &self,
        value: &Value,
        out: &mut String,
    ) -> Result<()> {
        let (negative, int, frac) = match value.to_number()? {
            Number::Int(n) if !self.percent => {
                (n < 0, n.unsigned_abs().to_string(), String::new())
            }
            Number::Int(n) => match n.checked_mul(100) {
                Some(n) => {
                    (n < 0, n.unsigned_abs().to_string(), String::new())
                }
                None => self.split(n as f64 * 100.0),
            },
            Number::Float(n) if !n.is_finite() => {
                out.push_str(if n.is_nan() {
                    "NaN"
                } else if n < 0.0 {
                    "-∞"
                } else {
                    "∞"
                });
                return Ok(());
            }
            Number::Float(n) if self.percent => self.split(n * 100.0),
            Number::Float(n) => self.split(n),
        };
        let mut frac = frac;
        while frac.len() < self.min_frac {
            frac.push('0');
        }
        if negative {
            out.push(self.symbols.minus);
        }
        // A pattern without required integer digits drops a zero integer
        // part, but only when a fraction follows. Zero itself is `0`.
        let int = if int == "0" && self.min_int == 0 && !frac.is_empty() {
            ""
        } else {
            &int
        };
        for _ in int.len()..self.min_int {
            out.push('0');
        }
        for (i, digit) in int.chars().enumerate() {
            let remaining = int.len() - i;
            if self.grouping && i > 0 && remaining % 3 == 0 {
                out.push(self.symbols.group);
            }
            out.push(digit);
        }
        if !frac.is_empty() {
            out.push(self.symbols.decimal);
            out.push_str(&frac);
        }
        if self.percent {
            out.push(self.symbols.percent);
        }
        Ok(())
    }

    /// Rounds `n` to the maximum number of fraction digits and splits it
    /// into a sign, integer digits and fraction digits. Trailing zeros in
    /// the fraction are dropped.
    fn split(&self, n: f64) -> (bool, String, String) {
        let rounded = format!("{:.*}", self.max_frac, n.abs());
        let (int, frac) = match rounded.split_once('.') {
            Some((int, frac)) => (int, frac.trim_end_matches('0')),
            None => (rounded.as_str(), ""),
        };
        let is_zero = int.chars().chain(frac.chars()).all(|c| c == '0');
        (n < 0.0 && !is_zero, int.to_string(), frac.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(pattern: &str, language: &str, value: impl Into<Value>) -> String {
        let symbols = NumberSymbols::for_language(language);
        let format = NumberFormat::new(pattern, symbols).unwrap();
        let mut out = String::new();
        format.format(&value.into(), &mut out).unwrap();
        out
    }

    #[test]
    fn default_pattern() {
        assert_eq!(fmt("", "en", 1234567.891), "1,234,567.891");
        assert_eq!(fmt("", "en", 2.71828), "2.718");
        assert_eq!(fmt("", "en", 1234567), "1,234,567");
        assert_eq!(fmt("", "en", -1234), "-1,234");
        assert_eq!(fmt("", "en", 0.5), "0.5");
        assert_eq!(fmt("", "en", 0), "0");
        assert_eq!(fmt("", "en", -0.0001), "0");
    }

    #[test]
    fn localized_separators() {
        assert_eq!(fmt("", "de", 1234567.5), "1.234.567,5");
        assert_eq!(fmt("", "fr", 1234567.5), "1\u{202F}234\u{202F}567,5");
        assert_eq!(fmt("", "ja", 1234567.5), "1,234,567.5");
    }

    #[test]
    fn named_styles() {
        assert_eq!(fmt("integer", "en", 1234.4), "1,234");
        assert_eq!(fmt("integer", "en", 1235.5), "1,236");
        assert_eq!(fmt("percent", "en", 0.256), "26%");
        assert_eq!(fmt("percent", "en", 3), "300%");
        assert_eq!(fmt("percent", "en", -2), "-200%");
        // Integers are scaled exactly, without a detour through floats.
        assert_eq!(
            fmt("percent", "en", 92_233_720_368_547_758i64),
            "9,223,372,036,854,775,800%",
        );
        assert!(fmt("percent", "en", i64::MAX).ends_with('%'));
    }

    #[test]
    fn explicit_patterns() {
        assert_eq!(fmt("0.00", "en", 2.34567), "2.35");
        assert_eq!(fmt("0.00", "en", 1234), "1234.00");
        assert_eq!(fmt("000", "en", 7), "007");
        assert_eq!(fmt("#.##", "en", 0.5), ".5");
        assert_eq!(fmt("#.##", "en", 0), "0");
        assert_eq!(fmt("#.##", "en", 0.001), "0");
        assert_eq!(fmt("#", "en", 0), "0");
        assert_eq!(fmt("#.00", "en", 0), ".00");
        assert_eq!(fmt("#,##0.0#", "de", 1234.5), "1.234,5");
    }

    #[test]
    fn malformed() {
        let symbols = NumberSymbols::for_language("en");
        assert!(NumberFormat::new("#,##0.##0", symbols).is_err());
        assert!(NumberFormat::new("abc", symbols).is_err());
        assert!(NumberFormat::new("%", symbols).is_err());
        assert!(NumberFormat::new("0.0.0", symbols).is_err());
    }

    #[test]
    fn non_numbers() {
        let symbols = NumberSymbols::for_language("en");
        let format = NumberFormat::new("", symbols).unwrap();
        let mut out = String::new();
        assert!(format.format(&Value::from("abc"), &mut out).is_err());
    }
}
