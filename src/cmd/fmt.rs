use std::io::Write;

use loctext::{
    DEFAULT_DATE_TIME_PATTERN, FormatKey, FormatterCache, SharedCache, Value,
};

use crate::args::{self, Usage, flags, positional};

const USAGE: &'static str = r#"
Format datetimes or numbers with a pattern.

This accepts one or more values as positional arguments. When no positional
arguments are given, then line delimited values are read from stdin.

USAGE:
    loctext fmt <value>...
    loctext fmt < line delimited <value>

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Format an instant in Tokyo with the month written out:

        $ loctext fmt -z Asia/Tokyo -p 'd MMMM yyyy HH:mm' 2024-06-15T12:30:00Z

    %snip-start%

    Format a civil datetime as wall clock time in your time zone, with German
    month and weekday names:

        $ loctext fmt -l de -p 'EEEE, d. MMMM yyyy' 2024-06-15T12:30

    Format numbers with French grouping:

        $ loctext fmt -n -l fr -p '#,##0.00' 1234567.891 42

    %snip-end%
REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    let mut target = flags::Target::default();
    let mut values = positional::Arguments::default();
    args::configure(
        p,
        USAGE,
        &mut [&mut config, &mut target, &mut values],
    )?;

    let key = if config.number {
        let pattern = config.pattern.as_deref().unwrap_or("");
        FormatKey::number(pattern, &target.locale())
    } else {
        let pattern =
            config.pattern.as_deref().unwrap_or(DEFAULT_DATE_TIME_PATTERN);
        FormatKey::new(pattern, &target.zone(), &target.locale())
    };
    // Build up front so that a bad pattern fails even without any input.
    let formatter = SharedCache::new().get(&key)?;

    let mut wtr = std::io::stdout().lock();
    let mut buf = String::new();
    values.try_map(|arg| {
        let value = Value::infer(arg.to_str()?);
        buf.clear();
        formatter.format_to(&value, &mut buf)?;
        writeln!(wtr, "{buf}")?;
        Ok(true)
    })?;
    Ok(())
}

#[derive(Debug, Default)]
struct Config {
    pattern: Option<String>,
    number: bool,
}

impl args::Configurable for Config {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Short('p') | lexopt::Arg::Long("pattern") => {
                self.pattern = Some(args::parse(p, "-p/--pattern")?);
            }
            lexopt::Arg::Short('n') | lexopt::Arg::Long("number") => {
                self.number = true;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const VALUE: Usage = Usage::arg(
            "<value>",
            "A datetime or number to format.",
            r#"
A datetime or number to format.

Datetimes may be RFC 3339 timestamps (`2024-06-15T12:30:00Z`), RFC 9557
timestamps (`2024-06-15T08:30:00-04:00[America/New_York]`) or civil datetimes
(`2024-06-15T12:30`), which are interpreted in the time zone given by
-z/--zone. Integers are interpreted as milliseconds since the Unix epoch.

With -n/--number, values must be integers or decimals.
"#,
        );

        const PATTERN: Usage = Usage::flag(
            "-p, --pattern <pattern>",
            "The pattern to format with.",
            r#"
The pattern to format with.

For datetimes, this is a pattern like `yyyy-MM-dd HH:mm:ss`, which is also the
default. Supported fields are `y` (year), `M` (month, `MMM` for a short name
and `MMMM` for a full name), `d` (day), `D` (day of year), `E` (weekday name),
`a` (AM/PM), `H` (hour 0-23), `h` (hour 1-12), `m` (minute), `s` (second),
`S` (fraction of a second), `z` (time zone abbreviation), `Z`, `X` and `x`
(offsets) and `VV` (time zone identifier). Text inside single quotes is copied
as is, and `''` is a single quote.

For numbers, this is a decimal pattern like `#,##0.00` or one of the named
styles `integer` or `percent`. The default is `#,##0.###`. A trailing `%`
multiplies by 100.
"#,
        );

        const NUMBER: Usage = Usage::flag(
            "-n, --number",
            "Format numbers instead of datetimes.",
            r#"
Format numbers instead of datetimes.

Numbers are formatted with the grouping separator and decimal separator of the
locale given by -l/--locale. The time zone is ignored.
"#,
        );

        &[VALUE, PATTERN, NUMBER]
    }
}
