use {anyhow::Context, lexopt::ValueExt};

use crate::{
    args::{Configurable, Usage},
    parse::{BufReadExt, Line},
};

/// Arguments read either as positional arguments on the CLI, or as line
/// delimited data on `stdin`.
///
/// This greedily consumes all remaining positional arguments. When there are
/// _zero_ positional arguments, lines are read from stdin instead.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    positional: Vec<String>,
}

impl Arguments {
    /// Run the given function over each argument.
    ///
    /// The argument given to the closure is either always `Positional` or
    /// always `StdinLine`. You never get a mix.
    ///
    /// Iteration stops when the closure returns false or returns an error.
    pub fn try_map(
        self,
        mut f: impl FnMut(Argument<'_>) -> anyhow::Result<bool>,
    ) -> anyhow::Result<()> {
        if !self.positional.is_empty() {
            for arg in self.positional.iter() {
                if !f(Argument::Positional(arg))? {
                    break;
                }
            }
            return Ok(());
        }
        std::io::stdin().lock().for_byte_line(|line| {
            f(Argument::StdinLine(line))
                .with_context(|| format!("line {} of <stdin>", line.number()))
        })
    }
}

impl Configurable for Arguments {
    fn configure(
        &mut self,
        _: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Value(ref mut v) => {
                let v = std::mem::take(v);
                self.positional.push(v.string()?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// A single argument from the CLI or a single line from stdin.
#[derive(Clone, Copy, Debug)]
pub enum Argument<'a> {
    Positional(&'a str),
    StdinLine(Line<'a>),
}

impl<'a> Argument<'a> {
    /// Return this argument as text.
    ///
    /// For a line from stdin, this is the line without its terminator.
    pub fn to_str(&self) -> anyhow::Result<&'a str> {
        match *self {
            Argument::Positional(arg) => Ok(arg),
            Argument::StdinLine(line) => line.to_str(),
        }
    }
}

/// A message key followed by zero or more message arguments.
#[derive(Clone, Debug, Default)]
pub struct KeyAndArgs {
    key: Option<String>,
    args: Vec<String>,
}

impl KeyAndArgs {
    const KEY: Usage = Usage::arg(
        "<key>",
        "The key of the message to print.",
        r#"
The key of the message to print.
"#,
    );

    const ARGS: Usage = Usage::arg(
        "<arg>...",
        "Arguments substituted into the message by position.",
        r#"
Arguments substituted into the message by position.

The first argument replaces `{0}`, the second `{1}` and so on. Arguments that
look like integers or decimals are treated as numbers. Arguments that look
like RFC 3339 or RFC 9557 timestamps are treated as instants. Everything else
is inserted as text.
"#,
    );

    /// Returns the message key, or an error if none was given.
    pub fn key(&self) -> anyhow::Result<&str> {
        self.key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("missing message <key> argument"))
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Configurable for KeyAndArgs {
    fn configure(
        &mut self,
        _: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Value(ref mut v) => {
                let v = std::mem::take(v).string()?;
                if self.key.is_none() {
                    self.key = Some(v);
                } else {
                    self.args.push(v);
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        &[KeyAndArgs::KEY, KeyAndArgs::ARGS]
    }
}
