use std::io::Write;

use loctext::{Args, RenderContext, SharedCache, Value};

use crate::args::{self, Usage, flags, positional};

const USAGE: &'static str = r#"
Print a localized message.

The message is looked up in the requested locale, then in each of its parent
locales, then in the default locale and its parents and finally in the root
message file. The first match wins. Arguments are substituted into the
message's placeholders and formatted for the requested locale and time zone.

USAGE:
    loctext msg -d <dir> <key> [<arg>...]

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Print the `greeting` message in Canadian French:

        $ loctext msg -d i18n -l fr-CA greeting Ann

    %snip-start%

    Use a named argument for a `{when,date,long}` placeholder:

        $ loctext msg -d i18n -l de -a when=2024-06-15T12:30:00Z event

    Fail instead of printing the key when the message doesn't exist:

        $ loctext msg -d i18n --strict no.such.key

    %snip-end%
REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    let mut bundle = flags::Bundle::default();
    let mut target = flags::Target::default();
    let mut key_and_args = positional::KeyAndArgs::default();
    args::configure(
        p,
        USAGE,
        &mut [&mut config, &mut bundle, &mut target, &mut key_and_args],
    )?;

    let key = key_and_args.key()?;
    let bundle = bundle.load()?;
    let cache = SharedCache::new();
    let cx =
        RenderContext::new(target.zone(), target.locale(), &bundle, &cache);

    let mut margs = Args::new();
    for arg in key_and_args.args() {
        margs = margs.arg(Value::infer(arg));
    }
    for (name, value) in config.named.iter() {
        margs = margs.named(name, Value::infer(value));
    }
    let message = cx.message(key, &margs)?;
    writeln!(std::io::stdout(), "{message}")?;
    Ok(())
}

#[derive(Debug, Default)]
struct Config {
    named: Vec<(String, String)>,
}

impl args::Configurable for Config {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Short('a') | lexopt::Arg::Long("arg") => {
                let pair: String = args::parse(p, "-a/--arg")?;
                let Some((name, value)) = pair.split_once('=') else {
                    anyhow::bail!(
                        "-a/--arg: expected `name=value`, but got `{pair}`"
                    );
                };
                self.named.push((name.to_string(), value.to_string()));
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const ARG: Usage = Usage::flag(
            "-a, --arg <name=value>",
            "Set a named message argument.",
            r#"
Set a named message argument.

This fills placeholders like `{name}` or `{when,date,medium}`. Values are typed
the same way as positional arguments. This flag may be given multiple times.
"#,
        );
        &[ARG]
    }
}
