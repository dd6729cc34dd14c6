use std::io::Write;

use crate::args::{self, flags};

const USAGE: &'static str = r#"
List messages that are missing a translation for a locale.

A message is untranslated when it can only be found in the default locale or
in the root message file, but not in the requested locale or any of its
parent locales. Each untranslated key is printed on its own line, and the
command fails when there is at least one.

USAGE:
    loctext check -d <dir> -l <locale>

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    List the keys still missing from the Brazilian Portuguese messages:

        $ loctext check -d i18n -l pt-BR

OPTIONS:
%flags%
"#;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut bundle = flags::Bundle::default();
    let mut target = flags::Target::default();
    args::configure(p, USAGE, &mut [&mut bundle, &mut target])?;

    let locale = target.locale();
    let bundle = bundle.load()?;
    let untranslated = bundle.untranslated(&locale);
    let mut wtr = std::io::stdout().lock();
    for key in untranslated.iter() {
        writeln!(wtr, "{key}")?;
    }
    wtr.flush()?;
    anyhow::ensure!(
        untranslated.is_empty(),
        "{} of {} message(s) in `{}` are untranslated for `{locale}`",
        untranslated.len(),
        bundle.keys().len(),
        bundle.base_name(),
    );
    Ok(())
}
