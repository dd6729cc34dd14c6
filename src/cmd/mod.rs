mod check;
mod fmt;
mod msg;
mod render;

const USAGE: &'static str = "\
Locale and time zone aware formatting of datetimes, numbers and messages.

USAGE:
    loctext <command> ...

COMMANDS:
    check   List messages missing a translation for a locale
    fmt     Format datetimes or numbers with a pattern
    msg     Print a localized message
    render  Render templates for line delimited JSON parameters
";

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let cmd = crate::args::next_as_command(USAGE, p)?;
    match &*cmd {
        "check" => check::run(p),
        "fmt" => fmt::run(p),
        "msg" => msg::run(p),
        "render" => render::run(p),
        unk => anyhow::bail!("unrecognized command '{}'", unk),
    }
}
