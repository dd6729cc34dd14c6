use std::{env, io::Write, process::ExitCode, sync::LazyLock};

use {anyhow::Context, loctext::Locale};

mod args;
mod cmd;
mod logger;
mod parallel;
mod parse;
mod style;

static LOCALE: LazyLock<Locale> = LazyLock::new(|| {
    match read_env_loctext_locale() {
        Ok(Some(locale)) => {
            log::trace!(
                "setting locale to `{locale}` from `LOCTEXT_LOCALE` \
                 environment variable",
            );
            locale
        }
        Ok(None) => {
            log::trace!(
                "`LOCTEXT_LOCALE` environment variable not set, using `en`",
            );
            Locale::english()
        }
        Err(err) => {
            log::warn!(
                "reading `LOCTEXT_LOCALE` failed, using `en`: {err:#}",
            );
            Locale::english()
        }
    }
});

fn main() -> ExitCode {
    let err = match run() {
        Ok(code) => return code,
        Err(err) => err,
    };
    if let Some(help) = err.root_cause().downcast_ref::<args::Help>() {
        writeln!(&mut std::io::stdout(), "{help}").unwrap();
        return ExitCode::SUCCESS;
    }
    if let Some(version) = err.root_cause().downcast_ref::<args::Version>() {
        writeln!(&mut std::io::stdout(), "{version}").unwrap();
        return ExitCode::SUCCESS;
    }
    // The Rust runtime ignores SIGPIPE, so a closed pipe shows up as an I/O
    // error. Unix convention is to exit quietly in that case.
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<std::io::Error>() {
            if err.kind() == std::io::ErrorKind::BrokenPipe {
                return ExitCode::from(0);
            }
        }
    }
    if std::env::var("RUST_BACKTRACE").map_or(false, |v| v == "1")
        && std::env::var("RUST_LIB_BACKTRACE").map_or(true, |v| v == "1")
    {
        writeln!(&mut std::io::stderr(), "{:?}", err).unwrap();
    } else {
        writeln!(&mut std::io::stderr(), "{:#}", err).unwrap();
    }
    ExitCode::from(1)
}

fn run() -> anyhow::Result<ExitCode> {
    let rustlog = env::var("LOCTEXT_LOG").unwrap_or_else(|_| String::new());
    let level = match &*rustlog {
        "" | "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        unk => anyhow::bail!("unrecognized log level '{}'", unk),
    };
    log::set_max_level(level);
    // Detecting the system time zone may log, so the logger starts out in
    // UTC and switches to local time once the zone is known.
    let logger = logger::Logger::init()?;
    logger.set_time_zone(loctext::Zone::system().get().clone());
    cmd::run(&mut lexopt::Parser::from_env())?;
    Ok(ExitCode::SUCCESS)
}

fn read_env_loctext_locale() -> anyhow::Result<Option<Locale>> {
    let Some(val) = std::env::var_os("LOCTEXT_LOCALE") else {
        return Ok(None);
    };
    let Some(val) = val.to_str() else {
        anyhow::bail!(
            "`LOCTEXT_LOCALE` environment variable is not valid UTF-8: {val:?}"
        )
    };
    let locale = Locale::parse(val)
        .context("failed to parse `LOCTEXT_LOCALE` environment variable")?;
    Ok(Some(locale))
}
