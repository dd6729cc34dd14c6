use std::{io::Write, path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    lexopt::ValueExt,
    loctext::{
        CacheStrategy, ContextCache, Discard, FormatterCache, Locale, Params, ReloadableBundle,
        RenderContext, Renderer, SharedCache, TemplateSet, Value, Zone,
    },
};

use crate::{
    args::{self, Usage, flags},
    parallel::Parallel,
    parse::{BufReadExt, LineBuf},
};

const USAGE: &'static str = r#"
Render a template for each line of JSON parameters read from stdin.

Each line on stdin must be a JSON object. Its members become the template's
parameters. Strings, numbers, booleans and null are supported as values.
Strings are interpreted as datetimes by `{{ date ... }}` directives.

Lines are rendered in parallel, but the output is always printed in the same
order as the input. Every worker gets its own formatter store when the cache
strategy is `confined`, and they all share one store when it is `shared`.

USAGE:
    loctext render -d <dir> -t <dir> <template-id> < line delimited <json>

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Render the `invoice` template in German for each line of `orders.jsonl`:

        $ loctext render -d i18n -t templates -l de invoice < orders.jsonl

    %snip-start%

    Measure rendering throughput on a single thread with a private formatter
    store, without printing anything:

        $ loctext render -d i18n -t templates -j1 --cache confined \
            --discard invoice < orders.jsonl

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
    args::configure(
        p,
        USAGE,
        &mut [&mut config, &mut bundle, &mut target],
    )?;

    let Some(id) = config.id.take() else {
        anyhow::bail!("missing <template-id> argument")
    };
    let Some(ref dir) = config.templates else {
        anyhow::bail!("a template directory must be given with -t/--templates")
    };
    let templates = TemplateSet::from_dir(dir)?;
    anyhow::ensure!(
        templates.contains(&id),
        "template `{id}` not found in {}",
        dir.display(),
    );
    bundle.set_cache_strategy(config.cache);
    let job = Job {
        templates,
        bundle: bundle.load_reloadable()?,
        zone: target.zone(),
        locale: target.locale(),
        id,
        discard: config.discard,
    };
    let shared = Arc::new(SharedCache::new());
    let store_config = bundle.config().clone();
    let strategy = store_config.get_cache_strategy();
    log::debug!(
        "rendering `{}` in {} ({}) with {strategy} formatter store(s)",
        job.id,
        job.locale,
        job.zone,
    );

    let mut stdout = std::io::stdout();
    let mut pool = Parallel::new(
        config.threads.get(),
        {
            let shared = Arc::clone(&shared);
            move || ContextCache::new(&store_config, &shared)
        },
        move |cache: &mut ContextCache, line: LineBuf| {
            job.render(cache, &line)
                .with_context(|| format!("line {} of <stdin>", line.number()))
        },
        move |rendered: anyhow::Result<String>| {
            stdout.write_all(rendered?.as_bytes())?;
            Ok(true)
        },
    );
    let mut count = 0;
    std::io::stdin().lock().for_byte_line(|line| {
        count += 1;
        pool.send(line.to_owned())
    })?;
    pool.wait()?;
    log::info!("rendered {count} line(s) of parameters");
    if strategy == CacheStrategy::Shared {
        log::debug!("shared formatter store holds {} entries", shared.len());
    }
    Ok(())
}

/// Everything a worker needs to render one line of parameters.
#[derive(Debug)]
struct Job {
    templates: TemplateSet,
    bundle: ReloadableBundle,
    zone: Zone,
    locale: Locale,
    id: String,
    discard: bool,
}

impl Job {
    fn render(
        &self,
        cache: &ContextCache,
        line: &LineBuf,
    ) -> anyhow::Result<String> {
        let text = line.as_line().to_str()?;
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(text).context("invalid JSON object")?;

        let bundle = self.bundle.current();
        let cx = RenderContext::new(
            self.zone.clone(),
            self.locale.clone(),
            &bundle,
            cache,
        );
        let mut params = Params::new(&cx);
        for (name, json) in object.iter() {
            let value = Value::from_json(json)
                .with_context(|| format!("parameter `{name}`"))?;
            params.insert(name, value);
        }
        if self.discard {
            self.templates.render(&self.id, &params, &mut Discard)?;
            return Ok(String::new());
        }
        let mut out = String::new();
        self.templates.render(&self.id, &params, &mut out)?;
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }
}

#[derive(Debug, Default)]
struct Config {
    id: Option<String>,
    templates: Option<PathBuf>,
    cache: CacheStrategy,
    threads: flags::Threads,
    discard: bool,
}

impl args::Configurable for Config {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Short('t') | lexopt::Arg::Long("templates") => {
                let dir = p.value().context("-t/--templates")?;
                self.templates = Some(PathBuf::from(dir));
            }
            lexopt::Arg::Long("cache") => {
                self.cache = args::parse(p, "--cache")?;
            }
            lexopt::Arg::Short('j') | lexopt::Arg::Long("threads") => {
                self.threads = args::parse(p, "-j/--threads")?;
            }
            lexopt::Arg::Long("discard") => {
                self.discard = true;
            }
            lexopt::Arg::Value(ref mut v) if self.id.is_none() => {
                self.id = Some(std::mem::take(v).string()?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const TEMPLATE_ID: Usage = Usage::arg(
            "<template-id>",
            "The template to render.",
            r#"
The template to render.

This is the file name, without the `.tmpl` extension, of a template in the
directory given by -t/--templates.
"#,
        );

        const TEMPLATES: Usage = Usage::flag(
            "-t, --templates <path>",
            "The directory containing `.tmpl` templates.",
            r#"
The directory containing `.tmpl` templates.

Templates are text with `{{ ... }}` directives. `{{ name }}` inserts a
parameter, `{{ msg key arg... }}` inserts a localized message,
`{{ date name "pattern" }}` formats a datetime and
`{{ number name "pattern" }}` formats a number. The pattern is optional in
both cases. Operands in double quotes are literals.

This flag is required.
"#,
        );

        const CACHE: Usage = Usage::flag(
            "--cache <strategy>",
            "Either `shared` (the default) or `confined`.",
            r#"
Either `shared` (the default) or `confined`.

With `shared`, all workers use one formatter store, so each distinct pattern,
time zone and locale is built once for the whole process. With `confined`,
each worker builds and keeps its own formatters, and its store is thrown away
when the worker finishes.
"#,
        );

        const DISCARD: Usage = Usage::flag(
            "--discard",
            "Render everything but print nothing.",
            r#"
Render everything but print nothing.

Rendered output is sent to a sink that throws it away. Errors are still
reported. This is useful for measuring how long rendering takes.
"#,
        );

        &[TEMPLATE_ID, TEMPLATES, CACHE, flags::Threads::USAGE, DISCARD]
    }
}
