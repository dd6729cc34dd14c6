/*!
A deliberately tiny template renderer.

A template is text with `{{ ... }}` directives:

* `{{ name }}` inserts the parameter `name`, formatted with the default for
  its type.
* `{{ msg key arg... }}` inserts the message `key` with the given arguments.
* `{{ date name }}` and `{{ date name "pattern" }}` format a datetime.
* `{{ number name }}` and `{{ number name "pattern" }}` format a number.

Operands are parameter names or `"quoted literals"`. This is not a general
purpose template language: there are no conditionals, loops or filters.
*/

use std::{collections::BTreeMap, path::Path, sync::LazyLock};

use regex::Regex;

use crate::{
    error::{Error, Result},
    formatter::DEFAULT_DATE_TIME_PATTERN,
    message::Args,
    render::{OutputSink, Params, Renderer},
    value::Value,
};

/// The file extension of templates loaded from a directory.
const EXTENSION: &str = "tmpl";

/// A set of parsed templates, keyed by identifier.
#[derive(Clone, Debug, Default)]
pub struct TemplateSet {
    templates: BTreeMap<String, Template>,
}

#[derive(Clone, Debug)]
struct Template {
    nodes: Vec<Node>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Node {
    Text(String),
    Value(Operand),
    Message { key: String, args: Vec<Operand> },
    Date { operand: Operand, pattern: Option<String> },
    Number { operand: Operand, pattern: Option<String> },
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Operand {
    Param(String),
    Literal(String),
}

impl TemplateSet {
    /// Create an empty set.
    pub fn new() -> TemplateSet {
        TemplateSet::default()
    }

    /// Load every `*.tmpl` file in `dir`. A template's identifier is its
    /// file name without the extension.
    pub fn from_dir(dir: &Path) -> Result<TemplateSet> {
        let location = dir.display().to_string();
        let io_err =
            |err: std::io::Error| Error::template(&location, err.to_string());
        let mut set = TemplateSet::new();
        for result in std::fs::read_dir(dir).map_err(io_err)? {
            let path = result.map_err(io_err)?.path();
            if path.extension().is_none_or(|ext| ext != EXTENSION) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                log::debug!("skipping template with non-UTF-8 name {path:?}");
                continue;
            };
            let text = std::fs::read_to_string(&path)
                .map_err(|err| Error::template(id, err.to_string()))?;
            set.insert(id, &text)?;
        }
        log::debug!("loaded {} template(s) from {location}", set.len());
        Ok(set)
    }

    /// Parse and add a template, replacing any previous one with the same
    /// identifier.
    pub fn insert(&mut self, id: &str, text: &str) -> Result<()> {
        let template = Template::parse(text)
            .map_err(|msg| Error::template(id, msg))?;
        self.templates.insert(id.to_string(), template);
        Ok(())
    }

    /// Builder style version of `insert`.
    pub fn with(mut self, id: &str, text: &str) -> Result<TemplateSet> {
        self.insert(id, text)?;
        Ok(self)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|id| &**id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Renderer for TemplateSet {
    fn render(
        &self,
        template_id: &str,
        params: &Params<'_>,
        sink: &mut dyn OutputSink,
    ) -> Result<()> {
        let Some(template) = self.templates.get(template_id) else {
            return Err(Error::template(template_id, "unknown template"));
        };
        let cx = params.context();
        let mut buf = String::new();
        for node in template.nodes.iter() {
            buf.clear();
            let value = |operand: &Operand| -> Result<Value> {
                match *operand {
                    Operand::Literal(ref s) => Ok(Value::from(s.as_str())),
                    Operand::Param(ref name) => {
                        params.get(name).cloned().ok_or_else(|| {
                            Error::template(
                                template_id,
                                format!("unknown parameter `{name}`"),
                            )
                        })
                    }
                }
            };
            match *node {
                Node::Text(ref text) => {
                    sink.write_str(text)?;
                    continue;
                }
                Node::Value(ref operand) => {
                    cx.env().plain(&value(operand)?, &mut buf)?;
                }
                Node::Message { ref key, ref args } => {
                    let args = args
                        .iter()
                        .map(value)
                        .collect::<Result<Vec<Value>>>()?;
                    buf.push_str(&cx.message(key, &Args::from(args))?);
                }
                Node::Date { ref operand, ref pattern } => {
                    let pattern = pattern.as_deref();
                    cx.env().date_time(
                        pattern.unwrap_or(DEFAULT_DATE_TIME_PATTERN),
                        &value(operand)?,
                        &mut buf,
                    )?;
                }
                Node::Number { ref operand, ref pattern } => {
                    cx.env().number(
                        pattern.as_deref().unwrap_or(""),
                        &value(operand)?,
                        &mut buf,
                    )?;
                }
            }
            sink.write_str(&buf)?;
        }
        Ok(())
    }
}

impl Template {
    fn parse(text: &str) -> std::result::Result<Template, String> {
        static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?s)\{\{\s*(.*?)\s*\}\}").unwrap()
        });

        let mut nodes = vec![];
        let mut last = 0;
        for caps in DIRECTIVE.captures_iter(text) {
            let (whole, [body]) = caps.extract();
            let start = caps.get_match().start();
            if start > last {
                nodes.push(Node::Text(text[last..start].to_string()));
            }
            last = start + whole.len();
            nodes.push(
                parse_directive(body)
                    .map_err(|msg| format!("directive `{whole}`: {msg}"))?,
            );
        }
        if last < text.len() {
            nodes.push(Node::Text(text[last..].to_string()));
        }
        if let Some(Node::Text(rest)) = nodes.last() {
            if rest.contains("{{") {
                return Err("unterminated `{{` directive".to_string());
            }
        }
        Ok(Template { nodes })
    }
}

fn parse_directive(body: &str) -> std::result::Result<Node, String> {
    let tokens = tokenize(body)?;
    let mut it = tokens.into_iter();
    let Some(first) = it.next() else {
        return Err("empty directive".to_string());
    };
    let rest: Vec<Operand> = it.collect();
    let word = match first {
        Operand::Param(ref word) if !rest.is_empty() => word.as_str(),
        Operand::Param(_) | Operand::Literal(_) => {
            if !rest.is_empty() {
                return Err("expected a single operand".to_string());
            }
            return Ok(Node::Value(first));
        }
    };
    let pattern = |operand: Option<&Operand>| match operand {
        None => None,
        Some(&Operand::Literal(ref s)) | Some(&Operand::Param(ref s)) => {
            Some(s.clone())
        }
    };
    match word {
        "msg" => {
            let mut rest = rest.into_iter();
            let key = match rest.next() {
                Some(Operand::Literal(key)) | Some(Operand::Param(key)) => key,
                None => return Err("missing message key".to_string()),
            };
            Ok(Node::Message { key, args: rest.collect() })
        }
        "date" | "number" if rest.len() <= 2 => {
            let operand = rest[0].clone();
            let pattern = pattern(rest.get(1));
            if word == "date" {
                Ok(Node::Date { operand, pattern })
            } else {
                Ok(Node::Number { operand, pattern })
            }
        }
        "date" | "number" => Err(format!("too many operands for `{word}`")),
        unk => Err(format!("unknown directive `{unk}`")),
    }
}

fn tokenize(body: &str) -> std::result::Result<Vec<Operand>, String> {
    let mut tokens = vec![];
    let mut rest = body.trim_start();
    while !rest.is_empty() {
        if let Some(quoted) = rest.strip_prefix('"') {
            let Some(end) = quoted.find('"') else {
                return Err("unterminated string literal".to_string());
            };
            tokens.push(Operand::Literal(quoted[..end].to_string()));
            rest = &quoted[end + 1..];
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let word = &rest[..end];
            if word.contains('"') {
                return Err(format!("unexpected `\"` in `{word}`"));
            }
            tokens.push(Operand::Param(word.to_string()));
            rest = &rest[end..];
        }
        rest = rest.trim_start();
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use crate::{
        bundle::{BundleSource, MessageBundle},
        cache::SharedCache,
        config::Config,
        context::RenderContext,
        locale::Locale,
        zone::Zone,
    };

    use super::*;

    fn bundle() -> MessageBundle {
        let source = BundleSource::embedded([
            ("m_en.properties", "greeting = Hello, {0}!\n"),
            ("m_de.properties", "greeting = Hallo, {0}!\n"),
        ]);
        MessageBundle::load(&source, "m", &Config::new()).unwrap()
    }

    fn render(set: &TemplateSet, locale: &str, id: &str) -> Result<String> {
        let bundle = bundle();
        let cache = SharedCache::new();
        let locale = Locale::parse(locale).unwrap();
        let cx = RenderContext::new(Zone::utc(), locale, &bundle, &cache);
        let ts: jiff::Timestamp = "2024-06-15T12:30:45Z".parse().unwrap();
        let params = Params::new(&cx)
            .value("name", "Ann")
            .value("when", ts)
            .value("total", 1234.5);
        let mut out = String::new();
        set.render(id, &params, &mut out)?;
        Ok(out)
    }

    #[test]
    fn directives() {
        let set = TemplateSet::new()
            .with(
                "page",
                "{{msg greeting name}} {{ date when \"d MMM yyyy\" }} \
                 ({{ when }}) total={{ number total \"#,##0.00\" }} \
                 {{ number total }} {{name}}",
            )
            .unwrap();
        assert_eq!(
            render(&set, "en", "page").unwrap(),
            "Hello, Ann! 15 Jun 2024 (2024-06-15 12:30:45) total=1,234.50 \
             1,234.5 Ann",
        );
        assert_eq!(
            render(&set, "de", "page").unwrap(),
            "Hallo, Ann! 15 Juni 2024 (2024-06-15 12:30:45) total=1.234,50 \
             1.234,5 Ann",
        );
    }

    #[test]
    fn literal_operands() {
        let set = TemplateSet::new()
            .with("t", "{{ msg \"greeting\" \"world\" }}|{{ \"x y\" }}")
            .unwrap();
        assert_eq!(render(&set, "en", "t").unwrap(), "Hello, world!|x y");
    }

    #[test]
    fn render_errors() {
        let set = TemplateSet::new().with("t", "{{ nope }}").unwrap();
        let err = render(&set, "en", "t").unwrap_err();
        assert!(matches!(err, Error::Template { .. }), "{err:?}");

        let err = render(&set, "en", "missing").unwrap_err();
        assert!(matches!(err, Error::Template { .. }), "{err:?}");
    }

    #[test]
    fn parse_errors() {
        for bad in [
            "{{ }}",
            "{{ a b }}",
            "{{ frobnicate x }}",
            "{{ date when \"x\" y }}",
            "{{ \"open }}",
            "text {{ name",
        ] {
            assert!(TemplateSet::new().with("t", bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.tmpl"), "Hi {{name}}\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "{{").unwrap();
        let set = TemplateSet::from_dir(dir.path()).unwrap();
        assert_eq!(set.ids().collect::<Vec<_>>(), vec!["hello"]);
        assert_eq!(render(&set, "en", "hello").unwrap(), "Hi Ann\n");
    }
}
