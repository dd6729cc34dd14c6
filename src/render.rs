/*!
The seam between the formatting core and a template engine.

A `Renderer` receives a template identifier, a `Params` value holding the
`RenderContext` plus business values, and an `OutputSink` to write text to.
The engine itself is opaque to this crate. `TemplateSet` in the `template`
module is a small implementation of it.
*/

use std::{collections::BTreeMap, io};

use crate::{context::RenderContext, error::Result, value::Value};

/// A destination for rendered text.
pub trait OutputSink {
    /// Append text to this sink.
    fn write_str(&mut self, text: &str) -> Result<()>;

    /// Flush any buffered text.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Signal that no more text will be written. By default this flushes.
    fn close(&mut self) -> Result<()> {
        self.flush()
    }
}

impl OutputSink for String {
    fn write_str(&mut self, text: &str) -> Result<()> {
        self.push_str(text);
        Ok(())
    }
}

/// A sink that throws away everything written to it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl OutputSink for Discard {
    fn write_str(&mut self, _: &str) -> Result<()> {
        Ok(())
    }
}

/// A sink that writes to any `std::io::Write` implementation.
#[derive(Debug)]
pub struct IoSink<W> {
    wtr: W,
}

impl<W: io::Write> IoSink<W> {
    pub fn new(wtr: W) -> IoSink<W> {
        IoSink { wtr }
    }

    pub fn into_inner(self) -> W {
        self.wtr
    }
}

impl<W: io::Write> OutputSink for IoSink<W> {
    fn write_str(&mut self, text: &str) -> Result<()> {
        self.wtr.write_all(text.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.wtr.flush()?;
        Ok(())
    }
}

/// The parameters of one render: its context and a map of named values.
#[derive(Debug)]
pub struct Params<'a> {
    context: &'a RenderContext<'a>,
    values: BTreeMap<String, Value>,
}

impl<'a> Params<'a> {
    pub fn new(context: &'a RenderContext<'a>) -> Params<'a> {
        Params { context, values: BTreeMap::new() }
    }

    /// Add a named value, replacing any previous one with the same name.
    pub fn value(mut self, name: &str, value: impl Into<Value>) -> Params<'a> {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn context(&self) -> &'a RenderContext<'a> {
        self.context
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }
}

/// A template engine.
pub trait Renderer {
    /// Render the template with the given identifier into `sink`.
    ///
    /// Implementations call back into `params.context()` to format dates,
    /// numbers and messages.
    fn render(
        &self,
        template_id: &str,
        params: &Params<'_>,
        sink: &mut dyn OutputSink,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sinks() {
        let mut s = String::new();
        OutputSink::write_str(&mut s, "a").unwrap();
        OutputSink::write_str(&mut s, "b").unwrap();
        OutputSink::close(&mut s).unwrap();
        assert_eq!(s, "ab");

        let mut sink = IoSink::new(Vec::<u8>::new());
        sink.write_str("héllo").unwrap();
        sink.close().unwrap();
        assert_eq!(sink.into_inner(), "héllo".as_bytes());

        let mut discard = Discard;
        discard.write_str("gone").unwrap();
        discard.close().unwrap();
    }
}
