use bstr::{BStr, BString, ByteSlice};

/// A borrowed line read from a stream, along with its line number.
#[derive(Clone, Copy, Debug)]
pub struct Line<'a> {
    /// The line number, 1-indexed.
    number: usize,
    /// The full line including its line terminator if present.
    full: &'a BStr,
}

impl<'a> Line<'a> {
    pub fn new(number: usize, full: &'a [u8]) -> Line<'a> {
        Line { number, full: full.as_bstr() }
    }

    /// Return the one-indexed line number of this line.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Return the line without its terminator.
    pub fn content(&self) -> &'a BStr {
        let (content, _) = split_line_terminator(self.full);
        content.as_bstr()
    }

    /// Return the line as text, failing when it is not valid UTF-8.
    pub fn to_str(&self) -> anyhow::Result<&'a str> {
        self.content().to_str().map_err(|err| {
            anyhow::anyhow!("line {} is not valid UTF-8: {err}", self.number)
        })
    }

    /// Turn this borrowed line into an owned line.
    pub fn to_owned(self) -> LineBuf {
        LineBuf { number: self.number, full: self.full.into() }
    }
}

/// An owned version of `Line`, suitable for sending to another thread.
#[derive(Clone, Debug)]
pub struct LineBuf {
    number: usize,
    full: BString,
}

impl LineBuf {
    pub fn number(&self) -> usize {
        self.number
    }

    /// Return this owned line as a borrowed line.
    pub fn as_line(&self) -> Line<'_> {
        Line { number: self.number, full: self.full.as_bstr() }
    }
}

/// An extension trait for `std::io::BufRead` that walks `\n` or `\r\n`
/// terminated lines without allocating a new buffer per line.
///
/// This exists instead of `bstr::io` because the closure here returns an
/// `anyhow::Result`, which composes with the rest of the binary.
pub trait BufReadExt: std::io::BufRead {
    /// Executes the given closure on each line in the underlying reader.
    ///
    /// Iteration stops when the reader is exhausted, when the closure
    /// returns `false` or when it returns an error.
    fn for_byte_line<F>(&mut self, mut for_each_line: F) -> anyhow::Result<()>
    where
        Self: Sized,
        F: FnMut(Line<'_>) -> anyhow::Result<bool>,
    {
        let mut number = 0;
        let mut bytes = vec![];
        let mut res = Ok(());
        let mut consumed = 0;
        'outer: loop {
            {
                let mut buf = self.fill_buf()?;
                if buf.is_empty() {
                    break;
                }
                while let Some(index) = buf.find_byte(b'\n') {
                    let (record, rest) = buf.split_at(index + 1);
                    buf = rest;
                    consumed += record.len();
                    number += 1;
                    match for_each_line(Line::new(number, record)) {
                        Ok(false) => break 'outer,
                        Err(err) => {
                            res = Err(err);
                            break 'outer;
                        }
                        Ok(true) => {}
                    }
                }
                // The tail has no terminator yet, so finish it off with
                // `read_until` below.
                bytes.extend_from_slice(buf);
                consumed += buf.len();
            }

            self.consume(consumed);
            consumed = 0;

            self.read_until(b'\n', &mut bytes)?;
            if bytes.is_empty() {
                break;
            }
            number += 1;
            if !for_each_line(Line::new(number, &bytes))? {
                break;
            }
            bytes.clear();
        }
        self.consume(consumed);
        res
    }
}

impl<B: std::io::BufRead> BufReadExt for B {}

fn split_line_terminator(line: &[u8]) -> (&[u8], &[u8]) {
    let mut terminator_at = line.len();
    if line.last_byte() == Some(b'\n') {
        terminator_at -= 1;
        if line[..terminator_at].last_byte() == Some(b'\r') {
            terminator_at -= 1;
        }
    }
    (&line[..terminator_at], &line[terminator_at..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &str) -> Vec<(usize, String)> {
        let mut got = vec![];
        std::io::Cursor::new(input)
            .for_byte_line(|line| {
                got.push((line.number(), line.to_str()?.to_string()));
                Ok(true)
            })
            .unwrap();
        got
    }

    #[test]
    fn terminators() {
        assert_eq!(
            lines("a\r\nb\n\nc"),
            vec![
                (1, "a".to_string()),
                (2, "b".to_string()),
                (3, "".to_string()),
                (4, "c".to_string()),
            ],
        );
        assert!(lines("").is_empty());
    }

    #[test]
    fn owned_lines() {
        let line = Line::new(7, b"x y\r\n").to_owned();
        assert_eq!(line.number(), 7);
        assert_eq!(line.as_line().content(), "x y");
        assert_eq!(line.as_line().to_str().unwrap(), "x y");
    }
}
