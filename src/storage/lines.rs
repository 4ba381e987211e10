//! Line reading for URL lists and ledgers
//!
//! Lists come from arbitrary sources and may hold bytes that are not valid
//! UTF-8. Such a line is decoded lossily instead of failing the read, so one
//! bad line never stops a run.

use std::io::{self, BufRead};

/// Iterator over the lines of a reader, decoded lossily
///
/// Like [`BufRead::lines`], the trailing `\n` or `\r\n` is stripped.
#[derive(Debug)]
pub struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LossyLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.ends_with(b"\n") {
                    self.buf.pop();
                    if self.buf.ends_with(b"\r") {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
