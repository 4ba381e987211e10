//! Streaming HTML to text extraction
//!
//! This module reduces (possibly malformed) HTML to the plain text a reader
//! would see in the page body:
//! - Only text inside `<body>` is considered
//! - Content of `script`, `style` and `noscript` elements is dropped
//! - Text nodes whose trimmed length does not exceed the minimum length are dropped
//! - Text nodes containing `/` are dropped (breadcrumbs, paths, link lists)
//!
//! Input is scanned as a token stream; no DOM is built.

mod sink;

pub use sink::TextSink;

use html5ever::tendril::stream::{TendrilSink, Utf8LossyDecoder};
use html5ever::tendril::{fmt::UTF8, ByteTendril, StrTendril};
use html5ever::tokenizer::{BufferQueue, Tokenizer, TokenizerOpts};
use std::borrow::Cow;
use std::io::{ErrorKind, Read};

/// Default minimum length (exclusive) of a captured text fragment
pub const DEFAULT_MIN_LENGTH: usize = 100;

const READ_CHUNK_SIZE: usize = 16 * 1024;

/// Feeds decoded text into the tokenizer
struct TokenFeed {
    tokenizer: Tokenizer<TextSink>,
    queue: BufferQueue,
    decode_errors: usize,
}

impl TendrilSink<UTF8> for TokenFeed {
    fn process(&mut self, text: StrTendril) {
        self.queue.push_back(text);
        let _ = self.tokenizer.feed(&mut self.queue);
    }

    fn error(&mut self, desc: Cow<'static, str>) {
        self.decode_errors += 1;
        tracing::trace!("Invalid UTF-8 in document: {}", desc);
    }

    type Output = String;

    fn finish(mut self) -> String {
        let _ = self.tokenizer.feed(&mut self.queue);
        self.tokenizer.end();

        let sink = self.tokenizer.sink;
        if sink.parse_errors() > 0 || self.decode_errors > 0 {
            tracing::trace!(
                "Tolerated {} HTML parse errors and {} invalid byte sequences",
                sink.parse_errors(),
                self.decode_errors
            );
        }
        sink.into_output()
    }
}

/// Incremental text extractor for a single document
///
/// Feed the document in chunks of any size, then call [`finish`](Self::finish).
/// Chunks may split multi-byte characters; invalid UTF-8 becomes U+FFFD.
///
/// # Example
///
/// ```
/// use url_harvest::extract::TextExtractor;
///
/// let mut extractor = TextExtractor::new(5);
/// extractor.feed(b"<html><body><p>Hello there");
/// extractor.feed(b" world</p></body></html>");
/// assert_eq!(extractor.finish(), "Hello there world\n");
/// ```
pub struct TextExtractor {
    decoder: Utf8LossyDecoder<TokenFeed>,
}

impl TextExtractor {
    /// Creates an extractor that keeps text nodes longer than `min_length` bytes
    pub fn new(min_length: usize) -> Self {
        let feed = TokenFeed {
            tokenizer: Tokenizer::new(TextSink::new(min_length), TokenizerOpts::default()),
            queue: BufferQueue::new(),
            decode_errors: 0,
        };
        Self {
            decoder: Utf8LossyDecoder::new(feed),
        }
    }

    /// Feeds the next chunk of the document
    pub fn feed(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        self.decoder.process(ByteTendril::from_slice(chunk));
    }

    /// Ends the document and returns the captured text
    ///
    /// An empty string is a normal result for pages without qualifying text.
    pub fn finish(self) -> String {
        self.decoder.finish()
    }
}

/// Result of extracting text from a readable source
#[derive(Debug)]
pub struct Extraction {
    /// Captured text, one fragment per line
    pub text: String,

    /// Read error that cut the document short, if any
    pub error: Option<std::io::Error>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Extracts text from a complete in-memory document
pub fn extract_text(html: &[u8], min_length: usize) -> String {
    let mut extractor = TextExtractor::new(min_length);
    extractor.feed(html);
    extractor.finish()
}

/// Extracts text from a reader, stopping at the first read error
///
/// Text captured before the error is kept and returned alongside it.
pub fn extract_from_reader<R: Read>(mut reader: R, min_length: usize) -> Extraction {
    let mut extractor = TextExtractor::new(min_length);
    let mut buf = vec![0u8; READ_CHUNK_SIZE];

    let error = loop {
        match reader.read(&mut buf) {
            Ok(0) => break None,
            Ok(n) => extractor.feed(&buf[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => break Some(e),
        }
    };

    Extraction {
        text: extractor.finish(),
        error,
    }
}
