//! Token sink holding the per-document extraction state
//!
//! The sink sees a flat token stream. It tracks whether the stream is inside
//! `<body>` and whether a `script`, `style` or `noscript` element is open, and
//! collects qualifying text nodes into the output buffer.

use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{Tag, TagKind, Token, TokenSink, TokenSinkResult};

/// Elements whose content is never captured
const SUPPRESSED_TAGS: [&str; 3] = ["script", "style", "noscript"];

/// Per-document extraction state
///
/// Suppression is a single flag: a nested suppressed element is cleared by
/// the first matching end tag.
#[derive(Debug)]
pub struct TextSink {
    min_length: usize,
    in_body: bool,
    suppressed: bool,
    /// Characters of the text node currently being tokenized
    pending: String,
    output: String,
    parse_errors: usize,
}

impl TextSink {
    pub fn new(min_length: usize) -> Self {
        Self {
            min_length,
            in_body: false,
            suppressed: false,
            pending: String::new(),
            output: String::new(),
            parse_errors: 0,
        }
    }

    /// Whether text seen right now would be considered for capture
    fn capturing(&self) -> bool {
        self.in_body && !self.suppressed
    }

    /// Text accumulated so far, one captured fragment per line
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(mut self) -> String {
        self.flush_text();
        self.output
    }

    pub fn parse_errors(&self) -> usize {
        self.parse_errors
    }

    /// Ends the current text node and captures it if it qualifies
    fn flush_text(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = self.pending.trim();
        if text.len() > self.min_length && !text.contains('/') {
            self.output.push_str(text);
            self.output.push('\n');
        }
        self.pending.clear();
    }

    fn handle_tag(&mut self, tag: &Tag) -> TokenSinkResult<()> {
        let name: &str = &tag.name;

        // `<body/>` and `<script/>` leave both flags alone, but the content
        // that follows is still raw text up to the matching end tag
        if tag.self_closing {
            return match tag.kind {
                TagKind::StartTag => raw_content_state(name),
                TagKind::EndTag => TokenSinkResult::Continue,
            };
        }

        match tag.kind {
            TagKind::StartTag => {
                if name == "body" {
                    self.in_body = true;
                } else if SUPPRESSED_TAGS.contains(&name) {
                    self.suppressed = true;
                }
                raw_content_state(name)
            }
            TagKind::EndTag => {
                if name == "body" {
                    self.in_body = false;
                } else if SUPPRESSED_TAGS.contains(&name) {
                    self.suppressed = false;
                }
                TokenSinkResult::Continue
            }
        }
    }
}

/// Tokenizer state to switch into after a start tag
///
/// Without a tree builder the tokenizer cannot know that `<script>` content is
/// raw text, so the sink tells it, the way a lenient standalone tokenizer does.
fn raw_content_state(name: &str) -> TokenSinkResult<()> {
    match name {
        "script" => TokenSinkResult::RawData(RawKind::ScriptData),
        "style" | "noscript" | "iframe" | "xmp" | "noembed" | "noframes" => {
            TokenSinkResult::RawData(RawKind::Rawtext)
        }
        "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
        "plaintext" => TokenSinkResult::Plaintext,
        _ => TokenSinkResult::Continue,
    }
}

impl TokenSink for TextSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(text) => {
                if self.capturing() {
                    self.pending.push_str(&text);
                }
                TokenSinkResult::Continue
            }
            Token::NullCharacterToken => TokenSinkResult::Continue,
            Token::ParseError(message) => {
                self.parse_errors += 1;
                tracing::trace!("HTML parse error at line {}: {}", line_number, message);
                TokenSinkResult::Continue
            }
            Token::TagToken(tag) => {
                self.flush_text();
                self.handle_tag(&tag)
            }
            Token::CommentToken(_) | Token::DoctypeToken(_) | Token::EOFToken => {
                self.flush_text();
                TokenSinkResult::Continue
            }
        }
    }
}
