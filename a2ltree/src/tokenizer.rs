use std::iter::FusedIterator;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TokenizerError {
    #[error("{filename}:{line}: Block comment was not closed before the end of input was reached")]
    UnclosedComment { filename: String, line: u32 },

    #[error("{filename}:{line}: String was not closed before the end of input was reached")]
    UnclosedString { filename: String, line: u32 },
}

/// One word of a2l input and the line on which it starts.
///
/// Quoted strings are returned without the enclosing quotes, but otherwise verbatim: escape
/// sequences like `\"` or `""` are not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct A2lWord<'a> {
    pub text: &'a str,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    BlockComment,
    LineComment,
    Quote,
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
    // the next region starting at bytepos has not been classified yet
    Start,
    // plain text is split into words up to `end`; the marker (if any) is located at `end`
    Plain { end: usize, marker: Option<Marker> },
    Done,
}

/// Splits the text of an a2l file into words.
///
/// The tokenizer is a lazy iterator which runs a single forward pass over the input. Comments are
/// discarded, strings are returned as a single word, and everything else is separated by
/// whitespace. If a block comment or a string is not closed, the iterator yields one
/// [`TokenizerError`] and is exhausted afterwards.
#[derive(Debug)]
pub struct Tokenizer<'a> {
    filename: &'a str,
    filetext: &'a str,
    bytepos: usize,
    line: u32,
    state: ScanState,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer for `filetext`. The `filename` is only used in error messages.
    #[must_use]
    pub fn new(filename: &'a str, filetext: &'a str) -> Self {
        Self {
            filename,
            filetext,
            bytepos: 0,
            line: 1,
            state: ScanState::Start,
        }
    }

    /// the current line of the scan position
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    // next_plain_word()
    // get the next whitespace separated word from the plain text region that ends at `end`
    fn next_plain_word(&mut self, end: usize) -> Option<A2lWord<'a>> {
        let filebytes = self.filetext.as_bytes();

        let wordstart = skip_while(filebytes, self.bytepos, end, is_separator);
        self.line += count_newlines(&filebytes[self.bytepos..wordstart]);
        self.bytepos = wordstart;
        if wordstart == end {
            return None;
        }

        let wordend = skip_while(filebytes, wordstart, end, |c| !is_separator(c));
        self.bytepos = wordend;
        Some(A2lWord {
            text: &self.filetext[wordstart..wordend],
            line: self.line,
        })
    }

    // handle_marker()
    // consume the comment or string that starts at the current position.
    // Strings produce a word, comments are skipped.
    fn handle_marker(&mut self, marker: Marker) -> Result<Option<A2lWord<'a>>, TokenizerError> {
        let filebytes = self.filetext.as_bytes();
        let startpos = self.bytepos;

        match marker {
            Marker::BlockComment => {
                let Some(closepos) = find_sequence(filebytes, startpos + 2, b"*/") else {
                    return Err(TokenizerError::UnclosedComment {
                        filename: self.filename.to_owned(),
                        line: self.line,
                    });
                };
                self.bytepos = closepos + 2;
                self.line += count_newlines(&filebytes[startpos..self.bytepos]);
                Ok(None)
            }
            Marker::LineComment => {
                if let Some(newline) = find_byte(filebytes, startpos + 2, b'\n') {
                    self.bytepos = newline + 1;
                    self.line += 1;
                } else {
                    // a line comment on the last line simply ends the input
                    self.bytepos = filebytes.len();
                }
                Ok(None)
            }
            Marker::Quote => {
                let Some(endpos) = find_string_end(filebytes, startpos + 1) else {
                    return Err(TokenizerError::UnclosedString {
                        filename: self.filename.to_owned(),
                        line: self.line,
                    });
                };
                let word = A2lWord {
                    text: &self.filetext[startpos + 1..endpos],
                    line: self.line,
                };
                self.line += count_newlines(word.text.as_bytes());
                self.bytepos = endpos + 1;
                Ok(Some(word))
            }
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<A2lWord<'a>, TokenizerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                ScanState::Start => {
                    let filebytes = self.filetext.as_bytes();
                    let (end, marker) = match find_marker(filebytes, self.bytepos) {
                        Some((markerpos, marker)) => (markerpos, Some(marker)),
                        None => (filebytes.len(), None),
                    };
                    self.state = ScanState::Plain { end, marker };
                }
                ScanState::Plain { end, marker } => {
                    if let Some(word) = self.next_plain_word(end) {
                        return Some(Ok(word));
                    }
                    // the plain region is used up, bytepos is now at the marker
                    let Some(marker) = marker else {
                        self.state = ScanState::Done;
                        return None;
                    };
                    self.state = ScanState::Start;
                    match self.handle_marker(marker) {
                        Ok(Some(word)) => return Some(Ok(word)),
                        Ok(None) => {}
                        Err(error) => {
                            self.state = ScanState::Done;
                            return Some(Err(error));
                        }
                    }
                }
                ScanState::Done => return None,
            }
        }
    }
}

impl FusedIterator for Tokenizer<'_> {}

// find_marker()
// find the earliest start of a block comment, a line comment or a string at or after bytepos.
// The markers are ASCII, so they can never be part of a multi-byte UTF-8 character
fn find_marker(filebytes: &[u8], bytepos: usize) -> Option<(usize, Marker)> {
    let mut pos = bytepos;
    while pos < filebytes.len() {
        match filebytes[pos] {
            b'"' => return Some((pos, Marker::Quote)),
            b'/' => match filebytes.get(pos + 1) {
                Some(b'*') => return Some((pos, Marker::BlockComment)),
                Some(b'/') => return Some((pos, Marker::LineComment)),
                _ => {}
            },
            _ => {}
        }
        pos += 1;
    }
    None
}

// find_string_end()
// find the position of the quote that closes a string whose content starts at `start`.
// A quote is escaped if it is preceded by an odd number of backslashes, or if it is
// immediately followed by another quote (the "" escape)
fn find_string_end(filebytes: &[u8], start: usize) -> Option<usize> {
    let mut searchpos = start;
    loop {
        let quotepos = find_byte(filebytes, searchpos, b'"')?;
        let backslashes = filebytes[start..quotepos]
            .iter()
            .rev()
            .take_while(|c| **c == b'\\')
            .count();

        if backslashes % 2 == 1 {
            searchpos = quotepos + 1;
        } else if filebytes.get(quotepos + 1) == Some(&b'"') {
            searchpos = quotepos + 2;
        } else {
            return Some(quotepos);
        }
    }
}

// find_byte()
fn find_byte(filebytes: &[u8], from: usize, target: u8) -> Option<usize> {
    filebytes
        .get(from..)?
        .iter()
        .position(|c| *c == target)
        .map(|pos| pos + from)
}

// find_sequence()
// find the first occurrence of `pattern` at or after `from`
fn find_sequence(filebytes: &[u8], from: usize, pattern: &[u8]) -> Option<usize> {
    filebytes
        .get(from..)?
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|pos| pos + from)
}

// skip_while()
// advance from `pos` while the predicate holds, but never beyond `end`
fn skip_while(
    filebytes: &[u8],
    mut pos: usize,
    end: usize,
    predicate: impl Fn(u8) -> bool,
) -> usize {
    while pos < end && predicate(filebytes[pos]) {
        pos += 1;
    }
    pos
}

// is_separator()
// space, tab, CR, LF, vertical tab and form feed separate words
fn is_separator(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x0b | 0x0c)
}

// count_newlines()
// count the number of newlines in a comment or string. This is needed to keep the line count accurate
fn count_newlines(text: &[u8]) -> u32 {
    text.iter().map(|c| u32::from(*c == b'\n')).sum()
}

/*************************************************************************************************/
