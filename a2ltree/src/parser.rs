use thiserror::Error;

use crate::node::Node;
use crate::tokenizer::{A2lWord, Tokenizer};
use crate::{A2lError, ParserConfig};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParserError {
    #[error(
        "{filename}:{error_line}: keyword mismatch: expected /end {expected}, got /end {actual} for the block starting on line {block_line}"
    )]
    IncorrectEndTag {
        filename: String,
        error_line: u32,
        block_line: u32,
        expected: String,
        actual: String,
    },

    #[error("{filename}:{error_line}: /end {tag} was found outside of any block")]
    UnmatchedEnd {
        filename: String,
        error_line: u32,
        tag: String,
    },

    #[error("{filename}:{error_line}: /begin is not followed by a valid tag")]
    InvalidBegin { filename: String, error_line: u32 },

    #[error("{filename}:{error_line}: {marker} at the end of the input is not followed by a tag")]
    IncompleteBlockMarker {
        filename: String,
        error_line: u32,
        marker: String,
    },

    #[error(
        "{filename}:{error_line}: unexpected end of input inside block {block} opened at line {block_line}"
    )]
    UnexpectedEOF {
        filename: String,
        error_line: u32,
        block: String,
        block_line: u32,
    },
}

// an open block on the parser stack
#[derive(Debug)]
struct OpenBlock {
    node: Node,
    // the block was opened while no opaque block was open, so it is part of the output
    attached: bool,
    // the block incremented the opacity depth
    opaque: bool,
}

// the marker word that preceded the current word, and the line it was on
#[derive(Debug, Clone, Copy)]
enum PendingMarker {
    Begin(u32),
    End(u32),
}

pub(crate) struct ParserState<'a> {
    filename: &'a str,
    config: &'a ParserConfig,
    log_msgs: &'a mut Vec<A2lError>,
    // the root is always at the bottom of the stack and is never popped
    stack: Vec<OpenBlock>,
    opacity_depth: u32,
    last_line: u32,
}

impl<'a> ParserState<'a> {
    pub(crate) fn new(
        filename: &'a str,
        config: &'a ParserConfig,
        log_msgs: &'a mut Vec<A2lError>,
    ) -> Self {
        Self {
            filename,
            config,
            log_msgs,
            stack: vec![OpenBlock {
                node: Node::default(),
                attached: true,
                opaque: false,
            }],
            opacity_depth: 0,
            last_line: 1,
        }
    }

    // parse_tree()
    // consume all words of the tokenizer and build the tree of blocks
    pub(crate) fn parse_tree(mut self, tokenizer: Tokenizer<'_>) -> Result<Node, A2lError> {
        let mut pending: Option<PendingMarker> = None;

        for item in tokenizer {
            let word = match item {
                Ok(word) => word,
                Err(tokenizer_error) => {
                    // the input is truncated at the unterminated comment or string
                    self.error_or_log(A2lError::TokenizerError { tokenizer_error })?;
                    break;
                }
            };
            self.last_line = word.line;

            match pending.take() {
                Some(PendingMarker::Begin(line)) => self.open_block(word.text, line)?,
                Some(PendingMarker::End(line)) => self.close_block(word.text, line)?,
                None => match word.text {
                    "/begin" => pending = Some(PendingMarker::Begin(word.line)),
                    "/end" => pending = Some(PendingMarker::End(word.line)),
                    _ => self.add_word(word),
                },
            }
        }

        if let Some(marker) = pending {
            let (marker, error_line) = match marker {
                PendingMarker::Begin(line) => ("/begin", line),
                PendingMarker::End(line) => ("/end", line),
            };
            self.log_parser_error(ParserError::IncompleteBlockMarker {
                filename: self.filename.to_owned(),
                error_line,
                marker: marker.to_owned(),
            })?;
        }

        self.finish()
    }

    // open_block()
    // handle "/begin <tag>"
    fn open_block(&mut self, tag: &str, line: u32) -> Result<(), A2lError> {
        if tag.is_empty() {
            return Err(A2lError::ParserError {
                parser_error: ParserError::InvalidBegin {
                    filename: self.filename.to_owned(),
                    error_line: line,
                },
            });
        }

        let attached = self.opacity_depth == 0;
        let opaque = self.config.is_opaque(tag);
        if opaque {
            self.opacity_depth += 1;
        }
        self.stack.push(OpenBlock {
            node: Node::new(tag.to_owned(), line),
            attached,
            opaque,
        });

        Ok(())
    }

    // close_block()
    // handle "/end <tag>". The tag must match the currently open block
    fn close_block(&mut self, tag: &str, line: u32) -> Result<(), A2lError> {
        if self.stack.len() == 1 {
            return Err(A2lError::ParserError {
                parser_error: ParserError::UnmatchedEnd {
                    filename: self.filename.to_owned(),
                    error_line: line,
                    tag: tag.to_owned(),
                },
            });
        }

        let current = &self.stack[self.stack.len() - 1];
        if current.node.key != tag {
            return Err(A2lError::ParserError {
                parser_error: ParserError::IncorrectEndTag {
                    filename: self.filename.to_owned(),
                    error_line: line,
                    block_line: current.node.line,
                    expected: current.node.key.clone(),
                    actual: tag.to_owned(),
                },
            });
        }

        self.pop_block();
        Ok(())
    }

    // pop_block()
    // remove the topmost block from the stack and attach it to its parent, unless it is suppressed
    fn pop_block(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        if let Some(block) = self.stack.pop() {
            if block.opaque {
                self.opacity_depth -= 1;
            }
            if block.attached {
                if let Some(parent) = self.stack.last_mut() {
                    parent.node.children.push(block.node);
                }
            }
        }
    }

    // add_word()
    // words inside opaque blocks are dropped
    fn add_word(&mut self, word: A2lWord<'_>) {
        if self.opacity_depth > 0 {
            return;
        }
        if let Some(current) = self.stack.last_mut() {
            current.node.words.push(word.text.to_owned());
        }
    }

    // finish()
    // all input has been consumed. Any blocks that are still open are dangling; they stay in the
    // output in the same way as they would have if they had been closed properly
    fn finish(mut self) -> Result<Node, A2lError> {
        if self.stack.len() > 1 {
            let innermost = &self.stack[self.stack.len() - 1].node;
            let parser_error = ParserError::UnexpectedEOF {
                filename: self.filename.to_owned(),
                error_line: self.last_line,
                block: innermost.key.clone(),
                block_line: innermost.line,
            };
            self.log_parser_error(parser_error)?;

            while self.stack.len() > 1 {
                self.pop_block();
            }
        }

        let root = self.stack.pop().map(|block| block.node).unwrap_or_default();
        Ok(root)
    }

    pub(crate) fn log_warning(&mut self, warning: A2lError) {
        self.log_msgs.push(warning);
    }

    // error_or_log()
    // in strict mode problems with the input are errors, otherwise they are only logged
    pub(crate) fn error_or_log(&mut self, err: A2lError) -> Result<(), A2lError> {
        if self.config.strict {
            Err(err)
        } else {
            self.log_warning(err);
            Ok(())
        }
    }

    fn log_parser_error(&mut self, parser_error: ParserError) -> Result<(), A2lError> {
        self.error_or_log(A2lError::ParserError { parser_error })
    }
}

/*************************************************************************************************/
