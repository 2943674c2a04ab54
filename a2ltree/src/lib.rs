//! a2ltree reads a2l files into a generic tree of blocks.
//!
//! The input is split into words, while comments are discarded and strings are kept as a single word.
//! Every `/begin KEY ... /end KEY` block becomes a [`Node`] which stores the plain words and the nested blocks
//! of the block in the order of the input. No attempt is made to interpret the content of the blocks.
//!
//! The content of some blocks (by default `A2ML` and `IF_DATA`) is not described by the a2l standard and
//! can't be represented in the tree in a meaningful way. These blocks are "opaque": they appear in the
//! tree, but all the words and blocks inside them are skipped.
//!
//! # Example
//!
//! ```rust
//! # use a2ltree::{A2lError, ParserConfig};
//! # fn main() -> Result<(), A2lError> {
//! let text = r#"
//! ASAP2_VERSION 1 71
//! /begin PROJECT new_project ""
//!   /begin MODULE new_module ""
//!   /end MODULE
//! /end PROJECT
//! "#;
//! let (doc, log_msgs) = a2ltree::load_from_string(text, &ParserConfig::default())?;
//! assert!(log_msgs.is_empty());
//! let project = doc.root.get_child("PROJECT").unwrap();
//! assert_eq!(project.words[0], "new_project");
//! assert_eq!(project.children[0].key, "MODULE");
//! # Ok(())
//! # }
//! ```

mod loader;
mod node;
mod parser;
mod tokenizer;

use fnv::FnvHashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use loader::Encoding;
pub use node::{Node, NodeIter};
pub use parser::ParserError;
pub use tokenizer::{A2lWord, Tokenizer, TokenizerError};

use parser::ParserState;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum A2lError {
    /// `FileOpenError`: An `IoError` that occurred while loading a file
    #[error("Failed to load {filename}: {ioerror}")]
    FileOpenError {
        filename: PathBuf,
        ioerror: std::io::Error,
    },

    /// `FileReadError`: An `IoError` that occurred while reading from a file
    #[error("Could not read from {filename}: {ioerror}")]
    FileReadError {
        filename: PathBuf,
        ioerror: std::io::Error,
    },

    /// `TokenizerError`: The input ended inside a comment or a string
    #[error("Tokenizer error: {tokenizer_error}")]
    TokenizerError { tokenizer_error: TokenizerError },

    /// `ParserError`: The blocks in the input are not structured correctly
    #[error("Parser error: {parser_error}")]
    ParserError { parser_error: ParserError },
}

/// Settings for parsing a2l data
///
/// By default, parsing is not strict and the blocks `A2ML` and `IF_DATA` are opaque.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Toggles strict parsing.
    ///
    /// If strict parsing is disabled, an unclosed comment or string silently ends the input, and
    /// blocks which are still open at the end of the input are accepted. Each of these events is
    /// reported as a warning. With strict parsing, they are errors.
    pub strict: bool,
    opaque_keywords: FnvHashSet<String>,
}

const DEFAULT_OPAQUE_KEYWORDS: [&str; 2] = ["A2ML", "IF_DATA"];

impl ParserConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            strict: false,
            opaque_keywords: DEFAULT_OPAQUE_KEYWORDS
                .iter()
                .map(|kw| (*kw).to_string())
                .collect(),
        }
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Make `MEASUREMENT` blocks opaque. This greatly reduces the size of the tree for large files,
    /// if the measurements are not needed.
    #[must_use]
    pub fn with_opaque_measurements(mut self, opaque: bool) -> Self {
        if opaque {
            self.opaque_keywords.insert("MEASUREMENT".to_string());
        } else {
            self.opaque_keywords.remove("MEASUREMENT");
        }
        self
    }

    /// Add a keyword to the set of opaque block keywords
    #[must_use]
    pub fn with_opaque_keyword(mut self, keyword: &str) -> Self {
        self.opaque_keywords.insert(keyword.to_string());
        self
    }

    /// check if blocks with the given keyword are opaque
    #[must_use]
    pub fn is_opaque(&self, keyword: &str) -> bool {
        self.opaque_keywords.contains(keyword)
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// The result of loading an a2l file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A2lDocument {
    /// the synthetic root block, which contains all the top-level words and blocks of the file
    pub root: Node,
    /// the text encoding that was detected while loading. `None` if the input was already a string
    pub encoding: Option<Encoding>,
    /// digest of the raw file content, for change detection.
    ///
    /// The loader stores a 64-bit FNV-1a hash here. It is not used by the parser and may be
    /// replaced by a digest from any other source.
    pub digest: Option<Vec<u8>>,
}

/**
Load an a2l file

The file is read completely, its text encoding is detected (UTF-8, UTF-16, UTF-32 or ISO-8859-1) and then it is parsed.

The returned `Vec<A2lError>` contains all warnings generated during parsing. It is always empty if `config.strict` is set.

# Example
```
# use a2ltree::ParserConfig;
match a2ltree::load("example.a2l", &ParserConfig::default()) {
    Ok((doc, log_messages)) => {/* do something with it*/},
    Err(error_message) => println!("{error_message}")
}
```

# Errors

An `A2lError` provides details information if loading the file fails.
 */
pub fn load<P: AsRef<Path>>(
    path: P,
    config: &ParserConfig,
) -> Result<(A2lDocument, Vec<A2lError>), A2lError> {
    let pathref = path.as_ref();
    let filedata = loader::load(pathref)?;
    let filename = pathref.to_string_lossy();
    load_bytes_impl(&filename, &filedata, config)
}

/// Load a2l data from a byte buffer
///
/// The text encoding of the data is detected in the same way as in [`load`].
///
/// # Errors
///
/// An `A2lError` provides details information if parsing the data fails.
pub fn load_from_bytes(
    a2ldata: &[u8],
    config: &ParserConfig,
) -> Result<(A2lDocument, Vec<A2lError>), A2lError> {
    load_bytes_impl("", a2ldata, config)
}

/**
Load a2l data stored in a string

# Example

```rust
# use a2ltree::{A2lError, ParserConfig};
# fn main() -> Result<(), A2lError> {
let text = r#"/begin MEASUREMENT m "" UBYTE /begin IF_DATA XCP 0x1 /end IF_DATA /end MEASUREMENT"#;
let (doc, _) = a2ltree::load_from_string(text, &ParserConfig::default())?;
let measurement = &doc.root.children[0];
assert_eq!(measurement.words, vec!["m", "", "UBYTE"]);
assert!(measurement.children[0].words.is_empty());
assert!(doc.digest.is_none());
# Ok(())
# }
```

# Errors

An `A2lError` provides details information if parsing the data fails.
 */
pub fn load_from_string(
    a2ldata: &str,
    config: &ParserConfig,
) -> Result<(A2lDocument, Vec<A2lError>), A2lError> {
    let (root, log_msgs) = load_impl("", a2ldata, config)?;
    Ok((
        A2lDocument {
            root,
            encoding: None,
            digest: None,
        },
        log_msgs,
    ))
}

fn load_bytes_impl(
    filename: &str,
    filedata: &[u8],
    config: &ParserConfig,
) -> Result<(A2lDocument, Vec<A2lError>), A2lError> {
    let digest = loader::content_digest(filedata);
    let (text, encoding) = loader::decode_raw_bytes(filedata);
    let (root, log_msgs) = load_impl(filename, &text, config)?;
    Ok((
        A2lDocument {
            root,
            encoding: Some(encoding),
            digest: Some(digest),
        },
        log_msgs,
    ))
}

fn load_impl(
    filename: &str,
    filetext: &str,
    config: &ParserConfig,
) -> Result<(Node, Vec<A2lError>), A2lError> {
    let mut log_msgs = Vec::<A2lError>::new();
    let tokenizer = Tokenizer::new(filename, filetext);
    let root = ParserState::new(filename, config, &mut log_msgs).parse_tree(tokenizer)?;
    Ok((root, log_msgs))
}

/*************************************************************************************************/

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_empty_input() {
        let (doc, log_msgs) = load_from_string("", &ParserConfig::default()).unwrap();
        assert!(doc.root.is_root());
        assert!(doc.root.words.is_empty());
        assert!(doc.root.children.is_empty());
        assert!(log_msgs.is_empty());
    }

    #[test]
    fn test_load_file() {
        let dir = tempdir().unwrap();

        // create a file in a temp directory and load it
        let path = dir.path().join("test.a2l");
        let text = r#"
            ASAP2_VERSION 1 71
            /begin PROJECT new_project ""
                /begin MODULE new_module ""
                /end MODULE
            /end PROJECT
        "#;
        std::fs::write(&path, text).unwrap();

        let (doc, _) = load(&path, &ParserConfig::default()).unwrap();
        let module = &doc.root.get_child("PROJECT").unwrap().children[0];
        assert_eq!(module.words[0], "new_module");
        assert_eq!(module.line, 4);
        assert_eq!(doc.encoding, Some(Encoding::Utf8));
        assert_eq!(doc.digest, Some(loader::content_digest(text.as_bytes())));

        // try to load a file that does not exist
        let nonexistent_path = dir.path().join("nonexistent.a2l");
        let result = load(nonexistent_path, &ParserConfig::default());
        assert!(matches!(result, Err(A2lError::FileOpenError { .. })));
    }

    #[test]
    fn error_messages_contain_filename() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.a2l");
        std::fs::write(&path, "/begin A\n/end B").unwrap();

        let error = load(&path, &ParserConfig::default()).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("broken.a2l:2:"));
        assert!(message.contains("expected /end A, got /end B"));
    }

    #[test]
    fn load_bytes() {
        // UTF-16 little endian with BOM
        let mut data: Vec<u8> = vec![0xff, 0xfe];
        for c in "/begin A x /end A".encode_utf16() {
            data.extend_from_slice(&c.to_le_bytes());
        }
        let (doc, _) = load_from_bytes(&data, &ParserConfig::default()).unwrap();
        assert_eq!(doc.encoding, Some(Encoding::Utf16Le));
        assert_eq!(doc.root.children[0].key, "A");
        assert_eq!(doc.root.children[0].words, vec!["x"]);
        assert!(doc.digest.is_some());
    }

    #[test]
    fn strict_parsing() {
        let data = "/begin A /* comment";

        let (doc, log_msgs) = load_from_string(data, &ParserConfig::default()).unwrap();
        assert_eq!(doc.root.children[0].key, "A");
        // one warning for the comment and one for the open block
        assert_eq!(log_msgs.len(), 2);

        let result = load_from_string(data, &ParserConfig::new().with_strict(true));
        assert!(matches!(
            result,
            Err(A2lError::TokenizerError {
                tokenizer_error: TokenizerError::UnclosedComment { .. }
            })
        ));
    }

    #[test]
    fn parser_config() {
        let config = ParserConfig::default();
        assert!(!config.strict);
        assert!(config.is_opaque("A2ML"));
        assert!(config.is_opaque("IF_DATA"));
        assert!(!config.is_opaque("MEASUREMENT"));

        let config = config.with_opaque_measurements(true);
        assert!(config.is_opaque("MEASUREMENT"));
        let config = config.with_opaque_measurements(false);
        assert!(!config.is_opaque("MEASUREMENT"));

        let config = config.with_opaque_keyword("ANNOTATION_TEXT");
        assert!(config.is_opaque("ANNOTATION_TEXT"));
        // keywords are case sensitive
        assert!(!config.is_opaque("if_data"));
    }
}
