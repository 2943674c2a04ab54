#[cfg(test)]
mod test {
    use a2ltree::*;
    use tempfile::tempdir;

    const TEST_A2L: &str = r###"
ASAP2_VERSION 1 61
/begin PROJECT SOMETHING "project ""quoted"" name"

  /begin MODULE CPP "module \"CPP\" // not a comment"
    /begin A2ML
      struct Foo {
        uint;
        uint;
      }; /* trap: /end A2ML */
      block "IF_DATA" taggedunion if_data {
        "ETK" struct Foo;
      };
    /end A2ML
    /begin MOD_COMMON ""
      BYTE_ORDER MSB_LAST
      ALIGNMENT_BYTE 1
    /end MOD_COMMON
    /*
     * computation methods
     */
    /begin COMPU_METHOD compumethod
      ""
      RAT_FUNC
      "%6.3"
      ""
      COEFFS 0 1 0 0 0 1 // identity
      REF_UNIT abc
    /end COMPU_METHOD
    /begin MEASUREMENT measurement ""
      UBYTE CM.IDENTICAL 0 0 0 255
      /begin IF_DATA ETK
        KP_BLOB 0x13A30 INTERN 0x1 RASTER 0x4
      /end IF_DATA
    /end MEASUREMENT
    /begin MEASUREMENT measurement_2 "second
line"
      UWORD CM.IDENTICAL 0 0 0 65535
    /end MEASUREMENT
  /end MODULE
/end PROJECT"###;

    #[test]
    fn parse_document() {
        let (doc, log_msgs) = load_from_string(TEST_A2L, &ParserConfig::default()).unwrap();
        assert!(log_msgs.is_empty());

        let root = &doc.root;
        assert!(root.is_root());
        assert_eq!(root.words, vec!["ASAP2_VERSION", "1", "61"]);
        assert_eq!(root.children.len(), 1);

        let project = &root.children[0];
        assert_eq!(project.key, "PROJECT");
        assert_eq!(project.line, 3);
        assert_eq!(project.words, vec!["SOMETHING", r#"project ""quoted"" name"#]);

        let module = project.get_child("MODULE").unwrap();
        assert_eq!(module.line, 5);
        assert_eq!(
            module.words,
            vec!["CPP", r#"module \"CPP\" // not a comment"#]
        );
        let keys: Vec<&str> = module.children.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "A2ML",
                "MOD_COMMON",
                "COMPU_METHOD",
                "MEASUREMENT",
                "MEASUREMENT"
            ]
        );

        // the content of the A2ML block is skipped
        let a2ml = module.get_child("A2ML").unwrap();
        assert_eq!(a2ml.line, 6);
        assert!(a2ml.words.is_empty());
        assert!(a2ml.children.is_empty());

        let mod_common = module.get_child("MOD_COMMON").unwrap();
        assert_eq!(mod_common.line, 15);
        assert_eq!(
            mod_common.words,
            vec!["", "BYTE_ORDER", "MSB_LAST", "ALIGNMENT_BYTE", "1"]
        );

        let compu_method = module.get_child("COMPU_METHOD").unwrap();
        assert_eq!(compu_method.line, 22);
        assert_eq!(
            compu_method.words,
            vec![
                "compumethod",
                "",
                "RAT_FUNC",
                "%6.3",
                "",
                "COEFFS",
                "0",
                "1",
                "0",
                "0",
                "0",
                "1",
                "REF_UNIT",
                "abc"
            ]
        );

        let measurements: Vec<&Node> = module.children_by_key("MEASUREMENT").collect();
        assert_eq!(measurements.len(), 2);
        assert_eq!(measurements[0].line, 30);
        assert_eq!(measurements[0].words[0], "measurement");
        assert_eq!(measurements[0].children.len(), 1);
        let if_data = &measurements[0].children[0];
        assert_eq!(if_data.key, "IF_DATA");
        assert_eq!(if_data.line, 32);
        assert!(if_data.words.is_empty());

        assert_eq!(measurements[1].line, 36);
        assert_eq!(measurements[1].words[1], "second\nline");
        assert_eq!(measurements[1].words[2], "UWORD");

        // no content of any opaque block reaches the tree
        for node in root {
            assert!(!node.words.iter().any(|w| w == "KP_BLOB" || w == "struct"));
        }
    }

    #[test]
    fn parse_twice() {
        let config = ParserConfig::default();
        let (doc_1, _) = load_from_string(TEST_A2L, &config).unwrap();
        let (doc_2, _) = load_from_string(TEST_A2L, &config).unwrap();
        assert_eq!(doc_1, doc_2);
    }

    #[test]
    fn parse_concurrently() {
        let config = ParserConfig::default();
        let (expected, _) = load_from_string(TEST_A2L, &config).unwrap();
        let config = &config;

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(move || load_from_string(TEST_A2L, config).unwrap().0))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn opaque_measurements() {
        let config = ParserConfig::new().with_opaque_measurements(true);
        let (doc, _) = load_from_string(TEST_A2L, &config).unwrap();
        let measurements = doc.root.find_all("MEASUREMENT");
        assert_eq!(measurements.len(), 2);
        for measurement in measurements {
            assert!(measurement.words.is_empty());
            assert!(measurement.children.is_empty());
        }
        assert!(doc.root.find_all("IF_DATA").is_empty());
        // other blocks are not affected
        assert_eq!(doc.root.find_all("COMPU_METHOD")[0].words.len(), 14);
    }

    #[test]
    fn comments_do_not_change_the_tree() {
        let without_comments = r#"
ASAP2_VERSION 1 61
/begin PROJECT p ""
  /begin MODULE m ""
    /begin COMPU_METHOD cm "" IDENTICAL "%6.3" "" /end COMPU_METHOD
  /end MODULE
/end PROJECT"#;
        let with_comments = r#"
ASAP2_VERSION 1 61 // version
/begin PROJECT p "" /* the project */
  /begin MODULE m ""
    /begin COMPU_METHOD cm "" IDENTICAL "%6.3" "" /end COMPU_METHOD /* /end MODULE */
  /end MODULE
/end PROJECT"#;
        let config = ParserConfig::new().with_strict(true);
        let (doc_1, _) = load_from_string(without_comments, &config).unwrap();
        let (doc_2, _) = load_from_string(with_comments, &config).unwrap();
        assert_eq!(doc_1, doc_2);
    }

    #[test]
    fn keyword_mismatch() {
        let result = load_from_string(
            "/begin PROJECT p \"\"\n  /begin MODULE m \"\"\n  /end PROJECT\n/end MODULE",
            &ParserConfig::default(),
        );
        let Err(A2lError::ParserError {
            parser_error:
                ParserError::IncorrectEndTag {
                    expected,
                    actual,
                    error_line,
                    ..
                },
        }) = result
        else {
            panic!("expected IncorrectEndTag");
        };
        assert_eq!(expected, "MODULE");
        assert_eq!(actual, "PROJECT");
        assert_eq!(error_line, 3);
    }

    #[test]
    fn strict_and_lenient() {
        let truncated = "/begin PROJECT p \"\"\n  /begin MODULE m \"unterminated\n";

        let (doc, log_msgs) = load_from_string(truncated, &ParserConfig::default()).unwrap();
        let project = doc.root.get_child("PROJECT").unwrap();
        let module = project.get_child("MODULE").unwrap();
        assert_eq!(module.words, vec!["m"]);
        assert_eq!(log_msgs.len(), 2);
        assert!(matches!(
            log_msgs[0],
            A2lError::TokenizerError {
                tokenizer_error: TokenizerError::UnclosedString { line: 2, .. }
            }
        ));
        assert!(matches!(
            log_msgs[1],
            A2lError::ParserError {
                parser_error: ParserError::UnexpectedEOF { .. }
            }
        ));

        let result = load_from_string(truncated, &ParserConfig::new().with_strict(true));
        assert!(matches!(
            result,
            Err(A2lError::TokenizerError {
                tokenizer_error: TokenizerError::UnclosedString { line: 2, .. }
            })
        ));
    }

    #[test]
    fn load_files() {
        let dir = tempdir().unwrap();

        // utf-8 with BOM
        let path = dir.path().join("utf8.a2l");
        let mut data = vec![0xef, 0xbb, 0xbf];
        data.extend_from_slice(TEST_A2L.as_bytes());
        std::fs::write(&path, &data).unwrap();
        let (doc, _) = load(&path, &ParserConfig::default()).unwrap();
        assert_eq!(doc.encoding, Some(Encoding::Utf8));
        let (expected, _) = load_from_string(TEST_A2L, &ParserConfig::default()).unwrap();
        assert_eq!(doc.root, expected.root);

        // the digest changes when the file content changes
        let path_2 = dir.path().join("utf8_2.a2l");
        std::fs::write(&path_2, TEST_A2L.as_bytes()).unwrap();
        let (doc_2, _) = load(&path_2, &ParserConfig::default()).unwrap();
        assert_eq!(doc.root, doc_2.root);
        assert!(doc.digest.is_some());
        assert_ne!(doc.digest, doc_2.digest);

        // latin-1
        let path = dir.path().join("latin1.a2l");
        std::fs::write(&path, b"/begin UNIT u \"\xb0C\" /end UNIT").unwrap();
        let (doc, _) = load(&path, &ParserConfig::default()).unwrap();
        assert_eq!(doc.encoding, Some(Encoding::Latin1));
        assert_eq!(doc.root.children[0].words, vec!["u", "\u{b0}C"]);
    }

    #[test]
    fn tokenizer_words() {
        let words: Vec<(&str, u32)> = Tokenizer::new("", "a \"b c\"\n/* x\n */ d")
            .map(|item| {
                let word = item.unwrap();
                (word.text, word.line)
            })
            .collect();
        assert_eq!(words, vec![("a", 1), ("b c", 1), ("d", 3)]);
    }
}
