use ctc_lm_lib::labels::{LabelConfig, LabelError, LabelTranslator, Symbol};

#[test]
fn env_overrides_replace_defaults() {
    // Only test in this binary touching CTC_LABEL_*.
    std::env::set_var("CTC_LABEL_ALPHABET_SIZE", "29");
    std::env::set_var("CTC_LABEL_APOSTROPHE", "26");
    std::env::set_var("CTC_LABEL_SPACE", " 27 ");
    std::env::set_var("CTC_LABEL_BLANK", "not-a-number");

    let config = LabelConfig::from_env();

    std::env::remove_var("CTC_LABEL_ALPHABET_SIZE");
    std::env::remove_var("CTC_LABEL_APOSTROPHE");
    std::env::remove_var("CTC_LABEL_SPACE");
    std::env::remove_var("CTC_LABEL_BLANK");

    assert_eq!(config.alphabet_size, 29);
    assert_eq!(config.letter_count, 26);
    assert_eq!(config.apostrophe, 26);
    assert_eq!(config.space, 27);
    // Unparseable values keep the default.
    assert_eq!(config.blank, LabelConfig::default().blank);
}

#[test]
fn json_config_fills_missing_fields_from_defaults() {
    let config = LabelConfig::from_json_str(r#"{ "alphabet_size": 31, "blank": 30 }"#).unwrap();
    assert_eq!(config.alphabet_size, 31);
    assert_eq!(config.blank, 30);
    assert_eq!(config.space, LabelConfig::default().space);
}

#[test]
fn json_config_is_validated() {
    let err = LabelConfig::from_json_str(r#"{ "space": 29, "blank": 29 }"#).unwrap_err();
    assert!(matches!(err, LabelError::InvalidConfig(_)));

    let err = LabelConfig::from_json_str("{ space: 1 ").unwrap_err();
    assert!(matches!(err, LabelError::Json(_)));
}

#[test]
fn config_loads_from_file() {
    let path = std::env::temp_dir().join(format!("ctc-labels-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{"alphabet_size":29,"letter_count":26,"apostrophe":26,"space":27,"blank":28}"#,
    )
    .unwrap();
    let loaded = LabelConfig::load(&path);
    let _ = std::fs::remove_file(&path);

    let translator = LabelTranslator::new(loaded.unwrap()).unwrap();
    assert_eq!(translator.translate(26).unwrap(), Symbol::Character('\''));
    assert_eq!(translator.translate(27).unwrap(), Symbol::WordBoundary);
    assert_eq!(translator.translate(28).unwrap(), Symbol::Blank);
    assert_eq!(translator.translate(0).unwrap(), Symbol::Character('a'));
}

#[test]
fn missing_config_file_is_io_error() {
    let err = LabelConfig::load("/nonexistent/ctc-labels.json").unwrap_err();
    assert!(matches!(err, LabelError::Io(_)));
    assert!(!err.user_message().is_empty());
}
