// Integration tests for the .config model

use ukconfig::dotconfig::{ConfigValue, DotConfigError, DotConfigFile};
use ukconfig::kconfig::{parse_str, KeyValueMap, Tristate};

const SAMPLE: &str = "\
#
# Automatically generated file; DO NOT EDIT.
# Unikraft/0.16.0 Configuration
#
CONFIG_UK_NAME=\"helloworld\"
CONFIG_LIBUKDEBUG=y
# CONFIG_LIBUKDEBUG_PRINTD is not set
CONFIG_LIBUKDEBUG_PRINTK_INFO=m

#
# Allocators
#
CONFIG_LIBUKALLOC_IFSTATS_PERLIB=m
CONFIG_STACK_SIZE_PAGE_ORDER=4
CONFIG_UKPLAT_MEMRNAME=0x10000
CONFIG_NEGATIVE=-3
# end of Allocators
";

#[test]
fn test_values_are_total() {
    let config = DotConfigFile::parse("CONFIG_FOO=y\n# CONFIG_BAR is not set\n");
    assert_eq!(config.value("FOO"), &ConfigValue::Yes);
    assert_eq!(config.value("BAR"), &ConfigValue::NotSet);
    assert_eq!(config.value("BAZ"), &ConfigValue::NotSet);
    assert!(config.contains("BAR"));
    assert!(!config.contains("BAZ"));
}

#[test]
fn test_round_trip_preserves_text() {
    let config = DotConfigFile::parse(SAMPLE);
    assert_eq!(config.serialize(), SAMPLE);
    assert_eq!(config.len(), 8);
    assert_eq!(config.trailing_comments(), ["# end of Allocators"]);

    let reparsed = DotConfigFile::parse(&config.serialize());
    for entry in config.entries() {
        assert_eq!(reparsed.value(entry.name()), entry.value());
    }
}

#[test]
fn test_literal_values() {
    let config = DotConfigFile::parse(SAMPLE);
    assert_eq!(
        config.value("UK_NAME").text().as_deref(),
        Some("helloworld")
    );
    assert_eq!(config.value("STACK_SIZE_PAGE_ORDER").as_str(), "4");
    assert_eq!(config.value("UKPLAT_MEMRNAME").as_str(), "0x10000");
    assert_eq!(config.value("NEGATIVE").as_str(), "-3");
    assert_eq!(config.value("LIBUKDEBUG").tristate(), Tristate::Yes);
    assert_eq!(config.value("LIBUKDEBUG_PRINTK_INFO").tristate(), Tristate::Module);
}

#[test]
fn test_malformed_lines_become_comments() {
    let source = "CONFIG_BROKEN=not a value\nCONFIG_OK=y\n";
    let config = DotConfigFile::parse(source);
    assert!(!config.contains("BROKEN"));
    let ok = config.entries().next().unwrap();
    assert_eq!(ok.name(), "OK");
    assert_eq!(ok.comments(), ["CONFIG_BROKEN=not a value"]);
    assert_eq!(config.serialize(), source);
}

#[test]
fn test_set_appends_with_pending_comments() {
    let mut config = DotConfigFile::parse("CONFIG_A=y\n# note about B\n");
    config.set("B", "m");
    config.set("C", ConfigValue::Literal("12".into()));
    config.set("A", Tristate::No);

    assert_eq!(
        config.serialize(),
        "# CONFIG_A is not set\n# note about B\nCONFIG_B=m\nCONFIG_C=12\n"
    );
    let names: Vec<&str> = config.entries().map(|e| e.name()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[test]
fn test_set_existing_leaves_trailing_comments() {
    let mut config = DotConfigFile::parse(SAMPLE);
    config.set("UK_NAME", "m");
    config.set("STACK_SIZE_PAGE_ORDER", "6");
    config.set("LIBUKDEBUG", Tristate::No);

    assert_eq!(config.trailing_comments(), ["# end of Allocators"]);
    let serialized = config.serialize();
    assert!(serialized.ends_with("CONFIG_NEGATIVE=-3\n# end of Allocators\n"));
    assert!(serialized.starts_with("#\n# Automatically generated file; DO NOT EDIT.\n"));
    assert_eq!(serialized.lines().count(), SAMPLE.lines().count());
}

#[test]
fn test_set_values_survive_round_trip() {
    let mut config = DotConfigFile::new();
    config.set("EMPTY", "");
    config.set("WORDS", "hello world");
    config.set("QUOTES", "say \"hi\" \\ bye");
    config.set("HEX", "0x10");
    config.set("NEG", "-7");
    config.set("TRI", "m");
    config.set("LIT_Y", ConfigValue::Literal("y".into()));
    config.set("LIT_BARE", ConfigValue::Literal("bare".into()));
    config.set("MULTILINE", "first\nsecond");
    config.set("OFF", "n");

    let reparsed = DotConfigFile::parse(&config.serialize());
    assert_eq!(reparsed.len(), config.len());
    assert!(reparsed.trailing_comments().is_empty());
    for entry in config.entries() {
        assert_eq!(
            reparsed.value(entry.name()),
            entry.value(),
            "{} changed across a round trip",
            entry.name()
        );
    }

    assert_eq!(config.value("WORDS").text().as_deref(), Some("hello world"));
    assert_eq!(config.value("EMPTY").text().as_deref(), Some(""));
    assert_eq!(config.value("QUOTES").text().as_deref(), Some("say \"hi\" \\ bye"));
    assert_eq!(config.value("LIT_Y"), &ConfigValue::Yes);
    assert_eq!(config.value("OFF"), &ConfigValue::NotSet);
}

#[test]
fn test_unset_keeps_position_and_comments() {
    let mut config = DotConfigFile::parse("# about A\nCONFIG_A=y\n# about B\nCONFIG_B=m\n");
    config.unset("A");
    assert_eq!(config.value("A"), &ConfigValue::NotSet);
    assert_eq!(
        config.serialize(),
        "# about A\n# CONFIG_A is not set\n# about B\nCONFIG_B=m\n"
    );

    let before = config.clone();
    config.unset("MISSING");
    assert_eq!(config, before);
    assert!(!config.contains("MISSING"));
}

#[test]
fn test_mod_to_yes_is_lossy() {
    let mut config = DotConfigFile::parse(SAMPLE);
    let original = config.clone();

    config.mod_to_yes();
    for entry in original.entries() {
        let expected = match entry.value() {
            ConfigValue::Module => &ConfigValue::Yes,
            other => other,
        };
        assert_eq!(config.value(entry.name()), expected);
    }

    // Former modules cannot be told apart from real `y` entries anymore
    config.mod_to_no();
    assert_eq!(config.value("LIBUKALLOC_IFSTATS_PERLIB"), &ConfigValue::Yes);
    assert_eq!(config.value("LIBUKDEBUG_PRINTK_INFO"), &ConfigValue::Yes);
    assert_ne!(config, original);
}

#[test]
fn test_mod_to_no() {
    let mut config = DotConfigFile::parse(SAMPLE);
    config.mod_to_no();
    assert_eq!(config.value("LIBUKALLOC_IFSTATS_PERLIB"), &ConfigValue::NotSet);
    assert_eq!(config.value("LIBUKDEBUG"), &ConfigValue::Yes);
    assert!(config
        .serialize()
        .contains("# CONFIG_LIBUKALLOC_IFSTATS_PERLIB is not set\n"));
}

#[test]
fn test_clone_is_independent() {
    let config = DotConfigFile::parse("CONFIG_A=y\n");
    let mut copy = config.clone();
    copy.set("A", "m");
    copy.set("B", "y");
    assert_eq!(config.value("A"), &ConfigValue::Yes);
    assert_eq!(config.len(), 1);
    assert_eq!(copy.len(), 2);
}

#[test]
fn test_file_io() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".config");
    std::fs::write(&path, SAMPLE).unwrap();

    let mut config = DotConfigFile::from_file(&path).expect("Reading failed");
    config.set("LIBUKDEBUG", "n");
    config.write_to(&path).expect("Writing failed");

    let reread = DotConfigFile::from_file(&path).expect("Reading failed");
    assert_eq!(reread.value("LIBUKDEBUG"), &ConfigValue::NotSet);
    assert_eq!(reread.len(), config.len());

    let missing = DotConfigFile::from_file(dir.path().join("missing"));
    assert!(matches!(missing, Err(DotConfigError::Read { .. })));
    let unwritable = config.write_to(dir.path().join("no/such/dir/.config"));
    assert!(matches!(unwritable, Err(DotConfigError::Write { .. })));
}

#[test]
fn test_expressions_read_config_values() {
    let kconf = parse_str(
        "mainmenu \"Test\"\n\
         config NAME\n\tstring\n\
         config NET\n\ttristate\n\
         config FEATURE\n\tbool\n\tdepends on NET && NAME = \"helloworld\"\n",
        "Config.uk",
        KeyValueMap::new(),
    )
    .expect("Parsing failed");
    let feature = kconf.config_id("FEATURE").unwrap();

    let mut config = DotConfigFile::parse("CONFIG_NAME=\"helloworld\"\nCONFIG_NET=m\n");
    assert_eq!(kconf.availability(feature, &config), Tristate::Module);

    config.mod_to_yes();
    assert_eq!(kconf.availability(feature, &config), Tristate::Yes);

    config.set("NAME", ConfigValue::string("other"));
    assert_eq!(kconf.availability(feature, &config), Tristate::No);
}
