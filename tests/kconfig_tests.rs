// Integration tests for the Kconfig parser and dependency resolver

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use ukconfig::kconfig::{
    parse_str, ConfigType, DuplicatePolicy, KConfigFile, KconfigError, KeyValueMap,
    MissingMainMenu, MenuKind, ParseOptions, Parser, Tristate,
};

fn parse(source: &str) -> KConfigFile {
    parse_str(source, "Config.uk", KeyValueMap::new()).expect("Parsing failed")
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn test_simple_dependency() {
    let kconf = parse(
        "mainmenu \"Test\"\n\
         config A\n    bool \"A\"\n\
         config B\n    bool \"B\"\n    depends on A\n",
    );

    let names: BTreeSet<String> = kconf.configs().keys().cloned().collect();
    assert_eq!(names, set(&["A", "B"]));
    assert_eq!(kconf.depends_on_symbol("B"), Some(&set(&["A"])));
    assert!(kconf.depends_on_symbol("A").unwrap().is_empty());

    let root = kconf.root_menu();
    assert_eq!(root.kind, MenuKind::MainMenu);
    assert_eq!(root.title(), "Test");
    let children: Vec<&str> = root
        .children()
        .iter()
        .map(|&id| kconf.menu(id).name.as_str())
        .collect();
    assert_eq!(children, vec!["A", "B"]);
    for &child in root.children() {
        assert_eq!(kconf.parent(child), Some(kconf.root()));
    }
}

#[test]
fn test_transitive_closure() {
    let kconf = parse(
        "mainmenu \"Test\"\n\
         config A\n\tbool\n\
         config B\n\tbool\n\tdepends on A\n\
         config C\n\tbool\n\tvisible if B && !UNKNOWN\n\
         config D\n\tbool\n\tdepends on C || ARCH = \"x86_64\"\n\
         config ARCH\n\tstring\n",
    );

    assert_eq!(kconf.depends_on_symbol("C"), Some(&set(&["A", "B"])));
    assert_eq!(
        kconf.depends_on_symbol("D"),
        Some(&set(&["A", "ARCH", "B", "C"]))
    );
}

#[test]
fn test_cycle_terminates() {
    let kconf = parse(
        "mainmenu \"Test\"\n\
         config A\n\tbool\n\tdepends on B\n\
         config B\n\tbool\n\tdepends on A\n\
         config C\n\tbool\n\tdepends on A\n",
    );

    assert_eq!(kconf.depends_on_symbol("A"), Some(&set(&["A", "B"])));
    assert_eq!(kconf.depends_on_symbol("B"), Some(&set(&["A", "B"])));
    assert_eq!(kconf.depends_on_symbol("C"), Some(&set(&["A", "B"])));
}

#[test]
fn test_memoized_across_threads() {
    let kconf = parse(
        "mainmenu \"Test\"\n\
         config A\n\tbool\n\
         config B\n\tbool\n\tdepends on A\n\
         config C\n\tbool\n\tdepends on B\n",
    );
    let id = kconf.config_id("C").unwrap();

    let results: Vec<&BTreeSet<String>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8).map(|_| s.spawn(|| kconf.depends_on(id))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for deps in &results {
        assert!(std::ptr::eq(*deps, results[0]));
        assert_eq!(*deps, &set(&["A", "B"]));
    }
}

#[test]
fn test_conditions_propagate_through_scopes() {
    let kconf = parse(
        "mainmenu \"Test\"\n\
         config NET\n\tbool \"Networking\"\n\
         menu \"Drivers\"\n\tdepends on NET\n\tvisible if EXPERT\n\
         if PCI\n\
         config VIRTIO\n\ttristate \"Virtio\"\n\tdepends on MMIO\n\
         endif\n\
         endmenu\n\
         config PCI\n\tbool\n\
         config MMIO\n\tbool\n\
         config EXPERT\n\tbool\n",
    );

    let virtio = kconf.lookup("VIRTIO").unwrap();
    assert_eq!(virtio.ty, ConfigType::Tristate);
    assert_eq!(
        virtio.depends_on_expr().unwrap().to_string(),
        "NET && PCI && MMIO"
    );
    assert_eq!(virtio.visible_if_expr().unwrap().to_string(), "EXPERT");
    assert_eq!(
        kconf.depends_on_symbol("VIRTIO"),
        Some(&set(&["EXPERT", "MMIO", "NET", "PCI"]))
    );

    // if blocks sit between their parent menu and their contents
    let if_block = kconf.parent(kconf.config_id("VIRTIO").unwrap()).unwrap();
    assert_eq!(kconf.menu(if_block).kind, MenuKind::If);
    let drivers = kconf.parent(if_block).unwrap();
    assert_eq!(kconf.menu(drivers).title(), "Drivers");
}

#[test]
fn test_choice_and_comment() {
    let kconf = parse(
        "mainmenu \"Test\"\n\
         choice PLATFORM\n\tprompt \"Platform\"\n\tdefault KVM\n\
         config KVM\n\tbool \"KVM\"\n\
         config XEN\n\tbool \"Xen\"\n\
         endchoice\n\
         comment \"Platform selected above\"\n",
    );

    let root = kconf.root_menu();
    assert_eq!(root.children().len(), 2);
    let choice = kconf.menu(root.children()[0]);
    assert_eq!(choice.kind, MenuKind::Choice);
    assert_eq!(choice.name, "PLATFORM");
    assert_eq!(choice.title(), "Platform");
    assert_eq!(choice.children().len(), 2);
    // Only config and menuconfig nodes are indexed
    assert!(kconf.lookup("PLATFORM").is_none());

    let comment = kconf.menu(root.children()[1]);
    assert_eq!(comment.kind, MenuKind::Comment);
    assert_eq!(comment.title(), "Platform selected above");
}

#[test]
fn test_preorder_iteration() {
    let kconf = parse(
        "mainmenu \"Test\"\n\
         menuconfig LIBS\n\tbool \"Libraries\"\n\
         menu \"Libs\"\n\
         config LIBA\n\tbool\n\
         endmenu\n\
         config LAST\n\tbool\n",
    );

    let order: Vec<String> = kconf
        .iter()
        .map(|(_, menu)| format!("{}:{}", menu.kind.as_str(), menu.title()))
        .collect();
    assert_eq!(
        order,
        vec![
            "mainmenu:Test",
            "menuconfig:Libraries",
            "menu:Libs",
            "config:LIBA",
            "config:LAST"
        ]
    );
}

#[test]
fn test_source_relative_and_absolute() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Config.uk",
        "mainmenu \"Root\"\nsource \"lib/Config.uk\"\nconfig AFTER\n\tbool\n",
    );
    write(
        dir.path(),
        "lib/Config.uk",
        "menu \"Lib\"\nsource \"sub/Config.uk\"\nendmenu\n",
    );
    write(dir.path(), "lib/sub/Config.uk", "config DEEP\n\tbool\n\tdepends on AFTER\n");

    let kconf = Parser::new(KeyValueMap::new())
        .parse_file(dir.path().join("Config.uk"))
        .expect("Parsing failed");

    let deep = kconf.lookup("DEEP").unwrap();
    assert_eq!(deep.source, dir.path().join("lib/sub/Config.uk"));
    assert_eq!(deep.line, 1);
    assert_eq!(kconf.depends_on_symbol("DEEP"), Some(&set(&["AFTER"])));

    let lib = kconf.parent(kconf.config_id("DEEP").unwrap()).unwrap();
    assert_eq!(kconf.menu(lib).title(), "Lib");

    // An absolute path is used as is
    let absolute = dir.path().join("lib/sub/Config.uk");
    let kconf = parse_str(
        &format!("mainmenu \"Abs\"\nconfig AFTER\n\tbool\nsource \"{}\"\n", absolute.display()),
        "/nowhere/Config.uk",
        KeyValueMap::new(),
    )
    .expect("Parsing failed");
    assert!(kconf.lookup("DEEP").is_some());
}

#[test]
fn test_optional_source() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Config.uk",
        "mainmenu \"Root\"\nosource \"missing/Config.uk\"\nconfig A\n\tbool\n",
    );
    let kconf = Parser::new(KeyValueMap::new())
        .parse_file(dir.path().join("Config.uk"))
        .expect("Parsing failed");
    assert!(kconf.lookup("A").is_some());
}

#[test]
fn test_source_errors_are_wrapped() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Config.uk",
        "mainmenu \"Root\"\n\nsource \"bad.uk\"\n",
    );
    write(dir.path(), "bad.uk", "config A\n\tbool\n\tfrobnicate\n");

    let err = Parser::new(KeyValueMap::new())
        .parse_file(dir.path().join("Config.uk"))
        .unwrap_err();
    match &err {
        KconfigError::Include { ctx, .. } => assert_eq!(ctx.line, 3),
        other => panic!("expected include error, got {:?}", other),
    }
    match err.root_cause() {
        KconfigError::Syntax { ctx, message } => {
            assert_eq!(message, "unknown line");
            assert!(ctx.file.ends_with("bad.uk"));
            assert_eq!(ctx.line, 3);
            assert_eq!(ctx.source_line, "\tfrobnicate");
        }
        other => panic!("expected syntax error, got {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains("bad.uk:3:"), "{}", message);
    assert!(message.contains("included from"), "{}", message);

    // A missing file is an I/O error inside the include
    write(dir.path(), "Config.uk", "mainmenu \"Root\"\nsource \"nope.uk\"\n");
    let err = Parser::new(KeyValueMap::new())
        .parse_file(dir.path().join("Config.uk"))
        .unwrap_err();
    assert!(matches!(err.root_cause(), KconfigError::Io { .. }));
}

#[test]
fn test_recursive_source_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Config.uk", "mainmenu \"Root\"\nsource \"Config.uk\"\n");

    let err = Parser::new(KeyValueMap::new())
        .parse_file(dir.path().join("Config.uk"))
        .unwrap_err();
    match &err {
        KconfigError::Syntax { ctx, message } => {
            assert_eq!(ctx.line, 2);
            assert!(message.starts_with("recursive inclusion"), "{}", message);
        }
        other => panic!("expected syntax error, got {:?}", other),
    }

    // A -> B -> A through a parent directory
    write(dir.path(), "Config.uk", "mainmenu \"Root\"\nsource \"lib/Config.uk\"\n");
    write(dir.path(), "lib/Config.uk", "config LIB\n\tbool\nsource \"../Config.uk\"\n");
    let err = Parser::new(KeyValueMap::new())
        .parse_file(dir.path().join("Config.uk"))
        .unwrap_err();
    assert!(matches!(err, KconfigError::Include { .. }));
    match err.root_cause() {
        KconfigError::Syntax { ctx, message } => {
            assert!(ctx.file.ends_with("Config.uk"));
            assert_eq!(ctx.line, 3);
            assert!(message.starts_with("recursive inclusion"), "{}", message);
        }
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_same_file_sourced_twice() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Config.uk",
        "mainmenu \"Root\"\nmenu \"One\"\nsource \"common.uk\"\nendmenu\n\
         menu \"Two\"\nsource \"common.uk\"\nendmenu\n",
    );
    write(dir.path(), "common.uk", "comment \"shared\"\n");

    let kconf = Parser::new(KeyValueMap::new())
        .parse_file(dir.path().join("Config.uk"))
        .expect("Parsing failed");
    let comments = kconf
        .iter()
        .filter(|(_, menu)| menu.kind == MenuKind::Comment)
        .count();
    assert_eq!(comments, 2);
}

#[test]
fn test_missing_file() {
    let err = Parser::new(KeyValueMap::new())
        .parse_file("/definitely/not/here/Config.uk")
        .unwrap_err();
    assert!(matches!(err, KconfigError::Io { .. }));
}

#[test]
fn test_first_error_wins() {
    let err = parse_str(
        "mainmenu \"Test\"\nconfig A\n\tbogus\nconfig B\n\talso-bogus\n",
        "Config.uk",
        KeyValueMap::new(),
    )
    .unwrap_err();
    match err {
        KconfigError::Syntax { ctx, .. } => assert_eq!(ctx.line, 3),
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_missing_mainmenu_policies() {
    let source = "config A\n\tbool\n";

    let err = parse_str(source, "Config.uk", KeyValueMap::new()).unwrap_err();
    assert!(matches!(err, KconfigError::MissingMainMenu { .. }));

    let kconf = Parser::new(KeyValueMap::new())
        .with_options(ParseOptions {
            missing_mainmenu: MissingMainMenu::Empty,
            ..ParseOptions::default()
        })
        .parse_str(source, "Config.uk")
        .expect("Parsing failed");
    assert_eq!(kconf.root_menu().kind, MenuKind::MainMenu);
    assert!(kconf.root_menu().children().is_empty());
    assert!(kconf.configs().is_empty());
}

#[test]
fn test_duplicate_policies() {
    let source = "mainmenu \"Test\"\n\
                  config A\n\tbool \"first\"\n\
                  config A\n\tbool \"second\"\n";

    let kconf = parse(source);
    assert_eq!(kconf.lookup("A").unwrap().title(), "second");
    assert_eq!(kconf.root_menu().children().len(), 2);

    let err = Parser::new(KeyValueMap::new())
        .with_options(ParseOptions {
            duplicates: DuplicatePolicy::Error,
            ..ParseOptions::default()
        })
        .parse_str(source, "Config.uk")
        .unwrap_err();
    match err {
        KconfigError::DuplicateConfig { name, first, second } => {
            assert_eq!(name, "A");
            assert_eq!(first, "Config.uk:2");
            assert_eq!(second, "Config.uk:4");
        }
        other => panic!("expected duplicate error, got {:?}", other),
    }
}

#[test]
fn test_reverse_dependencies_are_gated() {
    let source = "mainmenu \"Test\"\n\
                  config DRIVER\n\tbool\n\tselect BUS if ARCH_OK\n\
                  config BUS\n\tbool\n\
                  config ARCH_OK\n\tbool\n";

    let kconf = parse(source);
    assert!(!kconf.reverse_dependencies());
    assert!(kconf.depends_on_symbol("BUS").unwrap().is_empty());
    assert_eq!(kconf.selected_by("BUS"), &[kconf.config_id("DRIVER").unwrap()]);

    let kconf = Parser::new(KeyValueMap::new())
        .with_options(ParseOptions {
            reverse_dependencies: true,
            ..ParseOptions::default()
        })
        .parse_str(source, "Config.uk")
        .expect("Parsing failed");
    assert_eq!(
        kconf.depends_on_symbol("BUS"),
        Some(&set(&["ARCH_OK", "DRIVER"]))
    );
}

#[test]
fn test_recorded_properties() {
    let kconf = parse(
        "mainmenu \"Test\"\n\
         config STACK_SIZE\n\
         \thex \"Stack size\"\n\
         \tdefault 0x4000 if SMALL\n\
         \tdefault 0x10000\n\
         \trange 0x1000 0x100000\n\
         \toption modules\n\
         \t---help---\n\
         \t  Size of each thread stack.\n\
         config SMALL\n\tdef_bool n\n",
    );

    let stack = kconf.lookup("STACK_SIZE").unwrap();
    assert_eq!(stack.ty, ConfigType::Hex);
    assert_eq!(stack.defaults.len(), 2);
    assert_eq!(stack.default().unwrap().value.to_string(), "0x4000");
    assert_eq!(stack.ranges.len(), 1);
    assert_eq!(stack.help.as_deref(), Some("Size of each thread stack."));
    assert_eq!(kconf.lookup("SMALL").unwrap().ty, ConfigType::Bool);
}

#[test]
fn test_visibility_against_values() {
    let kconf = parse(
        "mainmenu \"Test\"\n\
         config A\n\ttristate \"A\"\n\
         config B\n\tbool \"B\" if A\n\
         config C\n\tbool \"C\"\n\tdepends on A && !B\n",
    );

    let values: rustc_hash::FxHashMap<String, String> = [("A", "m")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let b = kconf.config_id("B").unwrap();
    let c = kconf.config_id("C").unwrap();
    assert!(kconf.is_visible(b, &values));
    assert_eq!(kconf.availability(c, &values), Tristate::Module);

    let none = rustc_hash::FxHashMap::default();
    assert!(!kconf.is_visible(b, &none));
    assert_eq!(kconf.availability(c, &none), Tristate::No);
}

#[test]
fn test_line_numbers_survive_preprocessing() {
    let err = parse_str(
        "mainmenu \"Test\"\nX := 1\nconfig A\n\tdepends on B && \\\n\t\tC\n\tbogus\n",
        "Config.uk",
        KeyValueMap::new(),
    )
    .unwrap_err();
    match err {
        KconfigError::Syntax { ctx, .. } => assert_eq!(ctx.line, 6),
        other => panic!("expected syntax error, got {:?}", other),
    }
}
