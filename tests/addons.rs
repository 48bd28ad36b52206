use once_cell::sync::Lazy;
use qcalc::{Calculator, DirectorySource, ErrorKind, Settings};
use qcalc_core::addons::MANIFEST_FILE;
use qcalc_core::serialization::{deserialize_addon_set, serialize_addon_set};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Addon directory shared by every test; tests only read from it.
static ADDONS: Lazy<TempDir> = Lazy::new(|| {
    let root = TempDir::new().unwrap();
    write_addon(
        root.path(),
        "finance",
        r#"{
            "name": "Finance",
            "constants": { "vat": "0.21" },
            "functions": {
                "gross": { "expression": "net * (1 + vat)", "arguments": ["net"] },
                "compound": { "expression": "p * (1 + r) ^ n", "arguments": ["p", "r", "n"] }
            }
        }"#,
        None,
    );
    write_addon(
        root.path(),
        "geometry",
        r#"{
            "script": "geometry.rhai",
            "scripts": {
                "circle": { "function": "circle_area" },
                "sides": { "function": "polygon_sides", "arity": 1 }
            }
        }"#,
        Some((
            "geometry.rhai",
            r#"
                fn circle_area(r) { 3.0 * r * r }
                fn polygon_sides(name) { if name == 3.0 { 3 } else { 4 } }
            "#,
        )),
    );
    write_addon(
        root.path(),
        "unstable",
        r#"{
            "script": "main.rhai",
            "scripts": {
                "spin": { "function": "spin" },
                "label": { "function": "label" },
                "fail": { "function": "fail" }
            }
        }"#,
        Some((
            "main.rhai",
            r#"
                fn spin(x) { let i = 0; loop { i += 1; } }
                fn label(x) { "not a number" }
                fn fail(x) { throw "bad input" }
            "#,
        )),
    );
    write_addon(
        root.path(),
        "clashing",
        r#"{ "constants": { "vat": "0.5" } }"#,
        None,
    );
    write_addon(
        root.path(),
        "broken",
        r#"{ "script": "main.rhai", "scripts": { "x": { "function": "x" } } }"#,
        Some(("main.rhai", "fn x( {")),
    );
    root
});

fn write_addon(root: &Path, id: &str, manifest: &str, script: Option<(&str, &str)>) {
    let dir = root.join(id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(MANIFEST_FILE), manifest).unwrap();
    if let Some((name, text)) = script {
        fs::write(dir.join(name), text).unwrap();
    }
}

fn set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

fn calculator() -> Calculator<DirectorySource> {
    let source = DirectorySource::new(ADDONS.path()).with_max_operations(10_000);
    Calculator::new(source, Settings::default())
}

#[test]
fn discovers_every_addon() {
    let calc = calculator();
    assert_eq!(
        calc.available_addons().unwrap(),
        set(&["broken", "clashing", "finance", "geometry", "unstable"])
    );
}

#[test]
fn manifest_constants_and_functions() {
    let mut calc = calculator();
    assert!(calc.set_active_addons(&set(&["finance"])).is_empty());
    assert_eq!(calc.evaluate_to_string("gross(100)").unwrap(), "121");
    assert_eq!(calc.evaluate_to_string("compound(1000, 0.1, 2)").unwrap(), "1210");
    assert_eq!(calc.evaluate("vat := 0").unwrap_err().kind(), ErrorKind::Kind);
}

#[test]
fn script_functions() {
    let mut calc = calculator();
    assert!(calc.set_active_addons(&set(&["geometry"])).is_empty());
    assert_eq!(calc.evaluate_to_string("circle(2)").unwrap(), "12");
    // Integer results from scripts are accepted.
    assert_eq!(calc.evaluate_to_string("sides(3) + sides(5)").unwrap(), "7");
    assert_eq!(calc.evaluate("circle(1, 2)").unwrap_err().kind(), ErrorKind::Arity);
}

#[test]
fn misbehaving_scripts_are_errors() {
    let mut calc = calculator();
    assert!(calc.set_active_addons(&set(&["unstable"])).is_empty());
    for input in ["spin(1)", "label(1)", "fail(1)"] {
        let err = calc.evaluate(input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Script, "{}", input);
    }
    assert!(calc.evaluate("fail(1)").unwrap_err().to_string().contains("bad input"));
    // Still usable after the failures.
    assert_eq!(calc.evaluate_to_string("2 * 3").unwrap(), "6");
}

#[test]
fn deactivation_removes_contributions() {
    let mut calc = calculator();
    calc.set_active_addons(&set(&["finance", "geometry"]));
    assert!(calc.set_active_addons(&set(&["geometry"])).is_empty());
    assert_eq!(calc.evaluate("vat").unwrap_err().kind(), ErrorKind::UnknownSymbol);
    assert_eq!(calc.evaluate("gross(1)").unwrap_err().kind(), ErrorKind::UnknownSymbol);
    assert_eq!(calc.evaluate_to_string("circle(1)").unwrap(), "3");
}

#[test]
fn conflicting_addon_fails_alone() {
    let mut calc = calculator();
    let failures = calc.set_active_addons(&set(&["clashing", "finance", "geometry"]));
    // `clashing` is activated first and owns `vat`, so `finance` fails.
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].addon, "finance");
    assert_eq!(calc.active_addons(), set(&["clashing", "geometry"]));
    assert_eq!(calc.evaluate_to_string("vat").unwrap(), "0.5");
    assert!(!calc.symbols().contains("gross"));
}

#[test]
fn broken_script_does_not_stop_the_batch() {
    let mut calc = calculator();
    let failures = calc.set_active_addons(&set(&["broken", "finance"]));
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].addon, "broken");
    assert_eq!(calc.active_addons(), set(&["finance"]));
}

#[test]
fn enabled_set_survives_a_restart() {
    let mut first = calculator();
    first.set_active_addons(&set(&["finance", "geometry"]));
    let saved = serialize_addon_set(&first.active_addons()).unwrap();
    assert!(first.shutdown().is_empty());
    assert!(first.symbols().is_empty());

    let mut second = calculator();
    let mut restored = deserialize_addon_set(&saved).unwrap();
    restored.insert("uninstalled".to_string());
    assert!(second.restore_addons(&restored).unwrap().is_empty());
    assert_eq!(second.active_addons(), set(&["finance", "geometry"]));
    assert_eq!(second.evaluate_to_string("gross(circle(10))").unwrap(), "363");
}
