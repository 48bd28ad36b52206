use super::*;
use pretty_assertions::assert_eq;

fn native(f: impl Fn(&[f64]) -> Result<f64, String> + 'static) -> Rc<dyn Callable> {
    Rc::new(NativeCallable::new(f))
}

#[test]
fn test_run_passes_arguments_in_order() {
    let mut handler = ScriptHandler::new();
    let script = ScriptRef::new("math", "sub", 2);
    handler.register(script.clone(), native(|args| Ok(args[0] - args[1])));
    assert_eq!(handler.run(&script, &[10.0, 4.0]), Ok(6.0));
}

#[test]
fn test_unregistered_script() {
    let handler = ScriptHandler::new();
    let script = ScriptRef::new("math", "missing", 0);
    assert_eq!(
        handler.run(&script, &[]),
        Err(ScriptError::Unregistered(script.clone()))
    );
}

#[test]
fn test_failures_carry_the_message() {
    let mut handler = ScriptHandler::new();
    let script = ScriptRef::new("math", "boom", 0);
    handler.register(script.clone(), native(|_| Err("kaboom".to_string())));
    assert_eq!(
        handler.run(&script, &[]),
        Err(ScriptError::Failed("kaboom".to_string()))
    );
    // The handler is still usable after a failure.
    assert!(handler.run(&script, &[]).is_err());
}

#[test]
fn test_non_finite_results_are_errors() {
    let mut handler = ScriptHandler::new();
    let script = ScriptRef::new("math", "inf", 0);
    handler.register(script.clone(), native(|_| Ok(f64::INFINITY)));
    assert!(matches!(
        handler.run(&script, &[]),
        Err(ScriptError::NotFinite(_))
    ));
}

#[test]
fn test_arity_is_checked_before_calling() {
    let mut handler = ScriptHandler::new();
    let script = ScriptRef::new("math", "one", 1);
    handler.register(script.clone(), native(|args| Ok(args[0])));
    assert_eq!(
        handler.run(&script, &[1.0, 2.0]),
        Err(ScriptError::Arity {
            expected: 1,
            found: 2
        })
    );
}

#[test]
fn test_register_and_unregister() {
    let mut handler = ScriptHandler::new();
    let script = ScriptRef::new("a", "f", 0);
    assert!(handler.register(script.clone(), native(|_| Ok(1.0))).is_none());
    assert!(handler.register(script.clone(), native(|_| Ok(2.0))).is_some());
    assert_eq!(handler.len(), 1);
    assert_eq!(handler.run(&script, &[]), Ok(2.0));
    assert!(handler.unregister(&script));
    assert!(!handler.unregister(&script));
    assert!(handler.is_empty());
}

#[test]
fn test_rhai_callable() {
    let module = RhaiModule::compile("fn mean(a, b) { (a + b) / 2.0 }", 0).unwrap();
    assert_eq!(module.arity_of("mean"), Some(2));
    assert_eq!(module.arity_of("median"), None);

    let mut handler = ScriptHandler::new();
    let script = ScriptRef::new("stats", "mean", 2);
    handler.register(script.clone(), Rc::new(RhaiCallable::new(module, "mean")));
    assert_eq!(handler.run(&script, &[1.0, 4.0]), Ok(2.5));
}

#[test]
fn test_rhai_integer_results_are_accepted() {
    let module = RhaiModule::compile("fn answer() { 42 }", 0).unwrap();
    let callable = RhaiCallable::new(module, "answer");
    assert_eq!(callable.call(&[]), Ok(42.0));
}

#[test]
fn test_rhai_non_numeric_result_is_an_error() {
    let module = RhaiModule::compile(r#"fn name() { "qcalc" }"#, 0).unwrap();
    let callable = RhaiCallable::new(module, "name");
    let message = callable.call(&[]).unwrap_err();
    assert!(message.contains("instead of a number"), "{}", message);
}

#[test]
fn test_rhai_runtime_error_then_second_call() {
    let module = RhaiModule::compile(r#"fn fail(x) { throw "bad input " + x; }"#, 0).unwrap();
    let callable = RhaiCallable::new(module, "fail");
    let first = callable.call(&[1.0]).unwrap_err();
    assert!(first.contains("bad input"), "{}", first);
    let second = callable.call(&[2.0]).unwrap_err();
    assert!(second.contains("bad input"), "{}", second);
}

#[test]
fn test_rhai_operation_budget() {
    let module = RhaiModule::compile("fn spin() { loop {} }", 1_000).unwrap();
    let callable = RhaiCallable::new(module, "spin");
    assert!(callable.call(&[]).is_err());
}

#[test]
fn test_rhai_compile_error() {
    assert!(RhaiModule::compile("fn broken( {", 0).is_err());
}

#[test]
fn test_rhai_entry_points_are_optional() {
    let module = RhaiModule::compile("fn load() { 0 }", 0).unwrap();
    assert_eq!(module.run_entry_point("load"), Ok(()));
    assert_eq!(module.run_entry_point("unload"), Ok(()));

    let failing = RhaiModule::compile(r#"fn load() { throw "no" }"#, 0).unwrap();
    assert!(failing.run_entry_point("load").is_err());
}
