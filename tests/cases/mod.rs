use qcalc::{Calculator, DirectorySource, Settings};

/// A calculator with default settings and no addons.
pub fn calculator() -> Calculator<DirectorySource> {
    Calculator::new(DirectorySource::new("/nonexistent/qcalc-addons"), Settings::default())
}

/// Evaluates `input` in a fresh calculator, after running every `setup`
/// line, and compares the displayed result or the error kind.
#[macro_export]
macro_rules! test_case {
    (
        name: $name:ident,
        $(setup: [$($setup:expr),* $(,)?],)?
        input: $input:expr,
        output: $output:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            let mut calc = $crate::cases::calculator();
            $($(
                calc.evaluate($setup).expect("setup failed");
            )*)?
            let expected: Result<&str, qcalc::ErrorKind> = $output;
            pretty_assertions::assert_eq!(
                calc.evaluate_to_string($input).map_err(|e| e.kind()),
                expected.map(str::to_string),
            );
        }
    };
}
