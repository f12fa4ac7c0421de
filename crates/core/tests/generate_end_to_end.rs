use crankgen_core::config::ResolvedConfig;
use crankgen_core::generator::{GenerateError, Generator};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const HEADER: &str = "; GENERATED BY crankgen FROM case.crankgen - DO NOT EDIT\n";

fn write_source(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("case.crankgen");
    fs::write(&path, content).unwrap();
    path
}

fn generate(path: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    let generator = Generator::new(&ResolvedConfig::default()).unwrap();
    generator.generate_file(path).map(|r| r.written)
}

/// Bodies of generated files with the provenance header removed.
fn bodies(files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|f| {
            let text = fs::read_to_string(f).unwrap();
            text.strip_prefix(HEADER).expect("provenance header").to_string()
        })
        .collect()
}

#[test]
fn letters_and_numbers_produce_nine_files() {
    let tmp = tempdir().unwrap();
    let src = write_source(
        tmp.path(),
        "VAR a = A, B, C\nVAR n = 1, 2, 3\nBEGIN_TEMPLATE\nHere we go: $a$n = {-{n*100}-}",
    );

    let written = generate(&src).unwrap();
    assert_eq!(written.len(), 9);
    for (i, path) in written.iter().enumerate() {
        assert_eq!(path, &tmp.path().join(format!("case_{}_gen.crank", i + 1)));
    }

    let eighth = fs::read_to_string(tmp.path().join("case_8_gen.crank")).unwrap();
    assert_eq!(eighth, format!("{HEADER}Here we go: C2 = 200"));
}

#[test]
fn derived_sum_matches_operands() {
    let tmp = tempdir().unwrap();
    let src = write_source(
        tmp.path(),
        "VAR a = 2, 4, 6\nVAR n = 1, 2, 3\nLAMBDA sum = a+n\nBEGIN_TEMPLATE\n$a + $n == $sum\n",
    );

    let out = bodies(&generate(&src).unwrap());
    assert_eq!(out.len(), 9);
    for body in out {
        let (lhs, sum) = body.trim_end().split_once(" == ").unwrap();
        let (a, n) = lhs.split_once(" + ").unwrap();
        let (a, n, sum): (i64, i64, i64) =
            (a.parse().unwrap(), n.parse().unwrap(), sum.parse().unwrap());
        assert_eq!(a + n, sum, "{body}");
    }
}

#[test]
fn string_variables_render_quoted() {
    let tmp = tempdir().unwrap();
    let src = write_source(tmp.path(), "SVAR a = 1, 2\nVAR n = 1, 2\nBEGIN_TEMPLATE\n$a$n");

    assert_eq!(bodies(&generate(&src).unwrap()), vec!["\"1\"1", "\"1\"2", "\"2\"1", "\"2\"2"]);
}

#[test]
fn file_count_ignores_derived_expressions() {
    let tmp = tempdir().unwrap();
    let src = write_source(
        tmp.path(),
        concat!(
            "VAR a = 1, 2\nVAR b = x, y, z\nVAR c = 0.5, 1.5\n",
            "LAMBDA d = a * c\nLAMBDA e = d + 1\n",
            "BEGIN_TEMPLATE\n$e\n",
        ),
    );
    assert_eq!(generate(&src).unwrap().len(), 12);
}

#[test]
fn derived_values_chain_and_reach_spans() {
    let tmp = tempdir().unwrap();
    let src = write_source(
        tmp.path(),
        concat!(
            "VAR n = 3\nLAMBDA sq = n ** 2\nLAMBDA half = sq / 2\n",
            "BEGIN_TEMPLATE\n$sq $half {-{half * 2 == sq}-}\n",
        ),
    );
    assert_eq!(bodies(&generate(&src).unwrap()), vec!["9 4.5 True\n"]);
}

#[test]
fn derived_strings_are_quoted_in_output() {
    let tmp = tempdir().unwrap();
    let src = write_source(
        tmp.path(),
        "VAR n = 2\nLAMBDA label = 'ab' * n\nBEGIN_TEMPLATE\n(set x $label)\n",
    );
    assert_eq!(bodies(&generate(&src).unwrap()), vec!["(set x \"abab\")\n"]);
}

#[test]
fn timestamp_helper_in_derived_expressions() {
    let tmp = tempdir().unwrap();
    let src = write_source(
        tmp.path(),
        concat!(
            "SVAR at = 2020-01-01T00:00:00Z, 2020-01-01T00:00:01.250000Z\n",
            "LAMBDA secs = ts(at).timestamp()\n",
            "BEGIN_TEMPLATE\n",
            "$secs\n",
        ),
    );
    assert_eq!(bodies(&generate(&src).unwrap()), vec!["1577836800.0\n", "1577836801.25\n"]);
}

#[test]
fn broken_span_is_left_verbatim() {
    let tmp = tempdir().unwrap();
    let src = write_source(tmp.path(), "VAR n = 1\nBEGIN_TEMPLATE\n{-{n +}-} {-{nope}-} {-{n}-}\n");
    assert_eq!(bodies(&generate(&src).unwrap()), vec!["{-{n +}-} {-{nope}-} 1\n"]);
}

#[test]
fn template_text_is_kept_verbatim() {
    let tmp = tempdir().unwrap();
    let src = write_source(
        tmp.path(),
        "; header comment\nVAR n = 1\nBEGIN_TEMPLATE\nVAR n = 99\n  indented\tline\r\n\n$$ $n\n",
    );
    assert_eq!(bodies(&generate(&src).unwrap()), vec!["VAR n = 99\n  indented\tline\r\n\n$ 1\n"]);
}

#[test]
fn no_variables_still_generates_once() {
    let tmp = tempdir().unwrap();
    let src = write_source(tmp.path(), "LAMBDA x = 6 * 7\nBEGIN_TEMPLATE\n$x\n");
    assert_eq!(bodies(&generate(&src).unwrap()), vec!["42\n"]);
}

#[test]
fn self_reference_aborts_before_writing() {
    let tmp = tempdir().unwrap();
    let src = write_source(tmp.path(), "VAR n = 1, 2\nLAMBDA x = x + 1\nBEGIN_TEMPLATE\n$x\n");

    let err = generate(&src).unwrap_err();
    assert!(matches!(err, GenerateError::Derived { .. }));
    assert_eq!(err.to_string(), "UndefinedName: name 'x' is not defined at line 2");
    assert!(!tmp.path().join("case_1_gen.crank").exists());
}

#[test]
fn oversized_repetition_in_lambda_is_reported() {
    let tmp = tempdir().unwrap();
    let src = write_source(
        tmp.path(),
        "VAR n = 1\n\nLAMBDA big = 'abc' * 9223372036854775807\nBEGIN_TEMPLATE\n$big\n",
    );

    let err = generate(&src).unwrap_err();
    assert_eq!(err.to_string(), "Overflow: integer overflow in * at line 3");
    assert!(!tmp.path().join("case_1_gen.crank").exists());
}

#[test]
fn oversized_repetition_in_span_is_left_verbatim() {
    let tmp = tempdir().unwrap();
    let line = "x {-{'ab' * 4611686018427387904 * 2}-} y\n";
    let src = write_source(tmp.path(), &format!("VAR n = 1\nBEGIN_TEMPLATE\n{line}"));
    assert_eq!(bodies(&generate(&src).unwrap()), vec![line]);
}

#[test]
fn placeholder_errors_use_source_line_numbers() {
    let tmp = tempdir().unwrap();
    let src = write_source(
        tmp.path(),
        "; notes\nVAR n = 1\n\nLAMBDA m = n + 1\nBEGIN_TEMPLATE\nline one\nline two $n $gone\n",
    );

    let err = generate(&src).unwrap_err();
    assert!(
        err.to_string().starts_with("placeholder '$gone' is not defined (line 7, column 13)"),
        "{err}"
    );
}

#[test]
fn undefined_placeholder_is_fatal() {
    let tmp = tempdir().unwrap();
    let src = write_source(tmp.path(), "VAR n = 1\nBEGIN_TEMPLATE\n$n $m\n");

    match generate(&src).unwrap_err() {
        GenerateError::Render { index, file, .. } => {
            assert_eq!(index, 1);
            assert_eq!(file, "case.crankgen");
        }
        other => panic!("expected Render, got {other:?}"),
    }
    assert!(!tmp.path().join("case_1_gen.crank").exists());
}

#[test]
fn missing_separator_is_a_parse_error() {
    let tmp = tempdir().unwrap();
    let src = write_source(tmp.path(), "VAR n 1, 2\nBEGIN_TEMPLATE\n$n\n");
    assert!(matches!(generate(&src).unwrap_err(), GenerateError::Parse(_)));
}

#[test]
fn custom_output_settings_apply() {
    let tmp = tempdir().unwrap();
    let src = write_source(tmp.path(), "VAR n = 1\nBEGIN_TEMPLATE\n$n\n");

    let mut cfg = ResolvedConfig::default();
    cfg.output.extension = ".txt".into();
    cfg.output.comment_prefix = "#".into();
    let report = Generator::new(&cfg).unwrap().generate_file(&src).unwrap();

    assert_eq!(report.written, vec![tmp.path().join("case_1_gen.txt")]);
    assert_eq!(
        fs::read_to_string(&report.written[0]).unwrap(),
        "# GENERATED BY crankgen FROM case.crankgen - DO NOT EDIT\n1\n"
    );
}
