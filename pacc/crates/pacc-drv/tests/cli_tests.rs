//! End-to-end tests of the `pacc` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn pacc() -> Command {
    Command::cargo_bin("pacc").unwrap()
}

#[test]
fn test_requires_an_input_file() {
    pacc().assert().failure();
}

#[test]
fn test_parse_minimal_program() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "main.c", "int main() { return 0; }\n");

    pacc().arg("-a").arg(&input).assert().success();
}

#[test]
fn test_preprocess_prints_expanded_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "main.c", "#define N 4\nint x = N;\n");

    pacc()
        .arg("-p")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("int x = 4 ;"));
}

#[test]
fn test_include_path_flag() {
    let dir = tempfile::tempdir().unwrap();
    let inc = dir.path().join("include");
    fs::create_dir(&inc).unwrap();
    write(&inc, "lib.h", "#define FROM_LIB 1\n");
    let input = write(
        dir.path(),
        "main.c",
        "#include <lib.h>\nint x = FROM_LIB;\n",
    );

    pacc()
        .arg("-I")
        .arg(&inc)
        .arg("-p")
        .arg("-a")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("int x = 1 ;"));
}

#[test]
fn test_pragma_once_across_double_include() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "guard.h",
        "#pragma once\nstruct Once { int v; };\n",
    );
    let input = write(
        dir.path(),
        "main.c",
        "#include \"guard.h\"\n#include \"guard.h\"\nstruct Once o;\nint main() { o.v = 1; return 0; }\n",
    );

    // the guarded header's tokens must appear exactly once
    pacc()
        .arg("-p")
        .arg("-a")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::function(|out: &str| {
            out.matches("struct Once {").count() == 1
        }));
}

#[test]
fn test_unresolved_include_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "main.c", "#include \"nope.h\"\n");

    pacc()
        .arg("-a")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unresolved"));
}

#[test]
fn test_syntax_error_fails_with_location() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "main.c", "int x = ;\n");

    pacc()
        .arg("-a")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_leftover_tokens_fail() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "main.c", "int main() { return 0; }\n}\n");

    pacc()
        .arg("-a")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("leftover"));
}

#[test]
fn test_unknown_field_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(
        dir.path(),
        "main.c",
        "struct P { int x; };\nstruct P p;\nint main() { p.nope = 1; return 0; }\n",
    );

    pacc()
        .arg("-a")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no field"));
}

#[test]
fn test_lexical_error_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "main.c", "char *s = \"unterminated;\n");

    pacc()
        .arg("-a")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing terminating"));
}

#[test]
fn test_without_flags_stops_after_preprocessing() {
    let dir = tempfile::tempdir().unwrap();
    // would be a parse error, but the parser phase is not requested
    let input = write(dir.path(), "main.c", "int x = ;\n");

    pacc().arg(&input).assert().success();
}

#[test]
fn test_line_continuation_in_macro() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(
        dir.path(),
        "main.c",
        "#define TWO \\\n 2\nint x = TWO;\n",
    );

    pacc()
        .arg("-p")
        .arg("-a")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("int x = 2 ;"));
}
