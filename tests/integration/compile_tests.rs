//! Building a debuggee with the configured compiler.

use mi_session::compile::compile;
use mi_session::config::CompilerConfig;
use mi_session::AppError;

use super::test_helpers::tool_available;

#[tokio::test]
async fn compiles_a_valid_program() {
    if !tool_available("gcc") {
        eprintln!("gcc not found; skipping");
        return;
    }
    let temp = tempfile::tempdir().expect("tempdir");
    let source = temp.path().join("hello.c");
    let output = temp.path().join("hello");
    std::fs::write(&source, "int main(void) { return 0; }\n").expect("write source");

    compile(&CompilerConfig::default(), &source, &output)
        .await
        .expect("compile succeeds");
    assert!(output.exists());
}

#[tokio::test]
async fn compiler_errors_carry_stderr() {
    if !tool_available("gcc") {
        eprintln!("gcc not found; skipping");
        return;
    }
    let temp = tempfile::tempdir().expect("tempdir");
    let source = temp.path().join("broken.c");
    std::fs::write(&source, "int main(void) { return }\n").expect("write source");

    let err = compile(&CompilerConfig::default(), &source, temp.path().join("broken"))
        .await
        .expect_err("compile fails");
    match err {
        AppError::Compile(stderr) => assert!(stderr.contains("error"), "{stderr}"),
        other => panic!("expected AppError::Compile, got {other:?}"),
    }
}

#[tokio::test]
async fn non_zero_exit_is_a_compile_error() {
    // `false` ignores its arguments and exits with status 1.
    let config = CompilerConfig {
        program: "false".to_owned(),
        args: Vec::new(),
    };
    let err = compile(&config, "in.c", "out").await.expect_err("false fails");
    assert!(matches!(err, AppError::Compile(_)));
}

#[tokio::test]
async fn missing_compiler_is_a_spawn_error() {
    let config = CompilerConfig {
        program: "/nonexistent/cc".to_owned(),
        args: Vec::new(),
    };
    let err = compile(&config, "in.c", "out").await.expect_err("no compiler");
    assert!(matches!(err, AppError::Spawn(_)));
}
