use mi_session::AppError;

#[test]
fn unexpected_result_names_command_and_class() {
    let err = AppError::UnexpectedResult {
        command: "-exec-run".to_owned(),
        class: "weird".to_owned(),
    };
    assert_eq!(err.to_string(), "command '-exec-run' returned unexpected status weird");
}

#[test]
fn compile_error_carries_stderr() {
    let err = AppError::Compile("main.c:1: error: expected ';'".to_owned());
    assert!(err.to_string().contains("main.c:1: error"));
}

#[test]
fn io_errors_convert() {
    let err: AppError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed").into();
    assert!(matches!(err, AppError::Io(ref msg) if msg.contains("pipe closed")));
}
