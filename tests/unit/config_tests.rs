use mi_session::{config::GlobalConfig, AppError};

#[test]
fn empty_document_yields_defaults() {
    let config = GlobalConfig::from_toml_str("").expect("empty config parses");
    assert_eq!(config, GlobalConfig::default());
    assert_eq!(config.debugger.program, "gdb");
    assert_eq!(
        config.debugger.args,
        vec!["--interpreter=mi4", "--quiet", "-nx", "-nh"]
    );
    assert_eq!(config.compiler.program, "gcc");
    assert_eq!(config.compiler.args, vec!["-ggdb", "-O0"]);
    assert_eq!(config.max_line_bytes, 1_048_576);
}

#[test]
fn sections_override_defaults() {
    let config = GlobalConfig::from_toml_str(
        r#"
max_line_bytes = 4096

[debugger]
program = "/usr/local/bin/gdb"

[compiler]
program = "clang"
args = ["-g", "-O0", "-Wall"]
"#,
    )
    .expect("config parses");

    assert_eq!(config.debugger.program, "/usr/local/bin/gdb");
    assert_eq!(config.debugger.args.len(), 4, "unset args keep their default");
    assert_eq!(config.compiler.program, "clang");
    assert_eq!(config.compiler.args, vec!["-g", "-O0", "-Wall"]);
    assert_eq!(config.max_line_bytes, 4096);
}

#[test]
fn empty_program_is_rejected() {
    let result = GlobalConfig::from_toml_str("[debugger]\nprogram = \"  \"\n");
    assert!(matches!(result, Err(AppError::Config(ref msg)) if msg.contains("debugger.program")));
}

#[test]
fn zero_line_limit_is_rejected() {
    let result = GlobalConfig::from_toml_str("max_line_bytes = 0\n");
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn invalid_toml_is_a_config_error() {
    let result = GlobalConfig::from_toml_str("[debugger\n");
    assert!(matches!(result, Err(AppError::Config(ref msg)) if msg.starts_with("invalid config")));
}

#[test]
fn loads_from_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("mi-session.toml");
    std::fs::write(&path, "[debugger]\nargs = [\"--interpreter=mi3\"]\n").expect("write config");

    let config = GlobalConfig::load_from_path(&path).expect("config loads");
    assert_eq!(config.debugger.args, vec!["--interpreter=mi3"]);
}

#[test]
fn missing_file_is_a_config_error() {
    let result = GlobalConfig::load_from_path("/nonexistent/mi-session.toml");
    assert!(matches!(result, Err(AppError::Config(ref msg)) if msg.contains("failed to read")));
}
