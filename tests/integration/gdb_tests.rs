//! End-to-end checks against a real gdb, skipped when gdb or gcc is absent.
//!
//! Nothing here starts the debuggee, so the tests do not depend on ptrace
//! being permitted.

use mi_session::compile::compile;
use mi_session::{DebuggerEvent, GlobalConfig, Session};

use super::test_helpers::{deinit_promptly, record_events, tool_available};

#[tokio::test]
async fn gdb_answers_breakpoint_and_error_commands() {
    if !tool_available("gdb") || !tool_available("gcc") {
        eprintln!("gdb or gcc not found; skipping");
        return;
    }
    let config = GlobalConfig::default();
    let temp = tempfile::tempdir().expect("tempdir");
    let source = temp.path().join("hello.c");
    let target = temp.path().join("hello");
    std::fs::write(
        &source,
        "#include <stdio.h>\nint main(void) {\n    puts(\"hello\");\n    return 0;\n}\n",
    )
    .expect("write source");
    compile(&config.compiler, &source, &target).await.expect("compile");

    let mut session = Session::new(config);
    let seen = record_events(&session);
    session.init(&target).expect("init");

    let payload = session.command("-break-insert main").await.expect("break-insert");
    assert_eq!(payload["bkpt"]["func"], "main", "{payload}");

    let record = session
        .execute("-this-command-does-not-exist")
        .await
        .expect("errors are results");
    assert_eq!(record.class, "error");
    assert!(record.payload["msg"].is_string());

    assert!(
        seen.lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, DebuggerEvent::Notification(r) if r.class == "thread-group-added")),
        "gdb announces its thread group at startup"
    );

    deinit_promptly(&mut session).await;
}
