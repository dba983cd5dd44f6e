//! Command/response correlation and event dispatch through a live session.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use mi_session::mi::{AsyncKind, StreamKind};
use mi_session::{AppError, DebuggerEvent, EventCallback};

use super::test_helpers::{
    deinit_promptly, fake_session, record_events, wait_until, DUMMY_TARGET,
};

#[tokio::test]
async fn sequential_commands_get_their_own_results() {
    let mut session = fake_session();
    session.init(DUMMY_TARGET).expect("init");

    for i in 0..5 {
        let command = format!("cmd-{i}");
        let payload = session.command(&command).await.expect("command");
        assert_eq!(payload, json!({"echo": command}));
    }

    deinit_promptly(&mut session).await;
}

#[tokio::test]
async fn events_before_a_result_are_dispatched_first() {
    let mut session = fake_session();
    let seen = record_events(&session);
    session.init(DUMMY_TARGET).expect("init");

    session.command("hello").await.expect("command");

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2, "{seen:?}");
    match &seen[0] {
        DebuggerEvent::Notification(record) => {
            assert_eq!(record.kind, AsyncKind::Notify);
            assert_eq!(record.class, "thread-group-added");
            assert_eq!(record.payload, json!({"id": "i1"}));
        }
        other => panic!("expected a notification, got {other:?}"),
    }
    match &seen[1] {
        DebuggerEvent::Stream(record) => {
            assert_eq!(record.kind, StreamKind::Console);
            assert_eq!(record.raw, "\"fake debugger ready\\n\"");
        }
        other => panic!("expected stream output, got {other:?}"),
    }

    deinit_promptly(&mut session).await;
}

#[tokio::test]
async fn unexpected_result_class_fails_the_command() {
    let mut session = fake_session();
    session.init(DUMMY_TARGET).expect("init");

    let err = session.command("bogus").await.expect_err("bogus class");
    assert_eq!(
        err,
        AppError::UnexpectedResult {
            command: "bogus".to_owned(),
            class: "weird".to_owned(),
        }
    );

    // The response was consumed; the next command gets its own result.
    let payload = session.command("after").await.expect("command");
    assert_eq!(payload, json!({"echo": "after"}));

    deinit_promptly(&mut session).await;
}

#[tokio::test]
async fn error_class_is_a_recognized_result() {
    let mut session = fake_session();
    session.init(DUMMY_TARGET).expect("init");

    let record = session.execute("fail").await.expect("error is a result class");
    assert_eq!(record.class, "error");
    assert_eq!(record.payload, json!({"msg": "No symbol table is loaded."}));

    deinit_promptly(&mut session).await;
}

#[tokio::test]
async fn async_events_after_running_reach_the_callback() {
    let mut session = fake_session();
    let seen = record_events(&session);
    session.init(DUMMY_TARGET).expect("init");

    let record = session.execute("run").await.expect("run");
    assert_eq!(record.class, "running");

    let stopped = wait_until(|| {
        seen.lock().unwrap().iter().any(|event| {
            matches!(event, DebuggerEvent::Notification(r) if r.class == "stopped"
                && r.payload == json!({"reason": "exited-normally"}))
        })
    })
    .await;
    assert!(stopped, "*stopped must be dispatched");

    deinit_promptly(&mut session).await;
}

#[tokio::test]
async fn suspending_event_callback_is_awaited_in_order() {
    let mut session = fake_session();
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    session.on_event(EventCallback::suspending(move |event: DebuggerEvent| {
        let sink = Arc::clone(&sink);
        async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let label = match event {
                DebuggerEvent::Notification(record) => record.class,
                DebuggerEvent::Stream(record) => record.raw,
            };
            sink.lock().unwrap().push(label);
        }
    }));
    session.init(DUMMY_TARGET).expect("init");

    session.command("x").await.expect("command");
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["thread-group-added", "\"fake debugger ready\\n\""]
    );

    deinit_promptly(&mut session).await;
}

#[tokio::test]
async fn unknown_tag_ends_result_delivery() {
    let mut session = fake_session();
    session.init(DUMMY_TARGET).expect("init");

    let err = session.command("crash").await.expect_err("reader aborted");
    assert_eq!(err, AppError::ChannelClosed);

    // Depending on timing the debugger may already be gone (broken pipe),
    // but no result can ever arrive again.
    assert!(session.command("after").await.is_err());

    deinit_promptly(&mut session).await;
}

#[tokio::test]
async fn multi_line_command_is_rejected() {
    let mut session = fake_session();
    session.init(DUMMY_TARGET).expect("init");

    let err = session.command("one\ntwo").await.expect_err("two lines");
    assert!(matches!(err, AppError::Protocol(_)));

    let payload = session.command("single").await.expect("command");
    assert_eq!(payload, json!({"echo": "single"}));

    deinit_promptly(&mut session).await;
}
