//! Line classification and payload decoding of single protocol lines.

use serde_json::json;

use mi_session::mi::classify::{classify, is_prompt, is_result_class, Category, RESULT_CLASSES};
use mi_session::mi::value::decode;
use mi_session::mi::{AsyncKind, StreamKind};

#[test]
fn result_line_splits_class_and_payload() {
    let line = classify("^done,reason=\"exited-normally\"");
    assert_eq!(line.category, Category::Result);
    assert_eq!(line.sub_label, "done");
    assert_eq!(line.payload, "reason=\"exited-normally\"");
}

#[test]
fn async_line_decodes_payload() {
    let line = classify("*stopped,reason=\"breakpoint-hit\"");
    assert_eq!(line.category, Category::Async(AsyncKind::Exec));
    assert_eq!(line.sub_label, "stopped");
    assert_eq!(
        decode(line.payload).expect("payload decodes"),
        json!({"reason": "breakpoint-hit"})
    );
}

#[test]
fn stream_line_keeps_raw_payload() {
    let line = classify("~\"Reading symbols...\\n\"");
    assert_eq!(line.category, Category::Stream(StreamKind::Console));
    assert_eq!(line.sub_label, "");
    assert_eq!(line.payload, "\"Reading symbols...\\n\"");
}

#[test]
fn stream_payload_commas_are_not_split() {
    let line = classify("&\"warning: a, b, c\\n\"");
    assert_eq!(line.category, Category::Stream(StreamKind::Log));
    assert_eq!(line.payload, "\"warning: a, b, c\\n\"");
}

#[test]
fn line_without_comma_has_empty_payload() {
    for (raw, label) in [("^running", "running"), ("*stopped", "stopped"), ("=foo", "foo")] {
        let line = classify(raw);
        assert_eq!(line.sub_label, label, "label of {raw}");
        assert_eq!(line.payload, "", "payload of {raw}");
    }
    assert_eq!(decode("").expect("empty payload decodes"), json!({}));
}

#[test]
fn only_first_comma_splits() {
    let line = classify("=thread-group-added,id=\"i1\",pid=\"42\"");
    assert_eq!(line.category, Category::Async(AsyncKind::Notify));
    assert_eq!(line.sub_label, "thread-group-added");
    assert_eq!(line.payload, "id=\"i1\",pid=\"42\"");
}

#[test]
fn every_tag_maps_to_its_category() {
    let cases = [
        ('^', Category::Result),
        ('*', Category::Async(AsyncKind::Exec)),
        ('+', Category::Async(AsyncKind::Status)),
        ('=', Category::Async(AsyncKind::Notify)),
        ('~', Category::Stream(StreamKind::Console)),
        ('@', Category::Stream(StreamKind::Target)),
        ('&', Category::Stream(StreamKind::Log)),
    ];
    for (tag, expected) in cases {
        assert_eq!(classify(&format!("{tag}x")).category, expected, "tag {tag}");
    }
}

#[test]
fn unrecognized_tag_is_unknown() {
    assert_eq!(classify("!oops").category, Category::Unknown('!'));
    assert_eq!(classify("(gdb)x").category, Category::Unknown('('));
    assert_eq!(classify("").category, Category::Unknown('\0'));
}

#[test]
fn prompt_is_recognized_exactly() {
    assert!(is_prompt("(gdb)"));
    assert!(is_prompt("(gdb) "));
    assert!(!is_prompt("(gdb"));
    assert!(!is_prompt("~\"(gdb)\""));
}

#[test]
fn recognized_result_classes() {
    for class in RESULT_CLASSES {
        assert!(is_result_class(class));
    }
    assert!(!is_result_class("weird"));
    assert!(!is_result_class(""));
}
