//! Save/restore behavior through the gate.

use std::fs;
use std::thread;
use std::time::Duration;

use ledis_server::{Gate, GateOutcome};

fn gate() -> (Gate, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    (Gate::with_data_dir(dir.path()), dir)
}

fn run(gate: &Gate, line: &str) -> String {
    match gate.execute(line) {
        GateOutcome::Reply(reply) => reply.to_string(),
        GateOutcome::Terminate => panic!("unexpected terminate for {line:?}"),
    }
}

#[test]
fn save_flush_restore_round_trip() {
    let (gate, _dir) = gate();
    run(&gate, "RPUSH L a b");
    assert_eq!(run(&gate, "SAVE"), "OK");
    assert_eq!(run(&gate, "FLUSHDB"), "OK");
    assert_eq!(run(&gate, "RESTORE"), "OK");
    assert_eq!(run(&gate, "LRANGE L 0 -1"), "1) \"a\"\n2) \"b\"");
}

#[test]
fn restore_reproduces_a_mixed_workload() {
    let (gate, _dir) = gate();
    run(&gate, "SET s hello");
    run(&gate, "RPUSH l 1 2 3");
    run(&gate, "LPOP l");
    run(&gate, "SADD set a b c");
    run(&gate, "SREM set b");
    run(&gate, "SAVE");
    run(&gate, "FLUSHDB");
    run(&gate, "RESTORE");

    assert_eq!(run(&gate, "GET s"), "\"hello\"");
    assert_eq!(run(&gate, "LRANGE l 0 -1"), "1) \"2\"\n2) \"3\"");
    assert_eq!(run(&gate, "SMEMBERS set"), "1) \"a\"\n2) \"c\"");
}

#[test]
fn saved_ttl_survives_restore_within_a_second() {
    let (gate, _dir) = gate();
    run(&gate, "SET k v");
    run(&gate, "EXPIRE k 100");
    run(&gate, "SAVE");
    run(&gate, "FLUSHDB");
    run(&gate, "RESTORE");

    let ttl: i64 = run(&gate, "TTL k")
        .strip_prefix("(integer) ")
        .unwrap()
        .parse()
        .unwrap();
    assert!((99..=101).contains(&ttl), "ttl was {ttl}");
}

#[test]
fn dead_keys_are_not_resurrected() {
    let (gate, _dir) = gate();
    run(&gate, "SET doomed v");
    run(&gate, "DEL doomed");
    run(&gate, "SET keep v");
    run(&gate, "SAVE");
    run(&gate, "FLUSHDB");
    run(&gate, "RESTORE");

    assert_eq!(run(&gate, "GET doomed"), "(nil)");
    assert_eq!(run(&gate, "KEYS"), "1) \"keep\"");
}

#[test]
fn expired_keys_are_not_resurrected() {
    let (gate, _dir) = gate();
    run(&gate, "SET temp v");
    run(&gate, "EXPIRE temp 1");
    run(&gate, "SET keep v");
    thread::sleep(Duration::from_millis(1100));
    run(&gate, "SAVE");
    run(&gate, "RESTORE");

    assert_eq!(run(&gate, "GET temp"), "(nil)");
    assert_eq!(run(&gate, "TTL temp"), "(integer) -2");
    assert_eq!(run(&gate, "KEYS"), "1) \"keep\"");
}

#[test]
fn write_expire_delete_rewrite_replays_cleanly() {
    let (gate, _dir) = gate();
    run(&gate, "SET k v1");
    run(&gate, "EXPIRE k 100");
    run(&gate, "DEL k");
    run(&gate, "SET k v2");
    run(&gate, "SAVE");
    run(&gate, "FLUSHDB");
    run(&gate, "RESTORE");

    // the rewrite never got a new TTL, so none may survive the replay
    assert_eq!(run(&gate, "GET k"), "\"v2\"");
    assert_eq!(run(&gate, "TTL k"), "(integer) -1");
}

#[test]
fn restore_replaces_state_wholesale() {
    let (gate, _dir) = gate();
    run(&gate, "SET old 1");
    run(&gate, "SAVE");
    run(&gate, "SET extra 2");
    run(&gate, "RESTORE");

    assert_eq!(run(&gate, "GET extra"), "(nil)");
    assert_eq!(run(&gate, "KEYS"), "1) \"old\"");
}

#[test]
fn restored_log_keeps_accumulating() {
    let (gate, _dir) = gate();
    run(&gate, "SET a 1");
    run(&gate, "SAVE");
    run(&gate, "FLUSHDB");
    run(&gate, "RESTORE");
    // the restored log must carry "SET a 1" forward into the next save
    run(&gate, "SET b 2");
    run(&gate, "SAVE");
    run(&gate, "FLUSHDB");
    run(&gate, "RESTORE");

    assert_eq!(run(&gate, "KEYS"), "1) \"a\"\n2) \"b\"");
}

#[test]
fn corrupt_snapshot_leaves_engine_unchanged() {
    let (gate, dir) = gate();
    run(&gate, "SET live v");
    fs::write(dir.path().join("ledis.snpsht"), [0xFF, 0xFF, 0x00]).unwrap();

    assert!(run(&gate, "RESTORE").starts_with("ERROR:"));
    assert_eq!(run(&gate, "GET live"), "\"v\"");
    assert_eq!(run(&gate, "KEYS"), "1) \"live\"");
}

#[test]
fn second_save_replaces_the_file() {
    let (gate, dir) = gate();
    run(&gate, "SET first 1");
    run(&gate, "SAVE");
    run(&gate, "SET second 2");
    run(&gate, "SAVE");
    run(&gate, "FLUSHDB");
    run(&gate, "RESTORE");

    assert_eq!(run(&gate, "KEYS"), "1) \"first\"\n2) \"second\"");
    assert!(!dir.path().join("ledis.snpsht.bak").exists());
}

#[test]
fn flushdb_truncates_what_gets_saved() {
    let (gate, _dir) = gate();
    run(&gate, "SET before 1");
    run(&gate, "FLUSHDB");
    run(&gate, "SET after 2");
    run(&gate, "SAVE");
    run(&gate, "FLUSHDB");
    run(&gate, "RESTORE");

    assert_eq!(run(&gate, "KEYS"), "1) \"after\"");
}
