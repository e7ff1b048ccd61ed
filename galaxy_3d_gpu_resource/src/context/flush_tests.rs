//! Unit tests for flush.rs

use crate::context::FlushState;
use crate::texture::FlushEpoch;

#[test]
fn test_initial_epoch() {
    let state = FlushState::new();
    assert_eq!(state.epoch(), FlushEpoch { number: 0, in_flush: false });
}

#[test]
fn test_token_marks_flush_in_progress() {
    let state = FlushState::new();
    let token = state.begin().unwrap();
    assert_eq!(token.epoch(), FlushEpoch { number: 0, in_flush: true });
    assert_eq!(state.epoch(), token.epoch());
}

#[test]
fn test_dropping_token_advances_number() {
    let state = FlushState::new();
    drop(state.begin().unwrap());
    assert_eq!(state.epoch(), FlushEpoch { number: 1, in_flush: false });

    drop(state.begin().unwrap());
    assert_eq!(state.epoch().number, 2);
}

#[test]
fn test_flushes_do_not_nest() {
    let state = FlushState::new();
    let token = state.begin().unwrap();
    assert!(state.begin().is_none());
    drop(token);
    assert!(state.begin().is_some());
}
