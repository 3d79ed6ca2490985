//! Integration tests for the playback section
//!
//! These drive a mounted section end to end: course file on disk, file
//! backed preferences, key dispatch, simulated engine and auto-advance.

use anyhow::Result;
use lecture_player::course::NavigationProvider;
use lecture_player::input::{KeyCode, KeyEvent};
use lecture_player::media::{AdapterCall, MediaEvent};
use lecture_player::player::{Command, Overlay, SectionView, PLACEHOLDER_SOURCE};
use lecture_player_integration_tests::{HandlerCall, Harness, TestFixture};
use std::time::Duration;

fn settle() -> Duration {
    Duration::from_millis(2100)
}

#[test]
fn test_skip_forward_clamps_to_duration() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut h = Harness::mount(&fixture, Some(0))?;
    h.ready(120.0);

    h.section.execute(Command::SeekTo(115.0));
    h.section.execute(Command::SkipForward);
    h.section.pump();
    assert_eq!(h.section.state().map(|s| s.current_time), Some(120.0));
    assert_eq!(h.engine.position(), 120.0);

    h.section.execute(Command::SeekTo(4.0));
    h.section.execute(Command::SkipBackward);
    h.section.pump();
    assert_eq!(h.section.state().map(|s| s.current_time), Some(0.0));
    Ok(())
}

#[test]
fn test_error_cleared_only_by_new_load() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut h = Harness::mount(&fixture, Some(0))?;
    h.section.pump();

    h.engine.fail("network failure");
    h.section.pump();
    let state = h.section.state().cloned().unwrap_or_default();
    assert!(!state.is_loading);
    assert_eq!(state.error.as_deref(), Some("network failure"));

    h.engine.emit(MediaEvent::CanPlay);
    h.section.pump();
    assert_eq!(
        h.section.state().and_then(|s| s.error.clone()).as_deref(),
        Some("network failure")
    );
    match h.section.render() {
        SectionView::Player(view) => {
            assert_eq!(view.overlay, Overlay::Error("network failure".to_string()))
        }
        other => panic!("unexpected view {:?}", other),
    }

    h.engine.emit(MediaEvent::LoadStart);
    h.section.pump();
    assert_eq!(h.section.state().and_then(|s| s.error.clone()), None);
    Ok(())
}

#[test]
fn test_volume_survives_remount() -> Result<()> {
    let fixture = TestFixture::new()?;

    let mut first = Harness::mount(&fixture, Some(0))?;
    first.ready(120.0);
    first.section.execute(Command::SetVolume(0.35));
    assert!(fixture.preferences_path().exists());
    first.section.unmount();

    let second = Harness::mount(&fixture, Some(0))?;
    assert_eq!(second.section.state().map(|s| s.volume), Some(0.35));
    assert_eq!(second.engine.volume(), 0.35);
    match second.section.render() {
        SectionView::Player(view) => {
            assert_eq!(view.controls.volume, 0.35);
            assert!(!view.controls.is_muted);
        }
        other => panic!("unexpected view {:?}", other),
    }
    Ok(())
}

#[test]
fn test_lecture_change_resets_position() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut h = Harness::mount(&fixture, Some(0))?;
    h.ready(754.0);
    h.section.execute(Command::TogglePlay);
    h.section.execute(Command::SeekTo(300.0));
    h.section.pump();
    assert_eq!(h.section.state().map(|s| s.is_playing), Some(true));

    h.section.go_to_next();
    let state = h.section.state().cloned().unwrap_or_default();
    assert_eq!(state.current_time, 0.0);
    assert!(!state.is_playing);
    assert_eq!(h.engine.source().as_deref(), Some(PLACEHOLDER_SOURCE));
    assert_eq!(h.section.lecture().map(|l| l.id), Some(102));
    Ok(())
}

#[test]
fn test_held_key_executes_once() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut h = Harness::mount(&fixture, Some(0))?;
    h.ready(120.0);
    h.engine.clear_calls();

    assert!(h.keys.dispatch(&KeyEvent::press(KeyCode::Space)));
    for _ in 0..5 {
        assert!(!h.keys.dispatch(&KeyEvent::press(KeyCode::Space).repeated()));
    }
    h.section.pump();

    let plays = h.engine.calls().iter().filter(|c| **c == AdapterCall::Play).count();
    assert_eq!(plays, 1);
    assert!(h.engine.is_playing());
    Ok(())
}

#[test]
fn test_keys_in_text_input_ignored() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut h = Harness::mount(&fixture, Some(0))?;
    h.ready(120.0);
    h.engine.clear_calls();

    assert!(!h.keys.dispatch(&KeyEvent::press(KeyCode::KeyM).in_text_input()));
    assert!(!h.keys.dispatch(&KeyEvent::press(KeyCode::ArrowLeft).with_alt()));
    h.section.pump();
    assert!(h.engine.calls().is_empty());
    Ok(())
}

#[test]
fn test_empty_state_until_lecture_selected() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut h = Harness::mount(&fixture, None)?;
    assert!(matches!(h.section.render(), SectionView::Empty { .. }));
    assert!(!h.engine.is_bound());

    h.keys.dispatch(&KeyEvent::press(KeyCode::Space));
    h.section.pump();
    assert!(h.engine.calls().is_empty());

    h.follow_navigation();
    match h.section.render() {
        SectionView::Player(view) => {
            assert_eq!(view.metadata.title, "Ownership");
            assert_eq!(view.metadata.length_label.as_deref(), Some("12:34"));
            assert_eq!(view.attachments[0].href, "/quiz/101/1");
            assert_eq!(view.attachments[1].href, "/attachment/101/2");
            assert!(view.navigation.can_go_next);
            assert!(!view.navigation.can_go_previous);
        }
        other => panic!("unexpected view {:?}", other),
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_auto_advance_after_lecture_ends() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut h = Harness::mount(&fixture, Some(0))?;
    h.ready(30.0);
    h.section.execute(Command::TogglePlay);
    h.section.pump();

    h.engine.tick(31.0);
    h.section.pump();
    assert_eq!(h.handler.calls(), vec![HandlerCall::VideoEnd]);
    assert!(h.section.auto_advance_pending());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(h.handler.count(HandlerCall::Next), 0);

    tokio::time::sleep(Duration::from_millis(600)).await;
    tokio::task::yield_now().await;
    assert_eq!(h.handler.count(HandlerCall::Next), 1);

    h.navigator.go_to_next_lecture();
    h.follow_navigation();
    assert_eq!(h.section.lecture().map(|l| l.id), Some(102));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_double_ended_advances_once() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut h = Harness::mount(&fixture, Some(0))?;
    h.ready(30.0);

    h.engine.emit(MediaEvent::Ended);
    h.section.pump();
    tokio::time::sleep(Duration::from_millis(800)).await;
    h.engine.emit(MediaEvent::Ended);
    h.section.pump();

    tokio::time::sleep(settle() * 2).await;
    tokio::task::yield_now().await;
    assert_eq!(h.handler.count(HandlerCall::VideoEnd), 2);
    assert_eq!(h.handler.count(HandlerCall::Next), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unmount_cancels_auto_advance() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut h = Harness::mount(&fixture, Some(0))?;
    h.ready(30.0);

    h.engine.emit(MediaEvent::Ended);
    h.section.pump();
    tokio::time::sleep(Duration::from_millis(1000)).await;
    h.section.unmount();

    tokio::time::sleep(settle()).await;
    tokio::task::yield_now().await;
    assert_eq!(h.handler.count(HandlerCall::Next), 0);
    assert_eq!(h.keys.listener_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_lecture_change_cancels_auto_advance() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut h = Harness::mount(&fixture, Some(0))?;
    h.ready(30.0);

    h.engine.emit(MediaEvent::Ended);
    h.section.pump();
    h.section.go_to_next();
    assert!(!h.section.auto_advance_pending());

    tokio::time::sleep(settle()).await;
    tokio::task::yield_now().await;
    assert_eq!(h.handler.count(HandlerCall::Next), 0);
    assert_eq!(h.navigator.current_index(), 1);
    Ok(())
}
