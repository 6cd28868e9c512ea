mod common;

use common::*;
use spectrum_core::{
    DrawCommand, GameEvent, HitPolicyKind, Layer, PixelPoint, PostState, SelectionSource,
    SubmissionOutcome, SubmitState, WinState,
};
use spectrum_types::{Stream, ValidationError};

fn circle_centers(frame: &spectrum_core::Frame, layer: Layer) -> Vec<PixelPoint> {
    frame
        .layer(layer)
        .filter_map(|command| match command {
            DrawCommand::Circle { center, .. } => Some(*center),
            _ => None,
        })
        .collect()
}

fn assert_single_center(frame: &spectrum_core::Frame, layer: Layer, x: f64, y: f64) {
    let centers = circle_centers(frame, layer);
    assert_eq!(centers.len(), 1, "expected one point on {:?}", layer);
    assert!(
        (centers[0].x - x).abs() < 1e-6 && (centers[0].y - y).abs() < 1e-6,
        "point drawn at {:?}, expected ({}, {})",
        centers[0],
        x,
        y
    );
}

#[test]
fn test_miss_is_drawn_at_transformed_pixel() {
    let (mut game, events) = create_observed_game(HitPolicyKind::Authoritative);
    guess_word(&mut game, "happy", miss("g1", "happy", 0.2, 0.9));

    let frame = game.render();
    assert_single_center(&frame, Layer::OwnGuesses, 130.0, 90.0);
    assert!(!game.session().is_won());
    assert!(!events.has_event_type(|e| matches!(e, GameEvent::Won { .. })));

    // The fresh guess is selected and annotated
    let selection = game.session().selection().unwrap();
    assert_eq!(selection.word, "happy");
    assert_eq!(selection.source, SelectionSource::Own);
    assert!(frame.layer(Layer::Selection).any(
        |command| matches!(command, DrawCommand::Text { text, .. } if text == "happy")
    ));
}

#[test]
fn test_hit_wins_and_posts_exactly_once() {
    let (mut game, events) = create_observed_game(HitPolicyKind::Authoritative);
    game.apply_target(game.round(), centered_target(0.1)).unwrap();
    guess_word(&mut game, "boring", hit("g1", "boring", 0.5, 0.5, "abc"));

    match game.session().win_state() {
        WinState::Won { guess, token, post } => {
            assert_eq!(guess.word, "boring");
            assert_eq!(token.as_deref(), Some("abc"));
            assert_eq!(*post, PostState::Available);
        }
        other => panic!("expected a win, got {:?}", other),
    }

    let pending = game.begin_post_win("alice").unwrap().unwrap();
    assert_eq!(pending.token, "abc");
    assert_eq!(pending.username, "alice");
    assert!(game.complete_post_win(pending, Ok(())));

    assert_eq!(game.begin_post_win("alice"), Ok(None));
    assert_eq!(
        events.count(|e| matches!(e, GameEvent::WinPosted { .. })),
        1
    );
    assert_eq!(events.count(|e| matches!(e, GameEvent::Won { .. })), 1);
}

#[test]
fn test_second_hit_does_not_rewin() {
    let (mut game, events) = create_observed_game(HitPolicyKind::Authoritative);
    guess_word(&mut game, "boring", hit("g1", "boring", 0.5, 0.5, "abc"));
    guess_word(&mut game, "dull", hit("g2", "dull", 0.51, 0.5, "def"));

    assert_eq!(events.count(|e| matches!(e, GameEvent::Won { .. })), 1);
    let pending = game.begin_post_win("alice").unwrap().unwrap();
    assert_eq!(pending.token, "abc");
}

#[test]
fn test_empty_word_never_leaves_idle() {
    let (mut game, events) = create_observed_game(HitPolicyKind::Authoritative);
    assert_eq!(game.submit("   ").unwrap_err(), ValidationError::EmptyWord);
    assert_eq!(game.session().submit_state(), &SubmitState::Idle);
    assert_eq!(game.session().inline_error(), Some("Please enter a word to guess."));
    assert!(!events.has_event_type(|e| matches!(e, GameEvent::GuessSubmitted { .. })));
    assert!(events.has_event_type(|e| matches!(e, GameEvent::GuessRejected { .. })));
}

#[test]
fn test_leaderboard_deltas_accumulate() {
    let mut game = create_test_game();
    let round = game.round();
    assert_eq!(game.leaderboard().cursor(), 0);

    game.apply_leaderboard(
        round,
        leaderboard_delta(&[("a", "sun", 0.1, 0.1), ("b", "moon", 0.9, 0.9)], 1_000),
    )
    .unwrap();
    assert_eq!(game.leaderboard().cursor(), 1_000);

    let outcome = game
        .apply_leaderboard(round, leaderboard_delta(&[("c", "star", 0.3, 0.7)], 2_000))
        .unwrap();
    assert_eq!(outcome.total, 3);
    assert_eq!(game.leaderboard().len(), 3);
    assert_eq!(circle_centers(&game.render(), Layer::Leaderboard).len(), 3);
}

#[test]
fn test_own_guess_on_leaderboard_drawn_once() {
    let mut game = create_test_game();
    let round = game.round();
    guess_word(&mut game, "boring", hit("shared", "boring", 0.5, 0.5, "abc"));
    game.apply_leaderboard(round, leaderboard_delta(&[("shared", "boring", 0.5, 0.5)], 10))
        .unwrap();

    let frame = game.render();
    assert!(circle_centers(&frame, Layer::Leaderboard).is_empty());
    assert_eq!(circle_centers(&frame, Layer::OwnGuesses).len(), 1);
}

#[test]
fn test_failed_submission_keeps_prior_state() {
    let mut game = create_test_game();
    guess_word(&mut game, "happy", miss("g1", "happy", 0.2, 0.9));

    let pending = game.submit("sad").unwrap();
    let outcome = game.complete_submission(pending, Err(Some("Word not found".to_string())));
    assert_eq!(outcome, SubmissionOutcome::Failed("Word not found".to_string()));
    assert_eq!(game.session().guesses().len(), 1);
    assert_eq!(game.session().inline_error(), Some("Word not found"));

    // A fresh submission clears the message
    game.submit("glad").unwrap();
    assert_eq!(game.session().inline_error(), None);
}

#[test]
fn test_fetch_failure_keeps_last_target() {
    let (mut game, events) = create_observed_game(HitPolicyKind::Authoritative);
    game.apply_target(game.round(), centered_target(0.1)).unwrap();
    game.record_fetch_failure(Stream::Target, "connection refused".to_string());

    assert_eq!(game.target(), Some(&centered_target(0.1)));
    assert!(events.has_event_type(|e| matches!(
        e,
        GameEvent::FetchFailed { stream: Stream::Target, .. }
    )));
}

#[test]
fn test_round_boundary_resets_and_drops_late_answers() {
    let (mut game, events) = create_observed_game(HitPolicyKind::Authoritative);
    let first = game.round();
    game.apply_timing(first, timing(60_000, 60_000)).unwrap();
    game.apply_target(first, centered_target(0.1)).unwrap();
    game.apply_leaderboard(first, leaderboard_delta(&[("a", "sun", 0.1, 0.1)], 500))
        .unwrap();
    guess_word(&mut game, "boring", hit("g1", "boring", 0.5, 0.5, "abc"));
    let late_guess = game.submit("slow").unwrap();
    let late_post = game.begin_post_win("alice").unwrap().unwrap();

    assert_eq!(game.countdown_text(0).as_deref(), Some("0h 1m 0s"));
    assert_eq!(game.tick(59_999), None);
    let second = game.tick(60_000).unwrap();
    assert_eq!(game.countdown_text(60_000).as_deref(), Some("0h 1m 0s"));

    assert!(game.session().guesses().is_empty());
    assert!(game.target().is_none());
    assert!(game.labels().is_none());
    assert!(game.leaderboard().is_empty());
    assert!(!game.session().is_won());

    assert_eq!(
        game.complete_submission(late_guess, Ok(hit("g2", "slow", 0.5, 0.5, "zzz"))),
        SubmissionOutcome::Stale
    );
    assert!(!game.complete_post_win(late_post, Ok(())));
    assert!(game.session().guesses().is_empty());
    assert!(!game.session().is_submitting());

    let old = leaderboard_delta(&[("b", "moon", 0.9, 0.9)], 900);
    assert!(game.apply_leaderboard(first, old).is_err());
    assert!(game.leaderboard().is_empty());

    assert!(events.has_event_type(|e| matches!(e, GameEvent::RoundAdvanced { round, .. } if *round == second)));
    assert_eq!(
        events.count(|e| matches!(e, GameEvent::StaleDiscarded { .. })),
        3
    );
}

#[test]
fn test_click_selects_nearest_point() {
    let mut game = create_test_game();
    let round = game.round();
    guess_word(&mut game, "happy", miss("g1", "happy", 0.2, 0.9));
    game.apply_leaderboard(round, leaderboard_delta(&[("l", "sun", 0.8, 0.1)], 10))
        .unwrap();

    // sun sits at (370, 410)
    let selected = game.click(PixelPoint::new(372.0, 408.0)).unwrap();
    assert_eq!(selected.word, "sun");
    assert_eq!(selected.source, SelectionSource::Leaderboard);

    assert!(game.click(PixelPoint::new(250.0, 250.0)).is_none());
    assert!(game.session().selection().is_none());
    assert!(game.render().layer(Layer::Selection).next().is_none());
}

#[test]
fn test_resize_moves_points_with_surface() {
    let mut game = create_test_game();
    guess_word(&mut game, "happy", miss("g1", "happy", 0.2, 0.9));
    let before = game.render();

    game.resize(1250.0, 900.0);
    let after = game.render();
    assert_ne!(before, after);
    // 900 * 0.8 = 720 side, 50 margin, 620 plot
    assert_single_center(&after, Layer::OwnGuesses, 174.0, 112.0);
}
