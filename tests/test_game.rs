use std::time::{Duration, Instant};

use wave_shooter::audio::{AudioCommand, Clip};
use wave_shooter::compute::BULLET_SPEED;
use wave_shooter::entities::*;
use wave_shooter::game::*;
use wave_shooter::store::StoreError;

fn new_game() -> GameState {
    GameState::new(GameSettings::default())
}

fn started(t0: Instant) -> GameState {
    let mut game = new_game();
    game.start(t0);
    game.drain_audio();
    game
}

fn secs(s: f32) -> Duration {
    Duration::from_secs_f32(s)
}

/// Park a bullet so that after one tick of travel it sits on the enemy's centre.
fn aim_at(game: &mut GameState, enemy_idx: usize) {
    let s = game.session_mut();
    let enemy = &s.wave.enemies[enemy_idx];
    let (ox, oy) = s.wave.offset;
    let bullet = Bullet {
        x: enemy.x + ox,
        y: enemy.y + oy + BULLET_SPEED,
    };
    s.bullets.push(bullet);
}

fn played(cmds: &[AudioCommand], clip: Clip) -> usize {
    cmds.iter()
        .filter(|c| matches!(c, AudioCommand::Play { clip: c2, .. } if *c2 == clip))
        .count()
}

fn lose_on_timer(t0: Instant) -> GameState {
    let mut game = started(t0);
    game.update(t0 + secs(15.0));
    assert_eq!(game.phase(), Phase::GameOver);
    game
}

// ── construction & start ──────────────────────────────────────────────────────

#[test]
fn new_game_is_idle_with_music() {
    let mut game = new_game();
    assert_eq!(game.phase(), Phase::Idle);
    assert_eq!(game.screen(), &Screen::Start);
    assert!(!game.session().running());
    assert_eq!(
        game.drain_audio(),
        vec![AudioCommand::Play {
            clip: Clip::Background,
            volume: 0.5,
            looped: true
        }]
    );
}

#[test]
fn start_spawns_first_wave() {
    let t0 = Instant::now();
    let game = started(t0);
    let s = game.session();
    assert_eq!(game.phase(), Phase::Playing);
    assert_eq!(game.screen(), &Screen::Hud);
    assert_eq!(s.stage, 1);
    assert_eq!(s.score, 0);
    assert_eq!(s.wave.enemies.len(), 12);
    assert_eq!(s.time_left, 15.0);
    assert_eq!(s.time_budget, 15.0);
    assert_eq!(s.player.x, 400.0);
    let tween = game.wave_motion().expect("wave tween running");
    assert!(!tween.is_cancelled());
    assert_eq!(tween.duration(), Duration::from_secs(14));
}

#[test]
fn start_while_playing_is_ignored() {
    let t0 = Instant::now();
    let mut game = started(t0);
    game.handle_input(InputAction::MoveLeft, t0);
    game.start(t0 + secs(1.0));
    assert_eq!(game.session().player.x, 390.0);
    assert_eq!(game.session().stage_started_at, Some(t0));
}

#[test]
fn update_while_idle_does_nothing() {
    let mut game = new_game();
    game.drain_audio();
    game.update(Instant::now() + secs(100.0));
    assert_eq!(game.phase(), Phase::Idle);
    assert!(game.drain_audio().is_empty());
}

// ── input ─────────────────────────────────────────────────────────────────────

#[test]
fn input_ignored_before_start() {
    let mut game = new_game();
    let now = Instant::now();
    game.handle_input(InputAction::Fire, now);
    game.handle_input(InputAction::MoveLeft, now);
    assert!(game.session().bullets.is_empty());
    assert_eq!(game.session().player.x, 400.0);
}

#[test]
fn movement_is_clamped_to_field() {
    let t0 = Instant::now();
    let mut game = started(t0);
    for _ in 0..100 {
        game.handle_input(InputAction::MoveLeft, t0);
    }
    assert_eq!(game.session().player.x, 0.0);
    for _ in 0..100 {
        game.handle_input(InputAction::MoveRight, t0);
    }
    assert_eq!(game.session().player.x, 800.0);
}

#[test]
fn fire_spawns_bullet_with_cue() {
    let t0 = Instant::now();
    let mut game = started(t0);
    game.handle_input(InputAction::Fire, t0);
    game.handle_input(InputAction::Fire, t0);
    let s = game.session();
    assert_eq!(s.bullets.len(), 2, "no fire-rate limit by default");
    assert_eq!(s.bullets[0], Bullet { x: 400.0, y: 500.0 });
    assert_eq!(played(&game.drain_audio(), Clip::Shoot), 2);
}

#[test]
fn fire_cooldown_when_configured() {
    let settings = GameSettings {
        fire_cooldown: Duration::from_millis(200),
        ..GameSettings::default()
    };
    let mut game = GameState::new(settings);
    let t0 = Instant::now();
    game.start(t0);
    game.handle_input(InputAction::Fire, t0);
    game.handle_input(InputAction::Fire, t0 + Duration::from_millis(100));
    assert_eq!(game.session().bullets.len(), 1);
    game.handle_input(InputAction::Fire, t0 + Duration::from_millis(250));
    assert_eq!(game.session().bullets.len(), 2);
}

// ── bullets & collisions ──────────────────────────────────────────────────────

#[test]
fn bullet_kills_one_enemy_for_100() {
    let t0 = Instant::now();
    let mut game = started(t0);
    aim_at(&mut game, 0);
    game.update(t0);
    let s = game.session();
    assert_eq!(s.score, 100);
    assert_eq!(s.wave.enemies.len(), 11);
    assert!(s.bullets.is_empty());
    assert_eq!(played(&game.drain_audio(), Clip::Explosion), 1);
}

#[test]
fn bullet_never_kills_two() {
    let t0 = Instant::now();
    let mut game = started(t0);
    {
        let s = game.session_mut();
        s.wave.enemies = vec![
            Enemy { x: 100.0, y: 100.0, size: 40.0 },
            Enemy { x: 100.0, y: 100.0, size: 40.0 },
            Enemy { x: 600.0, y: 100.0, size: 40.0 },
        ];
        s.bullets.push(Bullet { x: 100.0, y: 107.0 });
    }
    game.update(t0);
    let s = game.session();
    assert_eq!(s.wave.enemies.len(), 2);
    assert_eq!(s.score, 100);
    assert!(s.bullets.is_empty());
}

#[test]
fn missed_bullet_keeps_flying_then_leaves() {
    let t0 = Instant::now();
    let mut game = started(t0);
    game.session_mut().bullets = vec![Bullet { x: 10.0, y: 100.0 }, Bullet { x: 20.0, y: -2.0 }];
    game.update(t0);
    let bullets = &game.session().bullets;
    assert_eq!(bullets, &vec![Bullet { x: 10.0, y: 93.0 }]);
}

#[test]
fn clearing_the_wave_advances_mid_tick() {
    let t0 = Instant::now();
    let mut game = started(t0);
    {
        let s = game.session_mut();
        s.wave.enemies = vec![Enemy { x: 100.0, y: 100.0, size: 40.0 }];
        s.bullets.push(Bullet { x: 10.0, y: 300.0 }); // older, misses
        s.bullets.push(Bullet { x: 100.0, y: 107.0 }); // newest, hits
    }
    game.update(t0);
    let s = game.session();
    assert_eq!(s.stage, 2);
    assert_eq!(s.score, 1100);
    assert_eq!(s.wave.enemies.len(), 16);
    assert_eq!(s.bullets, vec![Bullet { x: 10.0, y: 293.0 }]);
    assert_eq!(played(&game.drain_audio(), Clip::LevelUp), 1);
}

#[test]
fn full_stage_one_clear() {
    let t0 = Instant::now();
    let mut game = started(t0);
    let mut tick = t0;
    while game.session().stage == 1 {
        tick += Duration::from_millis(16);
        game.update(tick);
        let last = game.session().wave.enemies.len() - 1;
        aim_at(&mut game, last);
        game.update(tick);
    }
    let s = game.session();
    assert_eq!(game.phase(), Phase::Playing);
    assert_eq!(s.stage, 2);
    assert_eq!(s.score, 100 * 12 + 1000);
    assert_eq!(s.wave.enemies.len(), 16);
    assert_eq!(s.time_budget, 14.0);
    assert_eq!(s.time_left, 14.0);
    assert_eq!(game.hud().timer_text, "14");
    assert_eq!(game.wave_motion().map(|t| t.duration()), Some(Duration::from_secs(13)));
}

// ── wave motion ───────────────────────────────────────────────────────────────

#[test]
fn wave_follows_its_tween() {
    let t0 = Instant::now();
    let mut game = started(t0);
    game.update(t0 + secs(7.0));
    let (dx, dy) = game.session().wave.offset;
    assert!((dx - 50.0).abs() < 0.01);
    assert!((dy - 200.0).abs() < 0.01);
}

// ── game over ─────────────────────────────────────────────────────────────────

#[test]
fn timer_expiry_ends_the_game_once() {
    let t0 = Instant::now();
    let mut game = started(t0);
    game.update(t0 + secs(15.0));
    assert_eq!(game.phase(), Phase::GameOver);
    assert_eq!(game.session().time_left, 0.0);
    let summary = match game.screen() {
        Screen::GameOver(s) => s.clone(),
        other => panic!("expected game over screen, got {other:?}"),
    };
    assert_eq!(summary.reason, GameOverReason::TimerExpired);
    assert!(game.wave_motion().map(|t| t.is_cancelled()).unwrap_or(true));

    game.drain_audio();
    game.update(t0 + secs(16.0));
    game.update(t0 + secs(17.0));
    assert_eq!(game.screen(), &Screen::GameOver(summary));
    assert!(game.drain_audio().is_empty());
}

#[test]
fn wave_reaching_ship_ends_the_game() {
    let t0 = Instant::now();
    let mut game = started(t0);
    game.update(t0 + secs(5.0));
    assert_eq!(game.phase(), Phase::Playing);
    game.update(t0 + secs(10.0));
    assert_eq!(game.phase(), Phase::GameOver);
    assert!(matches!(
        game.screen(),
        Screen::GameOver(GameOverSummary { reason: GameOverReason::WaveReachedPlayer, .. })
    ));
    assert!(game.session().time_left > 0.0);
}

#[test]
fn game_over_freezes_score_and_input() {
    let t0 = Instant::now();
    let mut game = lose_on_timer(t0);
    let offset = game.session().wave.offset;
    game.session_mut().bullets.push(Bullet { x: 10.0, y: 100.0 });
    game.handle_input(InputAction::Fire, t0 + secs(16.0));
    game.handle_input(InputAction::MoveLeft, t0 + secs(16.0));
    game.update(t0 + secs(20.0));
    let s = game.session();
    assert_eq!(s.bullets.len(), 1);
    assert_eq!(s.bullets[0].y, 100.0);
    assert_eq!(s.player.x, 400.0);
    assert_eq!(s.wave.offset, offset);
}

// ── victory ───────────────────────────────────────────────────────────────────

#[test]
fn stage_eleven_is_victory() {
    let t0 = Instant::now();
    let mut game = started(t0);
    for _ in 0..9 {
        game.next_stage(t0);
        assert_eq!(game.phase(), Phase::Playing);
        assert!(!game.session().wave.enemies.is_empty());
    }
    assert_eq!(game.session().stage, 10);
    game.drain_audio();

    game.next_stage(t0);
    let s = game.session();
    assert_eq!(game.phase(), Phase::Victory);
    assert_eq!(s.stage, 11);
    assert_eq!(s.score, 10_000);
    assert!(s.wave.enemies.is_empty());
    assert_eq!(game.screen(), &Screen::Victory { final_score: 10_000 });
    assert!(game.wave_motion().map(|t| t.is_cancelled()).unwrap_or(true));

    let audio = game.drain_audio();
    assert!(audio.contains(&AudioCommand::Stop { clip: Clip::Background }));
    assert_eq!(played(&audio, Clip::Victory), 1);
}

#[test]
fn victory_through_bullets_stops_the_tick() {
    let t0 = Instant::now();
    let mut game = started(t0);
    for _ in 0..9 {
        game.next_stage(t0);
    }
    {
        let s = game.session_mut();
        s.wave.enemies = vec![Enemy { x: 100.0, y: 100.0, size: 40.0 }];
        s.bullets.push(Bullet { x: 10.0, y: 300.0 });
        s.bullets.push(Bullet { x: 100.0, y: 107.0 });
    }
    game.update(t0);
    let s = game.session();
    assert_eq!(game.phase(), Phase::Victory);
    assert_eq!(s.score, 9 * 1000 + 100 + 1000);
    // the older bullet was never advanced
    assert_eq!(s.bullets, vec![Bullet { x: 10.0, y: 300.0 }]);
}

#[test]
fn next_stage_outside_play_is_ignored() {
    let t0 = Instant::now();
    let mut game = new_game();
    game.next_stage(t0);
    assert_eq!(game.session().stage, 1);
    let mut game = lose_on_timer(t0);
    game.next_stage(t0);
    assert_eq!(game.session().stage, 1);
    assert_eq!(game.phase(), Phase::GameOver);
}

// ── reset ─────────────────────────────────────────────────────────────────────

#[test]
fn reset_from_game_over() {
    let t0 = Instant::now();
    let mut game = started(t0);
    aim_at(&mut game, 0);
    game.update(t0);
    game.handle_input(InputAction::Fire, t0);
    game.update(t0 + secs(15.0));
    assert_eq!(game.phase(), Phase::GameOver);

    let id = game.game_id();
    game.drain_audio();
    game.reset();
    let s = game.session();
    assert_eq!(game.phase(), Phase::Idle);
    assert_eq!(game.screen(), &Screen::Start);
    assert_eq!((s.stage, s.score), (1, 0));
    assert!(!s.running());
    assert!(s.bullets.is_empty());
    assert!(s.wave.enemies.is_empty());
    assert!(game.wave_motion().is_none());
    assert_eq!(game.game_id(), id + 1);
    assert_eq!(
        game.drain_audio(),
        vec![
            AudioCommand::Stop { clip: Clip::Background },
            AudioCommand::Play { clip: Clip::Background, volume: 0.5, looped: true },
        ]
    );
}

#[test]
fn reset_from_victory_then_play_again() {
    let t0 = Instant::now();
    let mut game = started(t0);
    for _ in 0..10 {
        game.next_stage(t0);
    }
    assert_eq!(game.phase(), Phase::Victory);
    game.reset();
    assert_eq!(game.phase(), Phase::Idle);

    let t1 = t0 + secs(60.0);
    game.start(t1);
    game.handle_input(InputAction::Fire, t1);
    let s = game.session();
    assert_eq!(s.stage, 1);
    assert_eq!(s.wave.enemies.len(), 12);
    assert_eq!(s.bullets.len(), 1, "one fire input, one bullet");
}

#[test]
fn reset_while_playing_is_ignored() {
    let t0 = Instant::now();
    let mut game = started(t0);
    game.reset();
    assert_eq!(game.phase(), Phase::Playing);
    assert_eq!(game.game_id(), 0);
}

// ── score submission ──────────────────────────────────────────────────────────

fn summary(game: &GameState) -> GameOverSummary {
    match game.screen() {
        Screen::GameOver(s) => s.clone(),
        other => panic!("expected game over screen, got {other:?}"),
    }
}

#[test]
fn submit_once_per_screen() {
    let t0 = Instant::now();
    let mut game = lose_on_timer(t0);
    let submission = game.submit_score("  ace  ").expect("first submit");
    assert_eq!(submission.game_id, game.game_id());
    assert_eq!(
        submission.entry,
        HighscoreEntry { nickname: "ace".into(), score: 0, stage: 1 }
    );
    assert!(!summary(&game).can_submit());
    assert_eq!(game.submit_score("ace"), None);
}

#[test]
fn blank_nickname_is_not_submitted() {
    let mut game = lose_on_timer(Instant::now());
    assert_eq!(game.submit_score("   "), None);
    assert!(summary(&game).can_submit());
}

#[test]
fn submit_outside_game_over_is_refused() {
    let t0 = Instant::now();
    let mut game = new_game();
    assert_eq!(game.submit_score("ace"), None);
    let mut game = started(t0);
    assert_eq!(game.submit_score("ace"), None);
    for _ in 0..10 {
        game.next_stage(t0);
    }
    assert_eq!(game.submit_score("ace"), None);
}

#[test]
fn successful_save_shows_table() {
    let mut game = lose_on_timer(Instant::now());
    let sub = game.submit_score("ace").unwrap();
    let table = vec![
        HighscoreEntry { nickname: "top".into(), score: 9000, stage: 9 },
        sub.entry.clone(),
    ];
    game.finish_score_save(sub.game_id, Ok(table.clone()));
    let s = summary(&game);
    assert_eq!(s.highscores, Some(table));
    assert!(!s.can_submit());
}

#[test]
fn empty_table_is_fine() {
    let mut game = lose_on_timer(Instant::now());
    let sub = game.submit_score("ace").unwrap();
    game.finish_score_save(sub.game_id, Ok(Vec::new()));
    assert_eq!(summary(&game).highscores, Some(Vec::new()));
}

#[test]
fn failed_save_allows_retry() {
    let mut game = lose_on_timer(Instant::now());
    let sub = game.submit_score("ace").unwrap();
    game.finish_score_save(
        sub.game_id,
        Err(StoreError::Status { code: 503, body: "unavailable".into() }),
    );
    let s = summary(&game);
    assert!(s.can_submit());
    assert_eq!(s.highscores, None);
    assert!(game.submit_score("ace").is_some());
}

#[test]
fn late_reply_for_old_game_is_dropped() {
    let t0 = Instant::now();
    let mut game = lose_on_timer(t0);
    let sub = game.submit_score("ace").unwrap();
    game.reset();
    game.start(t0 + secs(30.0));
    game.update(t0 + secs(45.0));
    assert_eq!(game.phase(), Phase::GameOver);

    game.finish_score_save(sub.game_id, Ok(vec![sub.entry.clone()]));
    let s = summary(&game);
    assert_eq!(s.highscores, None);
    assert!(s.can_submit());
}
