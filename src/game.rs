/// The game-state object: lifecycle, per-frame update, input and the
/// score-submission bridge.
///
/// `GameState` never reads a clock. Every operation that depends on time
/// takes `now` from the host, which keeps the whole state machine
/// deterministic under test.
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::audio::{AudioCommand, AudioQueue, Clip};
use crate::compute::{
    self, advance_bullet, bullet_off_screen, first_hit, hud, remaining_time, spawn_bullet,
    spawn_player, wave_reached_player, Hud, KILL_SCORE, STAGE_CLEAR_BONUS,
};
use crate::config::Config;
use crate::entities::{
    EnemyWave, GameOverReason, HighscoreEntry, Phase, Session,
};
use crate::formation::{
    build_wave, formation_for_stage, time_budget, wave_duration, VICTORY_STAGE, WAVE_DRIFT_X,
    WAVE_DRIFT_Y,
};
use crate::store::StoreError;
use crate::tween::Tween;

// ── Settings ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct GameSettings {
    pub width: f32,
    pub height: f32,
    /// Zero disables the limit.
    pub fire_cooldown: Duration,
    pub min_spacing_ratio: f32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for GameSettings {
    fn from(config: &Config) -> Self {
        Self {
            width: config.display.width,
            height: config.display.height,
            fire_cooldown: Duration::from_millis(config.gameplay.fire_cooldown_ms),
            min_spacing_ratio: config.gameplay.min_spacing_ratio,
        }
    }
}

// ── Input & screens ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    MoveLeft,
    MoveRight,
    Fire,
}

/// What the game-over screen shows.
#[derive(Clone, Debug, PartialEq)]
pub struct GameOverSummary {
    pub reason: GameOverReason,
    pub final_score: u32,
    pub stage: u32,
    /// Set once a nickname is submitted; hides the save affordance.
    pub submit_locked: bool,
    /// Leaderboard fetched after a successful save.
    pub highscores: Option<Vec<HighscoreEntry>>,
}

impl GameOverSummary {
    pub fn can_submit(&self) -> bool {
        !self.submit_locked
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Screen {
    Start,
    Hud,
    GameOver(GameOverSummary),
    Victory { final_score: u32 },
}

/// A score the host should hand to the store.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreSubmission {
    /// Game the score belongs to; echoed back with the result.
    pub game_id: u64,
    pub entry: HighscoreEntry,
}

// ── Game state ───────────────────────────────────────────────────────────────

pub struct GameState {
    settings: GameSettings,
    session: Session,
    screen: Screen,
    wave_motion: Option<Tween>,
    audio: AudioQueue,
    /// Bumped on every reset so late store replies can be recognised.
    game_id: u64,
    last_shot: Option<Instant>,
}

fn idle_session(settings: &GameSettings) -> Session {
    Session {
        phase: Phase::Idle,
        stage: 1,
        score: 0,
        time_left: 0.0,
        time_budget: 0.0,
        stage_started_at: None,
        player: spawn_player(settings.width, settings.height),
        wave: EnemyWave::default(),
        bullets: Vec::new(),
    }
}

impl GameState {
    /// Start screen up, background music playing.
    pub fn new(settings: GameSettings) -> Self {
        let mut audio = AudioQueue::default();
        audio.play_looped(Clip::Background);
        Self {
            session: idle_session(&settings),
            settings,
            screen: Screen::Start,
            wave_motion: None,
            audio,
            game_id: 0,
            last_shot: None,
        }
    }

    // ── Read access ──────────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Direct access for hosts that script scenarios (replays, tests).
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn wave_motion(&self) -> Option<&Tween> {
        self.wave_motion.as_ref()
    }

    pub fn game_id(&self) -> u64 {
        self.game_id
    }

    pub fn hud(&self) -> Hud {
        hud(&self.session)
    }

    pub fn drain_audio(&mut self) -> Vec<AudioCommand> {
        self.audio.drain()
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Idle → Playing.
    pub fn start(&mut self, now: Instant) {
        if self.session.phase != Phase::Idle {
            debug!(phase = ?self.session.phase, "start ignored");
            return;
        }
        let s = &mut self.session;
        s.stage = 1;
        s.score = 0;
        s.player = spawn_player(self.settings.width, self.settings.height);
        s.bullets.clear();
        s.phase = Phase::Playing;
        self.screen = Screen::Hud;
        self.last_shot = None;
        info!(game_id = self.game_id, "game started");
        self.create_wave(now);
    }

    /// Award the clear bonus and move on to the next formation.
    pub fn next_stage(&mut self, now: Instant) {
        if self.session.phase != Phase::Playing {
            return;
        }
        self.audio.play(Clip::LevelUp);
        self.session.stage += 1;
        self.session.score += STAGE_CLEAR_BONUS;
        info!(stage = self.session.stage, score = self.session.score, "stage cleared");
        self.create_wave(now);
    }

    /// GameOver | Victory → Idle.
    pub fn reset(&mut self) {
        if !self.session.game_over() {
            debug!(phase = ?self.session.phase, "reset ignored");
            return;
        }
        self.stop_wave_motion();
        self.wave_motion = None;
        self.session = idle_session(&self.settings);
        self.screen = Screen::Start;
        self.last_shot = None;
        self.game_id += 1;
        self.audio.stop(Clip::Background);
        self.audio.play_looped(Clip::Background);
        info!(game_id = self.game_id, "back to start screen");
    }

    fn create_wave(&mut self, now: Instant) {
        self.stop_wave_motion();
        self.session.wave = EnemyWave::default();

        let stage = self.session.stage;
        if stage == VICTORY_STAGE {
            self.victory();
            return;
        }

        self.session.wave = build_wave(
            stage,
            self.settings.width,
            self.settings.height,
            self.settings.min_spacing_ratio,
        );
        let budget = time_budget(stage).as_secs_f32();
        self.session.time_budget = budget;
        self.session.time_left = budget;
        self.session.stage_started_at = Some(now);
        self.wave_motion = Some(Tween::yoyo(
            WAVE_DRIFT_X,
            WAVE_DRIFT_Y,
            wave_duration(stage),
            now,
        ));

        info!(
            stage,
            pattern = formation_for_stage(stage).pattern.name(),
            enemies = self.session.wave.enemies.len(),
            "wave spawned"
        );
    }

    fn stop_wave_motion(&mut self) {
        if let Some(tween) = self.wave_motion.as_mut() {
            tween.cancel();
        }
    }

    fn end_game(&mut self, reason: GameOverReason) {
        if self.session.phase != Phase::Playing {
            return;
        }
        self.session.phase = Phase::GameOver;
        self.stop_wave_motion();
        self.screen = Screen::GameOver(GameOverSummary {
            reason,
            final_score: self.session.score,
            stage: self.session.stage,
            submit_locked: false,
            highscores: None,
        });
        info!(?reason, score = self.session.score, stage = self.session.stage, "game over");
    }

    fn victory(&mut self) {
        self.session.phase = Phase::Victory;
        self.stop_wave_motion();
        self.audio.stop(Clip::Background);
        self.audio.play(Clip::Victory);
        self.screen = Screen::Victory {
            final_score: self.session.score,
        };
        info!(score = self.session.score, "victory");
    }

    // ── Per-frame update ─────────────────────────────────────────────────────

    /// One tick. Does nothing unless a game is in progress.
    pub fn update(&mut self, now: Instant) {
        if self.session.phase != Phase::Playing {
            return;
        }

        if let Some(offset) = self.wave_motion.as_ref().and_then(|t| t.sample(now)) {
            self.session.wave.offset = offset;
        }

        let elapsed = self
            .session
            .stage_started_at
            .map(|t| now.saturating_duration_since(t).as_secs_f32())
            .unwrap_or(0.0);
        self.session.time_left = remaining_time(self.session.time_budget, elapsed);

        if self.session.time_left == 0.0 {
            self.end_game(GameOverReason::TimerExpired);
            return;
        }
        if wave_reached_player(&self.session.wave, &self.session.player) {
            self.end_game(GameOverReason::WaveReachedPlayer);
            return;
        }

        self.update_bullets(now);
    }

    /// Move bullets newest-first; each kills at most one enemy.
    fn update_bullets(&mut self, now: Instant) {
        let mut i = self.session.bullets.len();
        while i > 0 {
            i -= 1;
            let moved = advance_bullet(&self.session.bullets[i]);

            if let Some(hit) = first_hit(&moved, &self.session.wave) {
                self.session.bullets.remove(i);
                self.session.wave.enemies.remove(hit);
                self.session.score += KILL_SCORE;
                self.audio.play(Clip::Explosion);
                debug!(
                    score = self.session.score,
                    left = self.session.wave.enemies.len(),
                    "enemy destroyed"
                );

                if self.session.wave.is_cleared() {
                    self.next_stage(now);
                    if self.session.phase != Phase::Playing {
                        return;
                    }
                }
                continue;
            }

            if bullet_off_screen(&moved) {
                self.session.bullets.remove(i);
            } else {
                self.session.bullets[i] = moved;
            }
        }
    }

    // ── Input ────────────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, action: InputAction, now: Instant) {
        if self.session.phase != Phase::Playing {
            return;
        }
        let player = &self.session.player;
        match action {
            InputAction::MoveLeft => self.session.player = compute::move_player_left(player),
            InputAction::MoveRight => {
                self.session.player = compute::move_player_right(player, self.settings.width)
            }
            InputAction::Fire => self.shoot(now),
        }
    }

    fn shoot(&mut self, now: Instant) {
        let cooldown = self.settings.fire_cooldown;
        if let Some(last) = self.last_shot {
            if !cooldown.is_zero() && now.saturating_duration_since(last) < cooldown {
                return;
            }
        }
        self.session.bullets.push(spawn_bullet(&self.session.player));
        self.last_shot = Some(now);
        self.audio.play(Clip::Shoot);
    }

    // ── Score submission ─────────────────────────────────────────────────────

    /// Lock the save affordance and hand back the score to persist.
    ///
    /// `None` when not on the game-over screen, when the nickname is blank,
    /// or when a save for this screen is already in flight or done.
    pub fn submit_score(&mut self, nickname: &str) -> Option<ScoreSubmission> {
        let Screen::GameOver(summary) = &mut self.screen else {
            return None;
        };
        let nickname = nickname.trim();
        if nickname.is_empty() || summary.submit_locked {
            return None;
        }
        summary.submit_locked = true;
        Some(ScoreSubmission {
            game_id: self.game_id,
            entry: HighscoreEntry {
                nickname: nickname.to_string(),
                score: self.session.score,
                stage: self.session.stage,
            },
        })
    }

    /// Feed back the store's answer for a submission.
    ///
    /// A failed save is logged and unlocks the form so the player can retry.
    pub fn finish_score_save(
        &mut self,
        game_id: u64,
        result: Result<Vec<HighscoreEntry>, StoreError>,
    ) {
        if game_id != self.game_id {
            debug!(game_id, current = self.game_id, "dropping reply for an old game");
            return;
        }
        let Screen::GameOver(summary) = &mut self.screen else {
            debug!("dropping score reply, no game-over screen");
            return;
        };
        match result {
            Ok(entries) => {
                info!(rows = entries.len(), "score saved");
                summary.highscores = Some(entries);
            }
            Err(e) => {
                error!(error = %e, "error saving score");
                summary.submit_locked = false;
            }
        }
    }
}
