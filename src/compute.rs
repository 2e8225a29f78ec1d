/// Pure game-logic functions.
///
/// Every public function takes immutable inputs and returns a fresh value.
/// `GameState` strings them together; nothing here touches the clock, the
/// audio queue or the score store.
use crate::entities::{Bullet, EnemyWave, Player, Rect, Session};

// ── Tuning ───────────────────────────────────────────────────────────────────

/// Horizontal distance per move input.
pub const PLAYER_STEP: f32 = 10.0;
/// Ship width as a share of the play-field width.
pub const PLAYER_SIZE_RATIO: f32 = 0.1;
/// Upward travel per tick.
pub const BULLET_SPEED: f32 = 7.0;
pub const BULLET_SIZE: f32 = 8.0;

pub const KILL_SCORE: u32 = 100;
pub const STAGE_CLEAR_BONUS: u32 = 1000;

/// Below this share of the stage timer the HUD ring turns red.
pub const LOW_TIME_FRACTION: f32 = 0.3;

// ── Constructors ─────────────────────────────────────────────────────────────

/// Ship centred horizontally, 10% above the bottom edge.
pub fn spawn_player(width: f32, height: f32) -> Player {
    Player {
        x: width * 0.5,
        y: height - height * 0.1,
        size: width * PLAYER_SIZE_RATIO,
    }
}

/// Bullet leaving the nose of the ship.
pub fn spawn_bullet(player: &Player) -> Bullet {
    Bullet {
        x: player.x,
        y: player.y - player.size / 2.0,
    }
}

// ── Input-driven transitions ─────────────────────────────────────────────────

pub fn move_player_left(player: &Player) -> Player {
    Player {
        x: (player.x - PLAYER_STEP).max(0.0),
        ..player.clone()
    }
}

pub fn move_player_right(player: &Player, width: f32) -> Player {
    Player {
        x: (player.x + PLAYER_STEP).min(width),
        ..player.clone()
    }
}

// ── Per-tick helpers ─────────────────────────────────────────────────────────

pub fn advance_bullet(bullet: &Bullet) -> Bullet {
    Bullet {
        y: bullet.y - BULLET_SPEED,
        ..bullet.clone()
    }
}

pub fn bullet_bounds(bullet: &Bullet) -> Rect {
    Rect::centered(bullet.x, bullet.y, BULLET_SIZE)
}

/// True once the bullet has left through the top edge.
pub fn bullet_off_screen(bullet: &Bullet) -> bool {
    bullet.y < -BULLET_SIZE
}

/// Axis-aligned rectangle overlap. Touching edges do not count.
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

/// Index of the enemy `bullet` hits, searching newest-first.
pub fn first_hit(bullet: &Bullet, wave: &EnemyWave) -> Option<usize> {
    let bb = bullet_bounds(bullet);
    wave.enemies
        .iter()
        .rposition(|enemy| overlaps(&bb, &enemy.bounds_at(wave.offset)))
}

/// Any enemy's lower edge at or past the ship's upper edge.
pub fn wave_reached_player(wave: &EnemyWave, player: &Player) -> bool {
    let top = player.bounds().top();
    wave.enemies
        .iter()
        .any(|enemy| enemy.bounds_at(wave.offset).bottom() >= top)
}

/// Seconds left on a `budget`-second timer after `elapsed` seconds, floored at 0.
pub fn remaining_time(budget: f32, elapsed: f32) -> f32 {
    (budget - elapsed).max(0.0)
}

// ── HUD derivation ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerColor {
    Green,
    Red,
}

/// Everything the heads-up display shows, derived from the session.
#[derive(Clone, Debug, PartialEq)]
pub struct Hud {
    /// "Stage: N | Score: S"
    pub score_text: String,
    /// Whole seconds left, rounded up.
    pub timer_text: String,
    /// Remaining share of the stage timer, 0.0 ..= 1.0.
    pub progress: f32,
    pub timer_color: TimerColor,
    /// Arc drawn only while time remains.
    pub show_arc: bool,
}

pub fn hud(session: &Session) -> Hud {
    let progress = if session.time_budget > 0.0 {
        (session.time_left / session.time_budget).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let timer_color = if progress < LOW_TIME_FRACTION {
        TimerColor::Red
    } else {
        TimerColor::Green
    };
    Hud {
        score_text: format!("Stage: {} | Score: {}", session.stage, session.score),
        timer_text: format!("{}", session.time_left.ceil() as u32),
        progress,
        timer_color,
        show_arc: progress > 0.0,
    }
}
