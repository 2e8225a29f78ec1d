/// All game entity types: pure data, no logic.
use std::time::Instant;

use serde::{Deserialize, Serialize};

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Start screen shown, no update loop.
    Idle,
    Playing,
    GameOver,
    Victory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOverReason {
    TimerExpired,
    WaveReachedPlayer,
}

// ── Formations ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pattern {
    Grid,
    V,
    Triangle,
    Diamond,
    X,
    Zigzag,
    Circle,
    Cross,
}

impl Pattern {
    pub fn name(&self) -> &'static str {
        match self {
            Pattern::Grid => "grid",
            Pattern::V => "v",
            Pattern::Triangle => "triangle",
            Pattern::Diamond => "diamond",
            Pattern::X => "x",
            Pattern::Zigzag => "zigzag",
            Pattern::Circle => "circle",
            Pattern::Cross => "cross",
        }
    }
}

/// Grid template for one stage's wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Formation {
    pub rows: u32,
    pub cols: u32,
    pub pattern: Pattern,
}

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Axis-aligned bounding box, top-left origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    /// Box of side `size` centred on `(cx, cy)`.
    pub fn centered(cx: f32, cy: f32, size: f32) -> Self {
        Rect {
            x: cx - size / 2.0,
            y: cy - size / 2.0,
            w: size,
            h: size,
        }
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

// ── Player, enemies, bullets ──────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    /// Side of the (square) ship sprite.
    pub size: f32,
}

impl Player {
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.x, self.y, self.size)
    }
}

/// One formation slot. Position is relative to the wave origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl Enemy {
    /// World-space bounds given the wave's current tween offset.
    pub fn bounds_at(&self, offset: (f32, f32)) -> Rect {
        Rect::centered(self.x + offset.0, self.y + offset.1, self.size)
    }
}

/// The enemies of the current stage, moving as one group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnemyWave {
    pub enemies: Vec<Enemy>,
    /// Displacement applied by the wave tween.
    pub offset: (f32, f32),
}

impl EnemyWave {
    pub fn is_cleared(&self) -> bool {
        self.enemies.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
}

// ── Scores ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighscoreEntry {
    pub nickname: String,
    pub score: u32,
    pub stage: u32,
}

// ── Master session state ──────────────────────────────────────────────────────

/// Everything that changes while a game is being played.
#[derive(Clone, Debug)]
pub struct Session {
    pub phase: Phase,
    pub stage: u32,
    pub score: u32,
    /// Seconds remaining on the stage timer.
    pub time_left: f32,
    /// Seconds the current stage started with.
    pub time_budget: f32,
    pub stage_started_at: Option<Instant>,
    pub player: Player,
    pub wave: EnemyWave,
    pub bullets: Vec<Bullet>,
}

impl Session {
    /// Any phase past the start screen, including the end screens.
    pub fn running(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn game_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver | Phase::Victory)
    }
}
