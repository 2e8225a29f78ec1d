/// Stage → formation → enemy layout.
///
/// Everything here is pure: the same stage and play-field size always yield
/// the same wave, so formation visuals stay stable between runs.
use std::time::Duration;

use crate::entities::{Enemy, EnemyWave, Formation, Pattern};

/// Clearing the wave of stage 10 moves the counter here and ends the game.
pub const VICTORY_STAGE: u32 = 11;

/// Horizontal drift of the wave tween, in game units.
pub const WAVE_DRIFT_X: f32 = 100.0;
/// Vertical drift of the wave tween, in game units.
pub const WAVE_DRIFT_Y: f32 = 400.0;

const BASE_DURATION_SECS: u64 = 14;
const MIN_DURATION_SECS: u64 = 5;

/// Enemy sprite width as a share of the cell spacing.
const ENEMY_FILL: f32 = 0.7;

// ── Formation table ──────────────────────────────────────────────────────────

pub const FORMATIONS: [Formation; 8] = [
    Formation { rows: 3, cols: 4, pattern: Pattern::Grid },
    Formation { rows: 4, cols: 5, pattern: Pattern::V },
    Formation { rows: 3, cols: 8, pattern: Pattern::Triangle },
    Formation { rows: 4, cols: 8, pattern: Pattern::Diamond },
    Formation { rows: 5, cols: 7, pattern: Pattern::X },
    Formation { rows: 4, cols: 10, pattern: Pattern::Zigzag },
    Formation { rows: 5, cols: 9, pattern: Pattern::Circle },
    Formation { rows: 6, cols: 8, pattern: Pattern::Cross },
];

/// Formation for a 1-based stage, cycling after stage 8.
pub fn formation_for_stage(stage: u32) -> Formation {
    let idx = (stage.max(1) - 1) % FORMATIONS.len() as u32;
    FORMATIONS[idx as usize]
}

// ── Cell predicate ───────────────────────────────────────────────────────────

/// Whether grid cell `(row, col)` holds an enemy for `pattern`.
pub fn should_create_enemy(row: u32, col: u32, pattern: Pattern, rows: u32, cols: u32) -> bool {
    let (r, c) = (row as i64, col as i64);
    let mid_row = (rows / 2) as i64;
    let mid_col = (cols / 2) as i64;
    let half_rows = rows as f32 / 2.0;

    match pattern {
        Pattern::Grid => true,
        Pattern::V => col as f32 >= (row as f32 - half_rows).abs(),
        Pattern::Triangle => c >= r && c < cols as i64 - r,
        Pattern::Diamond => {
            let d = (r - mid_row).abs();
            c >= d && c < cols as i64 - d
        }
        Pattern::X => {
            let d = (r - mid_row).abs();
            d == (c - mid_col).abs() || d == (c - (cols as i64 - mid_col - 1)).abs()
        }
        Pattern::Zigzag => r % 2 == c % 2,
        Pattern::Circle => {
            let dr = (r - mid_row) as f32;
            let dc = (c - mid_col) as f32;
            (dr * dr + dc * dc).sqrt() <= rows.min(cols) as f32 / 2.0
        }
        Pattern::Cross => r == mid_row || c == mid_col,
    }
}

/// Extra horizontal shift applied to a whole row.
fn row_offset(pattern: Pattern, row: u32, rows: u32, spacing: f32) -> f32 {
    match pattern {
        Pattern::V | Pattern::Diamond => (row as f32 - rows as f32 / 2.0).abs() * spacing / 2.0,
        Pattern::Triangle => row as f32 * spacing / 2.0,
        _ => 0.0,
    }
}

// ── Difficulty curve ─────────────────────────────────────────────────────────

/// Cell spacing, shrinking with stage. Never below `width * min_ratio`.
pub fn enemy_spacing(stage: u32, width: f32, min_ratio: f32) -> f32 {
    let raw = width * (0.1 - stage as f32 * 0.005);
    raw.max(width * min_ratio)
}

/// Time for the wave tween to travel one way: `max(14 - (stage-1), 5)` s.
pub fn wave_duration(stage: u32) -> Duration {
    let secs = BASE_DURATION_SECS
        .saturating_sub(stage.max(1) as u64 - 1)
        .max(MIN_DURATION_SECS);
    Duration::from_secs(secs)
}

/// Stage timer: one second longer than the wave's one-way trip.
pub fn time_budget(stage: u32) -> Duration {
    wave_duration(stage) + Duration::from_secs(1)
}

// ── Wave builder ─────────────────────────────────────────────────────────────

/// Lay out the wave for `stage` in a `width × height` play field.
pub fn build_wave(stage: u32, width: f32, height: f32, min_spacing_ratio: f32) -> EnemyWave {
    let Formation { rows, cols, pattern } = formation_for_stage(stage);
    let spacing = enemy_spacing(stage, width, min_spacing_ratio);
    let start_x = (width - (cols as f32 - 1.0) * spacing) / 2.0;
    let start_y = height * 0.1;

    let mut enemies = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            if !should_create_enemy(row, col, pattern, rows, cols) {
                continue;
            }
            enemies.push(Enemy {
                x: start_x + col as f32 * spacing + row_offset(pattern, row, rows, spacing),
                y: start_y + row as f32 * spacing,
                size: spacing * ENEMY_FILL,
            });
        }
    }

    EnemyWave {
        enemies,
        offset: (0.0, 0.0),
    }
}

