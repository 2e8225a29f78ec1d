/// Rendering layer. All terminal I/O lives here.
///
/// Each function receives a mutable writer and an immutable view of the
/// game. No game logic is performed; this module only maps game units onto
/// terminal cells and translates state into terminal commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use rand::Rng;
use wave_shooter::compute::{bullet_bounds, TimerColor};
use wave_shooter::entities::{Phase, Rect};
use wave_shooter::game::{GameOverSummary, GameState, Screen};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_PLAYER: Color = Color::White;
const C_ENEMY: Color = Color::Green;
const C_BULLET: Color = Color::Cyan;
const C_STAR: Color = Color::DarkGrey;
const C_HINT: Color = Color::DarkGrey;
const C_BUTTON: Color = Color::Green;
const C_TITLE_GAME_OVER: Color = Color::Red;
const C_TITLE_VICTORY: Color = Color::Green;
const C_TABLE_TITLE: Color = Color::Yellow;

/// Cells of the timer bar on the HUD row.
const TIMER_BAR_CELLS: usize = 10;

// ── Viewport ──────────────────────────────────────────────────────────────────

/// Maps the logical play field onto the bordered terminal area.
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
    width: f32,
    height: f32,
}

impl Viewport {
    pub fn new(cols: u16, rows: u16, width: f32, height: f32) -> Self {
        Self { cols, rows, width, height }
    }

    fn inner_cols(&self) -> f32 {
        self.cols.saturating_sub(2).max(1) as f32
    }

    /// Rows 2 ..= rows-3 are inside the border.
    fn inner_rows(&self) -> f32 {
        self.rows.saturating_sub(4).max(1) as f32
    }

    /// Cell for a game-space point, or `None` outside the field.
    fn cell(&self, x: f32, y: f32) -> Option<(u16, u16)> {
        if x < 0.0 || y < 0.0 || x > self.width || y >= self.height {
            return None;
        }
        let col = 1.0 + (x / self.width * self.inner_cols()).min(self.inner_cols() - 1.0);
        let row = 2.0 + (y / self.height * self.inner_rows()).min(self.inner_rows() - 1.0);
        Some((col as u16, row as u16))
    }

    fn rect_cells(&self, r: &Rect) -> Option<(u16, u16, u16)> {
        let (left, row) = self.cell(r.x.max(0.0), r.y + r.h / 2.0)?;
        let (right, _) = self.cell((r.x + r.w).min(self.width), r.y + r.h / 2.0)?;
        Some((left, right.max(left), row))
    }
}

// ── Starfield ─────────────────────────────────────────────────────────────────

/// Static backdrop, scattered once at startup.
pub struct Starfield {
    stars: Vec<(f32, f32)>,
}

impl Starfield {
    pub fn new(rng: &mut impl Rng, count: usize, width: f32, height: f32) -> Self {
        let stars = (0..count)
            .map(|_| (rng.gen_range(0.0..width), rng.gen_range(0.0..height)))
            .collect();
        Self { stars }
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame. `nickname` is the text typed on the
/// game-over screen.
pub fn render<W: Write>(
    out: &mut W,
    game: &GameState,
    view: &Viewport,
    stars: &Starfield,
    nickname: &str,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, view)?;
    draw_stars(out, view, stars)?;

    match game.screen() {
        Screen::Start => draw_start(out, view)?,
        Screen::Hud => {
            draw_hud(out, game, view)?;
            draw_entities(out, game, view)?;
        }
        Screen::GameOver(summary) => {
            draw_hud(out, game, view)?;
            draw_entities(out, game, view)?;
            draw_game_over(out, view, summary, nickname)?;
        }
        Screen::Victory { final_score } => draw_victory(out, view, *final_score)?,
    }

    draw_controls_hint(out, game.phase(), view)?;

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, view.rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border & backdrop ─────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    let w = view.cols as usize;
    let h = view.rows;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(view.cols.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

fn draw_stars<W: Write>(out: &mut W, view: &Viewport, stars: &Starfield) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_STAR))?;
    for &(x, y) in &stars.stars {
        if let Some((col, row)) = view.cell(x, y) {
            out.queue(cursor::MoveTo(col, row))?;
            out.queue(Print("·"))?;
        }
    }
    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, game: &GameState, view: &Viewport) -> std::io::Result<()> {
    let hud = game.hud();

    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(&hud.score_text))?;

    // Timer bar stands in for the radial progress ring
    let filled = if hud.show_arc {
        ((hud.progress * TIMER_BAR_CELLS as f32).ceil() as usize).min(TIMER_BAR_CELLS)
    } else {
        0
    };
    let bar = format!(
        "[{}{}] {:>2}",
        "█".repeat(filled),
        "░".repeat(TIMER_BAR_CELLS - filled),
        hud.timer_text
    );
    let color = match hud.timer_color {
        TimerColor::Green => Color::Green,
        TimerColor::Red => Color::Red,
    };
    let x = view.cols.saturating_sub(bar.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(x, 0))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(bar))?;

    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn draw_entities<W: Write>(out: &mut W, game: &GameState, view: &Viewport) -> std::io::Result<()> {
    let session = game.session();

    out.queue(style::SetForegroundColor(C_ENEMY))?;
    for enemy in &session.wave.enemies {
        let bounds = enemy.bounds_at(session.wave.offset);
        if let Some((left, right, row)) = view.rect_cells(&bounds) {
            let sprite = if right > left + 1 { "«▼»" } else { "▼" };
            let half = sprite.chars().count() as u16 / 2;
            let col = ((left + right) / 2).saturating_sub(half).max(1);
            out.queue(cursor::MoveTo(col, row))?;
            out.queue(Print(sprite))?;
        }
    }

    out.queue(style::SetForegroundColor(C_BULLET))?;
    for bullet in &session.bullets {
        let b = bullet_bounds(bullet);
        if let Some((col, row)) = view.cell(bullet.x, b.y + b.h / 2.0) {
            out.queue(cursor::MoveTo(col, row))?;
            out.queue(Print("║"))?;
        }
    }

    // Ship sprite (2 rows, 3 cols):
    //   ▲
    //  /█\
    let p = &session.player;
    if let Some((col, row)) = view.cell(p.x, p.y) {
        out.queue(style::SetForegroundColor(C_PLAYER))?;
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(Print("▲"))?;
        if row + 1 < view.rows.saturating_sub(2) {
            out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row + 1))?;
            out.queue(Print("/█\\"))?;
        }
    }

    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

fn centered<W: Write>(
    out: &mut W,
    view: &Viewport,
    row: u16,
    text: &str,
    color: Color,
) -> std::io::Result<()> {
    let col = (view.cols / 2).saturating_sub(text.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(text))?;
    Ok(())
}

fn draw_start<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    let cy = view.rows / 2;
    centered(out, view, cy.saturating_sub(3), "★  WAVE  SHOOTER  ★", Color::Cyan)?;
    centered(out, view, cy.saturating_sub(1), "╔══════════════╗", C_BUTTON)?;
    centered(out, view, cy, "║  Start Game  ║", C_BUTTON)?;
    centered(out, view, cy + 1, "╚══════════════╝", C_BUTTON)?;
    centered(out, view, cy + 3, "press ENTER", C_HINT)?;
    Ok(())
}

fn draw_game_over<W: Write>(
    out: &mut W,
    view: &Viewport,
    summary: &GameOverSummary,
    nickname: &str,
) -> std::io::Result<()> {
    let mut row = (view.rows / 2).saturating_sub(8);

    centered(out, view, row, "╔════════════════════╗", C_TITLE_GAME_OVER)?;
    centered(out, view, row + 1, "║     GAME  OVER     ║", C_TITLE_GAME_OVER)?;
    centered(out, view, row + 2, "╚════════════════════╝", C_TITLE_GAME_OVER)?;
    row += 4;

    centered(out, view, row, &format!("Final Score: {}", summary.final_score), Color::White)?;
    centered(out, view, row + 1, &format!("Stage: {}", summary.stage), Color::White)?;
    row += 3;

    if summary.can_submit() {
        centered(out, view, row, "Enter Your Nickname:", Color::White)?;
        centered(out, view, row + 1, &format!("[ {:<16} ]", nickname), Color::Yellow)?;
        centered(out, view, row + 2, "ENTER - Save Score", C_BUTTON)?;
        row += 4;
    }

    if let Some(table) = &summary.highscores {
        centered(out, view, row, "HIGH SCORES", C_TABLE_TITLE)?;
        for (i, entry) in table.iter().enumerate() {
            let line = format!("{}. {} - {}", i + 1, entry.nickname, entry.score);
            centered(out, view, row + 1 + i as u16, &line, Color::White)?;
        }
        row += table.len() as u16 + 2;
    }

    centered(out, view, row, "TAB - Try Again", Color::Blue)?;
    Ok(())
}

fn draw_victory<W: Write>(out: &mut W, view: &Viewport, final_score: u32) -> std::io::Result<()> {
    let cy = view.rows / 2;
    centered(out, view, cy.saturating_sub(2), "VICTORY!", C_TITLE_VICTORY)?;
    centered(out, view, cy, &format!("Final Score: {final_score}"), C_TITLE_VICTORY)?;
    centered(out, view, cy + 2, "ENTER - Play Again", C_BUTTON)?;
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, phase: Phase, view: &Viewport) -> std::io::Result<()> {
    let hint = match phase {
        Phase::Idle => "ENTER : Start   Q : Quit",
        Phase::Playing => "← → / A D : Move   SPACE : Shoot   Q : Quit",
        Phase::GameOver => "type nickname   ENTER : Save   TAB : Try Again   ESC : Quit",
        Phase::Victory => "ENTER / R : Play Again   Q : Quit",
    };
    out.queue(cursor::MoveTo(1, view.rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(hint))?;
    Ok(())
}
