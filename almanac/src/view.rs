use cosmic_text::Weight;
use tiny_skia::Pixmap;

use crate::calendar::{COLS, Calendar, ROWS, WEEKDAYS};
use crate::config::Colors;
use crate::draw::{Text, alpha_color, fill_rect, fill_rect_alpha, stroke_rect};
use crate::layout::{BORDER, Hit, Layout, Rect};

const HOVER_ALPHA: u8 = 0x40;
const ARROW_IDLE: f32 = 0.7;
const CELL_INSET: u32 = 2;

pub struct Style {
    pub colors: Colors,
    pub label_size: f32,
    pub day_size: f32,
}

/// Paints the whole widget: frame, clock label, month header, weekday row
/// and day grid.
pub fn paint(
    pixmap: &mut Pixmap, text: &mut Text, style: &Style, lay: &Layout,
    label: &str, calendar: &Calendar, hover: Hit,
) {
    let c = &style.colors;
    let (pw, ph) = (pixmap.width(), pixmap.height());
    pixmap.fill(tiny_skia::Color::TRANSPARENT);

    let frame = Rect { x: 0, y: 0, w: pw, h: ph };
    fill_rect_alpha(pixmap.data_mut(), pw, ph, frame, c.background, c.background_alpha);
    stroke_rect(pixmap.data_mut(), pw, ph, frame, BORDER, c.border);

    text.render_centered(pixmap, label, lay.label, style.label_size, c.text, Weight::BOLD);

    // --- Header ---
    let arrows = [
        (lay.prev_month, "\u{2039}", Hit::PrevMonth),
        (lay.next_month, "\u{203a}", Hit::NextMonth),
        (lay.prev_year, "\u{2039}", Hit::PrevYear),
        (lay.next_year, "\u{203a}", Hit::NextYear),
    ];
    for (area, glyph, target) in arrows {
        let color = if hover == target { c.accent } else { alpha_color(c.text, ARROW_IDLE) };
        text.render_centered(pixmap, glyph, area, style.day_size * 1.2, color, Weight::BOLD);
    }
    let title = between(lay.month, lay.prev_month, lay.next_month);
    text.render_centered(pixmap, &calendar.month_name(), title, style.day_size, c.text, Weight::BOLD);
    let year = between(lay.year, lay.prev_year, lay.next_year);
    text.render_centered(pixmap, &calendar.year().to_string(), year, style.day_size, c.text, Weight::BOLD);

    // --- Weekdays ---
    for (col, name) in WEEKDAYS.iter().enumerate() {
        let area = Rect { x: lay.grid.x + col as u32 * lay.cell_w, w: lay.cell_w, ..lay.weekdays };
        text.render_centered(pixmap, name, area, style.day_size * 0.8, c.dim, Weight::NORMAL);
    }

    // --- Days ---
    let selected = calendar.selected();
    let today = calendar.today();
    let cells = calendar.cells();
    for row in 0..ROWS {
        for col in 0..COLS {
            let cell = cells[row * COLS + col];
            let area = lay.cell(row, col);
            let inner = inset(area, CELL_INSET);

            let mut color = if cell.in_month { c.text } else { c.dim };
            if cell.date == selected {
                fill_rect(pixmap.data_mut(), pw, ph, inner, c.accent);
                color = c.background;
            } else if hover == (Hit::Day { row, col }) {
                fill_rect_alpha(pixmap.data_mut(), pw, ph, inner, c.accent, HOVER_ALPHA);
            }
            if cell.date == today {
                stroke_rect(pixmap.data_mut(), pw, ph, inner, 1, c.today);
            }

            let weight = if cell.date == today { Weight::BOLD } else { Weight::NORMAL };
            let day = chrono::Datelike::day(&cell.date).to_string();
            text.render_centered(pixmap, &day, area, style.day_size, color, weight);
        }
    }
}

fn between(area: Rect, lead: Rect, trail: Rect) -> Rect {
    let x = lead.x + lead.w;
    Rect { x, w: trail.x.saturating_sub(x), ..area }
}

fn inset(r: Rect, by: u32) -> Rect {
    let by = by.min(r.w / 2).min(r.h / 2);
    Rect { x: r.x + by, y: r.y + by, w: r.w - 2 * by, h: r.h - 2 * by }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{HEIGHT, WIDTH, layout};

    #[test]
    fn title_fits_between_arrows() {
        let lay = layout(WIDTH, HEIGHT);
        let title = between(lay.month, lay.prev_month, lay.next_month);
        assert_eq!(title.x, lay.prev_month.x + lay.prev_month.w);
        assert_eq!(title.x + title.w, lay.next_month.x);
        assert_eq!(title.y, lay.month.y);
    }

    #[test]
    fn inset_never_underflows() {
        assert_eq!(inset(Rect { x: 0, y: 0, w: 10, h: 10 }, 2), Rect { x: 2, y: 2, w: 6, h: 6 });
        assert_eq!(inset(Rect { x: 5, y: 5, w: 3, h: 1 }, 2), Rect { x: 5, y: 5, w: 3, h: 1 });
    }
}
