use crate::calendar::{COLS, ROWS};

pub const WIDTH: u32 = 280;
pub const HEIGHT: u32 = 272;

pub const BORDER: u32 = 2;   // window frame
pub const MARGIN: u32 = 5;   // box margin
pub const SPACING: u32 = 5;  // between label and calendar
pub const LABEL_H: u32 = 28;
pub const HEADER_H: u32 = 28;
pub const WEEKDAY_H: u32 = 20;
pub const ARROW_W: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect { pub x: u32, pub y: u32, pub w: u32, pub h: u32 }

impl Rect {
    pub fn contains(&self, mx: u32, my: u32) -> bool {
        mx >= self.x && mx < self.x + self.w && my >= self.y && my < self.y + self.h
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    None,
    PrevMonth,
    NextMonth,
    PrevYear,
    NextYear,
    Day { row: usize, col: usize },
}

pub struct Layout {
    pub label: Rect,
    pub month: Rect,
    pub year: Rect,
    pub prev_month: Rect,
    pub next_month: Rect,
    pub prev_year: Rect,
    pub next_year: Rect,
    pub weekdays: Rect,
    pub grid: Rect,
    pub cell_w: u32,
    pub cell_h: u32,
}

pub fn layout(w: u32, h: u32) -> Layout {
    let inset = BORDER + MARGIN;
    let x = inset;
    let inner_w = w.saturating_sub(2 * inset);
    let bottom = h.saturating_sub(inset);

    let label = Rect { x, y: inset, w: inner_w, h: LABEL_H };
    let header_y = label.y + LABEL_H + SPACING;

    // month spinner takes the larger share, year the rest
    let month_w = inner_w * 3 / 5;
    let month = Rect { x, y: header_y, w: month_w, h: HEADER_H };
    let year = Rect { x: x + month_w, y: header_y, w: inner_w - month_w, h: HEADER_H };

    let weekdays = Rect { x, y: header_y + HEADER_H, w: inner_w, h: WEEKDAY_H };
    let grid_y = weekdays.y + WEEKDAY_H;
    let cell_w = inner_w / COLS as u32;
    let cell_h = bottom.saturating_sub(grid_y) / ROWS as u32;
    let grid = Rect { x, y: grid_y, w: cell_w * COLS as u32, h: cell_h * ROWS as u32 };

    Layout {
        label,
        month,
        year,
        prev_month: arrow(month, false),
        next_month: arrow(month, true),
        prev_year: arrow(year, false),
        next_year: arrow(year, true),
        weekdays,
        grid,
        cell_w,
        cell_h,
    }
}

fn arrow(area: Rect, trailing: bool) -> Rect {
    let w = ARROW_W.min(area.w / 2);
    let x = if trailing { area.x + area.w - w } else { area.x };
    Rect { x, y: area.y, w, h: area.h }
}

impl Layout {
    pub fn cell(&self, row: usize, col: usize) -> Rect {
        Rect {
            x: self.grid.x + col as u32 * self.cell_w,
            y: self.grid.y + row as u32 * self.cell_h,
            w: self.cell_w,
            h: self.cell_h,
        }
    }

    /// The calendar area, used for scroll-to-change-month.
    pub fn calendar(&self) -> Rect {
        Rect {
            x: self.month.x,
            y: self.month.y,
            w: self.grid.w.max(self.month.w + self.year.w),
            h: self.grid.y + self.grid.h - self.month.y,
        }
    }

    pub fn hit(&self, x: f64, y: f64) -> Hit {
        if x < 0.0 || y < 0.0 { return Hit::None; }
        let (mx, my) = (x as u32, y as u32);

        if self.prev_month.contains(mx, my) { return Hit::PrevMonth; }
        if self.next_month.contains(mx, my) { return Hit::NextMonth; }
        if self.prev_year.contains(mx, my) { return Hit::PrevYear; }
        if self.next_year.contains(mx, my) { return Hit::NextYear; }
        if self.grid.contains(mx, my) && self.cell_w > 0 && self.cell_h > 0 {
            let col = ((mx - self.grid.x) / self.cell_w) as usize;
            let row = ((my - self.grid.y) / self.cell_h) as usize;
            return Hit::Day { row, col };
        }
        Hit::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center(r: Rect) -> (f64, f64) {
        (r.x as f64 + r.w as f64 / 2.0, r.y as f64 + r.h as f64 / 2.0)
    }

    #[test]
    fn stacks_label_header_weekdays_grid() {
        let lay = layout(WIDTH, HEIGHT);
        assert_eq!(lay.label.y, BORDER + MARGIN);
        assert_eq!(lay.month.y, lay.label.y + LABEL_H + SPACING);
        assert_eq!(lay.weekdays.y, lay.month.y + HEADER_H);
        assert_eq!(lay.grid.y, lay.weekdays.y + WEEKDAY_H);
        assert!(lay.grid.y + lay.grid.h <= HEIGHT - BORDER - MARGIN);
        assert!(lay.grid.x + lay.grid.w <= WIDTH - BORDER - MARGIN);
        assert!(lay.cell_h >= 20);
    }

    #[test]
    fn arrows_sit_at_spinner_ends() {
        let lay = layout(WIDTH, HEIGHT);
        assert_eq!(lay.prev_month.x, lay.month.x);
        assert_eq!(lay.next_month.x + lay.next_month.w, lay.month.x + lay.month.w);
        assert_eq!(lay.prev_year.x, lay.year.x);
        assert_eq!(lay.next_year.x + lay.next_year.w, lay.year.x + lay.year.w);
    }

    #[test]
    fn hit_header_arrows() {
        let lay = layout(WIDTH, HEIGHT);
        let (x, y) = center(lay.prev_month);
        assert_eq!(lay.hit(x, y), Hit::PrevMonth);
        let (x, y) = center(lay.next_month);
        assert_eq!(lay.hit(x, y), Hit::NextMonth);
        let (x, y) = center(lay.prev_year);
        assert_eq!(lay.hit(x, y), Hit::PrevYear);
        let (x, y) = center(lay.next_year);
        assert_eq!(lay.hit(x, y), Hit::NextYear);
        // month title between the arrows is inert
        let (x, y) = center(lay.month);
        assert_eq!(lay.hit(x, y), Hit::None);
    }

    #[test]
    fn hit_grid_cells() {
        let lay = layout(WIDTH, HEIGHT);
        for (row, col) in [(0, 0), (2, 3), (5, 6)] {
            let (x, y) = center(lay.cell(row, col));
            assert_eq!(lay.hit(x, y), Hit::Day { row, col });
        }
    }

    #[test]
    fn hit_outside_targets() {
        let lay = layout(WIDTH, HEIGHT);
        let (x, y) = center(lay.label);
        assert_eq!(lay.hit(x, y), Hit::None);
        let (x, y) = center(lay.weekdays);
        assert_eq!(lay.hit(x, y), Hit::None);
        assert_eq!(lay.hit(-1.0, 10.0), Hit::None);
        assert_eq!(lay.hit(WIDTH as f64 + 5.0, HEIGHT as f64 + 5.0), Hit::None);
    }

    #[test]
    fn degenerate_size_does_not_panic() {
        let lay = layout(4, 4);
        assert_eq!(lay.hit(1.0, 1.0), Hit::None);
    }
}
