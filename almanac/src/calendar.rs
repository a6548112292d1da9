use chrono::{Datelike, Duration, Months, NaiveDate};

pub const ROWS: usize = 6;
pub const COLS: usize = 7;

pub const WEEKDAYS: [&str; COLS] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub date: NaiveDate,
    pub in_month: bool,
}

/// Month view with a selected day. The displayed month is always the month
/// of the selection.
pub struct Calendar {
    selected: NaiveDate,
    today: NaiveDate,
}

impl Calendar {
    pub fn new(today: NaiveDate) -> Self {
        Self { selected: today, today }
    }

    pub fn selected(&self) -> NaiveDate { self.selected }
    pub fn today(&self) -> NaiveDate { self.today }
    pub fn year(&self) -> i32 { self.selected.year() }

    pub fn month_name(&self) -> String {
        self.selected.format("%B").to_string()
    }

    /// Selects `date` without moving the today marker.
    pub fn set_date(&mut self, date: NaiveDate) {
        self.selected = date;
    }

    /// Moves the today marker and selects it.
    pub fn show_today(&mut self, today: NaiveDate) {
        self.today = today;
        self.set_date(today);
    }

    pub fn prev_month(&mut self) { self.shift(-1); }
    pub fn next_month(&mut self) { self.shift(1); }
    pub fn prev_year(&mut self) { self.shift(-12); }
    pub fn next_year(&mut self) { self.shift(12); }

    // chrono clamps the day to the target month's length
    fn shift(&mut self, months: i32) {
        let m = Months::new(months.unsigned_abs());
        let shifted = if months < 0 {
            self.selected.checked_sub_months(m)
        } else {
            self.selected.checked_add_months(m)
        };
        if let Some(d) = shifted {
            self.selected = d;
        }
    }

    /// Selecting a leading/trailing day moves the view to its month.
    pub fn select_cell(&mut self, row: usize, col: usize) {
        if row < ROWS && col < COLS {
            self.selected = self.cells()[row * COLS + col].date;
        }
    }

    pub fn cells(&self) -> [Cell; ROWS * COLS] {
        let first = self.selected - Duration::days(self.selected.day0() as i64);
        let lead = first.weekday().num_days_from_sunday() as i64;
        let start = first - Duration::days(lead);
        std::array::from_fn(|i| {
            let date = start + Duration::days(i as i64);
            Cell { date, in_month: date.month() == first.month() && date.year() == first.year() }
        })
    }
}
