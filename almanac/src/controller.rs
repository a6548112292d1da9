#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Unborn,
    Visible,
    Hidden,
}

/// What the app has to do for one activation. `Present` and `Hide` also
/// reset the calendar to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Construct,
    Present,
    Hide,
}

/// Side effects of an activation, implemented by the app over Wayland.
pub trait Effects {
    fn construct(&mut self);
    fn show_today(&mut self);
    fn show(&mut self);
    fn hide(&mut self);
}

impl Activation {
    pub fn apply(self, fx: &mut impl Effects) {
        match self {
            Activation::Construct => fx.construct(),
            Activation::Present => {
                fx.show_today();
                fx.show();
            }
            Activation::Hide => {
                fx.show_today();
                fx.hide();
            }
        }
    }
}

impl WindowState {
    pub fn activate(self, layer_shell: bool) -> (WindowState, Activation) {
        match self {
            WindowState::Unborn => (WindowState::Visible, Activation::Construct),
            _ if !layer_shell => (WindowState::Visible, Activation::Present),
            WindowState::Visible => (WindowState::Hidden, Activation::Hide),
            WindowState::Hidden => (WindowState::Visible, Activation::Present),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Calendar;
    use chrono::NaiveDate;

    fn trace(layer_shell: bool, n: usize) -> Vec<(WindowState, Activation)> {
        let mut state = WindowState::Unborn;
        (0..n).map(|_| {
            let step = state.activate(layer_shell);
            state = step.0;
            step
        }).collect()
    }

    #[test]
    fn layer_shell_alternates_after_construction() {
        use WindowState::*;
        let states: Vec<_> = trace(true, 5).into_iter().map(|(s, _)| s).collect();
        assert_eq!(states, [Visible, Hidden, Visible, Hidden, Visible]);
    }

    #[test]
    fn without_layer_shell_stays_visible() {
        let steps = trace(false, 4);
        assert_eq!(steps[0], (WindowState::Visible, Activation::Construct));
        for step in &steps[1..] {
            assert_eq!(*step, (WindowState::Visible, Activation::Present));
        }
        assert_eq!(WindowState::Hidden.activate(false), (WindowState::Visible, Activation::Present));
    }

    #[test]
    fn constructs_exactly_once() {
        for layer_shell in [true, false] {
            let built = trace(layer_shell, 10).iter()
                .filter(|(_, a)| *a == Activation::Construct)
                .count();
            assert_eq!(built, 1);
        }
    }

    /// Records effects and keeps a calendar the way the app does.
    struct Recorder {
        log: Vec<&'static str>,
        calendar: Option<Calendar>,
        today: NaiveDate,
    }

    impl Effects for Recorder {
        fn construct(&mut self) {
            self.log.push("construct");
            self.calendar = Some(Calendar::new(self.today));
        }
        fn show_today(&mut self) {
            self.log.push("today");
            if let Some(cal) = self.calendar.as_mut() {
                cal.show_today(self.today);
            }
        }
        fn show(&mut self) { self.log.push("show"); }
        fn hide(&mut self) { self.log.push("hide"); }
    }

    fn activate(state: &mut WindowState, layer_shell: bool, fx: &mut Recorder) {
        let (next, action) = state.activate(layer_shell);
        *state = next;
        action.apply(fx);
    }

    #[test]
    fn present_and_hide_reset_calendar_to_today() {
        let day = |d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
        let mut fx = Recorder { log: Vec::new(), calendar: None, today: day(14) };
        let mut state = WindowState::Unborn;

        activate(&mut state, true, &mut fx);
        fx.calendar.as_mut().unwrap().next_year();

        fx.today = day(15);
        activate(&mut state, true, &mut fx);
        assert_eq!(state, WindowState::Hidden);
        assert_eq!(fx.calendar.as_ref().unwrap().selected(), day(15));

        fx.calendar.as_mut().unwrap().prev_month();
        fx.today = day(16);
        activate(&mut state, true, &mut fx);
        let cal = fx.calendar.as_ref().unwrap();
        assert_eq!((cal.selected(), cal.today()), (day(16), day(16)));

        assert_eq!(fx.log, ["construct", "today", "hide", "today", "show"]);
    }

    #[test]
    fn construct_skips_calendar_reset() {
        let mut fx = Recorder {
            log: Vec::new(),
            calendar: None,
            today: NaiveDate::from_ymd_opt(2025, 1, 14).unwrap(),
        };
        Activation::Construct.apply(&mut fx);
        Activation::Present.apply(&mut fx);
        assert_eq!(fx.log, ["construct", "today", "show"]);
    }

    #[test]
    fn toggle_actions() {
        assert_eq!(WindowState::Visible.activate(true), (WindowState::Hidden, Activation::Hide));
        assert_eq!(WindowState::Hidden.activate(true), (WindowState::Visible, Activation::Present));
    }
}
