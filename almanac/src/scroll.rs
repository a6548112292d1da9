use smithay_client_toolkit::seat::pointer::AxisScroll;

/// One logical wheel notch in `value120` units.
const WHEEL_NOTCH: i32 = 120;
/// Continuous (touchpad) scroll distance per month.
const CONTINUOUS_STEP: f64 = 10.0;

/// Turns vertical axis events into whole month steps. Wheels step once per
/// notch; continuous sources accumulate distance.
#[derive(Debug, Default)]
pub struct ScrollSteps {
    value120: i32,
    continuous: f64,
}

impl ScrollSteps {
    /// Positive steps scroll forward in time.
    pub fn feed(&mut self, axis: &AxisScroll) -> i32 {
        if axis.value120 != 0 {
            self.continuous = 0.0;
            self.value120 += axis.value120;
            let steps = self.value120 / WHEEL_NOTCH;
            self.value120 -= steps * WHEEL_NOTCH;
            return steps;
        }
        if axis.discrete != 0 {
            self.reset();
            return axis.discrete;
        }

        self.continuous += axis.absolute;
        let steps = (self.continuous / CONTINUOUS_STEP).trunc();
        self.continuous -= steps * CONTINUOUS_STEP;
        if axis.stop {
            self.continuous = 0.0;
        }
        steps as i32
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
