/// Largest zoom factor reached at the far end of the slider.
const MAX_ZOOM_FACTOR: f64 = 5.0;
const HEADROOM_PERCENT: u64 = 105;

/// Y-axis ceiling for an unzoomed chart, 5% above the peak rounded up.
pub fn nice_y_max(max_count: u64) -> u64 {
    (max_count * HEADROOM_PERCENT).div_ceil(100)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Zoom {
    max_count: u64,
    position: f64,
}

impl Zoom {
    pub fn new(max_count: u64) -> Self {
        Self {
            max_count,
            position: 0.0,
        }
    }

    #[cfg(test)]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Moves the slider handle; positions outside [0, 1] are clamped.
    pub fn set_position(&mut self, position: f64) {
        self.position = if position.is_nan() {
            0.0
        } else {
            position.clamp(0.0, 1.0)
        };
    }

    pub fn factor(&self) -> f64 {
        1.0 + self.position * (MAX_ZOOM_FACTOR - 1.0)
    }

    pub fn y_max(&self) -> f64 {
        (self.max_count as f64 / self.factor()).max(1.0)
    }

    pub fn label(&self) -> String {
        let effective = self.max_count as f64 / self.y_max();
        let effective = if effective > 0.0 { effective } else { 1.0 };
        format!("{effective:.1}x")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_fully_zoomed_out() {
        let zoom = Zoom::new(400);
        assert_eq!(zoom.factor(), 1.0);
        assert_eq!(zoom.y_max(), 400.0);
        assert_eq!(zoom.label(), "1.0x");
    }

    #[test]
    fn slider_end_zooms_five_times() {
        let mut zoom = Zoom::new(400);
        zoom.set_position(1.0);
        assert_eq!(zoom.y_max(), 80.0);
        assert_eq!(zoom.label(), "5.0x");

        zoom.set_position(0.5);
        assert_eq!(zoom.factor(), 3.0);
    }

    #[test]
    fn position_is_clamped() {
        let mut zoom = Zoom::new(10);
        zoom.set_position(3.0);
        assert_eq!(zoom.position(), 1.0);
        zoom.set_position(-1.0);
        assert_eq!(zoom.position(), 0.0);
    }

    #[test]
    fn y_max_never_drops_below_one() {
        let mut zoom = Zoom::new(2);
        zoom.set_position(1.0);
        assert_eq!(zoom.y_max(), 1.0);
        assert_eq!(zoom.label(), "2.0x");
        assert_eq!(Zoom::new(0).label(), "1.0x");
    }

    #[test]
    fn headroom_rounds_up() {
        assert_eq!(nice_y_max(100), 105);
        assert_eq!(nice_y_max(7), 8);
        assert_eq!(nice_y_max(0), 0);
    }
}
