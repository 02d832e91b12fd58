// Rotation servo position math.
//
// The rotation servo travels linearly across its calibrated 0–270° range,
// so step distance is the absolute difference between stops, NOT the
// circular distance: 0° -> 270° crosses the full travel, three steps.

use std::time::Duration;

/// Discrete stops of the rotation servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationAngle {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl RotationAngle {
    pub const ALL: [RotationAngle; 4] = [
        RotationAngle::Deg0,
        RotationAngle::Deg90,
        RotationAngle::Deg180,
        RotationAngle::Deg270,
    ];

    /// Accepts exactly the four calibrated stops; anything else is not a
    /// position this rig can hold.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees {
            0 => Some(RotationAngle::Deg0),
            90 => Some(RotationAngle::Deg90),
            180 => Some(RotationAngle::Deg180),
            270 => Some(RotationAngle::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            RotationAngle::Deg0 => 0,
            RotationAngle::Deg90 => 90,
            RotationAngle::Deg180 => 180,
            RotationAngle::Deg270 => 270,
        }
    }

    /// Index into the calibrated stop table.
    pub fn index(self) -> usize {
        (self.degrees() / 90) as usize
    }

    /// 90° steps the servo physically travels to reach `target`.
    pub fn steps_to(self, target: RotationAngle) -> u32 {
        (i32::from(self.degrees()) - i32::from(target.degrees())).unsigned_abs() / 90
    }

    /// Next stop to the left; from 0° this wraps to 270°, a full reverse
    /// sweep of the travel.
    pub fn left(self) -> Self {
        match self {
            RotationAngle::Deg0 => RotationAngle::Deg270,
            RotationAngle::Deg90 => RotationAngle::Deg0,
            RotationAngle::Deg180 => RotationAngle::Deg90,
            RotationAngle::Deg270 => RotationAngle::Deg180,
        }
    }

    /// Next stop to the right; from 270° this wraps to 0°.
    pub fn right(self) -> Self {
        match self {
            RotationAngle::Deg0 => RotationAngle::Deg90,
            RotationAngle::Deg90 => RotationAngle::Deg180,
            RotationAngle::Deg180 => RotationAngle::Deg270,
            RotationAngle::Deg270 => RotationAngle::Deg0,
        }
    }
}

/// Settle wait for a rotation of `steps` 90° increments.
pub fn rotation_settle(steps: u32, step_settle: Duration) -> Duration {
    step_settle * steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_four_stops_parse() {
        assert_eq!(RotationAngle::from_degrees(0), Some(RotationAngle::Deg0));
        assert_eq!(RotationAngle::from_degrees(90), Some(RotationAngle::Deg90));
        assert_eq!(RotationAngle::from_degrees(180), Some(RotationAngle::Deg180));
        assert_eq!(RotationAngle::from_degrees(270), Some(RotationAngle::Deg270));

        assert_eq!(RotationAngle::from_degrees(45), None);
        assert_eq!(RotationAngle::from_degrees(-90), None);
        assert_eq!(RotationAngle::from_degrees(360), None);
    }

    #[test]
    fn step_distance_is_linear_not_circular() {
        // Full travel costs three steps even though the circular distance
        // would be one
        assert_eq!(RotationAngle::Deg0.steps_to(RotationAngle::Deg270), 3);
        assert_eq!(RotationAngle::Deg270.steps_to(RotationAngle::Deg0), 3);

        assert_eq!(RotationAngle::Deg90.steps_to(RotationAngle::Deg180), 1);
        assert_eq!(RotationAngle::Deg0.steps_to(RotationAngle::Deg180), 2);
    }

    #[test]
    fn same_stop_is_zero_steps() {
        for angle in RotationAngle::ALL {
            assert_eq!(angle.steps_to(angle), 0);
        }
    }

    #[test]
    fn left_decrements_and_wraps_at_zero() {
        assert_eq!(RotationAngle::Deg270.left(), RotationAngle::Deg180);
        assert_eq!(RotationAngle::Deg90.left(), RotationAngle::Deg0);
        assert_eq!(RotationAngle::Deg0.left(), RotationAngle::Deg270);
    }

    #[test]
    fn right_increments_and_wraps_at_270() {
        assert_eq!(RotationAngle::Deg0.right(), RotationAngle::Deg90);
        assert_eq!(RotationAngle::Deg180.right(), RotationAngle::Deg270);
        assert_eq!(RotationAngle::Deg270.right(), RotationAngle::Deg0);
    }

    #[test]
    fn left_and_right_are_inverse_on_inner_stops() {
        for angle in [RotationAngle::Deg90, RotationAngle::Deg180] {
            assert_eq!(angle.left().right(), angle);
            assert_eq!(angle.right().left(), angle);
        }
    }

    #[test]
    fn settle_scales_with_steps() {
        let step = Duration::from_millis(650);
        assert_eq!(rotation_settle(0, step), Duration::ZERO);
        assert_eq!(rotation_settle(2, step), Duration::from_millis(1300));
        assert_eq!(rotation_settle(3, step), Duration::from_millis(1950));
    }
}
