//! Desired time gap to the lead.

use longplan_traits::{ControlMode, DriverSettings};

use crate::util::interp;

/// Solver default follow time (s).
pub const T_FOLLOW: f32 = 1.45;

const DF0_BP: [f32; 8] = [0.0, 5.56, 11.11, 13.89, 19.4, 22.2, 25.0, 41.67];
const DF0_V: [f32; 8] = [1.2, 1.3, 1.32, 1.32, 1.32, 1.32, 1.32, 1.35];
const DF1_BP: [f32; 7] = [0.0, 5.56, 11.11, 13.89, 19.4, 25.0, 41.67];
const DF1_V: [f32; 7] = [1.2, 1.37, 1.45, 1.5, 1.5, 1.6, 1.8];
const DF2_BP: [f32; 6] = [0.0, 5.56, 11.11, 13.89, 25.0, 41.67];
const DF2_V: [f32; 6] = [1.2, 1.47, 1.75, 1.95, 2.2, 2.4];

/// Follow time for the current speed. Profiles only apply in ACC; unknown
/// selectors keep the default.
pub fn desired_follow_time(v_ego: f32, settings: &DriverSettings, mode: ControlMode) -> f32 {
    if !settings.following_profile_ctrl || mode != ControlMode::Acc {
        return T_FOLLOW;
    }
    match settings.following_profile {
        0 => interp(v_ego, &DF0_BP, &DF0_V),
        1 => interp(v_ego, &DF1_BP, &DF1_V),
        2 => interp(v_ego, &DF2_BP, &DF2_V),
        _ => T_FOLLOW,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(profile: u8) -> DriverSettings {
        DriverSettings {
            following_profile_ctrl: true,
            following_profile: profile,
            ..DriverSettings::default()
        }
    }

    #[test]
    fn disabled_or_blended_uses_default() {
        assert_eq!(
            desired_follow_time(20.0, &DriverSettings::default(), ControlMode::Acc),
            T_FOLLOW
        );
        assert_eq!(desired_follow_time(20.0, &settings(2), ControlMode::Blended), T_FOLLOW);
    }

    #[test]
    fn profiles_are_ordered_at_highway_speed() {
        let v = 25.0;
        let tf: Vec<f32> = (0..3)
            .map(|p| desired_follow_time(v, &settings(p), ControlMode::Acc))
            .collect();
        assert_eq!(tf, vec![1.32, 1.6, 2.2]);
    }

    #[test]
    fn unknown_profile_is_default() {
        assert_eq!(desired_follow_time(10.0, &settings(9), ControlMode::Acc), T_FOLLOW);
    }
}
