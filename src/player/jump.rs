//! Jump buffering, coyote time and variable jump height.

use bevy::prelude::*;

/// Jump tuning.
#[derive(Resource, Debug, Clone, Copy)]
pub struct JumpSettings {
    /// A press this long before landing still jumps
    pub buffer_time: f32,
    /// Grace period after walking off a ledge
    pub coyote_time: f32,
    /// Upward speed above which a jumping body no longer counts as grounded
    pub leave_ground_velocity: f32,
    /// Releasing within this window after takeoff cuts the jump
    pub max_charge_time: f32,
    /// Takeoff speed of a short hop
    pub min_up_speed: f32,
    /// Takeoff speed of a full jump
    pub max_up_speed: f32,
}

impl Default for JumpSettings {
    fn default() -> Self {
        Self {
            buffer_time: 0.12,
            coyote_time: 0.10,
            leave_ground_velocity: 0.05,
            max_charge_time: 0.15,
            min_up_speed: 6.0,
            max_up_speed: 10.0,
        }
    }
}

impl JumpSettings {
    /// Factor applied to upward speed when a jump is cut.
    pub fn cut_factor(&self) -> f32 {
        (self.min_up_speed / self.max_up_speed.max(0.01)).clamp(0.0, 1.0)
    }
}

/// Jump input for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct JumpInput {
    pub pressed: bool,
    pub released: bool,
    /// Ground check result
    pub on_ground: bool,
    pub vertical_velocity: f32,
    pub delta: f32,
}

/// What the jump controller wants done to the body this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpCommand {
    None,
    /// Replace vertical velocity with this takeoff speed.
    Launch(f32),
    /// Scale upward velocity by this factor.
    Cut(f32),
}

#[derive(Component, Debug, Default)]
pub struct JumpState {
    pub grounded: bool,
    coyote: f32,
    buffer: f32,
    jumping: bool,
    since_takeoff: f32,
}

impl JumpState {
    /// Forget buffered input and any jump in progress.
    pub fn reset(&mut self) {
        self.buffer = 0.0;
        self.coyote = 0.0;
        self.jumping = false;
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    pub fn update(&mut self, settings: &JumpSettings, input: JumpInput) -> JumpCommand {
        self.grounded = input.on_ground;
        if self.jumping && input.vertical_velocity > settings.leave_ground_velocity {
            self.grounded = false;
        }

        self.coyote = if self.grounded {
            settings.coyote_time
        } else {
            (self.coyote - input.delta).max(0.0)
        };
        self.buffer = (self.buffer - input.delta).max(0.0);
        self.since_takeoff += input.delta;

        if self.grounded {
            self.jumping = false;
        }

        if input.pressed {
            self.buffer = settings.buffer_time;
        }

        if self.buffer > 0.0 && (self.grounded || self.coyote > 0.0) && !self.jumping {
            self.jumping = true;
            self.grounded = false;
            self.buffer = 0.0;
            self.coyote = 0.0;
            self.since_takeoff = 0.0;
            return JumpCommand::Launch(settings.max_up_speed);
        }

        if input.released
            && self.jumping
            && input.vertical_velocity > 0.0
            && self.since_takeoff <= settings.max_charge_time
        {
            return JumpCommand::Cut(settings.cut_factor());
        }

        JumpCommand::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn frame(on_ground: bool, vertical_velocity: f32) -> JumpInput {
        JumpInput {
            on_ground,
            vertical_velocity,
            delta: DT,
            ..default()
        }
    }

    #[test]
    fn test_grounded_press_launches() {
        let settings = JumpSettings::default();
        let mut jump = JumpState::default();

        let command = jump.update(&settings, JumpInput { pressed: true, ..frame(true, 0.0) });
        assert_eq!(command, JumpCommand::Launch(10.0));
        assert!(jump.is_jumping());
    }

    #[test]
    fn test_buffered_press_jumps_on_landing() {
        let settings = JumpSettings::default();
        let mut jump = JumpState::default();

        // Pressed in the air with no coyote time left.
        let command = jump.update(&settings, JumpInput { pressed: true, ..frame(false, -3.0) });
        assert_eq!(command, JumpCommand::None);

        let command = jump.update(&settings, frame(true, 0.0));
        assert_eq!(command, JumpCommand::Launch(10.0), "buffered press should fire on landing");
    }

    #[test]
    fn test_stale_buffer_expires() {
        let settings = JumpSettings::default();
        let mut jump = JumpState::default();

        jump.update(&settings, JumpInput { pressed: true, ..frame(false, -3.0) });
        for _ in 0..10 {
            jump.update(&settings, frame(false, -3.0));
        }
        assert_eq!(jump.update(&settings, frame(true, 0.0)), JumpCommand::None);
    }

    #[test]
    fn test_coyote_time_allows_late_jump() {
        let settings = JumpSettings::default();
        let mut jump = JumpState::default();

        jump.update(&settings, frame(true, 0.0));
        jump.update(&settings, frame(false, -0.5));
        let command = jump.update(&settings, JumpInput { pressed: true, ..frame(false, -0.5) });
        assert_eq!(command, JumpCommand::Launch(10.0));
    }

    #[test]
    fn test_early_release_cuts_jump() {
        let settings = JumpSettings::default();
        let mut jump = JumpState::default();

        jump.update(&settings, JumpInput { pressed: true, ..frame(true, 0.0) });
        let command = jump.update(&settings, JumpInput { released: true, ..frame(true, 9.0) });
        assert_eq!(command, JumpCommand::Cut(0.6));
    }

    #[test]
    fn test_late_release_keeps_full_height() {
        let settings = JumpSettings::default();
        let mut jump = JumpState::default();

        jump.update(&settings, JumpInput { pressed: true, ..frame(true, 0.0) });
        for _ in 0..20 {
            jump.update(&settings, frame(false, 5.0));
        }
        let command = jump.update(&settings, JumpInput { released: true, ..frame(false, 4.0) });
        assert_eq!(command, JumpCommand::None);
    }
}
