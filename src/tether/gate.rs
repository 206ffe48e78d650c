//! Edge-triggered activation and cooldown.

/// Seconds until an ability may start another tether.
///
/// Once started, the remaining time only decreases until it reaches exactly zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CooldownTimer {
    remaining: f32,
}

impl CooldownTimer {
    pub fn start(&mut self, seconds: f32) {
        self.remaining = seconds.max(0.0);
    }

    /// Advance by a frame of real time.
    pub fn tick(&mut self, delta: f32) {
        if self.remaining > 0.0 {
            self.remaining = (self.remaining - delta.max(0.0)).max(0.0);
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn is_on_cooldown(&self) -> bool {
        self.remaining > 0.0
    }
}

/// What an activation press means right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Idle and ready: look for a target.
    Acquire,
    /// Already tethered: a second press cancels, it never retargets.
    Cancel,
    /// Idle but cooling down.
    CoolingDown,
    /// The ability is switched off.
    Disabled,
}

/// Decides what an activation edge does for one ability instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationGate {
    pub enabled: bool,
    cooldown: CooldownTimer,
}

impl Default for ActivationGate {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown: CooldownTimer::default(),
        }
    }
}

impl ActivationGate {
    pub fn on_activation_edge(&self, tethered: bool) -> GateAction {
        if tethered {
            GateAction::Cancel
        } else if !self.enabled {
            GateAction::Disabled
        } else if self.cooldown.is_on_cooldown() {
            GateAction::CoolingDown
        } else {
            GateAction::Acquire
        }
    }

    pub fn tick(&mut self, delta: f32) {
        self.cooldown.tick(delta);
    }

    pub fn start_cooldown(&mut self, seconds: f32) {
        self.cooldown.start(seconds);
    }

    pub fn cooldown(&self) -> &CooldownTimer {
        &self.cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_decreases_monotonically_to_zero() {
        let mut timer = CooldownTimer::default();
        timer.start(0.35);

        let mut previous = timer.remaining();
        let mut frames = 0;
        while timer.is_on_cooldown() {
            timer.tick(1.0 / 60.0);
            assert!(timer.remaining() <= previous);
            previous = timer.remaining();
            frames += 1;
            assert!(frames < 100, "cooldown never finished");
        }
        assert_eq!(timer.remaining(), 0.0);
    }

    #[test]
    fn test_negative_delta_does_not_extend_cooldown() {
        let mut timer = CooldownTimer::default();
        timer.start(1.0);
        timer.tick(-5.0);
        assert_eq!(timer.remaining(), 1.0);
    }

    #[test]
    fn test_gate_decisions() {
        let mut gate = ActivationGate::default();
        assert_eq!(gate.on_activation_edge(false), GateAction::Acquire);
        assert_eq!(gate.on_activation_edge(true), GateAction::Cancel);

        gate.start_cooldown(0.5);
        assert_eq!(gate.on_activation_edge(false), GateAction::CoolingDown);
        assert_eq!(gate.on_activation_edge(true), GateAction::Cancel);

        gate.tick(0.5);
        assert_eq!(gate.on_activation_edge(false), GateAction::Acquire);

        gate.enabled = false;
        assert_eq!(gate.on_activation_edge(false), GateAction::Disabled);
    }
}
