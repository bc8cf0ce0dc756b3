//! Judgments: the candidate-action descriptors the selector chooses among.

use crate::action::ActionDefinition;
use crate::priority::ActionPriority;
use crate::trigger::Trigger;

/// One candidate action a [`crate::selector::ActionSelector`] may choose,
/// pairing a trigger condition with a priority and a gating condition.
///
/// `Input` is the embedding game's input-state type; `Cat` is its action
/// category type, and `Ctx` is whatever per-entity context the condition
/// closure needs to decide applicability (typically
/// [`crate::registry::EntityContext`] or a reference into the game's own
/// world state).
pub struct Judgment<Input, Cat, Ctx> {
    /// Stable identifier, usually matching the underlying
    /// [`ActionDefinition::action_id`].
    pub judgment_id: &'static str,
    /// Current priority. `ActionPriority::Disabled` removes this judgment
    /// from consideration outright, before the trigger or condition is ever
    /// evaluated.
    pub priority: ActionPriority,
    /// Input condition gating selection.
    pub trigger: Box<dyn Trigger<Input> + Send + Sync>,
    /// Additional game-state condition gating selection (stamina cost,
    /// cooldown, facing, etc). Evaluated only if the trigger already fired,
    /// since conditions are typically more expensive to check.
    pub condition: Box<dyn Fn(&Ctx) -> bool + Send + Sync>,
    /// The action this judgment starts when selected.
    pub action: ActionDefinition<Cat>,
}

impl<Input, Cat, Ctx> Judgment<Input, Cat, Ctx> {
    /// Whether this judgment is eligible for selection this tick: not
    /// disabled, trigger fired, and condition holds.
    #[must_use]
    pub fn is_eligible(&self, input: &Input, ctx: &Ctx) -> bool {
        if self.priority.is_disabled() {
            return false;
        }
        self.trigger.is_triggered(input) && (self.condition)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::FrameWindow;
    use crate::trigger::Always;

    #[derive(PartialEq, Clone, Copy)]
    enum Cat {
        Attack,
    }

    fn judgment(priority: ActionPriority) -> Judgment<(), Cat, ()> {
        Judgment {
            judgment_id: "test/judgment",
            priority,
            trigger: Box::new(Always),
            condition: Box::new(|_| true),
            action: ActionDefinition {
                action_id: "test/action",
                category: Cat::Attack,
                total_frames: 10,
                cancel_window: FrameWindow::new(0, 10),
                hitbox_window: None,
                invincible_window: None,
                motion_ref: None,
            },
        }
    }

    #[test]
    fn disabled_is_never_eligible() {
        let j = judgment(ActionPriority::Disabled);
        assert!(!j.is_eligible(&(), &()));
    }

    #[test]
    fn enabled_with_true_condition_is_eligible() {
        let j = judgment(ActionPriority::NORMAL);
        assert!(j.is_eligible(&(), &()));
    }
}
