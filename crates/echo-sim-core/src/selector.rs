//! Deterministic action selection among competing judgments.

use rayon::prelude::*;

use crate::category::CategoryRules;
use crate::judgment::Judgment;
use crate::priority::ActionPriority;

/// Why a single judgment did or did not win selection this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// This judgment's action was started.
    Selected,
    /// `priority` was `ActionPriority::Disabled`.
    Disabled,
    /// The trigger did not fire this tick.
    InputNotFired,
    /// The trigger fired but the condition closure returned `false`.
    ConditionFailed,
    /// A higher-preference judgment in the exact same category already won.
    CategoryOccupied,
    /// A higher-preference judgment in a mutually exclusive category
    /// already won.
    ExclusivityConflict,
}

/// Outcome for one judgment after a selection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionResult {
    /// The judgment this result describes.
    pub judgment_id: &'static str,
    /// Index into the slice passed to [`ActionSelector::select`], for
    /// callers that need to recover the winning judgment itself.
    pub index: usize,
    /// Why it was or was not selected.
    pub outcome: SelectionOutcome,
}

/// Chooses at most one judgment per category out of a candidate set, in
/// deterministic priority order.
///
/// # Algorithm
/// 1. Eligibility (disabled / trigger fired / condition holds) is evaluated
///    for every judgment independently; this step is sharded across a rayon
///    thread pool since no judgment's eligibility depends on another's.
/// 2. Eligible judgments are stably sorted by [`ActionPriority`] ascending
///    (lower values evaluated first); ties preserve input order, so two
///    judgments of equal priority resolve by their position in the slice
///    passed to [`Self::select`], never by hash or thread scheduling.
/// 3. The sorted judgments are walked serially, each checked against the
///    categories already claimed by a higher-preference winner this tick.
///    This pass is inherently sequential: it is non-transitive-rule-safe
///    only because each decision is made against the exact set of
///    categories claimed *so far*, in priority order.
pub struct ActionSelector<Cat> {
    category_rules: Box<dyn CategoryRules<Cat> + Send + Sync>,
}

impl<Cat: Clone + PartialEq + Send + Sync> ActionSelector<Cat> {
    /// Creates a selector using `category_rules` to decide cross-category
    /// exclusivity.
    #[must_use]
    pub fn new(category_rules: impl CategoryRules<Cat> + Send + Sync + 'static) -> Self {
        Self {
            category_rules: Box::new(category_rules),
        }
    }

    /// Advances every judgment's trigger by one tick via
    /// [`crate::trigger::Trigger::on_judgment_update`].
    ///
    /// [`Self::select`] only ever reads trigger state through
    /// `is_triggered`; it never mutates it. Decision-phase wiring must call
    /// `advance` once per entity, before `select`, on every tick — otherwise
    /// level and sequence triggers ([`crate::trigger::Hold`],
    /// [`crate::trigger::Charge`], [`crate::trigger::Mash`],
    /// [`crate::trigger::Command`]) never accumulate `delta_ticks` and can
    /// never fire outside a test that calls their trigger methods directly.
    pub fn advance<Input, Ctx>(judgments: &mut [Judgment<Input, Cat, Ctx>], input: &Input, delta_ticks: u32) {
        for judgment in judgments {
            judgment.trigger.on_judgment_update(input, delta_ticks);
        }
    }

    /// Evaluates every judgment in `judgments` against `input`/`ctx` and
    /// returns one [`SelectionResult`] per judgment, in input order.
    pub fn select<Input, Ctx>(
        &self,
        judgments: &[Judgment<Input, Cat, Ctx>],
        input: &Input,
        ctx: &Ctx,
    ) -> Vec<SelectionResult>
    where
        Input: Sync,
        Ctx: Sync,
    {
        let eligibility: Vec<EligibilityCheck> = judgments
            .par_iter()
            .enumerate()
            .map(|(index, j)| classify(index, j, input, ctx))
            .collect();

        let mut results: Vec<SelectionResult> = eligibility
            .iter()
            .map(|e| SelectionResult {
                judgment_id: judgments[e.index].judgment_id,
                index: e.index,
                outcome: match e.pre_outcome {
                    Some(outcome) => outcome,
                    None => SelectionOutcome::Selected,
                },
            })
            .collect();

        let mut candidates: Vec<usize> = eligibility
            .iter()
            .filter(|e| e.pre_outcome.is_none())
            .map(|e| e.index)
            .collect();
        candidates.sort_by_key(|&index| judgments[index].priority);

        let mut claimed: Vec<Cat> = Vec::new();
        for index in candidates {
            let category = judgments[index].action.category.clone();
            let conflict = claimed.iter().any(|c| {
                *c == category || self.category_rules.are_exclusive(c, &category)
            });
            if conflict {
                let occupied_exactly = claimed.iter().any(|c| *c == category);
                results[index].outcome = if occupied_exactly {
                    SelectionOutcome::CategoryOccupied
                } else {
                    SelectionOutcome::ExclusivityConflict
                };
            } else {
                results[index].outcome = SelectionOutcome::Selected;
                claimed.push(category);
            }
        }

        results
    }
}

struct EligibilityCheck {
    index: usize,
    pre_outcome: Option<SelectionOutcome>,
}

fn classify<Input, Cat, Ctx>(
    index: usize,
    judgment: &Judgment<Input, Cat, Ctx>,
    input: &Input,
    ctx: &Ctx,
) -> EligibilityCheck {
    let pre_outcome = if judgment.priority.is_disabled() {
        Some(SelectionOutcome::Disabled)
    } else if !judgment.trigger.is_triggered(input) {
        Some(SelectionOutcome::InputNotFired)
    } else if !(judgment.condition)(ctx) {
        Some(SelectionOutcome::ConditionFailed)
    } else {
        None
    };
    EligibilityCheck { index, pre_outcome }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionDefinition, FrameWindow};
    use crate::category::FullExclusivityRules;
    use crate::trigger::Always;
    use crate::trigger::Never;

    #[derive(PartialEq, Eq, Clone, Copy, Debug)]
    enum Cat {
        Attack,
        Movement,
    }

    fn judgment(
        id: &'static str,
        priority: ActionPriority,
        category: Cat,
        fires: bool,
    ) -> Judgment<(), Cat, ()> {
        Judgment {
            judgment_id: id,
            priority,
            trigger: if fires {
                Box::new(Always)
            } else {
                Box::new(Never)
            },
            condition: Box::new(|_| true),
            action: ActionDefinition {
                action_id: id,
                category,
                total_frames: 10,
                cancel_window: FrameWindow::new(0, 10),
                hitbox_window: None,
                invincible_window: None,
                motion_ref: None,
            },
        }
    }

    #[test]
    fn higher_priority_wins_same_category() {
        let selector = ActionSelector::new(FullExclusivityRules);
        let judgments = vec![
            judgment("low", ActionPriority::LOWEST, Cat::Attack, true),
            judgment("high", ActionPriority::HIGHEST, Cat::Attack, true),
        ];
        let results = selector.select(&judgments, &(), &());
        assert_eq!(results[0].outcome, SelectionOutcome::CategoryOccupied);
        assert_eq!(results[1].outcome, SelectionOutcome::Selected);
    }

    #[test]
    fn disabled_judgment_never_considered() {
        let selector = ActionSelector::new(FullExclusivityRules);
        let judgments = vec![judgment("off", ActionPriority::Disabled, Cat::Attack, true)];
        let results = selector.select(&judgments, &(), &());
        assert_eq!(results[0].outcome, SelectionOutcome::Disabled);
    }

    #[test]
    fn non_firing_trigger_is_excluded() {
        let selector = ActionSelector::new(FullExclusivityRules);
        let judgments = vec![judgment("quiet", ActionPriority::NORMAL, Cat::Attack, false)];
        let results = selector.select(&judgments, &(), &());
        assert_eq!(results[0].outcome, SelectionOutcome::InputNotFired);
    }

    #[test]
    fn full_exclusivity_blocks_distinct_categories() {
        let selector = ActionSelector::new(FullExclusivityRules);
        let judgments = vec![
            judgment("attack", ActionPriority::HIGHEST, Cat::Attack, true),
            judgment("move", ActionPriority::HIGH, Cat::Movement, true),
        ];
        let results = selector.select(&judgments, &(), &());
        assert_eq!(results[0].outcome, SelectionOutcome::Selected);
        assert_eq!(results[1].outcome, SelectionOutcome::ExclusivityConflict);
    }

    #[test]
    fn equal_priority_ties_resolve_by_input_order() {
        let selector = ActionSelector::new(FullExclusivityRules);
        let judgments = vec![
            judgment("first", ActionPriority::NORMAL, Cat::Attack, true),
            judgment("second", ActionPriority::NORMAL, Cat::Attack, true),
        ];
        let results = selector.select(&judgments, &(), &());
        assert_eq!(results[0].outcome, SelectionOutcome::Selected);
        assert_eq!(results[1].outcome, SelectionOutcome::CategoryOccupied);
    }

    #[derive(Default)]
    struct FakeInput {
        held: Vec<crate::trigger::Button>,
    }

    impl crate::trigger::RawButtons for FakeInput {
        fn is_pressed(&self, _button: crate::trigger::Button) -> bool {
            false
        }
        fn is_held(&self, button: crate::trigger::Button) -> bool {
            self.held.contains(&button)
        }
        fn is_released(&self, _button: crate::trigger::Button) -> bool {
            false
        }
    }

    #[test]
    fn advance_accumulates_hold_trigger_state_across_ticks() {
        let selector = ActionSelector::new(FullExclusivityRules);
        let mut judgments = vec![Judgment {
            judgment_id: "charge-attack",
            priority: ActionPriority::NORMAL,
            trigger: Box::new(crate::trigger::Hold::new("A", 3)),
            condition: Box::new(|_| true),
            action: ActionDefinition {
                action_id: "charge-attack",
                category: Cat::Attack,
                total_frames: 10,
                cancel_window: FrameWindow::new(0, 10),
                hitbox_window: None,
                invincible_window: None,
                motion_ref: None,
            },
        }];
        let input = FakeInput { held: vec!["A"] };

        let results = selector.select(&judgments, &input, &());
        assert_eq!(results[0].outcome, SelectionOutcome::InputNotFired);

        ActionSelector::<Cat>::advance(&mut judgments, &input, 1);
        ActionSelector::<Cat>::advance(&mut judgments, &input, 2);

        let results = selector.select(&judgments, &input, &());
        assert_eq!(results[0].outcome, SelectionOutcome::Selected);
    }
}
