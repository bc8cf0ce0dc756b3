//! Stateful input triggers evaluated by judgments.
//!
//! Edge triggers ([`Press`], [`Release`]) fire at most once per tick,
//! evaluated against the *current* edge of the raw input state only — a
//! `delta_ticks > 1` tick does not retroactively "catch" an edge that
//! happened between logical ticks, since the runtime has no record of it.
//! Level triggers ([`Hold`], [`Charge`], [`Mash`]) accumulate `delta_ticks`
//! directly into their internal counters, so a single tick with
//! `delta_ticks > 1` can cross a threshold that would otherwise take several
//! single-tick steps.

/// A single logical input button/axis a trigger reads from an
/// [`crate::ports::InputState`].
pub type Button = &'static str;

/// Stateful evaluator deciding whether an input condition has fired this
/// tick.
///
/// Triggers retain state (hold counters, charge counters, command-sequence
/// progress) across ticks via `on_judgment_update`, but never retain a
/// reference to the [`crate::ports::InputState`] itself past the call that
/// handed it in.
pub trait Trigger<Input> {
    /// Called once when the owning judgment is newly evaluated as the active
    /// candidate for its category (i.e. when a selection starts depending on
    /// this trigger). Resets any per-activation state.
    fn on_judgment_start(&mut self) {}

    /// Called once when the owning judgment stops being evaluated.
    fn on_judgment_stop(&mut self) {}

    /// Advances internal counters by `delta_ticks` using `input`'s current
    /// state. Called once per tick before [`Self::is_triggered`].
    fn on_judgment_update(&mut self, input: &Input, delta_ticks: u32);

    /// Whether the trigger condition holds this tick.
    fn is_triggered(&self, input: &Input) -> bool;
}

/// Minimal raw button-state surface a concrete `InputState` exposes to
/// built-in triggers.
pub trait RawButtons {
    /// Whether `button` transitioned from up to down this tick.
    fn is_pressed(&self, button: Button) -> bool;
    /// Whether `button` is currently held down.
    fn is_held(&self, button: Button) -> bool;
    /// Whether `button` transitioned from down to up this tick.
    fn is_released(&self, button: Button) -> bool;
}

/// Fires on the tick `button` transitions from up to down.
#[derive(Debug, Clone)]
pub struct Press {
    button: Button,
}

impl Press {
    /// Creates a trigger for `button`'s press edge.
    #[must_use]
    pub const fn new(button: Button) -> Self {
        Self { button }
    }
}

impl<Input: RawButtons> Trigger<Input> for Press {
    fn on_judgment_update(&mut self, _input: &Input, _delta_ticks: u32) {}

    fn is_triggered(&self, input: &Input) -> bool {
        input.is_pressed(self.button)
    }
}

/// Fires on the tick `button` transitions from down to up.
#[derive(Debug, Clone)]
pub struct Release {
    button: Button,
}

impl Release {
    /// Creates a trigger for `button`'s release edge.
    #[must_use]
    pub const fn new(button: Button) -> Self {
        Self { button }
    }
}

impl<Input: RawButtons> Trigger<Input> for Release {
    fn on_judgment_update(&mut self, _input: &Input, _delta_ticks: u32) {}

    fn is_triggered(&self, input: &Input) -> bool {
        input.is_released(self.button)
    }
}

/// Fires once `button` has been held for at least `min_ticks` consecutive
/// ticks.
#[derive(Debug, Clone)]
pub struct Hold {
    button: Button,
    min_ticks: u32,
    held_ticks: u32,
}

impl Hold {
    /// Creates a hold trigger requiring `min_ticks` of continuous hold.
    #[must_use]
    pub const fn new(button: Button, min_ticks: u32) -> Self {
        Self {
            button,
            min_ticks,
            held_ticks: 0,
        }
    }
}

impl<Input: RawButtons> Trigger<Input> for Hold {
    fn on_judgment_start(&mut self) {
        self.held_ticks = 0;
    }

    fn on_judgment_update(&mut self, input: &Input, delta_ticks: u32) {
        if input.is_held(self.button) {
            self.held_ticks = self.held_ticks.saturating_add(delta_ticks);
        } else {
            self.held_ticks = 0;
        }
    }

    fn is_triggered(&self, _input: &Input) -> bool {
        self.held_ticks >= self.min_ticks
    }
}

/// Fires once `button` has been held past one of `thresholds` (ascending
/// tick counts), reporting the highest threshold crossed via
/// [`Self::level_reached`].
#[derive(Debug, Clone)]
pub struct Charge {
    button: Button,
    thresholds: Vec<u32>,
    held_ticks: u32,
}

impl Charge {
    /// Creates a charge trigger over `thresholds`, which should be sorted
    /// ascending (not enforced, but required for [`Self::level_reached`] to
    /// be meaningful).
    #[must_use]
    pub fn new(button: Button, thresholds: Vec<u32>) -> Self {
        Self {
            button,
            thresholds,
            held_ticks: 0,
        }
    }

    /// Count of thresholds currently crossed.
    #[must_use]
    pub fn level_reached(&self) -> usize {
        self.thresholds
            .iter()
            .filter(|&&t| self.held_ticks >= t)
            .count()
    }
}

impl<Input: RawButtons> Trigger<Input> for Charge {
    fn on_judgment_start(&mut self) {
        self.held_ticks = 0;
    }

    fn on_judgment_update(&mut self, input: &Input, delta_ticks: u32) {
        if input.is_held(self.button) {
            self.held_ticks = self.held_ticks.saturating_add(delta_ticks);
        } else {
            self.held_ticks = 0;
        }
    }

    fn is_triggered(&self, _input: &Input) -> bool {
        self.thresholds.iter().any(|&t| self.held_ticks >= t)
    }
}

/// Fires once `button` has been pressed `count` times within a rolling
/// `window_ticks` window.
#[derive(Debug, Clone)]
pub struct Mash {
    button: Button,
    count: u32,
    window_ticks: u32,
    presses: Vec<u32>,
    ticks_since_start: u32,
}

impl Mash {
    /// Creates a mash trigger requiring `count` presses inside
    /// `window_ticks`.
    #[must_use]
    pub fn new(button: Button, count: u32, window_ticks: u32) -> Self {
        Self {
            button,
            count,
            window_ticks,
            presses: Vec::new(),
            ticks_since_start: 0,
        }
    }
}

impl<Input: RawButtons> Trigger<Input> for Mash {
    fn on_judgment_start(&mut self) {
        self.presses.clear();
        self.ticks_since_start = 0;
    }

    fn on_judgment_update(&mut self, input: &Input, delta_ticks: u32) {
        self.ticks_since_start = self.ticks_since_start.saturating_add(delta_ticks);
        let cutoff = self.ticks_since_start.saturating_sub(self.window_ticks);
        self.presses.retain(|&t| t >= cutoff);
        if input.is_pressed(self.button) {
            self.presses.push(self.ticks_since_start);
        }
    }

    fn is_triggered(&self, _input: &Input) -> bool {
        self.presses.len() as u32 >= self.count
    }
}

/// Fires when every button in `buttons` is held simultaneously.
#[derive(Debug, Clone)]
pub struct Simultaneous {
    buttons: Vec<Button>,
}

impl Simultaneous {
    /// Creates a trigger requiring all of `buttons` held at once.
    #[must_use]
    pub fn new(buttons: Vec<Button>) -> Self {
        Self { buttons }
    }
}

impl<Input: RawButtons> Trigger<Input> for Simultaneous {
    fn on_judgment_update(&mut self, _input: &Input, _delta_ticks: u32) {}

    fn is_triggered(&self, input: &Input) -> bool {
        self.buttons.iter().all(|&b| input.is_held(b))
    }
}

/// Fires when `buttons` are pressed in order within a total window of
/// `window_ticks`, matching a directional-command-style input sequence.
#[derive(Debug, Clone)]
pub struct Command {
    buttons: Vec<Button>,
    window_ticks: u32,
    progress: usize,
    ticks_since_progress: u32,
}

impl Command {
    /// Creates a command-sequence trigger; `buttons` is matched strictly in
    /// order.
    #[must_use]
    pub fn new(buttons: Vec<Button>, window_ticks: u32) -> Self {
        Self {
            buttons,
            window_ticks,
            progress: 0,
            ticks_since_progress: 0,
        }
    }
}

impl<Input: RawButtons> Trigger<Input> for Command {
    fn on_judgment_start(&mut self) {
        self.progress = 0;
        self.ticks_since_progress = 0;
    }

    fn on_judgment_update(&mut self, input: &Input, delta_ticks: u32) {
        if self.buttons.is_empty() {
            return;
        }
        self.ticks_since_progress = self.ticks_since_progress.saturating_add(delta_ticks);
        if self.progress > 0 && self.ticks_since_progress > self.window_ticks {
            self.progress = 0;
            self.ticks_since_progress = 0;
        }
        if self.progress < self.buttons.len() && input.is_pressed(self.buttons[self.progress]) {
            self.progress += 1;
            self.ticks_since_progress = 0;
        }
    }

    fn is_triggered(&self, _input: &Input) -> bool {
        !self.buttons.is_empty() && self.progress >= self.buttons.len()
    }
}

/// Always fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl<Input> Trigger<Input> for Always {
    fn on_judgment_update(&mut self, _input: &Input, _delta_ticks: u32) {}

    fn is_triggered(&self, _input: &Input) -> bool {
        true
    }
}

/// Never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl<Input> Trigger<Input> for Never {
    fn on_judgment_update(&mut self, _input: &Input, _delta_ticks: u32) {}

    fn is_triggered(&self, _input: &Input) -> bool {
        false
    }
}

/// Fires only when every child trigger fires.
pub struct All<Input> {
    children: Vec<Box<dyn Trigger<Input> + Send + Sync>>,
}

impl<Input> All<Input> {
    /// Creates a conjunction of `children`.
    #[must_use]
    pub fn new(children: Vec<Box<dyn Trigger<Input> + Send + Sync>>) -> Self {
        Self { children }
    }
}

impl<Input> Trigger<Input> for All<Input> {
    fn on_judgment_start(&mut self) {
        for c in &mut self.children {
            c.on_judgment_start();
        }
    }

    fn on_judgment_stop(&mut self) {
        for c in &mut self.children {
            c.on_judgment_stop();
        }
    }

    fn on_judgment_update(&mut self, input: &Input, delta_ticks: u32) {
        for c in &mut self.children {
            c.on_judgment_update(input, delta_ticks);
        }
    }

    fn is_triggered(&self, input: &Input) -> bool {
        self.children.iter().all(|c| c.is_triggered(input))
    }
}

/// Fires when at least one child trigger fires.
pub struct Any<Input> {
    children: Vec<Box<dyn Trigger<Input> + Send + Sync>>,
}

impl<Input> Any<Input> {
    /// Creates a disjunction of `children`.
    #[must_use]
    pub fn new(children: Vec<Box<dyn Trigger<Input> + Send + Sync>>) -> Self {
        Self { children }
    }
}

impl<Input> Trigger<Input> for Any<Input> {
    fn on_judgment_start(&mut self) {
        for c in &mut self.children {
            c.on_judgment_start();
        }
    }

    fn on_judgment_stop(&mut self) {
        for c in &mut self.children {
            c.on_judgment_stop();
        }
    }

    fn on_judgment_update(&mut self, input: &Input, delta_ticks: u32) {
        for c in &mut self.children {
            c.on_judgment_update(input, delta_ticks);
        }
    }

    fn is_triggered(&self, input: &Input) -> bool {
        self.children.iter().any(|c| c.is_triggered(input))
    }
}
