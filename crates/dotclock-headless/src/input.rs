use clap::ValueEnum;
use dotclock_core::input::{Button, InputSource};
use serde::{Deserialize, Serialize};

/// Button names accepted by `--hold` and the `hold` config key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HeldButton {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl From<HeldButton> for Button {
    fn from(b: HeldButton) -> Self {
        match b {
            HeldButton::Right => Button::Right,
            HeldButton::Left => Button::Left,
            HeldButton::Up => Button::Up,
            HeldButton::Down => Button::Down,
            HeldButton::A => Button::A,
            HeldButton::B => Button::B,
            HeldButton::Select => Button::Select,
            HeldButton::Start => Button::Start,
        }
    }
}

/// Input source for unattended runs: a fixed set of buttons held down for
/// the whole session.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    held: Vec<Button>,
}

impl ScriptedInput {
    pub fn new(held: &[HeldButton]) -> Self {
        Self {
            held: held.iter().copied().map(Button::from).collect(),
        }
    }
}

impl InputSource for ScriptedInput {
    fn is_pressed(&self, button: Button) -> bool {
        self.held.contains(&button)
    }
}
