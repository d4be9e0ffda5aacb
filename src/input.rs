use crate::command::{CommandKey, SIGIL};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    DismissError,
    Refresh,
    EnterCommand,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    Confirm,
    Back,
    Command(CommandKey),
    None,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Default)]
pub struct InputContext {
    pub command_mode: bool,
    pub card_focused: bool,
    pub has_error: bool,
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Ctrl+C always quits
    if ctrl && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    if ctx.command_mode {
        let command_key = match key.code {
            KeyCode::Esc => CommandKey::Esc,
            KeyCode::Enter => CommandKey::Enter,
            KeyCode::Tab => CommandKey::Tab,
            KeyCode::BackTab | KeyCode::Up => CommandKey::Prev,
            KeyCode::Down => CommandKey::Next,
            KeyCode::Char('p') if ctrl => CommandKey::Prev,
            KeyCode::Char('n') if ctrl => CommandKey::Next,
            KeyCode::Backspace => CommandKey::Backspace,
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                CommandKey::Char(c)
            }
            _ => return Action::None,
        };
        return Action::Command(command_key);
    }

    match key.code {
        KeyCode::Esc => {
            if ctx.has_error {
                Action::DismissError
            } else {
                Action::Back
            }
        }
        KeyCode::Char('q') if !ctx.card_focused => Action::Quit,
        KeyCode::Char('r') if !ctx.card_focused => Action::Refresh,
        KeyCode::Char(c) if c == SIGIL && !ctx.card_focused => Action::EnterCommand,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Enter => Action::Confirm,
        _ => Action::None,
    }
}
