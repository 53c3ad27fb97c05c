use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press asks the host to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Select(usize),
    Next,
    Restart,
    ToggleTheme,
    ToggleSound,
    Quit,
}

pub fn command_for(key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Command::Quit),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => Some(Command::Quit),
        KeyCode::Enter | KeyCode::Right | KeyCode::Char(' ') | KeyCode::Char('n') => {
            Some(Command::Next)
        }
        KeyCode::Char(c @ '1'..='4') => Some(Command::Select(c as usize - '1' as usize)),
        KeyCode::Char(c @ 'a'..='d') => Some(Command::Select(c as usize - 'a' as usize)),
        KeyCode::Char(c @ 'A'..='D') => Some(Command::Select(c as usize - 'A' as usize)),
        KeyCode::Char('r') => Some(Command::Restart),
        KeyCode::Char('t') => Some(Command::ToggleTheme),
        KeyCode::Char('m') => Some(Command::ToggleSound),
        _ => None,
    }
}

/// Letter shown next to an option slot
pub fn option_label(slot: usize) -> char {
    (b'A' + slot as u8) as char
}
