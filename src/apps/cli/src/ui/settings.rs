//! Settings menu and its edit dialog

use super::input::InputBuffer;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsItem {
    RobotAvatar,
    UserAvatar,
    SystemRole,
    ApiKey,
}

impl SettingsItem {
    pub const ALL: [SettingsItem; 4] = [
        SettingsItem::RobotAvatar,
        SettingsItem::UserAvatar,
        SettingsItem::SystemRole,
        SettingsItem::ApiKey,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SettingsItem::RobotAvatar => "Robot Avatar",
            SettingsItem::UserAvatar => "User Avatar",
            SettingsItem::SystemRole => "System Role",
            SettingsItem::ApiKey => "API Key",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            SettingsItem::RobotAvatar | SettingsItem::UserAvatar => {
                "A short glyph shown next to messages; empty restores the default"
            }
            SettingsItem::SystemRole => "Instruction sent first with every request; empty uses the default",
            SettingsItem::ApiKey => "Your own key; empty uses the server key. Ctrl-G gets a server key",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SettingsView {
    #[default]
    Closed,
    Menu {
        selected: usize,
    },
    Editing {
        item: SettingsItem,
        input: InputBuffer,
    },
}

/// What the app should do after a key press in the settings overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsAction {
    None,
    /// Open the editor for `item`; the app supplies the current value.
    Edit(SettingsItem),
    Save { item: SettingsItem, value: String },
    FetchApiKey,
}

impl SettingsView {
    pub fn is_open(&self) -> bool {
        !matches!(self, SettingsView::Closed)
    }

    pub fn open_menu(&mut self) {
        *self = SettingsView::Menu { selected: 0 };
    }

    pub fn begin_edit(&mut self, item: SettingsItem, current: &str) {
        *self = SettingsView::Editing {
            item,
            input: InputBuffer::with_text(current),
        };
    }

    pub fn close(&mut self) {
        *self = SettingsView::Closed;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SettingsAction {
        match self {
            SettingsView::Closed => SettingsAction::None,
            SettingsView::Menu { selected } => match key.code {
                KeyCode::Esc => {
                    self.close();
                    SettingsAction::None
                }
                KeyCode::Up => {
                    *selected = selected.checked_sub(1).unwrap_or(SettingsItem::ALL.len() - 1);
                    SettingsAction::None
                }
                KeyCode::Down | KeyCode::Tab => {
                    *selected = (*selected + 1) % SettingsItem::ALL.len();
                    SettingsAction::None
                }
                KeyCode::Enter => SettingsAction::Edit(SettingsItem::ALL[*selected]),
                _ => SettingsAction::None,
            },
            SettingsView::Editing { item, input } => {
                let item = *item;
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return match key.code {
                        KeyCode::Char('g') if item == SettingsItem::ApiKey => SettingsAction::FetchApiKey,
                        _ => SettingsAction::None,
                    };
                }
                match key.code {
                    KeyCode::Esc => {
                        let selected = SettingsItem::ALL.iter().position(|i| *i == item).unwrap_or(0);
                        *self = SettingsView::Menu { selected };
                        SettingsAction::None
                    }
                    KeyCode::Enter => {
                        let value = input.take();
                        self.close();
                        SettingsAction::Save { item, value }
                    }
                    KeyCode::Char(c) => {
                        input.insert(c);
                        SettingsAction::None
                    }
                    KeyCode::Backspace => {
                        input.backspace();
                        SettingsAction::None
                    }
                    KeyCode::Delete => {
                        input.delete();
                        SettingsAction::None
                    }
                    KeyCode::Left => {
                        input.move_left();
                        SettingsAction::None
                    }
                    KeyCode::Right => {
                        input.move_right();
                        SettingsAction::None
                    }
                    KeyCode::Home => {
                        input.move_home();
                        SettingsAction::None
                    }
                    KeyCode::End => {
                        input.move_end();
                        SettingsAction::None
                    }
                    _ => SettingsAction::None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn menu_navigation_wraps() {
        let mut view = SettingsView::default();
        view.open_menu();
        view.handle_key(key(KeyCode::Up));
        assert_eq!(view, SettingsView::Menu { selected: 3 });
        view.handle_key(key(KeyCode::Down));
        assert_eq!(view, SettingsView::Menu { selected: 0 });
        assert_eq!(
            view.handle_key(key(KeyCode::Enter)),
            SettingsAction::Edit(SettingsItem::RobotAvatar)
        );
    }

    #[test]
    fn enter_saves_and_closes() {
        let mut view = SettingsView::default();
        view.begin_edit(SettingsItem::UserAvatar, "🦊");
        view.handle_key(key(KeyCode::Backspace));
        view.handle_key(key(KeyCode::Char('🐼')));
        assert_eq!(
            view.handle_key(key(KeyCode::Enter)),
            SettingsAction::Save {
                item: SettingsItem::UserAvatar,
                value: "🐼".to_string()
            }
        );
        assert!(!view.is_open());
    }

    #[test]
    fn esc_cancels_back_to_menu_on_same_item() {
        let mut view = SettingsView::default();
        view.begin_edit(SettingsItem::SystemRole, "old");
        view.handle_key(key(KeyCode::Char('x')));
        assert_eq!(view.handle_key(key(KeyCode::Esc)), SettingsAction::None);
        assert_eq!(view, SettingsView::Menu { selected: 2 });
        view.handle_key(key(KeyCode::Esc));
        assert!(!view.is_open());
    }

    #[test]
    fn get_api_key_only_in_api_key_editor() {
        let mut view = SettingsView::default();
        view.begin_edit(SettingsItem::RobotAvatar, "");
        assert_eq!(view.handle_key(ctrl('g')), SettingsAction::None);

        view.begin_edit(SettingsItem::ApiKey, "sk-old");
        assert_eq!(view.handle_key(ctrl('g')), SettingsAction::FetchApiKey);
        assert!(view.is_open());
    }
}
