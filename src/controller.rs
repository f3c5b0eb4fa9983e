use std::time::Duration;
use tracing::trace;

use crate::domain::{AppConfig, AppError, Message, Slot};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, AppError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        let message = match event::read()? {
            // crossterm also emits key release and repeat events on Windows
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                if model.raw_keyevents() {
                    Some(Message::RawKey(key))
                } else {
                    Self::handle_key(key)
                }
            }
            Event::Resize(width, height) => Some(Message::Resize(width as usize, height as usize)),
            _ => None,
        };
        Ok(message)
    }

    pub fn handle_key(key: event::KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Enter, _) => Some(Message::Enter),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Char('o'), _) => Some(Message::OpenFile(Slot::Primary)),
            (KeyCode::Char('s'), _) => Some(Message::OpenFile(Slot::Secondary)),
            (KeyCode::Char('c'), _) => Some(Message::Compare),
            (KeyCode::Tab, _) => Some(Message::FocusNext),
            (KeyCode::BackTab, _) => Some(Message::FocusPrev),
            (KeyCode::Right, _) | (KeyCode::Char('l'), _) => Some(Message::SelectNext),
            (KeyCode::Left, _) | (KeyCode::Char('h'), _) => Some(Message::SelectPrev),
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => Some(Message::ScrollDown),
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => Some(Message::ScrollUp),
            (KeyCode::PageDown, _) => Some(Message::ScrollPageDown),
            (KeyCode::PageUp, _) => Some(Message::ScrollPageUp),
            (KeyCode::Home, _) | (KeyCode::Char('g'), _) => Some(Message::ScrollTop),
            (KeyCode::End, _) | (KeyCode::Char('G'), _) => Some(Message::ScrollBottom),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_messages() {
        assert_eq!(Controller::handle_key(key(KeyCode::Char('q'))), Some(Message::Quit));
        assert_eq!(
            Controller::handle_key(key(KeyCode::Char('o'))),
            Some(Message::OpenFile(Slot::Primary))
        );
        assert_eq!(
            Controller::handle_key(key(KeyCode::Char('s'))),
            Some(Message::OpenFile(Slot::Secondary))
        );
        assert_eq!(Controller::handle_key(key(KeyCode::Char('c'))), Some(Message::Compare));
        assert_eq!(Controller::handle_key(key(KeyCode::BackTab)), Some(Message::FocusPrev));
        assert_eq!(Controller::handle_key(key(KeyCode::F(5))), None);
    }

    #[test]
    fn ctrl_c_quits_instead_of_comparing() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(Controller::handle_key(ctrl_c), Some(Message::Quit));
    }
}
