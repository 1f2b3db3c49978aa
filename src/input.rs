use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum InputEvent {
    Key { key: KeyCode, mods: KeyModifiers },
    Click { col: u16, row: u16 },
    Resize { cols: u16, rows: u16 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Pop { col: u16, row: u16 },
    ToggleHud,
    Restart,
    Resize { cols: u16, rows: u16 },
    Quit,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        let ev = match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press => InputEvent::Key {
                key: k.code,
                mods: k.modifiers,
            },
            Event::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
                InputEvent::Click {
                    col: m.column,
                    row: m.row,
                }
            }
            Event::Resize(cols, rows) => InputEvent::Resize { cols, rows },
            _ => continue,
        };
        out.push(ev);
        if out.len() >= 32 {
            break;
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(ev: InputEvent) -> Option<Action> {
    match ev {
        InputEvent::Click { col, row } => Some(Action::Pop { col, row }),
        InputEvent::Resize { cols, rows } => Some(Action::Resize { cols, rows }),
        InputEvent::Key { key, mods } => {
            if key == KeyCode::Char('c') && mods.contains(KeyModifiers::CONTROL) {
                return Some(Action::Quit);
            }
            match key {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
                KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::ToggleHud),
                KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Restart),
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> InputEvent {
        InputEvent::Key {
            key: KeyCode::Char(c),
            mods: KeyModifiers::NONE,
        }
    }

    #[test]
    fn click_maps_to_pop() {
        let a = map_event_to_action(InputEvent::Click { col: 3, row: 7 });
        assert_eq!(a, Some(Action::Pop { col: 3, row: 7 }));
    }

    #[test]
    fn quit_keys() {
        assert_eq!(map_event_to_action(key('q')), Some(Action::Quit));
        assert_eq!(map_event_to_action(key('Q')), Some(Action::Quit));
        let esc = InputEvent::Key {
            key: KeyCode::Esc,
            mods: KeyModifiers::NONE,
        };
        assert_eq!(map_event_to_action(esc), Some(Action::Quit));
        let ctrl_c = InputEvent::Key {
            key: KeyCode::Char('c'),
            mods: KeyModifiers::CONTROL,
        };
        assert_eq!(map_event_to_action(ctrl_c), Some(Action::Quit));
    }

    #[test]
    fn plain_c_does_nothing() {
        assert_eq!(map_event_to_action(key('c')), None);
    }

    #[test]
    fn hud_and_restart() {
        assert_eq!(map_event_to_action(key('h')), Some(Action::ToggleHud));
        assert_eq!(map_event_to_action(key('r')), Some(Action::Restart));
    }

    #[test]
    fn resize_passes_through() {
        let a = map_event_to_action(InputEvent::Resize { cols: 100, rows: 40 });
        assert_eq!(a, Some(Action::Resize { cols: 100, rows: 40 }));
    }
}
