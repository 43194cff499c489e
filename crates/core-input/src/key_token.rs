use core_events::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::event::{
    KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind as CKeyEventKind,
    KeyModifiers as CKeyModifiers,
};

/// Map a crossterm key event into the runtime key model.
///
/// Returns `None` for keys no binding can name (function keys, media keys, ...) and for
/// release events.
pub(crate) fn map_key_event(event: &CKeyEvent) -> Option<KeyEvent> {
    if matches!(event.kind, CKeyEventKind::Release) {
        return None;
    }
    Some(KeyEvent {
        code: map_key_code(&event.code)?,
        mods: map_mods(event.modifiers),
    })
}

pub(crate) fn map_key_code(code: &CKeyCode) -> Option<KeyCode> {
    let key = match code {
        CKeyCode::Char(c) => KeyCode::Char(*c),
        CKeyCode::Enter => KeyCode::Enter,
        CKeyCode::Esc => KeyCode::Esc,
        CKeyCode::Backspace => KeyCode::Backspace,
        CKeyCode::Tab | CKeyCode::BackTab => KeyCode::Tab,
        CKeyCode::Up => KeyCode::Up,
        CKeyCode::Down => KeyCode::Down,
        CKeyCode::Left => KeyCode::Left,
        CKeyCode::Right => KeyCode::Right,
        _ => return None,
    };
    Some(key)
}

pub(crate) fn map_mods(mods: CKeyModifiers) -> KeyModifiers {
    let mut out = KeyModifiers::empty();
    if mods.contains(CKeyModifiers::CONTROL) {
        out |= KeyModifiers::CTRL;
    }
    if mods.contains(CKeyModifiers::ALT) {
        out |= KeyModifiers::ALT;
    }
    if mods.contains(CKeyModifiers::SHIFT) {
        out |= KeyModifiers::SHIFT;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState as CKeyEventState;

    fn key_event(code: CKeyCode, modifiers: CKeyModifiers, kind: CKeyEventKind) -> CKeyEvent {
        CKeyEvent {
            code,
            modifiers,
            kind,
            state: CKeyEventState::empty(),
        }
    }

    #[test]
    fn maps_basic_char() {
        let ev = key_event(
            CKeyCode::Char('l'),
            CKeyModifiers::NONE,
            CKeyEventKind::Press,
        );
        let key = map_key_event(&ev).expect("char should map");
        assert_eq!(key, KeyEvent::plain(KeyCode::Char('l')));
    }

    #[test]
    fn maps_arrows_and_enter() {
        for (code, expected) in [
            (CKeyCode::Right, KeyCode::Right),
            (CKeyCode::Down, KeyCode::Down),
            (CKeyCode::Enter, KeyCode::Enter),
        ] {
            let ev = key_event(code, CKeyModifiers::NONE, CKeyEventKind::Press);
            assert_eq!(map_key_event(&ev).map(|k| k.code), Some(expected));
        }
    }

    #[test]
    fn keeps_modifier_bits() {
        let ev = key_event(
            CKeyCode::Char('d'),
            CKeyModifiers::CONTROL | CKeyModifiers::SHIFT,
            CKeyEventKind::Press,
        );
        let key = map_key_event(&ev).expect("ctrl-shift-d should map");
        assert!(key.mods.contains(KeyModifiers::CTRL));
        assert!(key.mods.contains(KeyModifiers::SHIFT));
        assert!(!key.mods.contains(KeyModifiers::ALT));
    }

    #[test]
    fn repeat_maps_like_press() {
        let ev = key_event(
            CKeyCode::Char('j'),
            CKeyModifiers::NONE,
            CKeyEventKind::Repeat,
        );
        assert!(map_key_event(&ev).is_some());
    }

    #[test]
    fn release_and_unsupported_keys_return_none() {
        let release = key_event(
            CKeyCode::Char('j'),
            CKeyModifiers::NONE,
            CKeyEventKind::Release,
        );
        assert!(map_key_event(&release).is_none());
        let caps = key_event(
            CKeyCode::CapsLock,
            CKeyModifiers::NONE,
            CKeyEventKind::Press,
        );
        assert!(map_key_event(&caps).is_none());
        let f5 = key_event(CKeyCode::F(5), CKeyModifiers::NONE, CKeyEventKind::Press);
        assert!(map_key_event(&f5).is_none());
    }
}
