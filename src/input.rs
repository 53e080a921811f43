use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use sandpit::Material;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Action {
    Quit,
    TogglePause,
    StepOnce,
    Select(Material),
    Brush(i32),
    Clear,
    Save,
    Load,
    ToggleEraser,
    ToggleHelp,
    MoveCursor(i32, i32),
    StampAtCursor,
    /// Mouse press or drag at a terminal cell.
    Paint { col: u16, row: u16, erase: bool, drag: bool },
    /// Mouse button released; ends the current stroke.
    EndStroke,
    Resize(u16, u16),
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<Event>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        out.push(event::read()?);
        if out.len() >= 64 {
            break;
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(ev: Event) -> Option<Action> {
    match ev {
        Event::Key(k) if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat => {
            map_key(k.code)
        }
        Event::Mouse(m) => map_mouse(m),
        Event::Resize(w, h) => Some(Action::Resize(w, h)),
        _ => None,
    }
}

fn map_key(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char('.') => Some(Action::StepOnce),
        KeyCode::Char(ch @ '1'..='8') => {
            let i = ch as usize - '1' as usize;
            Material::ALL.get(i).copied().map(Action::Select)
        }
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::Brush(1)),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::Brush(-1)),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::Clear),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Action::Save),
        KeyCode::Char('l') | KeyCode::Char('L') => Some(Action::Load),
        KeyCode::Char('e') | KeyCode::Char('E') => Some(Action::ToggleEraser),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::ToggleHelp),
        KeyCode::Up => Some(Action::MoveCursor(0, -1)),
        KeyCode::Down => Some(Action::MoveCursor(0, 1)),
        KeyCode::Left => Some(Action::MoveCursor(-1, 0)),
        KeyCode::Right => Some(Action::MoveCursor(1, 0)),
        KeyCode::Enter => Some(Action::StampAtCursor),
        _ => None,
    }
}

fn map_mouse(m: MouseEvent) -> Option<Action> {
    let (col, row) = (m.column, m.row);
    let (button, drag) = match m.kind {
        MouseEventKind::Down(b) => (b, false),
        MouseEventKind::Drag(b) => (b, true),
        MouseEventKind::Up(_) => return Some(Action::EndStroke),
        _ => return None,
    };
    let erase = match button {
        MouseButton::Left => false,
        MouseButton::Right => true,
        MouseButton::Middle => return None,
    };
    Some(Action::Paint { col, row, erase, drag })
}
