// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into `UserCommand` messages for the session
// actor. The only local state a key touches is the highlighted option.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use globetrotter_app::{Phase, UserCommand};

use super::ViewState;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// session actor. Keys that do not apply to the current phase are ignored.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    let snapshot = &view_state.snapshot;
    match key_event.code {
        KeyCode::Char('q') => Some(UserCommand::Quit),

        KeyCode::Char('s') => match snapshot.phase {
            Phase::Idle | Phase::Finished if !snapshot.loading => {
                Some(UserCommand::NewGame(view_state.user_id.clone()))
            }
            _ => None,
        },

        KeyCode::Char('r') => {
            view_state.selected = None;
            Some(UserCommand::Reset)
        }

        KeyCode::Char('f') if snapshot.is_active => Some(UserCommand::Finish),

        KeyCode::Char('n') | KeyCode::Enter if snapshot.can_advance => Some(UserCommand::Advance),

        KeyCode::Char(c @ '1'..='9') => select_option(view_state, c),

        _ => None,
    }
}

/// Pick the option behind digit `c` and submit it.
fn select_option(view_state: &mut ViewState, c: char) -> Option<UserCommand> {
    let snapshot = &view_state.snapshot;
    if snapshot.phase != Phase::Presenting || snapshot.loading || snapshot.can_advance {
        return None;
    }
    let index = c.to_digit(10)? as usize - 1;
    let city = snapshot
        .current_round
        .as_ref()?
        .answer_options()
        .get(index)?
        .city
        .clone();
    view_state.selected = Some(index);
    Some(UserCommand::SubmitAnswer(city))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
