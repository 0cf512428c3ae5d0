//! Keyboard shortcuts.
//!
//! Maps key presses to edits of the explicit [`EditorSettings`] state, the
//! same state the on-screen panel edits.

use nineslice::EditorSettings;
use winit::keyboard::KeyCode;

/// Pixel step for size/position/margin edits; shift switches to `FINE_STEP`.
const COARSE_STEP: f32 = 10.0;
const FINE_STEP: f32 = 1.0;
/// Tint channel step.
const CHANNEL_STEP: f32 = 0.1;

/// Which breakpoint the margin keys edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarginSide {
    #[default]
    Left,
    Right,
    Top,
    Bottom,
}

impl MarginSide {
    pub fn name(self) -> &'static str {
        match self {
            MarginSide::Left => "left",
            MarginSide::Right => "right",
            MarginSide::Top => "top",
            MarginSide::Bottom => "bottom",
        }
    }
}

/// Transient panel state that is not part of the mesh settings.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub shift: bool,
    pub margin_side: MarginSide,
}

/// An edit requested by a key press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditAction {
    Resize { dw: f32, dh: f32 },
    Move { dx: f32, dy: f32 },
    SelectVertex { delta: isize },
    AdjustChannel { channel: usize, delta: f32 },
    SelectMargin(MarginSide),
    AdjustMargin { delta: i64 },
    ResetColors,
}

/// Translates a pressed key into an edit.
pub fn action_for_key(code: KeyCode, shift: bool) -> Option<EditAction> {
    let step = if shift { FINE_STEP } else { COARSE_STEP };
    let channel_delta = if shift { -CHANNEL_STEP } else { CHANNEL_STEP };

    let action = match code {
        KeyCode::ArrowLeft => EditAction::Resize { dw: -step, dh: 0.0 },
        KeyCode::ArrowRight => EditAction::Resize { dw: step, dh: 0.0 },
        KeyCode::ArrowUp => EditAction::Resize { dw: 0.0, dh: -step },
        KeyCode::ArrowDown => EditAction::Resize { dw: 0.0, dh: step },
        KeyCode::KeyJ => EditAction::Move { dx: -step, dy: 0.0 },
        KeyCode::KeyL => EditAction::Move { dx: step, dy: 0.0 },
        KeyCode::KeyI => EditAction::Move { dx: 0.0, dy: -step },
        KeyCode::KeyK => EditAction::Move { dx: 0.0, dy: step },
        KeyCode::BracketLeft => EditAction::SelectVertex { delta: -1 },
        KeyCode::BracketRight => EditAction::SelectVertex { delta: 1 },
        KeyCode::KeyR => EditAction::AdjustChannel { channel: 0, delta: channel_delta },
        KeyCode::KeyG => EditAction::AdjustChannel { channel: 1, delta: channel_delta },
        KeyCode::KeyB => EditAction::AdjustChannel { channel: 2, delta: channel_delta },
        KeyCode::KeyA => EditAction::AdjustChannel { channel: 3, delta: channel_delta },
        KeyCode::Digit1 => EditAction::SelectMargin(MarginSide::Left),
        KeyCode::Digit2 => EditAction::SelectMargin(MarginSide::Right),
        KeyCode::Digit3 => EditAction::SelectMargin(MarginSide::Top),
        KeyCode::Digit4 => EditAction::SelectMargin(MarginSide::Bottom),
        KeyCode::Minus => EditAction::AdjustMargin { delta: -(step as i64) },
        KeyCode::Equal => EditAction::AdjustMargin { delta: step as i64 },
        KeyCode::Space => EditAction::ResetColors,
        _ => return None,
    };
    Some(action)
}

/// Applies an edit. Returns `true` if the settings changed.
///
/// Margin edits are not validated here; an out-of-range margin is reported
/// when the next frame builds its mesh.
pub fn apply(action: EditAction, settings: &mut EditorSettings, state: &mut InputState) -> bool {
    let before = settings.clone();
    match action {
        EditAction::Resize { dw, dh } => {
            settings.size[0] = (settings.size[0] + dw).max(0.0);
            settings.size[1] = (settings.size[1] + dh).max(0.0);
        }
        EditAction::Move { dx, dy } => {
            settings.position[0] += dx;
            settings.position[1] += dy;
        }
        EditAction::SelectVertex { delta } => {
            let next = settings.selected_index().saturating_add_signed(delta);
            settings.select_vertex(next);
        }
        EditAction::AdjustChannel { channel, delta } => {
            let mut color = settings.selected_color();
            color[channel] += delta;
            settings.set_selected_color(color);
        }
        EditAction::SelectMargin(side) => {
            state.margin_side = side;
            return false;
        }
        EditAction::AdjustMargin { delta } => {
            let m = &mut settings.margins;
            let value = match state.margin_side {
                MarginSide::Left => &mut m.left,
                MarginSide::Right => &mut m.right,
                MarginSide::Top => &mut m.top,
                MarginSide::Bottom => &mut m.bottom,
            };
            *value = (*value as i64 + delta).clamp(0, u32::MAX as i64) as u32;
        }
        EditAction::ResetColors => settings.reset_colors(),
    }
    *settings != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use nineslice::VERTEX_COUNT;

    #[test]
    fn test_unmapped_key_is_ignored() {
        assert_eq!(action_for_key(KeyCode::F12, false), None);
    }

    #[test]
    fn test_shift_selects_fine_step() {
        assert_eq!(
            action_for_key(KeyCode::ArrowRight, true),
            Some(EditAction::Resize { dw: 1.0, dh: 0.0 })
        );
        assert_eq!(
            action_for_key(KeyCode::KeyI, false),
            Some(EditAction::Move { dx: 0.0, dy: -10.0 })
        );
    }

    #[test]
    fn test_resize_never_goes_negative() {
        let mut settings = EditorSettings {
            size: [5.0, 5.0],
            ..Default::default()
        };
        let mut state = InputState::default();
        let action = action_for_key(KeyCode::ArrowLeft, false).unwrap();
        assert!(apply(action, &mut settings, &mut state));
        assert_eq!(settings.size, [0.0, 5.0]);
    }

    #[test]
    fn test_vertex_selection_clamped() {
        let mut settings = EditorSettings::default();
        let mut state = InputState::default();

        let prev = EditAction::SelectVertex { delta: -1 };
        assert!(!apply(prev, &mut settings, &mut state));
        assert_eq!(settings.selected_vertex, 0);

        for _ in 0..40 {
            apply(EditAction::SelectVertex { delta: 1 }, &mut settings, &mut state);
        }
        assert_eq!(settings.selected_vertex, VERTEX_COUNT - 1);
    }

    #[test]
    fn test_channel_edit_targets_selected_vertex() {
        let mut settings = EditorSettings::default();
        let mut state = InputState::default();
        settings.select_vertex(5);

        let darker = action_for_key(KeyCode::KeyG, true).unwrap();
        assert!(apply(darker, &mut settings, &mut state));
        let color = settings.colors[5];
        assert!((color[1] - 0.9).abs() < 1e-6);
        assert_eq!(settings.colors[4], nineslice::WHITE);

        // Already at 1.0: brightening changes nothing.
        let brighter = action_for_key(KeyCode::KeyR, false).unwrap();
        assert!(!apply(brighter, &mut settings, &mut state));
    }

    #[test]
    fn test_margin_edit_uses_active_side() {
        let mut settings = EditorSettings::default();
        let mut state = InputState::default();

        apply(
            EditAction::SelectMargin(MarginSide::Bottom),
            &mut settings,
            &mut state,
        );
        assert_eq!(state.margin_side, MarginSide::Bottom);

        let grow = action_for_key(KeyCode::Equal, false).unwrap();
        assert!(apply(grow, &mut settings, &mut state));
        assert_eq!(settings.margins.bottom, 113);
        assert_eq!(settings.margins.top, 103);

        state.margin_side = MarginSide::Left;
        let shrink = EditAction::AdjustMargin { delta: -1000 };
        apply(shrink, &mut settings, &mut state);
        assert_eq!(settings.margins.left, 0);
    }
}
