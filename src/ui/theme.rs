use ratatui::style::Color;

use crate::review::Phase;

pub const BORDER: Color = Color::Rgb(0x00, 0x79, 0xBF);

pub fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Reviewing => Color::Cyan,
        Phase::Finished => Color::Green,
        Phase::Quit => Color::Yellow,
    }
}
