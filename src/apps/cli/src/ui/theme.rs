//! Color palettes for the light and dark themes

use lightchat_core::Theme;
use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub foreground: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub user: Color,
    pub assistant: Color,
    pub code: Color,
    pub code_background: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self::light(),
            Theme::Dark => Self::dark(),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::Rgb(250, 250, 250),
            foreground: Color::Rgb(30, 30, 30),
            muted: Color::Rgb(120, 120, 120),
            accent: Color::Rgb(37, 99, 235),
            border: Color::Rgb(200, 200, 200),
            user: Color::Rgb(22, 101, 52),
            assistant: Color::Rgb(30, 64, 175),
            code: Color::Rgb(190, 18, 60),
            code_background: Color::Rgb(235, 235, 235),
            success: Color::Rgb(22, 163, 74),
            warning: Color::Rgb(202, 138, 4),
            error: Color::Rgb(220, 38, 38),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::Rgb(24, 24, 27),
            foreground: Color::Rgb(228, 228, 231),
            muted: Color::Rgb(140, 140, 150),
            accent: Color::Rgb(96, 165, 250),
            border: Color::Rgb(63, 63, 70),
            user: Color::Rgb(134, 239, 172),
            assistant: Color::Rgb(147, 197, 253),
            code: Color::Rgb(251, 146, 60),
            code_background: Color::Rgb(39, 39, 42),
            success: Color::Rgb(74, 222, 128),
            warning: Color::Rgb(250, 204, 21),
            error: Color::Rgb(248, 113, 113),
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn inline_code(&self) -> Style {
        Style::default().fg(self.code).bg(self.code_background)
    }

    pub fn code_block(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.code_background)
    }
}
