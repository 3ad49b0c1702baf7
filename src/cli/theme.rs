use crate::config::{
    HexColor, StyleOverride, ThemeConfig as UserThemeConfig, ThemeModifier, ThemePreset, ThemeToken,
};
use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Theme {
    enabled: bool,
    styles: HashMap<ThemeToken, Style>,
}

impl Theme {
    #[cfg(test)]
    pub fn new(enabled: bool) -> Self {
        Self::from_config(enabled, &UserThemeConfig::default())
    }

    pub fn from_config(enabled: bool, config: &UserThemeConfig) -> Self {
        let mut styles = preset_styles(config.preset);
        for (token, override_style) in &config.styles {
            let base = styles.get(token).copied().unwrap_or_default();
            styles.insert(*token, merge_style(base, override_style));
        }

        Self { enabled, styles }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn style(&self, token: ThemeToken) -> Style {
        if !self.enabled {
            return disabled_style(token);
        }

        self.styles.get(&token).copied().unwrap_or_default()
    }
}

fn preset_styles(preset: ThemePreset) -> HashMap<ThemeToken, Style> {
    ThemeToken::all()
        .iter()
        .copied()
        .map(|token| (token, preset_style(preset, token)))
        .collect()
}

fn preset_style(preset: ThemePreset, token: ThemeToken) -> Style {
    let palette = match preset {
        ThemePreset::Default => &DEFAULT_PALETTE,
        ThemePreset::Light => &LIGHT_PALETTE,
        ThemePreset::HighContrast => &HIGH_CONTRAST_PALETTE,
    };
    palette.style(token)
}

/// Colors a preset assigns to each role; modifiers are shared across presets.
struct Palette {
    quiz: Color,
    option: Color,
    chat: Color,
    input: Color,
    assistant: Color,
    muted: Color,
    diagram: Color,
    panel: Color,
    info: Color,
    error: Color,
}

const DEFAULT_PALETTE: Palette = Palette {
    quiz: Color::Rgb(122, 162, 247),
    option: Color::Rgb(192, 202, 245),
    chat: Color::Rgb(158, 206, 106),
    input: Color::White,
    assistant: Color::Rgb(224, 175, 104),
    muted: Color::Rgb(138, 138, 138),
    diagram: Color::Rgb(125, 207, 255),
    panel: Color::Rgb(187, 154, 247),
    info: Color::Rgb(86, 95, 137),
    error: Color::Rgb(247, 118, 142),
};

const LIGHT_PALETTE: Palette = Palette {
    quiz: Color::Rgb(31, 111, 235),
    option: Color::Rgb(36, 41, 47),
    chat: Color::Rgb(5, 80, 40),
    input: Color::Rgb(36, 41, 47),
    assistant: Color::Rgb(130, 70, 0),
    muted: Color::Rgb(80, 90, 110),
    diagram: Color::Rgb(9, 105, 218),
    panel: Color::Rgb(110, 64, 170),
    info: Color::Rgb(36, 70, 120),
    error: Color::Rgb(176, 0, 32),
};

const HIGH_CONTRAST_PALETTE: Palette = Palette {
    quiz: Color::Rgb(135, 206, 250),
    option: Color::Rgb(255, 255, 255),
    chat: Color::Rgb(0, 255, 127),
    input: Color::Rgb(255, 255, 255),
    assistant: Color::Rgb(255, 215, 0),
    muted: Color::Rgb(220, 220, 220),
    diagram: Color::Rgb(0, 255, 255),
    panel: Color::Rgb(255, 128, 255),
    info: Color::Rgb(173, 216, 230),
    error: Color::Rgb(255, 64, 64),
};

impl Palette {
    fn style(&self, token: ThemeToken) -> Style {
        let base = Style::default();
        match token {
            ThemeToken::QuizPrompt => base.fg(self.quiz).add_modifier(Modifier::BOLD),
            ThemeToken::QuizOption => base.fg(self.option),
            ThemeToken::QuizProgress => base.fg(self.muted).add_modifier(Modifier::ITALIC),
            ThemeToken::ChatPrompt => base.fg(self.chat).add_modifier(Modifier::BOLD),
            ThemeToken::UserInput => base.fg(self.input),
            ThemeToken::AssistantText => base.fg(self.assistant),
            ThemeToken::AssistantWaiting => base
                .fg(self.assistant)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ThemeToken::ToolRequest => base.fg(self.muted).add_modifier(Modifier::ITALIC),
            ThemeToken::ToolResult => base.fg(self.muted),
            ThemeToken::Diagram => base.fg(self.diagram),
            ThemeToken::CareerPanel => base.fg(self.panel),
            ThemeToken::SystemInfo => base.fg(self.info),
            ThemeToken::SystemError => base.fg(self.error).add_modifier(Modifier::BOLD),
        }
    }
}

fn disabled_style(token: ThemeToken) -> Style {
    match token {
        ThemeToken::QuizPrompt | ThemeToken::ChatPrompt => {
            Style::default().add_modifier(Modifier::BOLD)
        }
        _ => Style::default(),
    }
}

fn merge_style(base: Style, override_style: &StyleOverride) -> Style {
    let mut merged = base;

    if let Some(fg) = override_style.fg {
        merged = merged.fg(color_from_hex(fg));
    }

    if let Some(bg) = override_style.bg {
        merged = merged.bg(color_from_hex(bg));
    }

    if let Some(modifiers) = &override_style.modifiers {
        merged = merged
            .remove_modifier(Modifier::all())
            .add_modifier(modifiers_to_modifier(modifiers));
    }

    merged
}

fn color_from_hex(color: HexColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

fn modifiers_to_modifier(modifiers: &[ThemeModifier]) -> Modifier {
    modifiers
        .iter()
        .copied()
        .fold(Modifier::empty(), |acc, modifier| {
            acc | modifier_to_ratatui(modifier)
        })
}

fn modifier_to_ratatui(modifier: ThemeModifier) -> Modifier {
    match modifier {
        ThemeModifier::Bold => Modifier::BOLD,
        ThemeModifier::Dim => Modifier::DIM,
        ThemeModifier::Italic => Modifier::ITALIC,
        ThemeModifier::Underlined => Modifier::UNDERLINED,
        ThemeModifier::SlowBlink => Modifier::SLOW_BLINK,
        ThemeModifier::RapidBlink => Modifier::RAPID_BLINK,
        ThemeModifier::Reversed => Modifier::REVERSED,
        ThemeModifier::Hidden => Modifier::HIDDEN,
        ThemeModifier::CrossedOut => Modifier::CROSSED_OUT,
    }
}
