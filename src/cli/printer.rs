use crossterm::queue;
use crossterm::style::{
    Attribute, Attributes, Color as TermColor, ContentStyle, Print, PrintStyledContent,
    StyledContent,
};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use std::io::{self, Write};

/// Writes themed lines as ANSI-styled text, or plain text when `colored` is off.
pub(crate) fn write_lines<W: Write>(
    out: &mut W,
    lines: &[Line<'static>],
    colored: bool,
) -> io::Result<()> {
    for line in lines {
        write_spans(out, line, colored)?;
        queue!(out, Print("\n"))?;
    }
    out.flush()
}

/// Writes a prompt without a trailing newline.
pub(crate) fn write_prompt<W: Write>(
    out: &mut W,
    prompt: &Line<'static>,
    colored: bool,
) -> io::Result<()> {
    write_spans(out, prompt, colored)?;
    out.flush()
}

fn write_spans<W: Write>(out: &mut W, line: &Line<'static>, colored: bool) -> io::Result<()> {
    for span in &line.spans {
        let style = line.style.patch(span.style);
        if colored && style != Style::default() {
            queue!(
                out,
                PrintStyledContent(StyledContent::new(
                    content_style(style),
                    span.content.as_ref()
                ))
            )?;
        } else {
            queue!(out, Print(span.content.as_ref()))?;
        }
    }
    Ok(())
}

fn content_style(style: Style) -> ContentStyle {
    let mut content = ContentStyle::new();
    content.foreground_color = style.fg.map(term_color);
    content.background_color = style.bg.map(term_color);
    content.attributes = term_attributes(style.add_modifier);
    content
}

fn term_color(color: Color) -> TermColor {
    match color {
        Color::Reset => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::Gray => TermColor::Grey,
        Color::DarkGray => TermColor::DarkGrey,
        Color::LightRed => TermColor::Red,
        Color::LightGreen => TermColor::Green,
        Color::LightYellow => TermColor::Yellow,
        Color::LightBlue => TermColor::Blue,
        Color::LightMagenta => TermColor::Magenta,
        Color::LightCyan => TermColor::Cyan,
        Color::White => TermColor::White,
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        Color::Indexed(index) => TermColor::AnsiValue(index),
    }
}

fn term_attributes(modifier: Modifier) -> Attributes {
    const MAPPING: [(Modifier, Attribute); 9] = [
        (Modifier::BOLD, Attribute::Bold),
        (Modifier::DIM, Attribute::Dim),
        (Modifier::ITALIC, Attribute::Italic),
        (Modifier::UNDERLINED, Attribute::Underlined),
        (Modifier::SLOW_BLINK, Attribute::SlowBlink),
        (Modifier::RAPID_BLINK, Attribute::RapidBlink),
        (Modifier::REVERSED, Attribute::Reverse),
        (Modifier::HIDDEN, Attribute::Hidden),
        (Modifier::CROSSED_OUT, Attribute::CrossedOut),
    ];

    let mut attributes = Attributes::default();
    for (flag, attribute) in MAPPING {
        if modifier.contains(flag) {
            attributes.set(attribute);
        }
    }
    attributes
}
