use super::layout::{layout_conversation, LineKind, TextLine};
use super::{ConversationRenderer, ExportFormat, RenderContext};
use crate::chat::message::{Message, MessageRole};
use crate::settings::Theme;
use crate::util::errors::{LightChatError, LightChatResult};
use font8x8::{UnicodeFonts, BASIC_FONTS, BOX_FONTS, GREEK_FONTS, LATIN_FONTS};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

const SCALE: u32 = 2;
const GLYPH_SIZE: u32 = 8 * SCALE;
const LINE_HEIGHT: u32 = GLYPH_SIZE + 6;
const MARGIN: u32 = 24;
const COLUMNS: usize = 72;

/// Snapshot of the conversation as a PNG, drawn with an 8x8 bitmap font.
/// Characters the font lacks are drawn as `?`.
pub struct PngRenderer;

struct Palette {
    background: Rgb<u8>,
    text: Rgb<u8>,
    title: Rgb<u8>,
    user_bubble: Rgb<u8>,
    robot_bubble: Rgb<u8>,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            background: Rgb([0xf7, 0xf7, 0xf8]),
            text: Rgb([0x1f, 0x23, 0x28]),
            title: Rgb([0x4f, 0x46, 0xe5]),
            user_bubble: Rgb([0xff, 0xff, 0xff]),
            robot_bubble: Rgb([0xee, 0xf2, 0xff]),
        },
        Theme::Dark => Palette {
            background: Rgb([0x1e, 0x1f, 0x22]),
            text: Rgb([0xe6, 0xe6, 0xe6]),
            title: Rgb([0xa5, 0xb4, 0xfc]),
            user_bubble: Rgb([0x2b, 0x2d, 0x31]),
            robot_bubble: Rgb([0x31, 0x34, 0x45]),
        },
    }
}

fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
        .or_else(|| BOX_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn draw_text(image: &mut RgbImage, x: u32, y: u32, text: &str, color: Rgb<u8>) {
    for (index, ch) in text.chars().enumerate() {
        let origin_x = x + index as u32 * GLYPH_SIZE;
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..8u32 {
                // Bit 0 is the leftmost pixel.
                if bits & (1 << col) == 0 {
                    continue;
                }
                for dy in 0..SCALE {
                    for dx in 0..SCALE {
                        let px = origin_x + col * SCALE + dx;
                        let py = y + row as u32 * SCALE + dy;
                        if px < image.width() && py < image.height() {
                            image.put_pixel(px, py, color);
                        }
                    }
                }
            }
        }
    }
}

fn fill_band(image: &mut RgbImage, y: u32, height: u32, color: Rgb<u8>) {
    let right = image.width().saturating_sub(MARGIN / 2);
    for py in y..(y + height).min(image.height()) {
        for px in MARGIN / 2..right {
            image.put_pixel(px, py, color);
        }
    }
}

fn draw_lines(lines: &[TextLine], colors: &Palette) -> RgbImage {
    let width = MARGIN * 2 + COLUMNS as u32 * GLYPH_SIZE;
    let height = MARGIN * 2 + lines.len() as u32 * LINE_HEIGHT;
    let mut image = RgbImage::from_pixel(width, height, colors.background);

    for (index, line) in lines.iter().enumerate() {
        let top = MARGIN + index as u32 * LINE_HEIGHT;
        if let Some(role) = line.role {
            let bubble = match role {
                MessageRole::User => colors.user_bubble,
                _ => colors.robot_bubble,
            };
            fill_band(&mut image, top, LINE_HEIGHT, bubble);
        }
        let color = match line.kind {
            LineKind::Title | LineKind::Speaker => colors.title,
            LineKind::Body | LineKind::Gap => colors.text,
        };
        draw_text(&mut image, MARGIN, top + (LINE_HEIGHT - GLYPH_SIZE) / 2, &line.text, color);
    }
    image
}

impl ConversationRenderer for PngRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Png
    }

    fn render(&self, messages: &[Message], context: &RenderContext) -> LightChatResult<Vec<u8>> {
        let lines = layout_conversation(messages, context, COLUMNS);
        let image = draw_lines(&lines, &palette(context.theme));

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| LightChatError::render(format!("PNG encoding failed: {}", e)))?;
        Ok(bytes)
    }
}
