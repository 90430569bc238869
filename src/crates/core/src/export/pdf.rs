use super::layout::{layout_conversation, LineKind, TextLine};
use super::{ConversationRenderer, ExportFormat, RenderContext};
use crate::chat::message::Message;
use crate::util::errors::{LightChatError, LightChatResult};
use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rgb};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 18.0;
const LINE_HEIGHT_MM: f32 = 5.5;
const FONT_SIZE: f32 = 10.0;
const TITLE_FONT_SIZE: f32 = 14.0;
const COLUMNS: usize = 90;
const LAYER_NAME: &str = "Conversation";

/// A4 document set in the built-in Helvetica faces. Those fonts only cover
/// Latin-1, so other characters are written as `?`.
pub struct PdfRenderer;

pub(super) fn lines_per_page() -> usize {
    ((PAGE_HEIGHT_MM - 2.0 * MARGIN_MM) / LINE_HEIGHT_MM) as usize
}

/// Split the laid out lines into pages, never starting a page with a gap.
pub(super) fn paginate(lines: &[TextLine], per_page: usize) -> Vec<&[TextLine]> {
    let per_page = per_page.max(1);
    let mut pages = Vec::new();
    let mut rest = lines;
    while !rest.is_empty() {
        while rest.first().is_some_and(|line| line.kind == LineKind::Gap) && !pages.is_empty() {
            rest = &rest[1..];
        }
        if rest.is_empty() {
            break;
        }
        let take = per_page.min(rest.len());
        pages.push(&rest[..take]);
        rest = &rest[take..];
    }
    pages
}

fn latin1(text: &str) -> String {
    text.chars()
        .map(|ch| if (ch as u32) < 0x100 && !ch.is_control() { ch } else { '?' })
        .collect()
}

fn write_page(layer: &PdfLayerReference, lines: &[TextLine], regular: &IndirectFontRef, bold: &IndirectFontRef) {
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
    for line in lines {
        let (font, size, shade) = match line.kind {
            LineKind::Title => (bold, TITLE_FONT_SIZE, 0.2),
            LineKind::Speaker => (bold, FONT_SIZE, 0.3),
            LineKind::Body | LineKind::Gap => (regular, FONT_SIZE, 0.1),
        };
        if !line.text.is_empty() {
            layer.set_fill_color(Color::Rgb(Rgb::new(shade, shade, shade, None)));
            layer.use_text(latin1(&line.text), size, Mm(MARGIN_MM), Mm(y), font);
        }
        y -= LINE_HEIGHT_MM;
    }
}

impl ConversationRenderer for PdfRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn render(&self, messages: &[Message], context: &RenderContext) -> LightChatResult<Vec<u8>> {
        let lines = layout_conversation(messages, context, COLUMNS);
        let pages = paginate(&lines, lines_per_page());

        let (doc, first_page, first_layer) = PdfDocument::new(
            latin1(&context.title),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            LAYER_NAME,
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| LightChatError::render(format!("PDF font failed: {}", e)))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| LightChatError::render(format!("PDF font failed: {}", e)))?;

        for (index, page_lines) in pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
                doc.get_page(page).get_layer(layer)
            };
            write_page(&layer, page_lines, &regular, &bold);
        }

        doc.save_to_bytes()
            .map_err(|e| LightChatError::render(format!("PDF encoding failed: {}", e)))
    }
}
