//! PDF sink for the document compiler.
//!
//! Thin wrapper over `printpdf`: keeps the layout engine's top-left-origin
//! point coordinates and translates them into printpdf's bottom-left
//! millimeter space at the last moment.

use printpdf::image_crate::DynamicImage;
use printpdf::image_crate::GenericImageView;
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Pt,
};

use super::layout::PageMetrics;

/// DPI at which embedded images are declared; the transform rescales them to
/// the fitted layout size.
const IMAGE_DPI: f32 = 300.0;

pub struct PdfSink {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    metrics: PageMetrics,
    layer: PdfLayerReference,
}

impl PdfSink {
    pub fn new(title: &str, metrics: PageMetrics) -> Result<Self, printpdf::Error> {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm::from(Pt(metrics.width as _)),
            Mm::from(Pt(metrics.height as _)),
            "content",
        );
        let layer = doc.get_page(page).get_layer(layer);
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        Ok(Self {
            doc,
            font,
            metrics,
            layer,
        })
    }

    /// Start a new page; subsequent draws land on it.
    pub fn add_page(&mut self) {
        let (page, layer) = self.doc.add_page(
            Mm::from(Pt(self.metrics.width as _)),
            Mm::from(Pt(self.metrics.height as _)),
            "content",
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
    }

    /// Draw a single line of text. `x`/`y` are top-left-origin points; `y` is
    /// the top of the line.
    pub fn text(&self, text: &str, font_size: f32, x: f32, y: f32) {
        // Baseline sits roughly one font size below the top of the line.
        let baseline_from_bottom = self.metrics.height - y - font_size;
        self.layer.use_text(
            text,
            font_size as _,
            Mm::from(Pt(x as _)),
            Mm::from(Pt(baseline_from_bottom as _)),
            &self.font,
        );
    }

    /// Draw an image scaled to `width` x `height` points with its top-left
    /// corner at (`x`, `y`) top-left-origin points.
    pub fn image(&self, image: &DynamicImage, x: f32, y: f32, width: f32, height: f32) {
        let (px_w, px_h) = image.dimensions();
        // Native display size at the declared DPI, in points.
        let native_w = px_w as f32 * 72.0 / IMAGE_DPI;
        let native_h = px_h as f32 * 72.0 / IMAGE_DPI;

        let bottom = self.metrics.height - y - height;
        let transform = ImageTransform {
            translate_x: Some(Mm::from(Pt(x as _))),
            translate_y: Some(Mm::from(Pt(bottom as _))),
            scale_x: Some((width / native_w) as _),
            scale_y: Some((height / native_h) as _),
            dpi: Some(IMAGE_DPI as _),
            ..Default::default()
        };

        Image::from_dynamic_image(image).add_to_layer(self.layer.clone(), transform);
    }

    /// Finalize the document and return its bytes.
    pub fn finish(self) -> Result<Vec<u8>, printpdf::Error> {
        self.doc.save_to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::layout;

    #[test]
    fn produces_a_pdf_header() {
        let sink = PdfSink::new("test", PageMetrics::default()).unwrap();
        sink.text("hello", layout::BODY_FONT_SIZE, 72.0, 72.0);
        let bytes = sink.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn multi_page_document_renders() {
        let mut sink = PdfSink::new("test", PageMetrics::default()).unwrap();
        sink.text("page one", layout::BODY_FONT_SIZE, 72.0, 72.0);
        sink.add_page();
        sink.text("page two", layout::BODY_FONT_SIZE, 72.0, 72.0);
        let bytes = sink.finish().unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn image_draw_does_not_panic() {
        let mut sink = PdfSink::new("test", PageMetrics::default()).unwrap();
        let image = DynamicImage::new_rgb8(4, 4);
        sink.image(&image, 72.0, 72.0, 468.0, 468.0);
        sink.add_page();
        let bytes = sink.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
