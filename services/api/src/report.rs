//! services/api/src/report.rs
//!
//! Renders the "last exam" report as a single-page US Letter PDF, fully
//! built in memory before any bytes are handed to the response.

use chrono::{Local, TimeZone};
use exam_record_core::domain::ExamDocument;
use printpdf::{BuiltinFont, Color, Line, Mm, PdfDocument, Point, Rgb};
use serde_json::Value;

/// A custom error type for report rendering failures.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("PDF rendering failed: {0}")]
    Pdf(#[from] printpdf::Error),
}

// US Letter, in millimetres.
const PAGE_WIDTH: Mm = Mm(215.9);
const PAGE_HEIGHT: Mm = Mm(279.4);
const LEFT_MARGIN: Mm = Mm(25.4);

const ROSE: Color = Color::Rgb(Rgb {
    r: 0.9,
    g: 0.4,
    b: 0.6,
    icc_profile: None,
});
const BLACK: Color = Color::Rgb(Rgb {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    icc_profile: None,
});

fn text_field<'a>(exam: &'a ExamDocument, key: &str) -> &'a str {
    exam.get(key).and_then(Value::as_str).unwrap_or("unknown")
}

/// `DD/MM/YYYY HH:MM` in the server's local timezone.
fn format_timestamp(exam: &ExamDocument) -> String {
    exam.get("timestamp")
        .and_then(Value::as_i64)
        .and_then(|secs| Local.timestamp_opt(secs, 0).single())
        .map(|dt| dt.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// The stored score, or a placeholder for sessions that never received one.
fn format_score(exam: &ExamDocument) -> String {
    exam.get("score")
        .and_then(Value::as_f64)
        .map(|score| format!("{:.1} / 100", score))
        .unwrap_or_else(|| "not yet scored".to_string())
}

/// Renders the report for the given exam document and returns the complete
/// PDF byte buffer.
pub fn render_exam_report(exam: &ExamDocument) -> Result<Vec<u8>, ReportError> {
    let (doc, page_index, layer_index) =
        PdfDocument::new("Examination Results Report", PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
    let layer = doc.get_page(page_index).get_layer(layer_index);

    let title_font = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let body_font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let footer_font = doc.add_builtin_font(BuiltinFont::HelveticaOblique)?;

    // Title, roughly centered on the page.
    layer.set_fill_color(ROSE);
    layer.use_text("Examination Results Report", 22.0, Mm(57.0), Mm(254.0), &title_font);
    layer.set_fill_color(BLACK);

    // Separator rule under the title.
    layer.set_outline_color(ROSE);
    layer.set_outline_thickness(1.5);
    layer.add_line(Line {
        points: vec![
            (Point::new(LEFT_MARGIN, Mm(246.4)), false),
            (Point::new(Mm(190.5), Mm(246.4)), false),
        ],
        is_closed: false,
    });

    // Exam information section.
    let rows = [
        ("Email:", text_field(exam, "email").to_string()),
        ("Exam ID:", text_field(exam, "exam_id").to_string()),
        ("Session ID:", text_field(exam, "session_id").to_string()),
        ("Date/Time:", format_timestamp(exam)),
        ("Score:", format_score(exam)),
    ];
    let mut y = 238.8;
    for (label, value) in rows {
        layer.use_text(label, 12.0, LEFT_MARGIN, Mm(y), &body_font);
        layer.use_text(value, 12.0, Mm(60.0), Mm(y), &body_font);
        y -= 8.9;
    }

    // Footer caption.
    layer.use_text(
        "Confidential Report - Generated by Exam Record Service",
        8.0,
        LEFT_MARGIN,
        Mm(12.7),
        &footer_font,
    );

    Ok(doc.save_to_bytes()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_record_core::domain::ExamSession;
    use serde_json::json;

    #[test]
    fn rendered_report_is_a_pdf() {
        let mut exam = ExamSession::begin("a@b.com".into(), "rust-101".into(), 1_700_000_000)
            .into_document();
        exam.insert("score".to_string(), json!(87.5));

        let bytes = render_exam_report(&exam).expect("render report");
        assert!(bytes.starts_with(b"%PDF"));
        assert!(!bytes.is_empty());
    }

    #[test]
    fn session_without_result_still_renders() {
        let exam = ExamSession::begin("a@b.com".into(), "rust-101".into(), 1_700_000_000)
            .into_document();
        let bytes = render_exam_report(&exam).expect("render report");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_document_falls_back_to_placeholders() {
        let exam = ExamDocument::new();
        let bytes = render_exam_report(&exam).expect("render report");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn score_line_uses_the_stored_score() {
        let mut exam = ExamDocument::new();
        exam.insert("score".to_string(), json!(42.0));
        assert_eq!(format_score(&exam), "42.0 / 100");
        exam.remove("score");
        assert_eq!(format_score(&exam), "not yet scored");
    }
}
