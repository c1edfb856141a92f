//! Single-page PDF writer used by the headless engine.

use std::fmt::Write as _;

const MARGIN: f64 = 72.0;
const LEADING: f64 = 14.0;

/// Lay `lines` out top to bottom in Helvetica on one page of
/// `width` x `height` points.
pub(crate) fn render(lines: &[&str], width: f64, height: f64) -> Vec<u8> {
    let mut content = String::new();
    let _ = write!(
        content,
        "BT /F1 12 Tf {LEADING} TL {MARGIN} {:.2} Td",
        height - MARGIN
    );
    for line in lines {
        let _ = write!(content, " ({}) Tj T*", escape(line));
    }
    content.push_str(" ET");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {width:.2} {height:.2}] \
             /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>"
        ),
        format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{body}\nendobj\n", i + 1);
    }

    let xref_at = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(out, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    );
    out.into_bytes()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_framed_as_pdf() {
        let pdf = String::from_utf8(render(&["hello"], 612.0, 792.0)).unwrap();
        assert!(pdf.starts_with("%PDF-1.4\n"));
        assert!(pdf.trim_end().ends_with("%%EOF"));
        assert!(pdf.contains("(hello) Tj"));
        assert!(pdf.contains("/MediaBox [0 0 612.00 792.00]"));
    }

    #[test]
    fn xref_points_at_objects() {
        let pdf = String::from_utf8(render(&["a", "b"], 100.0, 100.0)).unwrap();
        let xref_at: usize = pdf
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|n| n.parse().ok())
            .unwrap();
        assert!(pdf[xref_at..].starts_with("xref"));

        let first_entry = pdf[xref_at..].lines().nth(3).unwrap();
        let offset: usize = first_entry[..10].parse().unwrap();
        assert!(pdf[offset..].starts_with("1 0 obj"));
    }

    #[test]
    fn parentheses_are_escaped() {
        assert_eq!(escape("f(x) \\ y"), "f\\(x\\) \\\\ y");
        assert_eq!(escape("café"), "caf?");
    }
}
