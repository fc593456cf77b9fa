use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point,
};

use crate::report::charts::RenderedChart;
use crate::report::table::{abbreviate, PreviewRow, TABLE_HEADERS};

// Landscape A4.
const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 10.0;

const TITLE: &str = "Uniswap Swap Data Analysis";
const COLUMN_WIDTHS: [f32; 7] = [40.0, 50.0, 30.0, 30.0, 40.0, 40.0, 30.0];
const ROW_HEIGHT: f32 = 8.0;
const LINE_HEIGHT: f32 = 10.0;
const CHART_TOP: f32 = 30.0;
const CHART_MAX_WIDTH: f32 = 260.0;

const PT_TO_MM: f32 = 0.3528;

/// Inputs for the landscape swap report.
pub struct PdfReport<'a> {
    pub total_swaps: usize,
    pub rows: &'a [PreviewRow],
    pub correlation: Option<&'a RenderedChart>,
    pub distribution: Option<&'a RenderedChart>,
}

/// Top-down layout cursor over one page layer. printpdf places text from
/// the bottom-left corner, so every position goes through `baseline`.
struct PageWriter {
    layer: PdfLayerReference,
    y: f32,
}

impl PageWriter {
    fn new(layer: PdfLayerReference) -> Self {
        Self { layer, y: MARGIN }
    }

    fn baseline(&self, top: f32, height: f32, font_size: f32) -> Mm {
        // Vertically centre the cap height in the cell.
        let cap = font_size * PT_TO_MM * 0.7;
        Mm(PAGE_HEIGHT - top - (height + cap) / 2.0)
    }

    fn ln(&mut self, height: f32) {
        self.y += height;
    }

    /// Full-width text line, left-aligned or centred.
    fn cell(&mut self, text: &str, font: &IndirectFontRef, size: f32, centered: bool) {
        let width = PAGE_WIDTH - 2.0 * MARGIN;
        let x = if centered {
            MARGIN + (width - text_width(text, size)).max(0.0) / 2.0
        } else {
            MARGIN
        };
        self.layer
            .use_text(pdf_text(text), size, Mm(x), self.baseline(self.y, LINE_HEIGHT, size), font);
        self.y += LINE_HEIGHT;
    }

    /// Bordered, centred table row; does not advance the cursor.
    fn table_row(&self, cells: &[&str], font: &IndirectFontRef, size: f32) {
        let mut x = MARGIN;
        for (text, width) in cells.iter().zip(COLUMN_WIDTHS) {
            self.border(x, self.y, width, ROW_HEIGHT);
            let max_chars = (width / (size * PT_TO_MM * 0.5)) as usize;
            let fitted = abbreviate(text, max_chars.saturating_sub(1));
            let text_x = x + (width - text_width(&fitted, size)).max(0.0) / 2.0;
            self.layer.use_text(
                pdf_text(&fitted),
                size,
                Mm(text_x),
                self.baseline(self.y, ROW_HEIGHT, size),
                font,
            );
            x += width;
        }
    }

    fn border(&self, x: f32, top: f32, width: f32, height: f32) {
        let bottom = PAGE_HEIGHT - top - height;
        let points = vec![
            (Point::new(Mm(x), Mm(bottom)), false),
            (Point::new(Mm(x + width), Mm(bottom)), false),
            (Point::new(Mm(x + width), Mm(bottom + height)), false),
            (Point::new(Mm(x), Mm(bottom + height)), false),
        ];
        self.layer.add_line(Line {
            points,
            is_closed: true,
        });
    }

    /// Place a chart at `CHART_TOP`, scaled to fit the page below it.
    fn chart(&self, chart: &RenderedChart) -> eyre::Result<()> {
        let max_height = PAGE_HEIGHT - CHART_TOP - MARGIN;
        let scale = (CHART_MAX_WIDTH / chart.width as f32).min(max_height / chart.height as f32);
        let width_mm = chart.width as f32 * scale;
        let height_mm = chart.height as f32 * scale;
        let dpi = chart.width as f32 * 25.4 / width_mm;

        let image = Image::from_dynamic_image(&chart.to_image()?);
        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(PAGE_HEIGHT - CHART_TOP - height_mm)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        Ok(())
    }
}

/// Rough Helvetica advance width; builtin fonts carry no metrics in printpdf.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * PT_TO_MM * 0.5
}

/// Builtin fonts are written with a single-byte encoding; non-ASCII becomes `?`.
fn pdf_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

/// Heading above the transactions table.
fn table_heading(rows: usize) -> String {
    format!("Top {} Transactions:", rows)
}

/// Body rows that fit below a header row drawn at `top`.
fn rows_fitting(top: f32) -> usize {
    let body_top = top + ROW_HEIGHT;
    ((PAGE_HEIGHT - MARGIN - body_top) / ROW_HEIGHT).max(1.0) as usize
}

/// Split `rows` table rows into per-page counts. The first page's table starts
/// at `first_top`, continuation pages at the top margin.
fn table_pages(rows: usize, first_top: f32) -> Vec<usize> {
    let mut pages = Vec::new();
    let mut left = rows;
    let mut top = first_top;
    loop {
        let take = left.min(rows_fitting(top));
        pages.push(take);
        left -= take;
        if left == 0 {
            return pages;
        }
        top = MARGIN;
    }
}

fn add_page(doc: &PdfDocumentReference, name: &str) -> PdfLayerReference {
    let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), name);
    doc.get_page(page).get_layer(layer)
}

/// Render the report to PDF bytes: summary table on page one (continued on
/// further pages, header repeated, when it does not fit), then one page per
/// chart that is present.
pub fn build_report_pdf(report: &PdfReport<'_>) -> eyre::Result<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new(TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Summary");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| eyre::eyre!("Failed to load PDF font: {}", e))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| eyre::eyre!("Failed to load PDF font: {}", e))?;

    let mut writer = PageWriter::new(doc.get_page(page).get_layer(layer));
    writer.cell(TITLE, &bold, 16.0, true);
    writer.ln(10.0);
    writer.cell(&format!("Total Swaps: {}", report.total_swaps), &regular, 12.0, false);
    writer.ln(5.0);
    writer.cell(&table_heading(report.rows.len()), &regular, 12.0, false);
    writer.ln(5.0);

    let mut remaining = report.rows;
    for (index, count) in table_pages(report.rows.len(), writer.y).into_iter().enumerate() {
        if index > 0 {
            writer = PageWriter::new(add_page(&doc, "Transactions (continued)"));
        }
        writer.table_row(&TABLE_HEADERS, &bold, 10.0);
        writer.ln(ROW_HEIGHT);

        let (page_rows, rest) = remaining.split_at(count);
        for row in page_rows {
            writer.table_row(&row.cells(), &regular, 9.0);
            writer.ln(ROW_HEIGHT);
        }
        remaining = rest;
    }

    let charts = [
        ("Correlation Plot:", report.correlation),
        ("Price Distribution:", report.distribution),
    ];
    for (heading, chart) in charts {
        let Some(chart) = chart else { continue };
        let mut writer = PageWriter::new(add_page(&doc, heading));
        writer.cell(heading, &regular, 12.0, false);
        writer.chart(chart)?;
    }

    doc.save_to_bytes()
        .map_err(|e| eyre::eyre!("Failed to serialize PDF: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(amount0: &str) -> PreviewRow {
        PreviewRow {
            timestamp: "2023-11-14 22:13:20".to_string(),
            sender: "0x3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad".to_string(),
            token0: "WETH".to_string(),
            token1: "USDC".to_string(),
            amount0: amount0.to_string(),
            amount1: "-2041.56".to_string(),
            price: "$2041.50".to_string(),
        }
    }

    #[test]
    fn test_summary_only_pdf() {
        let rows = vec![row("0.75"), row("N/A")];
        let bytes = build_report_pdf(&PdfReport {
            total_swaps: 2,
            rows: &rows,
            correlation: None,
            distribution: None,
        })
        .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_pdf_with_chart_pages() {
        let chart = RenderedChart {
            width: 80,
            height: 60,
            rgb: vec![128; 80 * 60 * 3],
        };
        let rows = vec![row("1.00")];
        let with_charts = build_report_pdf(&PdfReport {
            total_swaps: 1,
            rows: &rows,
            correlation: Some(&chart),
            distribution: Some(&chart),
        })
        .unwrap();
        let without = build_report_pdf(&PdfReport {
            total_swaps: 1,
            rows: &rows,
            correlation: None,
            distribution: None,
        })
        .unwrap();
        assert!(with_charts.starts_with(b"%PDF"));
        assert!(with_charts.len() > without.len());
    }

    #[test]
    fn test_long_table_breaks_across_pages() {
        // Title block leaves the first table header at 60mm.
        assert_eq!(table_pages(10, 60.0), vec![10]);
        assert_eq!(table_pages(16, 60.0), vec![16]);
        assert_eq!(table_pages(30, 60.0), vec![16, 14]);
        assert_eq!(table_pages(40, 60.0), vec![16, 22, 2]);
        assert_eq!(table_pages(0, 60.0), vec![0]);

        // The last row of a full page still ends above the bottom margin.
        let last_bottom = 60.0 + ROW_HEIGHT * (1 + rows_fitting(60.0)) as f32;
        assert!(last_bottom <= PAGE_HEIGHT - MARGIN);
        let last_bottom = MARGIN + ROW_HEIGHT * (1 + rows_fitting(MARGIN)) as f32;
        assert!(last_bottom <= PAGE_HEIGHT - MARGIN);

        let rows: Vec<PreviewRow> = (0..40).map(|i| row(&format!("{}.00", i))).collect();
        let long = build_report_pdf(&PdfReport {
            total_swaps: 40,
            rows: &rows,
            correlation: None,
            distribution: None,
        })
        .unwrap();
        let short = build_report_pdf(&PdfReport {
            total_swaps: 40,
            rows: &rows[..10],
            correlation: None,
            distribution: None,
        })
        .unwrap();
        assert!(long.starts_with(b"%PDF"));
        assert!(long.len() > short.len());
    }

    #[test]
    fn test_table_heading_counts_rows() {
        assert_eq!(table_heading(10), "Top 10 Transactions:");
        assert_eq!(table_heading(3), "Top 3 Transactions:");
    }

    #[test]
    fn test_pdf_text_replaces_non_ascii() {
        assert_eq!(pdf_text("WETH"), "WETH");
        assert_eq!(pdf_text("\u{1F984}UNI"), "?UNI");
    }
}
