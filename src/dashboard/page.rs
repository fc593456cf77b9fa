use crate::report::table::{PreviewRow, TABLE_HEADERS};
use crate::report::ReportData;

const EMPTY_WARNING: &str = "No swap data available. Run the fetch command first.";

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn preview_table(rows: &[PreviewRow]) -> String {
    let mut html = String::from("<table>\n<thead><tr>");
    for header in TABLE_HEADERS {
        html.push_str(&format!("<th>{}</th>", header));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        html.push_str("<tr>");
        for cell in row.cells() {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

/// The dashboard page. With no data only the warning is shown.
pub fn render_dashboard(data: &ReportData, preview_rows: usize) -> String {
    let mut body = String::new();

    if data.is_empty() {
        body.push_str(&format!("<p class=\"warning\">{}</p>\n", EMPTY_WARNING));
    } else {
        if let Some(snapshot) = &data.snapshot {
            body.push_str(&format!(
                "<p class=\"meta\">Snapshot #{} fetched {}</p>\n",
                snapshot.generation,
                snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
            ));
        }
        body.push_str(&format!("<p>Total Swaps: {}</p>\n", data.swaps.len()));

        body.push_str("<h2>Data Preview</h2>\n");
        body.push_str(&preview_table(&data.preview(preview_rows)));

        body.push_str(
            "<div class=\"charts\">\n\
             <div><h2>Correlation Plot</h2><img src=\"/charts/correlation.png\" alt=\"Correlation heatmap\"></div>\n\
             <div><h2>Price Distribution</h2><img src=\"/charts/price_distribution.png\" alt=\"Price distribution\"></div>\n\
             </div>\n",
        );
        body.push_str(
            "<p><a class=\"button\" href=\"/report.pdf\" download=\"Uniswap_Report.pdf\">Download PDF Report</a></p>\n",
        );
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Uniswap Swap Data Analysis</title>\n<style>{}</style>\n</head>\n\
         <body>\n<h1>Uniswap Swap Data Analysis</h1>\n{}</body>\n</html>\n",
        STYLE, body
    )
}

const STYLE: &str = "\
body{font-family:sans-serif;margin:2rem;}\
table{border-collapse:collapse;font-size:0.9rem;}\
th,td{border:1px solid #ccc;padding:4px 8px;text-align:center;}\
.charts{display:flex;flex-wrap:wrap;gap:2rem;}\
.charts img{max-width:100%;}\
.warning{background:#fff3cd;border:1px solid #ffe08a;padding:1rem;}\
.meta{color:#666;}\
.button{display:inline-block;padding:0.5rem 1rem;background:#2563eb;color:#fff;text-decoration:none;border-radius:4px;}";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::types::{SnapshotInfo, StoredSwap};
    use chrono::DateTime;

    fn data(swaps: Vec<StoredSwap>) -> ReportData {
        ReportData {
            swaps,
            snapshot: None,
        }
    }

    #[test]
    fn test_empty_page_shows_warning_only() {
        let html = render_dashboard(&data(Vec::new()), 10);
        assert!(html.contains(EMPTY_WARNING));
        assert!(!html.contains("<img"));
        assert!(!html.contains("/report.pdf"));
    }

    #[test]
    fn test_page_escapes_cells() {
        let swap = StoredSwap {
            timestamp: Some(1_700_000_000),
            sender: "0xabc".to_string(),
            token0_symbol: "<b>".to_string(),
            token1_symbol: "A&B".to_string(),
            amount0: Some(1.0),
            amount1: Some(2.0),
            price: Some(3.0),
        };
        let html = render_dashboard(&data(vec![swap]), 10);
        assert!(html.contains("<td>&lt;b&gt;</td>"));
        assert!(html.contains("<td>A&amp;B</td>"));
        assert!(html.contains("<td>$3.00</td>"));
        assert!(html.contains("/charts/correlation.png"));
        assert!(html.contains("Total Swaps: 1"));
    }

    #[test]
    fn test_page_shows_snapshot_and_headers() {
        let swap = StoredSwap {
            timestamp: Some(1_700_000_000),
            sender: "0xabc".to_string(),
            token0_symbol: "WETH".to_string(),
            token1_symbol: "USDC".to_string(),
            amount0: Some(1.0),
            amount1: Some(2.0),
            price: Some(3.0),
        };
        let data = ReportData {
            swaps: vec![swap.clone(), swap],
            snapshot: Some(SnapshotInfo {
                generation: 3,
                fetched_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
                record_count: 2,
            }),
        };

        let html = render_dashboard(&data, 1);
        assert!(html.contains("<p class=\"meta\">Snapshot #3 fetched 2023-11-14 22:13:20 UTC</p>\n"));
        assert!(html.contains("<p>Total Swaps: 2</p>\n"));
        assert!(html.contains("<th>Timestamp</th><th>Sender</th>"));
        // Preview is limited to one row.
        assert_eq!(html.matches("<td>0xabc</td>").count(), 1);
    }
}
