use crate::db::CatalogRow;
use crate::error::Error;

/// Descriptive summary of the catalog's prices: the count, mean, sample
/// standard deviation, extremes, and quartiles.
pub struct PriceSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

pub fn price_summary(prices: &[f64]) -> Option<PriceSummary> {
    if prices.is_empty() {
        return None;
    }

    let count = prices.len();
    let mean = prices.iter().sum::<f64>() / count as f64;

    // Sample standard deviation (n − 1); zero when a single observation.
    let std_dev = if count < 2 {
        0.0
    } else {
        let var = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        var.sqrt()
    };

    let mut sorted = prices.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    Some(PriceSummary {
        count,
        mean,
        std_dev,
        min: sorted[0],
        p25: percentile(&sorted, 0.25),
        p50: percentile(&sorted, 0.50),
        p75: percentile(&sorted, 0.75),
        max: sorted[count - 1],
    })
}

/// Linear interpolation between the closest ranks of an ascending slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

/// Render the catalog's statistics report as a standalone HTML document:
/// the summary table plus the highest- and lowest-priced rows.
pub fn render_report(rows: &[CatalogRow]) -> Result<String, Error> {
    let prices: Vec<f64> = rows.iter().map(|r| r.price).collect();
    let summary = price_summary(&prices).ok_or(Error::EmptyCatalog)?;

    // Ties resolve to the first row in index order.
    let highest = rows
        .iter()
        .max_by(|a, b| a.price.total_cmp(&b.price))
        .ok_or(Error::EmptyCatalog)?;
    let lowest = rows
        .iter()
        .min_by(|a, b| a.price.total_cmp(&b.price))
        .ok_or(Error::EmptyCatalog)?;

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Price Report</title>\n</head>\n<body>\n");
    html.push_str("<h1>Price Report</h1>\n");

    html.push_str("<table border=\"1\">\n<thead>\n<tr>");
    for col in ["Count", "Mean", "Std", "Min", "P25", "P50", "P75", "Max"] {
        html.push_str(&format!("<th>{}</th>", col));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n<tr>");
    html.push_str(&format!("<td>{}</td>", summary.count));
    for value in [
        summary.mean,
        summary.std_dev,
        summary.min,
        summary.p25,
        summary.p50,
        summary.p75,
        summary.max,
    ] {
        html.push_str(&format!("<td>{:.2}</td>", value));
    }
    html.push_str("</tr>\n</tbody>\n</table>\n");

    html.push_str("<h2>Highest price</h2>\n");
    push_highlight(&mut html, highest);
    html.push_str("<h2>Lowest price</h2>\n");
    push_highlight(&mut html, lowest);

    html.push_str("</body>\n</html>\n");
    Ok(html)
}

fn push_highlight(html: &mut String, row: &CatalogRow) {
    html.push_str(&format!("<p>Site: {}</p>\n", escape(&row.site)));
    html.push_str(&format!("<p>Product: {}</p>\n", escape(&row.product)));
    html.push_str(&format!("<p>Price: {:.2}</p>\n", row.price));
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: i64, site: &str, product: &str, price: f64) -> CatalogRow {
        CatalogRow {
            index,
            site: site.to_string(),
            product: product.to_string(),
            price,
            captured_on: "7/8/2026".to_string(),
        }
    }

    #[test]
    fn summary_matches_known_values() {
        let s = price_summary(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 2.5);
        assert!((s.std_dev - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.p25, 1.75);
        assert_eq!(s.p50, 2.5);
        assert_eq!(s.p75, 3.25);
        assert_eq!(s.max, 4.0);
    }

    #[test]
    fn single_observation_has_zero_spread() {
        let s = price_summary(&[9.9]).unwrap();
        assert_eq!(s.count, 1);
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.p50, 9.9);
    }

    #[test]
    fn empty_prices_yield_no_summary() {
        assert!(price_summary(&[]).is_none());
    }

    #[test]
    fn report_names_the_extreme_rows() {
        let rows = vec![
            row(0, "Extrabom", "Maçã Gala ", 3.5),
            row(1, "Extraplus", "Banana Prata ", 2.2),
            row(2, "Extrabom", "Morango ", 8.9),
        ];
        let html = render_report(&rows).unwrap();
        assert!(html.contains("Morango"));
        assert!(html.contains("8.90"));
        assert!(html.contains("Banana Prata"));
        assert!(html.contains("2.20"));
        assert!(html.contains("<th>P75</th>"));
    }

    #[test]
    fn empty_catalog_is_a_report_error() {
        let err = render_report(&[]).unwrap_err();
        assert!(matches!(err, Error::EmptyCatalog));
    }

    #[test]
    fn product_text_is_html_escaped() {
        let rows = vec![row(0, "Extrabom", "Doce & Salgado <kg>", 1.0)];
        let html = render_report(&rows).unwrap();
        assert!(html.contains("Doce &amp; Salgado &lt;kg&gt;"));
    }
}
