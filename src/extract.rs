use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use crate::db::ProductRecord;
use crate::error::Error;
use crate::normalize;

// Fixed structural selectors for the listing markup both sites share.
static GRID_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.box-produtos.box-produtos--margin-top.ec-itens").unwrap()
});
static NAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.name-produto").unwrap());
static PRICE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.item-por").unwrap());

/// Parse one listing page and extract its normalized records.
pub fn extract_listing(
    html: &str,
    url: &str,
    site: &str,
    captured_on: NaiveDate,
) -> Result<Vec<ProductRecord>, Error> {
    let document = Html::parse_document(html);
    let grid = locate_product_grid(&document, url)?;
    extract_records(grid, site, captured_on)
}

/// Find the single container holding the product list. A page without it
/// means the site's markup drifted; that must fail, not yield zero records.
pub fn locate_product_grid<'a>(document: &'a Html, url: &str) -> Result<ElementRef<'a>, Error> {
    document
        .select(&GRID_SELECTOR)
        .next()
        .ok_or_else(|| Error::ProductGridMissing {
            url: url.to_string(),
        })
}

/// Walk the name and price nodes of the grid in document order, normalize
/// each, and pair them positionally. The sites list names and prices in
/// matching order with equal counts; anything else errors rather than
/// pairing products with the wrong prices.
pub fn extract_records(
    grid: ElementRef,
    site: &str,
    captured_on: NaiveDate,
) -> Result<Vec<ProductRecord>, Error> {
    let names: Vec<String> = grid
        .select(&NAME_SELECTOR)
        .map(|el| {
            let text = normalize::strip_newlines(&node_text(el));
            normalize::truncate_at_marker(&text).to_string()
        })
        .collect();

    let prices = grid
        .select(&PRICE_SELECTOR)
        .map(|el| normalize::parse_price(&normalize::strip_newlines(&node_text(el))))
        .collect::<Result<Vec<f64>, Error>>()?;

    if names.len() != prices.len() {
        return Err(Error::PairCountMismatch {
            names: names.len(),
            prices: prices.len(),
        });
    }

    Ok(names
        .into_iter()
        .zip(prices)
        .map(|(product, price)| ProductRecord {
            site: site.to_string(),
            product,
            price,
            captured_on,
        })
        .collect())
}

fn node_text(el: ElementRef) -> String {
    el.text().collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn extracts_paired_records_from_fixture_page() {
        let html = std::fs::read_to_string("tests/fixtures/hortifruti_page.html").unwrap();
        let records = extract_listing(&html, "http://test/?page=1", "X", today()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].site, "X");
        assert_eq!(records[0].product, "Maçã Gala ");
        assert_eq!(records[0].price, 3.50);
        assert_eq!(records[1].product, "Banana Prata ");
        assert_eq!(records[1].price, 2.20);
        assert!(records.iter().all(|r| r.captured_on == today()));
    }

    #[test]
    fn missing_grid_is_schema_drift() {
        let html = "<html><body><div class='box-produtos'>renamed</div></body></html>";
        let err = extract_listing(html, "http://test/?page=3", "X", today()).unwrap_err();
        assert!(matches!(err, Error::ProductGridMissing { .. }));
    }

    #[test]
    fn count_mismatch_fails_instead_of_truncating() {
        let html = r#"
            <div class="box-produtos box-produtos--margin-top ec-itens">
                <div class="name-produto">Maçã Gala Unidade</div>
                <div class="name-produto">Banana Prata Unidade</div>
                <div class="item-por">Por: R$ 3,50</div>
            </div>
        "#;
        let err = extract_listing(html, "http://test/?page=1", "X", today()).unwrap_err();
        assert!(matches!(
            err,
            Error::PairCountMismatch { names: 2, prices: 1 }
        ));
    }

    #[test]
    fn malformed_price_poisons_the_page() {
        let html = r#"
            <div class="box-produtos box-produtos--margin-top ec-itens">
                <div class="name-produto">Maçã Gala Unidade</div>
                <div class="item-por">Consulte a loja</div>
            </div>
        "#;
        let err = extract_listing(html, "http://test/?page=1", "X", today()).unwrap_err();
        assert!(matches!(err, Error::PriceParse { .. }));
    }

    #[test]
    fn nodes_outside_the_grid_are_ignored() {
        let html = r#"
            <div class="destaques">
                <div class="name-produto">Banner Promo</div>
                <div class="item-por">Por: R$ 0,99</div>
            </div>
            <div class="box-produtos box-produtos--margin-top ec-itens">
                <div class="name-produto">Alface Unidade</div>
                <div class="item-por">Por: R$ 2,50</div>
            </div>
        "#;
        let records = extract_listing(html, "http://test/?page=1", "X", today()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product, "Alface ");
        assert_eq!(records[0].price, 2.50);
    }
}
