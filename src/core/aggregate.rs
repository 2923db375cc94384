use crate::domain::model::{Category, Listing, NeighborhoodIndex};
use chrono::NaiveDate;
use std::collections::BTreeMap;

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}

/// Groups cleaned listings by neighborhood and computes the day's index
/// rows. Neighborhoods with zero cleaned listings emit no row at all:
/// absence, not a zero value.
pub fn aggregate(date: NaiveDate, listings: &[Listing]) -> Vec<NeighborhoodIndex> {
    let mut groups: BTreeMap<&str, Vec<&Listing>> = BTreeMap::new();
    for listing in listings {
        groups
            .entry(listing.neighborhood.as_str())
            .or_default()
            .push(listing);
    }

    groups
        .into_iter()
        .map(|(neighborhood, group)| {
            let sale = |l: &&&Listing| l.category == Category::Sale;
            let rent = |l: &&&Listing| l.category == Category::Rent;

            NeighborhoodIndex {
                date,
                neighborhood: neighborhood.to_string(),
                avg_sale_price_per_m2: mean(
                    group.iter().filter(sale).map(|l| l.price_per_m2),
                ),
                avg_rent_price: mean(group.iter().filter(rent).map(|l| l.price as f64)),
                avg_rent_price_per_m2: mean(
                    group.iter().filter(rent).map(|l| l.price_per_m2),
                ),
                avg_rooms: mean(group.iter().filter_map(|l| l.rooms.map(f64::from))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
    }

    fn sale(neighborhood: &str, price: i64, area: f64) -> Listing {
        Listing::new(neighborhood, price, Some(2), area, Category::Sale)
    }

    fn rent(neighborhood: &str, price: i64, area: f64) -> Listing {
        Listing::new(neighborhood, price, Some(1), area, Category::Rent)
    }

    #[test]
    fn sale_mean_with_no_rent_fields() {
        // price_per_m2 values 100 and 200 → mean 150
        let listings = vec![sale("X", 10_000, 100.0), sale("X", 20_000, 100.0)];
        let rows = aggregate(date(), &listings);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.neighborhood, "X");
        assert_eq!(row.avg_sale_price_per_m2, Some(150.0));
        assert_eq!(row.avg_rent_price, None);
        assert_eq!(row.avg_rent_price_per_m2, None);
        assert_eq!(row.avg_rooms, Some(2.0));
    }

    #[test]
    fn rent_means_cover_price_and_price_per_m2() {
        let listings = vec![rent("X", 500, 50.0), rent("X", 700, 70.0)];
        let rows = aggregate(date(), &listings);

        let row = &rows[0];
        assert_eq!(row.avg_sale_price_per_m2, None);
        assert_eq!(row.avg_rent_price, Some(600.0));
        assert_eq!(row.avg_rent_price_per_m2, Some(10.0));
    }

    #[test]
    fn rooms_mean_skips_missing_values() {
        let mut no_rooms = sale("X", 100_000, 50.0);
        no_rooms.rooms = None;
        let listings = vec![no_rooms, sale("X", 100_000, 40.0)];

        let rows = aggregate(date(), &listings);
        assert_eq!(rows[0].avg_rooms, Some(2.0));
    }

    #[test]
    fn all_rooms_missing_yields_none() {
        let mut l = sale("X", 100_000, 50.0);
        l.rooms = None;
        let rows = aggregate(date(), &[l]);
        assert_eq!(rows[0].avg_rooms, None);
    }

    #[test]
    fn one_row_per_neighborhood_and_none_for_absent() {
        let listings = vec![
            sale("Blloku", 100_000, 50.0),
            sale("Kombinat", 80_000, 80.0),
            rent("Blloku", 600, 60.0),
        ];
        let rows = aggregate(date(), &listings);

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|r| r.neighborhood == "Blloku"));
        assert!(rows.iter().any(|r| r.neighborhood == "Kombinat"));
        // nothing emitted for neighborhoods that produced no listings
        assert!(!rows.iter().any(|r| r.neighborhood == "Lapraka"));
    }

    #[test]
    fn empty_input_emits_no_rows() {
        assert!(aggregate(date(), &[]).is_empty());
    }
}
