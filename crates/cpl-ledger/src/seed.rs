use cpl_types::Asset;

/// The assets written by `InitLedger`, in write order.
pub fn seed_assets() -> Vec<Asset> {
    vec![
        Asset::new(
            "carbonAsset1",
            "pasture-restoration",
            Some(120),
            "kisumu_farmer01",
            "2025-08-01",
        ),
        Asset::new(
            "carbonAsset2",
            "livestock-methane-reduction",
            Some(90),
            "eldoret_farmer22",
            "2025-08-02",
        ),
        Asset::new(
            "carbonAsset3",
            "agroforestry",
            Some(200),
            "nyeri_farmer08",
            "2025-08-03",
        ),
        Asset::new(
            "carbonAsset4",
            "biochar-soil-enrichment",
            Some(75),
            "narok_farmer15",
            "2025-08-04",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_distinct_ids_in_key_order() {
        let ids: Vec<String> = seed_assets().into_iter().map(|a| a.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(ids.len(), 4);
        assert_eq!(ids, sorted);
    }
}
