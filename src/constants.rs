/// Column names the Transformer projects the raw export down to, in output
/// order. All eight must be present in the raw file.
pub const KEEP_COLS: [&str; 8] = [
    "listing_id",
    "city",
    "district",
    "neighbourhood",
    "room_type",
    "price",
    "latitude",
    "longitude",
];

/// Substring used to locate the listings entry inside the downloaded archive.
pub const ARCHIVE_MATCH_TOKEN: &str = "listings";

/// The only city this pipeline supports; compared after trimming and ASCII
/// case folding, the stored value is left untouched.
pub const SUPPORTED_CITY: &str = "paris";

/// Upper sanity bound for nightly prices. Rows at or above it are dropped.
pub const PRICE_CEILING: f64 = 10_000.0;

/// Historical quarter name -> arrondissement number, one entry per
/// arrondissement. Used to backfill a missing district from the neighbourhood.
pub const QUARTER_TO_ARRONDISSEMENT: [(&str, u32); 20] = [
    ("Louvre", 1),
    ("Bourse", 2),
    ("Temple", 3),
    ("Hotel-de-Ville", 4),
    ("Pantheon", 5),
    ("Luxembourg", 6),
    ("Palais-Bourbon", 7),
    ("Elysee", 8),
    ("Opera", 9),
    ("Enclos-St-Laurent", 10),
    ("Popincourt", 11),
    ("Reuilly", 12),
    ("Gobelins", 13),
    ("Observatoire", 14),
    ("Vaugirard", 15),
    ("Passy", 16),
    ("Batignolles-Monceau", 17),
    ("Buttes-Montmartre", 18),
    ("Buttes-Chaumont", 19),
    ("Menilmontant", 20),
];

/// Looks up the arrondissement number for a historical quarter name.
pub fn arrondissement_for_quarter(name: &str) -> Option<u32> {
    let name = name.trim();
    QUARTER_TO_ARRONDISSEMENT
        .iter()
        .find(|(quarter, _)| *quarter == name)
        .map(|(_, n)| *n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_lookup_covers_all_twenty_arrondissements() {
        let mut numbers: Vec<u32> = QUARTER_TO_ARRONDISSEMENT.iter().map(|(_, n)| *n).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn quarter_lookup_trims_surrounding_whitespace() {
        assert_eq!(arrondissement_for_quarter(" Louvre "), Some(1));
        assert_eq!(arrondissement_for_quarter("Menilmontant"), Some(20));
        assert_eq!(arrondissement_for_quarter("Montmartre"), None);
    }
}
