// crates/tenantdb-core/src/runtime/listing.rs
// ============================================================================
// Module: Table Listing
// Description: Catalog query and psql output parsing for table listings.
// Purpose: Extract bare table names from the database client's text output.
// Dependencies: none
// ============================================================================

//! ## Overview
//! The admin listing shells into `psql` and scrapes its default aligned
//! output. That couples it to one client's human-readable format; the
//! structured path is [`crate::runtime::TenantGateway::list_tables`].

/// Public base tables, ordered by name.
pub const LIST_TABLES_SQL: &str = "SELECT table_name::text AS table_name \
     FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
     ORDER BY table_name;";

/// Extracts table names from aligned `psql` output.
///
/// Drops blank lines, the `table_name` header, the dashed separator, and the
/// `(N row)` / `(N rows)` footer.
#[must_use]
pub fn parse_table_listing(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with("table_name")
                && !line.starts_with('-')
                && !line.ends_with("row)")
                && !line.ends_with("rows)")
        })
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_table_listing;

    #[test]
    fn parses_aligned_output() {
        let output = " table_name \n------------\n orders\n users\n(2 rows)\n\n";
        assert_eq!(parse_table_listing(output), vec!["orders", "users"]);
    }

    #[test]
    fn drops_singular_footer() {
        let output = " table_name \n------------\n orders\n(1 row)\n";
        assert_eq!(parse_table_listing(output), vec!["orders"]);
    }

    #[test]
    fn empty_listing_yields_nothing() {
        let output = " table_name \n------------\n(0 rows)\n";
        assert!(parse_table_listing(output).is_empty());
    }
}
