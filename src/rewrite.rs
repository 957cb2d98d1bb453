//! Text rewrite rules for the block dialect.
//!
//! T-SQL-flavored text is adapted for HANA with a fixed chain of plain
//! string substitutions, applied in order. The chain is idempotent: running
//! it over already-adapted text changes nothing, so callers may rewrite
//! defensively without tracking whether a text was adapted before.

/// Adapt command text authored for the SQL Server family to HANA syntax.
///
/// Rules, in order: bracket identifier quotes become double quotes,
/// `ISNULL` becomes `IFNULL`, and `@p` parameter markers become `:p`.
/// The marker rule is a literal substring replace and intentionally does
/// not try to understand token boundaries.
pub fn rewrite_for_hana(text: &str) -> String {
    text.replace('[', "\"")
        .replace(']', "\"")
        .replace("ISNULL", "IFNULL")
        .replace("@p", ":p")
}

/// Strip marker prefixes from `p`-style parameter references.
///
/// Inside an anonymous block the declared variables are referenced by bare
/// name, so `:p1` and `@p1` both collapse to `p1`.
pub fn strip_parameter_markers(text: &str) -> String {
    text.replace(":p", "p").replace("@p", "p")
}

/// Replace user-facing `*` wildcards with the SQL `%` wildcard.
pub fn replace_wildcards(text: &str) -> String {
    text.replace('*', "%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_brackets_isnull_and_markers() {
        let adapted = rewrite_for_hana("SELECT [a] FROM [t] WHERE ISNULL(x, @p1) = 1");
        assert_eq!(adapted, "SELECT \"a\" FROM \"t\" WHERE IFNULL(x, :p1) = 1");
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let once = rewrite_for_hana("SELECT [a] FROM t WHERE ISNULL(x, @p1) = @p2");
        let twice = rewrite_for_hana(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rewrite_empty_text() {
        assert_eq!(rewrite_for_hana(""), "");
    }

    #[test]
    fn test_strip_markers_both_forms() {
        assert_eq!(
            strip_parameter_markers("UPDATE t SET a = :p1 WHERE b = @p2"),
            "UPDATE t SET a = p1 WHERE b = p2"
        );
    }

    #[test]
    fn test_wildcards() {
        assert_eq!(replace_wildcards("WHERE name LIKE 'A*'"), "WHERE name LIKE 'A%'");
    }
}
