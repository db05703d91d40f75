//! Elasticsearch query builders for food search
//!
//! Pure functions from a raw user query to a deterministic query body.
//! Keeping these free of I/O makes the ranking rules unit-testable.

use serde_json::{json, Value};

use crate::models::is_plausible_barcode;

/// Widths the code field is zero-padded to when matching barcodes.
/// Covers EAN-13, EAN-8, UPC-A, and ITF-24 as stored in the index.
const BARCODE_PAD_WIDTHS: [usize; 4] = [13, 8, 12, 24];

/// Normalize a raw user query: trim, lowercase, and drop every character
/// that is not a letter, digit, or whitespace.
pub fn normalize_query(query: &str) -> String {
    query
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Normalize a suggestion query. Suggestions match phrases verbatim, so
/// punctuation is kept; only case and surrounding whitespace are dropped.
pub fn normalize_suggestion_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Build the main food search query.
///
/// Each whitespace token contributes a fuzzy multi-field clause; tokens
/// that look like barcodes additionally contribute exact `code` matches
/// across all standard paddings. Any single clause is enough to match.
pub fn build_search_query(normalized: &str) -> Value {
    let mut should: Vec<Value> = Vec::new();

    for token in normalized.split_whitespace() {
        should.push(json!({
            "multi_match": {
                "query": token,
                "fields": [
                    "product_name^4",
                    "_keywords^3",
                    "generic_name^2",
                    "brands^2"
                ],
                "fuzziness": fuzziness_for(token)
            }
        }));

        if is_plausible_barcode(token) {
            should.extend(expand_barcode(token));
        }
    }

    json!({
        "bool": {
            "should": should,
            "minimum_should_match": "1"
        }
    })
}

/// Build the autocomplete suggestion query over `product_name`.
///
/// Exact phrases rank highest, then prefix matches on the search-as-you-type
/// subfields, then fuzzy ngram matches as a catch-all.
pub fn build_suggestion_query(normalized: &str) -> Value {
    json!({
        "bool": {
            "should": [
                {
                    "match_phrase": {
                        "product_name": {
                            "query": normalized,
                            "boost": 10.0
                        }
                    }
                },
                {
                    "multi_match": {
                        "query": normalized,
                        "type": "bool_prefix",
                        "fields": [
                            "product_name",
                            "product_name._2gram",
                            "product_name._3gram"
                        ],
                        "boost": 4.0
                    }
                },
                {
                    "match": {
                        "product_name_ngram": {
                            "query": normalized,
                            "fuzziness": "AUTO",
                            "boost": 2.0
                        }
                    }
                }
            ],
            "minimum_should_match": "1"
        }
    })
}

/// Short tokens get a fixed edit distance, longer ones defer to ES.
fn fuzziness_for(token: &str) -> &'static str {
    if token.chars().count() <= 3 {
        "2"
    } else {
        "AUTO"
    }
}

/// Expand a barcode token into exact `code` term clauses.
///
/// Leading zeros are stripped first (a code that is all zeros is kept
/// as-is), then the digits are re-padded to each standard width so a
/// scanned EAN-8 still hits a catalog entry stored as EAN-13.
fn expand_barcode(token: &str) -> Vec<Value> {
    let stripped = token.trim_start_matches('0');
    let digits = if stripped.is_empty() { token } else { stripped };

    BARCODE_PAD_WIDTHS
        .iter()
        .map(|&width| {
            let padded = pad_left(digits, width);
            json!({
                "term": {
                    "code": {
                        "value": padded,
                        "boost": 5.0
                    }
                }
            })
        })
        .collect()
}

fn pad_left(digits: &str, width: usize) -> String {
    if digits.len() >= width {
        digits.to_string()
    } else {
        format!("{}{}", "0".repeat(width - digits.len()), digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn should_clauses(query: &Value) -> &Vec<Value> {
        query["bool"]["should"].as_array().unwrap()
    }

    fn term_clauses(query: &Value) -> Vec<&Value> {
        should_clauses(query)
            .iter()
            .filter(|c| c.get("term").is_some())
            .collect()
    }

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(normalize_query("  Coca-Cola!  "), "cocacola");
        assert_eq!(normalize_query("Müsli & Honig"), "müsli  honig");
        assert_eq!(normalize_query("plain"), "plain");
    }

    #[test]
    fn suggestion_normalization_keeps_punctuation() {
        assert_eq!(normalize_suggestion_query("  Coca-Cola!  "), "coca-cola!");
        assert_eq!(normalize_suggestion_query("Müsli"), "müsli");
    }

    #[test]
    fn search_query_has_one_multi_match_per_token() {
        let query = build_search_query("greek yoghurt");
        let clauses = should_clauses(&query);

        assert_eq!(clauses.len(), 2);
        for clause in clauses {
            let fields = clause["multi_match"]["fields"].as_array().unwrap();
            assert_eq!(fields[0], "product_name^4");
            assert_eq!(fields[1], "_keywords^3");
            assert_eq!(fields[2], "generic_name^2");
            assert_eq!(fields[3], "brands^2");
        }
        assert_eq!(query["bool"]["minimum_should_match"], "1");
    }

    #[test]
    fn short_tokens_use_fixed_fuzziness() {
        let query = build_search_query("ice tea");
        let clauses = should_clauses(&query);

        assert_eq!(clauses[0]["multi_match"]["query"], "ice");
        assert_eq!(clauses[0]["multi_match"]["fuzziness"], "2");
        assert_eq!(clauses[1]["multi_match"]["query"], "tea");
        assert_eq!(clauses[1]["multi_match"]["fuzziness"], "2");

        let query = build_search_query("yoghurt");
        assert_eq!(should_clauses(&query)[0]["multi_match"]["fuzziness"], "AUTO");
    }

    #[test]
    fn non_barcode_digits_get_no_term_clauses() {
        // 3 and 11 digits are not plausible barcode lengths
        assert!(term_clauses(&build_search_query("123")).is_empty());
        assert!(term_clauses(&build_search_query("12345678901")).is_empty());
    }

    #[test]
    fn barcode_token_expands_to_all_paddings() {
        let query = build_search_query("5901234123457");
        let terms = term_clauses(&query);

        assert_eq!(terms.len(), 4);
        let values: Vec<&str> = terms
            .iter()
            .map(|t| t["term"]["code"]["value"].as_str().unwrap())
            .collect();
        assert_eq!(
            values,
            vec![
                "5901234123457",
                "5901234123457",
                "5901234123457",
                "000000000005901234123457"
            ]
        );
        for term in &terms {
            assert_eq!(term["term"]["code"]["boost"], 5.0);
        }
    }

    #[test]
    fn barcode_leading_zeros_are_stripped_then_repadded() {
        let query = build_search_query("00012345");
        let terms = term_clauses(&query);

        assert_eq!(terms.len(), 4);
        let values: Vec<&str> = terms
            .iter()
            .map(|t| t["term"]["code"]["value"].as_str().unwrap())
            .collect();
        assert_eq!(
            values,
            vec![
                "0000000012345",
                "00012345",
                "000000012345",
                "000000000000000000012345"
            ]
        );
    }

    #[test]
    fn all_zero_barcode_is_kept_verbatim() {
        let query = build_search_query("00000000");
        let terms = term_clauses(&query);

        assert_eq!(terms.len(), 4);
        assert_eq!(terms[1]["term"]["code"]["value"], "00000000");
        assert_eq!(terms[0]["term"]["code"]["value"], "0000000000000");
    }

    #[test]
    fn barcode_token_also_gets_a_fuzzy_clause() {
        let query = build_search_query("12345678");
        let clauses = should_clauses(&query);

        // 1 multi_match + 4 term clauses
        assert_eq!(clauses.len(), 5);
        assert!(clauses[0].get("multi_match").is_some());
    }

    #[test]
    fn identical_input_builds_identical_query() {
        let a = build_search_query("chocolate 12345678");
        let b = build_search_query("chocolate 12345678");
        assert_eq!(a, b);
    }

    #[test]
    fn suggestion_query_layers_three_strategies() {
        let query = build_suggestion_query("choco");
        let clauses = should_clauses(&query);

        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0]["match_phrase"]["product_name"]["boost"], 10.0);
        assert_eq!(clauses[1]["multi_match"]["type"], "bool_prefix");
        assert_eq!(clauses[1]["multi_match"]["boost"], 4.0);
        assert_eq!(
            clauses[2]["match"]["product_name_ngram"]["fuzziness"],
            "AUTO"
        );
        assert_eq!(clauses[2]["match"]["product_name_ngram"]["boost"], 2.0);
    }
}
