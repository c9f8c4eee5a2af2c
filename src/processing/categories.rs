use crate::error::{AppError, Result};
use crate::models::CategorySchema;

const FIELD_DELIMITER: char = ';';

fn split_field(id: i64, field: &str) -> Result<(&str, &str)> {
    field
        .trim()
        .rsplit_once('-')
        .ok_or_else(|| AppError::data_quality(id, format!("category field '{}' has no value", field)))
}

/// Map a raw category value onto {0, 1}; `2` is folded into `1`
pub fn parse_category_value(id: i64, raw: &str) -> Result<u8> {
    match raw.trim().parse::<i64>() {
        Ok(0) => Ok(0),
        Ok(1) | Ok(2) => Ok(1),
        Ok(other) => Err(AppError::data_quality(
            id,
            format!("category value {} is outside {{0, 1, 2}}", other),
        )),
        Err(_) => Err(AppError::data_quality(
            id,
            format!("category value '{}' is not an integer", raw),
        )),
    }
}

/// Derive the ordered column names from one categories string (`name-value;...`)
pub fn parse_schema(id: i64, categories: &str) -> Result<CategorySchema> {
    let names = categories
        .split(FIELD_DELIMITER)
        .map(|field| split_field(id, field).map(|(name, _)| name.to_string()))
        .collect::<Result<Vec<_>>>()?;
    Ok(CategorySchema::new(names))
}

/// Expand a categories string into one 0/1 label per schema column
pub fn expand_categories(id: i64, categories: &str, schema: &CategorySchema) -> Result<Vec<u8>> {
    let fields: Vec<&str> = categories.split(FIELD_DELIMITER).collect();
    if fields.len() != schema.len() {
        return Err(AppError::data_quality(
            id,
            format!(
                "expected {} category fields, found {}",
                schema.len(),
                fields.len()
            ),
        ));
    }

    fields
        .iter()
        .zip(schema.names())
        .map(|(field, expected)| {
            let (name, value) = split_field(id, field)?;
            if name != expected {
                return Err(AppError::data_quality(
                    id,
                    format!("category '{}' found where '{}' was expected", name, expected),
                ));
            }
            parse_category_value(id, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "related-1;request-0;offer-0;child_alone-0;water-2";

    #[test]
    fn test_parse_schema() {
        let schema = parse_schema(1, SAMPLE).unwrap();
        assert_eq!(
            schema.names(),
            &["related", "request", "offer", "child_alone", "water"]
        );
    }

    #[test]
    fn test_parse_schema_keeps_hyphenated_names() {
        let schema = parse_schema(1, "aid-related-1;other-aid-0").unwrap();
        assert_eq!(schema.names(), &["aid-related", "other-aid"]);
    }

    #[test]
    fn test_expand_folds_two_into_one() {
        let schema = parse_schema(1, SAMPLE).unwrap();
        let labels = expand_categories(1, SAMPLE, &schema).unwrap();
        assert_eq!(labels, vec![1, 0, 0, 0, 1]);
    }

    #[test]
    fn test_expand_is_deterministic() {
        let schema = parse_schema(1, SAMPLE).unwrap();
        assert_eq!(
            expand_categories(4, SAMPLE, &schema).unwrap(),
            expand_categories(4, SAMPLE, &schema).unwrap()
        );
    }

    #[test]
    fn test_rejects_out_of_range_value() {
        let schema = parse_schema(1, "related-1;water-0").unwrap();
        let err = expand_categories(12, "related-3;water-0", &schema).unwrap_err();
        assert_eq!(err.error_code(), "DATA_QUALITY_ERROR");
        assert!(err.to_string().contains("id 12"));
    }

    #[test]
    fn test_rejects_non_numeric_value() {
        let schema = parse_schema(1, "related-1;water-0").unwrap();
        assert!(expand_categories(5, "related-x;water-0", &schema).is_err());
        assert!(expand_categories(5, "related;water-0", &schema).is_err());
    }

    #[test]
    fn test_rejects_field_count_mismatch() {
        let schema = parse_schema(1, "related-1;water-0").unwrap();
        let err = expand_categories(8, "related-1", &schema).unwrap_err();
        assert!(err.to_string().contains("expected 2 category fields, found 1"));
    }

    #[test]
    fn test_rejects_reordered_names() {
        let schema = parse_schema(1, "related-1;water-0").unwrap();
        assert!(expand_categories(8, "water-1;related-0", &schema).is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_category_value(1, "0").unwrap(), 0);
        assert_eq!(parse_category_value(1, " 2").unwrap(), 1);
        assert!(parse_category_value(1, "-1").is_err());
    }
}
