use crate::error::MalformedResult;
use crate::models::{CATEGORIES, FlatDisplayResult};
use serde_json::Value;

/// Parse a reply and project it onto the 27 display values
pub fn flatten_response(response: &str) -> Result<FlatDisplayResult, MalformedResult> {
    let document: Value = serde_json::from_str(response)?;
    flatten_document(&document)
}

/// Overall rating, summary, then per category its average followed by a
/// rating/plan pair for each criterion. Null leaves are kept; absent keys fail.
pub fn flatten_document(document: &Value) -> Result<FlatDisplayResult, MalformedResult> {
    let mut values = Vec::with_capacity(FlatDisplayResult::LEN);
    values.push(lookup(document, &["Overall Rating"])?);
    values.push(lookup(document, &["Summary"])?);

    for (category, criteria) in CATEGORIES {
        values.push(lookup(document, &[category, "Average Rating"])?);
        for criterion in criteria {
            values.push(lookup(document, &[category, *criterion, "rating"])?);
            values.push(lookup(document, &[category, *criterion, "plan of action"])?);
        }
    }

    Ok(FlatDisplayResult::new(values))
}

/// Labels for the flattened values, index for index
pub fn display_labels() -> Vec<String> {
    let mut labels = Vec::with_capacity(FlatDisplayResult::LEN);
    labels.push("Overall Rating".to_string());
    labels.push("Summary".to_string());

    for (category, criteria) in CATEGORIES {
        labels.push(format!("{} Average Rating", category));
        for criterion in criteria {
            labels.push(format!("{} Rating", criterion));
            labels.push(format!("{} Plan of Action", criterion));
        }
    }

    labels
}

fn lookup(document: &Value, path: &[&str]) -> Result<Value, MalformedResult> {
    path.iter()
        .try_fold(document, |node, key| node.get(*key))
        .cloned()
        .ok_or_else(|| MalformedResult::MissingKey(path.join(" > ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::tests::valid_document;
    use serde_json::json;

    #[test]
    fn test_flatten_produces_fixed_order() {
        let flat = flatten_document(&valid_document()).unwrap();
        let values = flat.values();

        assert_eq!(values.len(), FlatDisplayResult::LEN);
        assert_eq!(values[0], json!(2.24));
        assert_eq!(
            values[1],
            json!("Slate is broadly healthy with gaps in Female and FO representation.")
        );
        // demographic
        assert_eq!(values[2], json!(2.0));
        assert_eq!(values[3], json!(3.0));
        assert_eq!(values[4], json!("Criterion satisfied"));
        assert_eq!(values[5], json!(2.0));
        assert_eq!(values[6], json!("Recruit two minority reviewers"));
        assert_eq!(values[8], json!("No information provided"));
        // geographic
        assert_eq!(values[9], json!(2.4));
        assert_eq!(values[12], json!(2.0));
        assert_eq!(values[13], json!("Add a southern reviewer"));
        assert_eq!(values[18], json!(1.0));
        assert_eq!(values[19], json!("No information provided"));
        // seniority
        assert_eq!(values[20], json!(2.33));
        assert_eq!(values[23], json!(1.0));
        assert_eq!(values[24], json!("No information provided"));
        assert_eq!(values[26], json!("Criterion satisfied"));
    }

    #[test]
    fn test_flatten_keeps_every_criterion() {
        let flat = flatten_document(&valid_document()).unwrap();
        let document = valid_document();
        let mut index = 2;

        for (category, criteria) in CATEGORIES {
            assert_eq!(flat.values()[index], document[category]["Average Rating"]);
            index += 1;
            for criterion in criteria {
                assert_eq!(flat.values()[index], document[category][criterion]["rating"]);
                assert_eq!(flat.values()[index + 1], document[category][criterion]["plan of action"]);
                index += 2;
            }
        }
        assert_eq!(index, FlatDisplayResult::LEN);
    }

    #[test]
    fn test_flatten_keeps_null_leaves() {
        let mut document = valid_document();
        document["Summary"] = Value::Null;

        let flat = flatten_document(&document).unwrap();
        assert_eq!(flat.values()[1], Value::Null);
    }

    #[test]
    fn test_flatten_missing_key_names_path() {
        let mut document = valid_document();
        document["Geographic Diversity"]["WE"]
            .as_object_mut()
            .unwrap()
            .remove("plan of action");

        match flatten_document(&document) {
            Err(MalformedResult::MissingKey(path)) => {
                assert_eq!(path, "Geographic Diversity > WE > plan of action")
            }
            other => panic!("expected missing key, got {:?}", other),
        }
    }

    #[test]
    fn test_flatten_response_rejects_invalid_json() {
        assert!(matches!(
            flatten_response("Sorry, I cannot help with that."),
            Err(MalformedResult::Json(_))
        ));
    }

    #[test]
    fn test_flatten_response_parses_text() {
        let flat = flatten_response(&valid_document().to_string()).unwrap();
        assert_eq!(flat.values().len(), FlatDisplayResult::LEN);
    }

    #[test]
    fn test_display_labels_align_with_values() {
        let labels = display_labels();
        assert_eq!(labels.len(), FlatDisplayResult::LEN);
        assert_eq!(labels[0], "Overall Rating");
        assert_eq!(labels[2], "Demographic Diversity Average Rating");
        assert_eq!(labels[3], "URM Rating");
        assert_eq!(labels[4], "URM Plan of Action");
        assert_eq!(labels[19], "FO Plan of Action");
        assert_eq!(labels[20], "Seniority/Career Phase Average Rating");
        assert_eq!(labels[26], "assistant professor Plan of Action");
    }
}
