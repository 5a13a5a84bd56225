//! Presentation of arbitrary command output as titled sections of key/value
//! rows and tables. The payload itself is never modified.

use serde_json::{Map, Value};

use super::json_converter::value_to_short_string;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSection {
    pub title: String,
    pub fields: Vec<Field>,
    pub table: Option<ResultTable>,
}

impl ResultSection {
    fn new(title: impl Into<String>) -> Self {
        ResultSection {
            title: title.into(),
            fields: Vec::new(),
            table: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.table.is_none()
    }
}

pub fn sections_from_value(value: &Value) -> Vec<ResultSection> {
    match value {
        Value::Object(map) => sections_from_object(map),
        Value::Array(items) => {
            let mut section = ResultSection::new("");
            match table_from_array(items) {
                Some(table) => section.table = Some(table),
                None => section.fields.push(field("value", value_to_short_string(value))),
            }
            vec![section]
        }
        Value::Null => vec![],
        scalar => {
            let mut section = ResultSection::new("");
            section.fields.push(field("value", value_to_short_string(scalar)));
            vec![section]
        }
    }
}

fn sections_from_object(map: &Map<String, Value>) -> Vec<ResultSection> {
    let mut general = ResultSection::new("");
    let mut sections = Vec::new();

    // `_ERROR`, `_WARNING` and friends are shown as messages, not data.
    for (key, value) in map.iter().filter(|(k, _)| !k.starts_with('_')) {
        match value {
            Value::Object(inner) if labelled_value(inner).is_none() => {
                let mut section = ResultSection::new(key.clone());
                flatten_into("", inner, &mut section.fields);
                if !section.is_empty() {
                    sections.push(section);
                }
            }
            Value::Array(items) => match table_from_array(items) {
                Some(table) => {
                    let mut section = ResultSection::new(key.clone());
                    section.table = Some(table);
                    sections.push(section);
                }
                None => general.fields.push(field(key, value_to_short_string(value))),
            },
            _ => general.fields.push(display_field(key, value)),
        }
    }

    if !general.is_empty() {
        sections.insert(0, general);
    }
    sections
}

/// Nested objects become dotted keys: `{"wal": {"size": 1}}` -> `wal.size`.
fn flatten_into(prefix: &str, map: &Map<String, Value>, out: &mut Vec<Field>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) if !inner.is_empty() && labelled_value(inner).is_none() => {
                flatten_into(&path, inner, out)
            }
            _ => out.push(display_field(&path, value)),
        }
    }
}

/// barman's status output wraps values as `{"description": .., "message": ..}`.
fn labelled_value(map: &Map<String, Value>) -> Option<(String, String)> {
    let description = map.get("description")?.as_str()?;
    let message = map.get("message")?;
    Some((description.to_string(), value_to_short_string(message)))
}

fn display_field(key: &str, value: &Value) -> Field {
    match value.as_object().and_then(labelled_value) {
        Some((label, message)) => field(&label, message),
        None => field(key, value_to_short_string(value)),
    }
}

fn table_from_array(items: &[Value]) -> Option<ResultTable> {
    if items.is_empty() || !items.iter().all(Value::is_object) {
        return None;
    }
    let mut columns: Vec<String> = Vec::new();
    for item in items.iter().filter_map(Value::as_object) {
        for key in item.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|item| {
            columns
                .iter()
                .map(|c| item.get(c).map(value_to_short_string).unwrap_or_default())
                .collect()
        })
        .collect();
    Some(ResultTable { columns, rows })
}

fn field(key: &str, value: String) -> Field {
    Field {
        key: key.to_string(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_objects_become_sections() {
        let sections = sections_from_value(&json!({
            "pg": {"active": true, "wal": {"compression": "gzip"}},
        }));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "pg");
        assert_eq!(
            sections[0].fields,
            vec![
                Field { key: "active".into(), value: "true".into() },
                Field { key: "wal.compression".into(), value: "gzip".into() },
            ]
        );
    }

    #[test]
    fn labelled_status_values_use_their_description() {
        let sections = sections_from_value(&json!({
            "pg": {"active": {"description": "Active", "message": "True"}},
        }));
        assert_eq!(sections[0].fields[0], Field { key: "Active".into(), value: "True".into() });
    }

    #[test]
    fn arrays_of_objects_become_tables() {
        let sections = sections_from_value(&json!({
            "pg": [{"backup_id": "a", "status": "DONE"}, {"backup_id": "b", "size": "1 GiB"}],
        }));
        let table = sections[0].table.as_ref().unwrap();
        assert_eq!(table.columns, vec!["backup_id", "status", "size"]);
        assert_eq!(table.rows[1], vec!["b", "", "1 GiB"]);
    }

    #[test]
    fn scalars_land_in_an_untitled_section_first() {
        let sections = sections_from_value(&json!({"pg": {"a": 1}, "ok": true, "_ERROR": ["x"]}));
        assert_eq!(sections[0].title, "");
        assert_eq!(sections[0].fields, vec![Field { key: "ok".into(), value: "true".into() }]);
        assert_eq!(sections[1].title, "pg");
    }

    #[test]
    fn null_renders_nothing() {
        assert!(sections_from_value(&Value::Null).is_empty());
    }
}
