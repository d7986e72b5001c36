use serde::{Deserialize, Deserializer};

/// Keeps "field absent" apart from "field is null" in PATCH bodies:
/// absent stays `None` (via `#[serde(default)]`), `null` becomes `Some(None)`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trims surrounding whitespace before `validator` length rules see the value.
pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

/// [`trimmed`] for optional fields; pair with `#[serde(default)]`.
pub fn trimmed_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|s| s.map(|s| s.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        assignee_id: Option<Option<i32>>,
    }

    #[derive(Deserialize)]
    struct Named {
        #[serde(deserialize_with = "trimmed")]
        name: String,
        #[serde(default, deserialize_with = "trimmed_option")]
        label: Option<String>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.assignee_id, None);

        let cleared: Patch = serde_json::from_str(r#"{"assignee_id": null}"#).unwrap();
        assert_eq!(cleared.assignee_id, Some(None));

        let set: Patch = serde_json::from_str(r#"{"assignee_id": 4}"#).unwrap();
        assert_eq!(set.assignee_id, Some(Some(4)));
    }

    #[test]
    fn names_are_trimmed_on_the_way_in() {
        let named: Named = serde_json::from_str(r#"{"name": " a ", "label": "  Disk "}"#).unwrap();
        assert_eq!(named.name, "a");
        assert_eq!(named.label.as_deref(), Some("Disk"));

        let named: Named = serde_json::from_str(r#"{"name": "Network"}"#).unwrap();
        assert_eq!(named.label, None);
    }
}
