//! Directory types returned by the remote API.

use serde::{Deserialize, Deserializer, Serialize};

/// A class together with the subjects that can be timetabled for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub school_id: Option<String>,
    #[serde(default, deserialize_with = "subject_names")]
    pub subjects: Vec<String>,
}

/// Subjects come either as plain names or as `{ "name": ... }` objects
#[derive(Deserialize)]
#[serde(untagged)]
enum SubjectRef {
    Name(String),
    Object { name: String },
}

fn subject_names<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw = Option::<Vec<SubjectRef>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|s| match s {
            SubjectRef::Name(name) | SubjectRef::Object { name } => name,
        })
        .filter(|name| !name.is_empty())
        .collect())
}

/// List endpoints answer either with a bare JSON value or wrapped in `data`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_subject_shapes() {
        let class: ClassInfo = serde_json::from_str(
            r#"{"_id":"C1","name":"7A","subjects":["Math",{"name":"Art"},""]}"#,
        )
        .unwrap();
        assert_eq!(class.id, "C1");
        assert_eq!(class.subjects, vec!["Math".to_string(), "Art".to_string()]);

        let bare: ClassInfo = serde_json::from_str(r#"{"id":"C2","subjects":null}"#).unwrap();
        assert!(bare.subjects.is_empty());
    }

    #[test]
    fn test_envelope_shapes() {
        let wrapped: Envelope<Vec<u32>> = serde_json::from_str(r#"{"data":[1,2]}"#).unwrap();
        assert_eq!(wrapped.into_inner(), vec![1, 2]);

        let bare: Envelope<Vec<u32>> = serde_json::from_str(r#"[3]"#).unwrap();
        assert_eq!(bare.into_inner(), vec![3]);
    }
}
