//! Typed decode of skill list items.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{CoreError, Record};

/// Default `$select` list for skill items.
pub const SKILL_SELECT: &[&str] = &[
    "Id", "Title", "Description", "Category", "Level", "Created", "Modified", "Author/Title", "Author/Email",
];

/// Nested author fields always requested alongside a caller-provided select list.
pub const AUTHOR_SELECT: &[&str] = &["Author/Title", "Author/Email"];

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Author {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
}

/// One item of the skills list as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Skill {
    pub id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    pub created: String,
    pub modified: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: Author,
}

impl Skill {
    /// Decode one raw item, reporting which field broke the expected shape.
    pub fn from_value(v: Value) -> Result<Self, CoreError> {
        serde_json::from_value(v).map_err(|e| CoreError::Decode(e.to_string()))
    }

    /// Project onto the fixed skill field list. Absent optionals are omitted.
    pub fn to_record(&self) -> Record {
        let mut m = Map::new();
        m.insert("Id".into(), Value::from(self.id));
        m.insert("Title".into(), Value::from(self.title.clone()));
        if let Some(d) = &self.description { m.insert("Description".into(), Value::from(d.clone())); }
        if let Some(c) = &self.category { m.insert("Category".into(), Value::from(c.clone())); }
        if let Some(l) = &self.level { m.insert("Level".into(), Value::from(l.clone())); }
        m.insert("Created".into(), Value::from(self.created.clone()));
        m.insert("Modified".into(), Value::from(self.modified.clone()));
        let mut author = Map::new();
        author.insert("Title".into(), Value::from(self.author.title.clone()));
        author.insert("Email".into(), Value::from(self.author.email.clone()));
        m.insert("Author".into(), Value::Object(author));
        Record::from_map(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_full_item() {
        let s = Skill::from_value(json!({
            "Id": 3, "Title": "Go", "Description": "Concurrency", "Category": "Lang", "Level": "Mid",
            "Created": "2024-01-01T00:00:00Z", "Modified": "2024-02-01T00:00:00Z",
            "Author": { "Title": "Grace", "Email": "grace@example.com" },
            "Extra": "ignored"
        }))
        .unwrap();
        assert_eq!(s.id, 3);
        assert_eq!(s.author.title, "Grace");
        let r = s.to_record();
        assert_eq!(r.resolve("Author.Email"), Some(&json!("grace@example.com")));
        assert!(r.get("Extra").is_none());
    }

    #[test]
    fn missing_author_defaults_to_empty() {
        let s = Skill::from_value(json!({
            "Id": 1, "Title": null, "Created": "c", "Modified": "m", "Author": null, "Description": null
        }))
        .unwrap();
        assert_eq!(s.title, "");
        assert_eq!(s.author, Author::default());
        assert_eq!(s.description, None);
        assert!(s.to_record().get("Description").is_none());
    }

    #[test]
    fn shape_errors_are_reported() {
        let err = Skill::from_value(json!({ "Title": "x", "Created": "c", "Modified": "m" })).unwrap_err();
        assert!(err.to_string().contains("Id"), "{}", err);
        assert!(Skill::from_value(json!({ "Id": "seven", "Title": "x", "Created": "c", "Modified": "m" })).is_err());
    }
}
