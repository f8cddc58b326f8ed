//! Data-format profiles.
//!
//! A profile maps the semantic fields of a response record to their
//! zero-based position in a comma-separated input line. Profiles are looked
//! up by name; custom ones come from the config file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// Field names of the `simple` export.
pub const SIMPLE_FIELDS: &[&str] = &["user", "exercise", "time_taken", "correct"];

/// Field names of the problem-log export.
pub const PLOG_FIELDS: &[&str] = &[
    "user",
    "time_done",
    "rowtype",
    "exercise",
    "problem_type",
    "seed",
    "time_taken",
    "problem_number",
    "correct",
    "number_attempts",
    "number_hints",
    "eventually_correct",
    "topic_mode",
    "dt",
];

/// Built-in profiles by name.
pub const BUILTIN_FORMATS: &[(&str, &[&str])] =
    &[("simple", SIMPLE_FIELDS), ("plog", PLOG_FIELDS)];

/// Zero-based positions of the fields the parser needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFormat {
    pub user: usize,
    pub exercise: usize,
    pub time_taken: usize,
    pub correct: usize,
}

impl DataFormat {
    /// Look up a built-in profile.
    pub fn for_slug(slug: &str) -> Result<Self, EvalError> {
        let (_, fields) = BUILTIN_FORMATS
            .iter()
            .find(|(name, _)| *name == slug)
            .ok_or_else(|| EvalError::UnknownFormat(slug.to_string()))?;
        Self::from_field_names(*fields)
    }

    /// Build a profile from an ordered list of column names.
    pub fn from_field_names<S: AsRef<str>>(names: &[S]) -> Result<Self, EvalError> {
        let position = |field: &str| {
            names
                .iter()
                .position(|n| n.as_ref() == field)
                .ok_or_else(|| EvalError::InvalidFormat(format!("missing field '{field}'")))
        };

        Ok(Self {
            user: position("user")?,
            exercise: position("exercise")?,
            time_taken: position("time_taken")?,
            correct: position("correct")?,
        })
    }

    /// The largest position this profile reads.
    pub fn max_index(&self) -> usize {
        self.user
            .max(self.exercise)
            .max(self.time_taken)
            .max(self.correct)
    }
}

/// Built-in profiles plus any declared in configuration.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    formats: BTreeMap<String, DataFormat>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        // Every built-in field list names all required fields.
        let formats = BUILTIN_FORMATS
            .iter()
            .filter_map(|(name, fields)| {
                DataFormat::from_field_names(*fields)
                    .ok()
                    .map(|format| (name.to_string(), format))
            })
            .collect();
        Self { formats }
    }
}

impl FormatRegistry {
    /// Registry with the built-in profiles and `custom` layered on top.
    pub fn with_custom<'a>(custom: impl IntoIterator<Item = (&'a String, &'a DataFormat)>) -> Self {
        let mut registry = Self::default();
        for (name, format) in custom {
            if registry.formats.insert(name.clone(), *format).is_some() {
                tracing::debug!("custom data format '{name}' overrides the built-in profile");
            }
        }
        registry
    }

    pub fn get(&self, name: &str) -> Result<DataFormat, EvalError> {
        self.formats
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::UnknownFormat(name.to_string()))
    }

    /// All profiles, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataFormat)> {
        self.formats.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_profile_positions() {
        let f = DataFormat::for_slug("simple").unwrap();
        assert_eq!(
            f,
            DataFormat {
                user: 0,
                exercise: 1,
                time_taken: 2,
                correct: 3
            }
        );
        assert_eq!(f.max_index(), 3);
    }

    #[test]
    fn plog_profile_positions() {
        let f = DataFormat::for_slug("plog").unwrap();
        assert_eq!(f.user, 0);
        assert_eq!(f.exercise, 3);
        assert_eq!(f.time_taken, 6);
        assert_eq!(f.correct, 8);
    }

    #[test]
    fn registry_matches_slug_lookup() {
        let registry = FormatRegistry::default();
        for (name, format) in registry.iter() {
            assert_eq!(DataFormat::for_slug(name).unwrap(), *format);
        }
    }

    #[test]
    fn registry_holds_every_builtin() {
        let registry = FormatRegistry::default();
        let names: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["plog", "simple"]);
        for (name, fields) in BUILTIN_FORMATS {
            assert_eq!(
                registry.get(name).unwrap(),
                DataFormat::from_field_names(*fields).unwrap()
            );
        }
    }

    #[test]
    fn unknown_slug_is_rejected() {
        assert_eq!(
            DataFormat::for_slug("csv9"),
            Err(EvalError::UnknownFormat("csv9".into()))
        );
        assert!(FormatRegistry::default().get("nope").is_err());
    }

    #[test]
    fn field_names_must_cover_required_fields() {
        let err = DataFormat::from_field_names(&["user", "exercise", "correct"]).unwrap_err();
        assert!(matches!(err, EvalError::InvalidFormat(msg) if msg.contains("time_taken")));
    }

    #[test]
    fn custom_profiles_shadow_builtins() {
        let custom: BTreeMap<String, DataFormat> = [(
            "simple".to_string(),
            DataFormat {
                user: 3,
                exercise: 2,
                time_taken: 1,
                correct: 0,
            },
        )]
        .into_iter()
        .collect();
        let registry = FormatRegistry::with_custom(&custom);
        assert_eq!(registry.get("simple").unwrap().user, 3);
        assert_eq!(registry.get("plog").unwrap().correct, 8);
    }
}
