//! Serde support for patch fields that distinguish "absent" from "null".
//!
//! Use as `#[serde(default, deserialize_with = "crate::nullable::deserialize")]`
//! on an `Option<Option<T>>`: a missing key stays `None`, an explicit
//! `null` becomes `Some(None)` and a value becomes `Some(Some(v))`.

use serde::{Deserialize, Deserializer};

pub(crate) fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    // Only called when the key is present, so `null` means "clear".
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Default)]
    struct Patch {
        #[serde(default, deserialize_with = "super::deserialize")]
        notes: Option<Option<String>>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.notes, None);

        let cleared: Patch = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(cleared.notes, Some(None));

        let set: Patch = serde_json::from_str(r#"{"notes": "felt strong"}"#).unwrap();
        assert_eq!(set.notes, Some(Some("felt strong".to_string())));
    }
}
