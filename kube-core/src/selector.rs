//! Label and field selector requirements and their wire encoding.
//!
//! Grammar (see the system spec's Data Model section): requirements are
//! joined with commas, in caller-provided order, duplicates preserved.
use thiserror::Error;

/// A single label requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelSelector {
    /// `key=value`
    Eq(String, String),
    /// `key!=value`
    Neq(String, String),
    /// `key in (v1,v2,...)`
    In(String, Vec<String>),
    /// `key notin (v1,v2,...)`
    NotIn(String, Vec<String>),
    /// `key`
    Exists(String),
    /// `!key`
    DoesNotExist(String),
}

/// A single field requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelector {
    /// `path=value`
    Eq(String, String),
    /// `path!=value`
    Neq(String, String),
}

/// Raised when a selector requirement cannot be encoded onto the wire.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    /// `In`/`NotIn` was given zero values.
    #[error("selector requirement on key {0:?} needs at least one value")]
    EmptyValueSet(String),
    /// A label value contains characters outside `[A-Za-z0-9_.-]`.
    #[error("label value {0:?} contains characters outside [A-Za-z0-9_.-]")]
    InvalidValue(String),
}

fn validate_value(v: &str) -> Result<(), SelectorError> {
    let ok = v
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if ok {
        Ok(())
    } else {
        Err(SelectorError::InvalidValue(v.to_string()))
    }
}

impl LabelSelector {
    fn encode(&self) -> Result<String, SelectorError> {
        match self {
            LabelSelector::Eq(k, v) => {
                validate_value(v)?;
                Ok(format!("{k}={v}"))
            }
            LabelSelector::Neq(k, v) => {
                validate_value(v)?;
                Ok(format!("{k}!={v}"))
            }
            LabelSelector::In(k, vs) => {
                if vs.is_empty() {
                    return Err(SelectorError::EmptyValueSet(k.clone()));
                }
                for v in vs {
                    validate_value(v)?;
                }
                Ok(format!("{k} in ({})", vs.join(",")))
            }
            LabelSelector::NotIn(k, vs) => {
                if vs.is_empty() {
                    return Err(SelectorError::EmptyValueSet(k.clone()));
                }
                for v in vs {
                    validate_value(v)?;
                }
                Ok(format!("{k} notin ({})", vs.join(",")))
            }
            LabelSelector::Exists(k) => Ok(k.clone()),
            LabelSelector::DoesNotExist(k) => Ok(format!("!{k}")),
        }
    }
}

impl FieldSelector {
    fn encode(&self) -> String {
        match self {
            FieldSelector::Eq(p, v) => format!("{p}={v}"),
            FieldSelector::Neq(p, v) => format!("{p}!={v}"),
        }
    }
}

/// Encode a sequence of label requirements, preserving order and duplicates.
///
/// Returns `None` for an empty list (the caller should then omit the query
/// parameter entirely, never send an empty one).
pub fn encode_label_selector(reqs: &[LabelSelector]) -> Result<Option<String>, SelectorError> {
    if reqs.is_empty() {
        return Ok(None);
    }
    let parts = reqs
        .iter()
        .map(LabelSelector::encode)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(parts.join(",")))
}

/// Encode a sequence of field requirements, preserving order and duplicates.
pub fn encode_field_selector(reqs: &[FieldSelector]) -> Option<String> {
    if reqs.is_empty() {
        return None;
    }
    Some(reqs.iter().map(FieldSelector::encode).collect::<Vec<_>>().join(","))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_selector_is_none() {
        assert_eq!(encode_label_selector(&[]).unwrap(), None);
        assert_eq!(encode_field_selector(&[]), None);
    }

    #[test]
    fn encodes_full_grammar_in_order() {
        let reqs = vec![
            LabelSelector::In("foo".into(), vec!["bar".into(), "baz".into()]),
            LabelSelector::NotIn("foo".into(), vec!["bar".into(), "baz".into()]),
            LabelSelector::Eq("foo".into(), "bar".into()),
            LabelSelector::Neq("foo".into(), "bar".into()),
            LabelSelector::Exists("foo".into()),
            LabelSelector::DoesNotExist("foo".into()),
        ];
        let encoded = encode_label_selector(&reqs).unwrap().unwrap();
        assert_eq!(
            encoded,
            "foo in (bar,baz),foo notin (bar,baz),foo=bar,foo!=bar,foo,!foo"
        );
    }

    #[test]
    fn duplicate_keys_are_preserved_not_deduped() {
        let reqs = vec![
            LabelSelector::Eq("app".into(), "nginx".into()),
            LabelSelector::Eq("app".into(), "nginx".into()),
        ];
        assert_eq!(encode_label_selector(&reqs).unwrap().unwrap(), "app=nginx,app=nginx");
    }

    #[test]
    fn in_with_no_values_fails() {
        let reqs = vec![LabelSelector::In("app".into(), vec![])];
        assert_eq!(
            encode_label_selector(&reqs).unwrap_err(),
            SelectorError::EmptyValueSet("app".into())
        );
    }

    #[test]
    fn field_selector_encodes_eq_and_neq() {
        let reqs = vec![
            FieldSelector::Eq("metadata.name".into(), "foo".into()),
            FieldSelector::Neq("status.phase".into(), "Running".into()),
        ];
        assert_eq!(
            encode_field_selector(&reqs).unwrap(),
            "metadata.name=foo,status.phase!=Running"
        );
    }

    #[test]
    fn invalid_label_value_rejected() {
        let reqs = vec![LabelSelector::Eq("app".into(), "ngin x".into())];
        assert!(matches!(
            encode_label_selector(&reqs).unwrap_err(),
            SelectorError::InvalidValue(_)
        ));
    }
}
