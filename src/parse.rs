//! C1: Type & Vector Parser.
//!
//! Validates an incoming type-string against an expected element type and
//! vector length, counts null (`N`) elements, and locates the boundary
//! between the value prefix and the `@name, value` property suffix
//! (§4.1, §6 value-message grammar).

use crate::value::{Arg, ElementType};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("value prefix length {value_len} is not a positive multiple of vector length {length}")]
    BadVectorLength { value_len: usize, length: usize },
    #[error("value tag '{tag}' at position {position} does not match expected type '{expected}' or 'N'")]
    TypeMismatch {
        position: usize,
        tag: char,
        expected: char,
    },
    #[error("unrecognized property name '{name}'")]
    UnknownProperty { name: String },
    #[error("property '{name}' value has wrong type tag '{tag}'")]
    PropertyTypeMismatch { name: &'static str, tag: char },
    #[error("property suffix is truncated")]
    TruncatedProperty,
}

/// Outcome of scanning the value prefix of a type-string (§4.1 steps 1-5,
/// minus property parsing which is a distinct step run by the caller).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValuePrefix {
    /// Number of packed samples of length `length` found in the prefix.
    pub count: usize,
    /// Total count of `N` (null) tags across the whole prefix.
    pub nulls: usize,
    /// Index into the type-string / args array where the property suffix
    /// begins (the index of the first `s`/`S` tag, or the string length if
    /// there is none).
    pub prop_start: usize,
}

/// Step 1-5 of §4.1: scan `typetags` up to the first `s`/`S` tag, validate
/// it is a well-formed sequence of `count` vectors of length `length` whose
/// elements are all either `expected` or `N`, and return the parsed shape.
///
/// A `typetags` with no `s`/`S` tag is scanned in its entirety as the value
/// prefix.
pub fn parse_value_prefix(
    typetags: &[u8],
    expected: ElementType,
    length: usize,
) -> Result<ValuePrefix, ParseError> {
    debug_assert!(length >= 1);

    let prop_start = typetags
        .iter()
        .position(|&b| b == b's' || b == b'S')
        .unwrap_or(typetags.len());

    let value_len = prop_start;
    let nulls = typetags[..value_len].iter().filter(|&&b| b == b'N').count();

    if value_len == 0 || value_len % length != 0 {
        log::debug!(
            "rejecting message: value_len={value_len} not a positive multiple of length={length}"
        );
        return Err(ParseError::BadVectorLength { value_len, length });
    }
    let count = value_len / length;
    if count == 0 {
        return Err(ParseError::BadVectorLength { value_len, length });
    }

    let expected_tag = expected.tag() as char;
    for (i, &b) in typetags[..value_len].iter().enumerate() {
        if b != expected.tag() && b != b'N' {
            log::debug!("rejecting message: tag mismatch at {i}: '{}'", b as char);
            return Err(ParseError::TypeMismatch {
                position: i,
                tag: b as char,
                expected: expected_tag,
            });
        }
    }

    Ok(ValuePrefix {
        count,
        nulls,
        prop_start,
    })
}

/// Recognized `@name` property keys in the value-message grammar (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyName {
    Instance,
    Slot,
}

/// Parsed property suffix: `[@instance <h>] [@slot <i>]` in any combination,
/// each appearing at most once (§4.1, §4.4.1 steps 1 and 3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Properties {
    pub instance: Option<u64>,
    pub slot: Option<i32>,
}

/// Parse the `@name, value` pairs starting at `prop_start` in `typetags` /
/// `args`. Any unrecognized name or type mismatch rejects the whole message,
/// per §4.1.
pub fn parse_properties(
    typetags: &[u8],
    args: &[Arg],
    prop_start: usize,
) -> Result<Properties, ParseError> {
    let mut props = Properties::default();
    let mut i = prop_start;

    while i < typetags.len() {
        if typetags[i] != b's' && typetags[i] != b'S' {
            return Err(ParseError::TypeMismatch {
                position: i,
                tag: typetags[i] as char,
                expected: 's',
            });
        }
        let name = match args.get(i) {
            Some(Arg::Str(s)) => s.as_str(),
            _ => return Err(ParseError::TruncatedProperty),
        };

        let value_idx = i + 1;
        if value_idx >= typetags.len() {
            return Err(ParseError::TruncatedProperty);
        }

        match name {
            "@instance" => {
                if typetags[value_idx] != b'h' {
                    return Err(ParseError::PropertyTypeMismatch {
                        name: "@instance",
                        tag: typetags[value_idx] as char,
                    });
                }
                match args.get(value_idx) {
                    Some(Arg::Int64(v)) => props.instance = Some(*v as u64),
                    _ => return Err(ParseError::TruncatedProperty),
                }
            }
            "@slot" => {
                if typetags[value_idx] != b'i' {
                    return Err(ParseError::PropertyTypeMismatch {
                        name: "@slot",
                        tag: typetags[value_idx] as char,
                    });
                }
                match args.get(value_idx) {
                    Some(Arg::Int32(v)) => props.slot = Some(*v),
                    _ => return Err(ParseError::TruncatedProperty),
                }
            }
            other => {
                return Err(ParseError::UnknownProperty {
                    name: other.to_string(),
                })
            }
        }

        i = value_idx + 1;
    }

    Ok(props)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_single_sample() {
        let tt = b"f";
        let p = parse_value_prefix(tt, ElementType::F32, 1).unwrap();
        assert_eq!(p, ValuePrefix { count: 1, nulls: 0, prop_start: 1 });
    }

    #[test]
    fn vector_two_samples_packed() {
        let tt = b"iiii";
        let p = parse_value_prefix(tt, ElementType::I32, 2).unwrap();
        assert_eq!(p.count, 2);
        assert_eq!(p.nulls, 0);
    }

    #[test]
    fn release_message_is_all_nulls() {
        let tt = b"N";
        let p = parse_value_prefix(tt, ElementType::F32, 1).unwrap();
        assert_eq!(p.count, 1);
        assert_eq!(p.nulls, 1);
    }

    #[test]
    fn non_multiple_length_is_rejected() {
        let tt = b"fff";
        let err = parse_value_prefix(tt, ElementType::F32, 2).unwrap_err();
        assert!(matches!(err, ParseError::BadVectorLength { .. }));
    }

    #[test]
    fn wrong_element_type_is_rejected() {
        let tt = b"if";
        let err = parse_value_prefix(tt, ElementType::I32, 1).unwrap_err();
        assert!(matches!(err, ParseError::TypeMismatch { position: 1, .. }));
    }

    #[test]
    fn property_suffix_instance_and_slot() {
        let tt = [b'f', b's', b'h', b's', b'i'];
        let args = vec![
            Arg::Float32(1.0),
            Arg::Str("@instance".to_string()),
            Arg::Int64(7),
            Arg::Str("@slot".to_string()),
            Arg::Int32(2),
        ];
        let prefix = parse_value_prefix(&tt, ElementType::F32, 1).unwrap();
        assert_eq!(prefix.prop_start, 1);
        let props = parse_properties(&tt, &args, prefix.prop_start).unwrap();
        assert_eq!(props.instance, Some(7));
        assert_eq!(props.slot, Some(2));
    }

    #[test]
    fn unknown_property_name_is_rejected() {
        let tt = [b'f', b's', b'i'];
        let args = vec![
            Arg::Float32(1.0),
            Arg::Str("@bogus".to_string()),
            Arg::Int32(1),
        ];
        let prefix = parse_value_prefix(&tt, ElementType::F32, 1).unwrap();
        let err = parse_properties(&tt, &args, prefix.prop_start).unwrap_err();
        assert!(matches!(err, ParseError::UnknownProperty { .. }));
    }
}
