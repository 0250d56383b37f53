//! Typed field access on NBT compounds.
//!
//! Every lookup reports whether a field was missing or had the wrong tag,
//! so callers pick between "absent means default" and "absent is an error".

use quartz_nbt::{NbtCompound, NbtList, NbtTag};

use crate::error::FormatError;

/// A value that can be borrowed out of a single NBT tag.
pub(crate) trait FromTag<'a>: Sized {
    const EXPECTED: &'static str;

    fn from_tag(tag: &'a NbtTag) -> Option<Self>;
}

macro_rules! from_tag {
    ($lt:lifetime, $ty:ty, $variant:ident, $name:literal, |$v:ident| $conv:expr) => {
        impl<$lt> FromTag<$lt> for $ty {
            const EXPECTED: &'static str = $name;

            fn from_tag(tag: &$lt NbtTag) -> Option<Self> {
                match tag {
                    NbtTag::$variant($v) => Some($conv),
                    _ => None,
                }
            }
        }
    };
}

from_tag!('a, i8, Byte, "Byte", |v| *v);
from_tag!('a, i32, Int, "Int", |v| *v);
from_tag!('a, i64, Long, "Long", |v| *v);
from_tag!('a, &'a [i8], ByteArray, "ByteArray", |v| v.as_slice());
from_tag!('a, &'a [i32], IntArray, "IntArray", |v| v.as_slice());
from_tag!('a, &'a NbtCompound, Compound, "Compound", |v| v);
from_tag!('a, &'a NbtList, List, "List", |v| v);

/// Field that must be present with the right tag.
pub(crate) fn required<'a, T: FromTag<'a>>(
    compound: &'a NbtCompound,
    field: &'static str,
) -> Result<T, FormatError> {
    optional(compound, field)?.ok_or(FormatError::Missing { field })
}

/// Field that may be absent; present with the wrong tag is still an error.
pub(crate) fn optional<'a, T: FromTag<'a>>(
    compound: &'a NbtCompound,
    field: &'static str,
) -> Result<Option<T>, FormatError> {
    match compound.inner().get(field) {
        None => Ok(None),
        Some(tag) => T::from_tag(tag)
            .map(Some)
            .ok_or(FormatError::WrongType {
                field,
                expected: T::EXPECTED,
            }),
    }
}

/// Required byte array of exactly `N` bytes.
pub(crate) fn byte_array<const N: usize>(
    compound: &NbtCompound,
    field: &'static str,
) -> Result<Box<[u8; N]>, FormatError> {
    let bytes: &[i8] = required(compound, field)?;
    if bytes.len() != N {
        return Err(FormatError::BadLength {
            field,
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = Box::new([0u8; N]);
    out.copy_from_slice(bytemuck::cast_slice(bytes));
    Ok(out)
}

/// Optional list whose elements must all be compounds.
pub(crate) fn compound_list<'a>(
    compound: &'a NbtCompound,
    field: &'static str,
) -> Result<Vec<&'a NbtCompound>, FormatError> {
    let Some(list) = optional::<&NbtList>(compound, field)? else {
        return Ok(Vec::new());
    };
    list.iter()
        .map(|tag| match tag {
            NbtTag::Compound(c) => Ok(c),
            _ => Err(FormatError::WrongType {
                field,
                expected: "List of Compound",
            }),
        })
        .collect()
}

/// Optional boolean stored as a byte; absent reads as `false`.
pub(crate) fn flag(compound: &NbtCompound, field: &'static str) -> Result<bool, FormatError> {
    Ok(optional::<i8>(compound, field)?.is_some_and(|b| b != 0))
}

/// Byte array tag from unsigned bytes.
pub(crate) fn byte_array_tag(bytes: &[u8]) -> NbtTag {
    NbtTag::ByteArray(bytemuck::cast_slice::<u8, i8>(bytes).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NbtCompound {
        let mut c = NbtCompound::new();
        c.insert("i", NbtTag::Int(7));
        c.insert("b", NbtTag::Byte(1));
        c.insert("arr", NbtTag::ByteArray(vec![-1, 2, 3]));
        c.insert("list", NbtTag::List(NbtList::from(vec![NbtTag::Int(1)])));
        c
    }

    #[test]
    fn required_reads_matching_tag() {
        let c = sample();
        assert_eq!(required::<i32>(&c, "i").unwrap(), 7);
    }

    #[test]
    fn missing_and_wrong_type_are_distinct() {
        let c = sample();
        assert!(matches!(
            required::<i32>(&c, "nope"),
            Err(FormatError::Missing { field: "nope" })
        ));
        assert!(matches!(
            required::<i64>(&c, "i"),
            Err(FormatError::WrongType {
                field: "i",
                expected: "Long"
            })
        ));
        assert!(optional::<i64>(&c, "nope").unwrap().is_none());
        assert!(optional::<i64>(&c, "i").is_err());
    }

    #[test]
    fn byte_array_checks_length_and_sign() {
        let c = sample();
        let arr = byte_array::<3>(&c, "arr").unwrap();
        assert_eq!(*arr, [255, 2, 3]);
        assert!(matches!(
            byte_array::<4>(&c, "arr"),
            Err(FormatError::BadLength {
                expected: 4,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn compound_list_rejects_other_elements() {
        let c = sample();
        assert!(compound_list(&c, "list").is_err());
        assert!(compound_list(&c, "absent").unwrap().is_empty());
    }

    #[test]
    fn flag_defaults_to_false() {
        let c = sample();
        assert!(flag(&c, "b").unwrap());
        assert!(!flag(&c, "absent").unwrap());
        assert!(flag(&c, "i").is_err());
    }
}
