//! Element types and wire-level argument representation.
//!
//! `Arg` stands in for the OSC-like transport's argument representation
//! (out of scope per §1 — "the OSC-like transport layer" is an external
//! collaborator). The core only needs to know the handful of tags the
//! value-message grammar (§6) actually uses.

/// The element type of a signal's value vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    I32,
    F32,
    F64,
}

impl ElementType {
    /// The type-tag character this element type is written as on the wire.
    pub const fn tag(self) -> u8 {
        match self {
            ElementType::I32 => b'i',
            ElementType::F32 => b'f',
            ElementType::F64 => b'd',
        }
    }
}

/// A single scalar value of a signal's vector, tagged by element type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    I32(i32),
    F32(f32),
    F64(f64),
}

impl Scalar {
    pub fn element_type(&self) -> ElementType {
        match self {
            Scalar::I32(_) => ElementType::I32,
            Scalar::F32(_) => ElementType::F32,
            Scalar::F64(_) => ElementType::F64,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::I32(v) => v as f64,
            Scalar::F32(v) => v as f64,
            Scalar::F64(v) => v,
        }
    }

    /// Coerce into a different element type, as used by the query handler
    /// (§4.5) when a reply type differing from the signal's own is requested.
    pub fn coerce(&self, to: ElementType) -> Scalar {
        let v = self.as_f64();
        match to {
            ElementType::I32 => Scalar::I32(v as i32),
            ElementType::F32 => Scalar::F32(v as f32),
            ElementType::F64 => Scalar::F64(v),
        }
    }
}

/// One wire-level argument, as produced by the (out-of-scope) OSC-like
/// transport's decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Null,
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Str(String),
}

impl Arg {
    /// The type-tag character this argument was decoded from.
    pub fn tag(&self) -> u8 {
        match self {
            Arg::Null => b'N',
            Arg::Int32(_) => b'i',
            Arg::Int64(_) => b'h',
            Arg::Float32(_) => b'f',
            Arg::Float64(_) => b'd',
            Arg::Str(_) => b's',
        }
    }

    pub fn as_scalar(&self, expected: ElementType) -> Option<Scalar> {
        match (expected, self) {
            (ElementType::I32, Arg::Int32(v)) => Some(Scalar::I32(*v)),
            (ElementType::F32, Arg::Float32(v)) => Some(Scalar::F32(*v)),
            (ElementType::F64, Arg::Float64(v)) => Some(Scalar::F64(*v)),
            _ => None,
        }
    }
}
