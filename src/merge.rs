//! Field-level merging across sources.
//!
//! Each output field owns a fixed precedence chain: an ordered list of
//! (source, accessor) steps. The chain is evaluated by [`resolve`], which
//! returns the first value that is actually present. A step never combines
//! partial values with another step.

/// Whether a value carries an answer. Blank strings do not.
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Presence for u32 {
    fn is_present(&self) -> bool {
        true
    }
}

impl Presence for u64 {
    fn is_present(&self) -> bool {
        true
    }
}

impl Presence for f64 {
    fn is_present(&self) -> bool {
        self.is_finite()
    }
}

/// One link of a precedence chain.
pub struct Step<S, T> {
    pub source: &'static str,
    pub read: fn(&S) -> Option<T>,
}

impl<S, T> Step<S, T> {
    pub const fn new(source: &'static str, read: fn(&S) -> Option<T>) -> Self {
        Self { source, read }
    }
}

/// A value together with the source that supplied it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub source: &'static str,
    pub value: T,
}

/// Evaluates `chain` in order and keeps the first present value.
pub fn resolve<S, T: Presence>(chain: &[Step<S, T>], sources: &S) -> Option<Resolved<T>> {
    chain.iter().find_map(|step| {
        (step.read)(sources)
            .filter(Presence::is_present)
            .map(|value| Resolved {
                source: step.source,
                value,
            })
    })
}

pub fn first_present<S, T: Presence>(chain: &[Step<S, T>], sources: &S) -> Option<T> {
    resolve(chain, sources).map(|r| r.value)
}

/// Trimmed copy of an optional string, `None` when blank.
pub fn text(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
