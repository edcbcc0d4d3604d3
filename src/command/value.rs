use std::fmt;
use std::sync::Arc;

/// A value computed only when the owning command is rendered.
pub type DeferredValue = Arc<dyn Fn() -> FlagValue + Send + Sync>;

/// The value carried by a [`Flag`](super::Flag).
#[derive(Clone, Default)]
pub enum FlagValue {
    #[default]
    Absent,
    Bool(bool),
    Str(String),
    List(Vec<String>),
    /// Computed at render time, for values not yet known when the flag is added
    /// (a package list produced by a later step, for example).
    Deferred(DeferredValue),
}

impl FlagValue {
    pub fn deferred<F>(compute: F) -> Self
    where
        F: Fn() -> FlagValue + Send + Sync + 'static,
    {
        FlagValue::Deferred(Arc::new(compute))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, FlagValue::Deferred(_))
    }

    /// Evaluate deferred values until a concrete value is reached.
    pub fn resolve(&self) -> FlagValue {
        match self {
            FlagValue::Deferred(compute) => compute().resolve(),
            other => other.clone(),
        }
    }

    /// Merge `other` (registered later) into this value.
    ///
    /// When either side is deferred the merge itself is deferred, so the
    /// rendered result is the same as if both values had been known up front.
    pub fn merge(self, other: FlagValue) -> FlagValue {
        if self.is_deferred() || other.is_deferred() {
            let (earlier, later) = (self, other);
            return FlagValue::deferred(move || earlier.resolve().merge(later.resolve()));
        }

        match (self, other) {
            (FlagValue::Absent, later) => later,
            (earlier, FlagValue::Absent) => earlier,
            (FlagValue::Bool(_), later) => later,
            (earlier, FlagValue::Bool(_)) => earlier,
            (earlier, later) => {
                let mut values = earlier.into_list();
                values.extend(later.into_list());
                FlagValue::List(values)
            }
        }
    }

    /// Coerce a concrete value to a list of strings.
    ///
    /// Booleans and absent values have no list form and yield an empty list.
    pub fn into_list(self) -> Vec<String> {
        match self {
            FlagValue::Str(value) => vec![value],
            FlagValue::List(values) => values,
            FlagValue::Deferred(compute) => compute().into_list(),
            FlagValue::Absent | FlagValue::Bool(_) => Vec::new(),
        }
    }
}

impl fmt::Debug for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Absent => write!(f, "Absent"),
            FlagValue::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            FlagValue::Str(value) => f.debug_tuple("Str").field(value).finish(),
            FlagValue::List(values) => f.debug_tuple("List").field(values).finish(),
            FlagValue::Deferred(_) => write!(f, "Deferred(..)"),
        }
    }
}

impl PartialEq for FlagValue {
    /// Deferred values compare by what they resolve to.
    fn eq(&self, other: &Self) -> bool {
        match (self.resolve(), other.resolve()) {
            (FlagValue::Absent, FlagValue::Absent) => true,
            (FlagValue::Bool(a), FlagValue::Bool(b)) => a == b,
            (FlagValue::Str(a), FlagValue::Str(b)) => a == b,
            (FlagValue::List(a), FlagValue::List(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::Str(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        FlagValue::Str(value)
    }
}

impl From<&String> for FlagValue {
    fn from(value: &String) -> Self {
        FlagValue::Str(value.clone())
    }
}

impl From<Vec<String>> for FlagValue {
    fn from(values: Vec<String>) -> Self {
        FlagValue::List(values)
    }
}

impl From<Vec<&str>> for FlagValue {
    fn from(values: Vec<&str>) -> Self {
        FlagValue::List(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for FlagValue {
    fn from(values: &[&str]) -> Self {
        FlagValue::List(values.iter().map(|v| v.to_string()).collect())
    }
}

impl From<&[String]> for FlagValue {
    fn from(values: &[String]) -> Self {
        FlagValue::List(values.to_vec())
    }
}

impl From<u32> for FlagValue {
    fn from(value: u32) -> Self {
        FlagValue::Str(value.to_string())
    }
}

impl From<usize> for FlagValue {
    fn from(value: usize) -> Self {
        FlagValue::Str(value.to_string())
    }
}

impl<T> From<Option<T>> for FlagValue
where
    T: Into<FlagValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FlagValue::Absent)
    }
}
