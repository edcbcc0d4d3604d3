use super::value::FlagValue;
use crate::error::{ErrorCode, LabflowError, Result};

/// Separator meaning "emit as separate argv tokens".
pub const DEFAULT_SEPARATOR: &str = " ";

/// A named command-line option.
///
/// `flag_separator` sits between the flag and its value (`" "` emits two
/// tokens, `"="` fuses them as `--name=value`). `value_separator` joins the
/// values of a non-repeatable multi-valued flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    name: String,
    value: FlagValue,
    flag_separator: String,
    value_separator: String,
    repeatable: bool,
}

impl Flag {
    pub fn new(name: impl Into<String>, value: impl Into<FlagValue>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(LabflowError::command_with_code(
                ErrorCode::COMMAND_INVALID_FLAG,
                format!("Invalid flag name '{}'", name),
            ));
        }

        Ok(Self {
            name,
            value: value.into(),
            flag_separator: DEFAULT_SEPARATOR.to_string(),
            value_separator: DEFAULT_SEPARATOR.to_string(),
            repeatable: false,
        })
    }

    /// Repeat the flag before every value instead of joining the values.
    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn with_flag_separator(mut self, separator: impl Into<String>) -> Self {
        self.flag_separator = separator.into();
        self
    }

    pub fn with_value_separator(mut self, separator: impl Into<String>) -> Self {
        self.value_separator = separator.into();
        self
    }

    pub fn with_separators(
        self,
        flag_separator: impl Into<String>,
        value_separator: impl Into<String>,
    ) -> Self {
        self.with_flag_separator(flag_separator)
            .with_value_separator(value_separator)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &FlagValue {
        &self.value
    }

    pub fn is_repeatable(&self) -> bool {
        self.repeatable
    }

    /// Merge a later registration of the same flag into this one.
    ///
    /// Flags with a different name are left untouched. The rendering options of
    /// the earlier registration are kept, except that a repeatable later flag
    /// makes the merged flag repeatable.
    pub fn merge(&mut self, other: Flag) {
        if self.name != other.name {
            return;
        }
        let value = std::mem::take(&mut self.value);
        self.value = value.merge(other.value);
        self.repeatable |= other.repeatable;
    }

    /// Render to argv tokens. Absent, `false`, empty strings and empty lists
    /// render to nothing.
    pub fn to_command(&self) -> Vec<String> {
        match self.value.resolve() {
            FlagValue::Absent | FlagValue::Bool(false) => Vec::new(),
            FlagValue::Bool(true) => vec![self.name.clone()],
            FlagValue::Str(value) if value.is_empty() => Vec::new(),
            FlagValue::Str(value) => self.with_value(&value),
            FlagValue::List(values) => self.render_list(values),
            FlagValue::Deferred(_) => Vec::new(),
        }
    }

    fn render_list(&self, values: Vec<String>) -> Vec<String> {
        let values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
        if values.is_empty() {
            return Vec::new();
        }

        if self.repeatable {
            return values.iter().flat_map(|v| self.with_value(v)).collect();
        }

        if self.flag_separator == DEFAULT_SEPARATOR && self.value_separator == DEFAULT_SEPARATOR {
            let mut tokens = Vec::with_capacity(values.len() + 1);
            tokens.push(self.name.clone());
            tokens.extend(values);
            return tokens;
        }

        self.with_value(&values.join(&self.value_separator))
    }

    fn with_value(&self, value: &str) -> Vec<String> {
        if self.flag_separator == DEFAULT_SEPARATOR {
            vec![self.name.clone(), value.to_string()]
        } else {
            vec![format!("{}{}{}", self.name, self.flag_separator, value)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_names_are_rejected() {
        assert!(Flag::new("", true).is_err());
        assert!(Flag::new("--bad name", true).is_err());
        let err = Flag::new(" ", "x").unwrap_err();
        assert_eq!(err.code(), ErrorCode::COMMAND_INVALID_FLAG);
    }

    #[test]
    fn test_boolean_rendering() {
        assert_eq!(Flag::new("-y", true).unwrap().to_command(), vec!["-y"]);
        assert!(Flag::new("-y", false).unwrap().to_command().is_empty());
        assert!(Flag::new("-y", FlagValue::Absent)
            .unwrap()
            .to_command()
            .is_empty());
    }

    #[test]
    fn test_string_rendering_with_separators() {
        let spaced = Flag::new("-n", "qc").unwrap();
        assert_eq!(spaced.to_command(), vec!["-n", "qc"]);

        let fused = Flag::new("--name", "qc").unwrap().with_flag_separator("=");
        assert_eq!(fused.to_command(), vec!["--name=qc"]);
    }

    #[test]
    fn test_empty_list_renders_nothing() {
        let flag = Flag::new("-c", Vec::<String>::new()).unwrap();
        assert!(flag.to_command().is_empty());

        let repeated = Flag::new("-c", Vec::<String>::new()).unwrap().repeatable();
        assert!(repeated.to_command().is_empty());
    }

    #[test]
    fn test_list_joined_with_value_separator() {
        let flag = Flag::new("--targets", vec!["a", "b"])
            .unwrap()
            .with_value_separator(",");
        assert_eq!(flag.to_command(), vec!["--targets", "a,b"]);

        let fused = Flag::new("--targets", vec!["a", "b"])
            .unwrap()
            .with_flag_separator("=")
            .with_value_separator(",");
        assert_eq!(fused.to_command(), vec!["--targets=a,b"]);
    }

    #[test]
    fn test_repeatable_list_with_fused_separator() {
        let flag = Flag::new("--config", vec!["a=1", "b=2"])
            .unwrap()
            .with_flag_separator("=")
            .repeatable();
        assert_eq!(flag.to_command(), vec!["--config=a=1", "--config=b=2"]);
    }

    #[test]
    fn test_merge_ignores_other_names() {
        let mut flag = Flag::new("-c", "a").unwrap();
        flag.merge(Flag::new("-n", "b").unwrap());
        assert_eq!(flag.to_command(), vec!["-c", "a"]);
    }
}
