use serde_json::Value as JsonValue;

/// A wire-level value type a parameter may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    pub fn matches(&self, value: &JsonValue) -> bool {
        matches!(
            (self, value),
            (Self::String, JsonValue::String(_))
                | (Self::Number, JsonValue::Number(_))
                | (Self::Boolean, JsonValue::Bool(_))
                | (Self::Array, JsonValue::Array(_))
                | (Self::Object, JsonValue::Object(_))
        )
    }
}

/// Constraint on one named parameter. `comment` and `docs` are documentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub types: &'static [ParamType],
    pub required: bool,
    pub comment: &'static str,
    pub docs: Option<&'static str>,
}

impl ParamSpec {
    pub const fn of(types: &'static [ParamType]) -> Self {
        Self {
            types,
            required: false,
            comment: "",
            docs: None,
        }
    }

    pub const fn string() -> Self {
        Self::of(&[ParamType::String])
    }

    pub const fn number() -> Self {
        Self::of(&[ParamType::Number])
    }

    pub const fn boolean() -> Self {
        Self::of(&[ParamType::Boolean])
    }

    pub const fn array() -> Self {
        Self::of(&[ParamType::Array])
    }

    pub const fn object() -> Self {
        Self::of(&[ParamType::Object])
    }

    /// A document accepted either as an object or as its serialized string form.
    pub const fn string_or_object() -> Self {
        Self::of(&[ParamType::String, ParamType::Object])
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub const fn comment(self, comment: &'static str) -> Self {
        Self { comment, ..self }
    }

    pub const fn docs(self, url: &'static str) -> Self {
        Self {
            docs: Some(url),
            ..self
        }
    }

    pub fn accepts(&self, value: &JsonValue) -> bool {
        self.types.iter().any(|t| t.matches(value))
    }

    /// True for union fields that must be canonicalized to a string before transmission.
    pub fn is_string_object_union(&self) -> bool {
        self.types.contains(&ParamType::String) && self.types.contains(&ParamType::Object)
    }

    pub fn expected(&self) -> String {
        self.types
            .iter()
            .map(ParamType::as_str)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// An operation's declared parameters, in declaration order.
pub type Schema = &'static [(&'static str, ParamSpec)];
