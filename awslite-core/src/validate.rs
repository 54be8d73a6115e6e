use serde_json::{Map, Value as JsonValue};

use crate::error::ValidationError;
use crate::schema::ParamSpec;

pub type Args = Map<String, JsonValue>;

/// Reserved argument understood by every operation.
pub const PAGINATE_KEY: &str = "paginate";

/// How fields absent from the schema are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    #[default]
    Permissive,
    RejectUnknown,
}

/// Arguments that passed [`validate`]. Unknown fields are retained under
/// [`Strictness::Permissive`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedArgs(Args);

impl ValidatedArgs {
    pub fn as_map(&self) -> &Args {
        &self.0
    }

    pub fn into_inner(self) -> Args {
        self.0
    }
}

impl std::ops::Deref for ValidatedArgs {
    type Target = Args;

    fn deref(&self) -> &Args {
        &self.0
    }
}

/// Check `args` against `schema`. Fails on the first violation, in schema order.
///
/// `null` is treated as absent. The reserved `paginate` key is accepted on every
/// operation as long as it is a boolean or the string `"iterator"`.
pub fn validate(
    schema: &[(&str, ParamSpec)],
    args: JsonValue,
    strictness: Strictness,
) -> Result<ValidatedArgs, ValidationError> {
    let args = match args {
        JsonValue::Object(map) => map,
        JsonValue::Null => Map::new(),
        _ => return Err(ValidationError::NotAnObject),
    };

    for (name, spec) in schema {
        match args.get(*name) {
            None | Some(JsonValue::Null) => {
                if spec.required {
                    return Err(ValidationError::MissingRequired {
                        field: (*name).to_string(),
                    });
                }
            }
            Some(value) => {
                if !spec.accepts(value) {
                    return Err(ValidationError::WrongType {
                        field: (*name).to_string(),
                        expected: spec.expected(),
                    });
                }
            }
        }
    }

    let declared = |key: &str| schema.iter().any(|(name, _)| *name == key);
    for (key, value) in &args {
        if key == PAGINATE_KEY && !declared(key) {
            let ok = matches!(value, JsonValue::Bool(_) | JsonValue::Null)
                || value.as_str() == Some("iterator");
            if !ok {
                return Err(ValidationError::WrongType {
                    field: key.clone(),
                    expected: "boolean | \"iterator\"".to_string(),
                });
            }
            continue;
        }
        if strictness == Strictness::RejectUnknown && !declared(key) {
            return Err(ValidationError::UnknownField { field: key.clone() });
        }
    }

    Ok(ValidatedArgs(args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHEMA: &[(&str, ParamSpec)] = &[
        ("RoleName", ParamSpec::string().required()),
        ("MaxItems", ParamSpec::number()),
        ("PolicyDocument", ParamSpec::string_or_object()),
        ("Tags", ParamSpec::array()),
    ];

    #[test]
    fn accepts_valid_args() {
        let args = validate(
            SCHEMA,
            json!({"RoleName": "ops", "MaxItems": 10, "Tags": []}),
            Strictness::Permissive,
        )
        .unwrap();
        assert_eq!(args.get("RoleName"), Some(&json!("ops")));
    }

    #[test]
    fn missing_required_names_field() {
        let err = validate(SCHEMA, json!({"MaxItems": 1}), Strictness::Permissive).unwrap_err();
        assert_eq!(err.field(), Some("RoleName"));
        assert!(err.to_string().contains("RoleName"));
    }

    #[test]
    fn null_counts_as_missing() {
        let err = validate(SCHEMA, json!({"RoleName": null}), Strictness::Permissive).unwrap_err();
        assert!(matches!(err, ValidationError::MissingRequired { .. }));
    }

    #[test]
    fn wrong_type_reports_expected_types() {
        let err = validate(
            SCHEMA,
            json!({"RoleName": "ops", "PolicyDocument": 5}),
            Strictness::Permissive,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongType {
                field: "PolicyDocument".to_string(),
                expected: "string | object".to_string()
            }
        );
    }

    #[test]
    fn union_field_accepts_both_forms() {
        for doc in [json!("{}"), json!({"Statement": []})] {
            validate(
                SCHEMA,
                json!({"RoleName": "ops", "PolicyDocument": doc}),
                Strictness::Permissive,
            )
            .unwrap();
        }
    }

    #[test]
    fn unknown_fields_pass_unless_rejected() {
        let args = json!({"RoleName": "ops", "Extra": true});
        let ok = validate(SCHEMA, args.clone(), Strictness::Permissive).unwrap();
        assert_eq!(ok.get("Extra"), Some(&json!(true)));

        let err = validate(SCHEMA, args, Strictness::RejectUnknown).unwrap_err();
        assert_eq!(err.field(), Some("Extra"));
    }

    #[test]
    fn paginate_is_reserved() {
        let ok = validate(
            SCHEMA,
            json!({"RoleName": "ops", "paginate": "iterator"}),
            Strictness::RejectUnknown,
        );
        assert!(ok.is_ok());

        let err = validate(
            SCHEMA,
            json!({"RoleName": "ops", "paginate": "sometimes"}),
            Strictness::Permissive,
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("paginate"));
    }

    #[test]
    fn non_object_args_rejected() {
        let err = validate(SCHEMA, json!([1, 2]), Strictness::Permissive).unwrap_err();
        assert_eq!(err, ValidationError::NotAnObject);
    }
}
