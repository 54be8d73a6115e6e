//! Turns validated arguments and descriptor output into a concrete HTTP request.

use awslite_core::{Args, ParamSpec, RawRequest};
use serde_json::Value as JsonValue;
use url::Url;

use crate::error::Error;
use crate::http::{header_ci, HttpRequestParts};

/// Serialize `string | object` union arguments given as structured values.
pub fn canonicalize_unions(schema: &[(&str, ParamSpec)], args: &mut Args) -> Result<(), Error> {
    for (name, spec) in schema {
        if !spec.is_string_object_union() {
            continue;
        }
        if let Some(value) = args.get_mut(*name) {
            if value.is_string() || value.is_null() {
                continue;
            }
            let text = serde_json::to_string(value)
                .map_err(|e| Error::InvalidRequest(format!("cannot serialize `{name}`: {e}")))?;
            *value = JsonValue::String(text);
        }
    }
    Ok(())
}

/// Flatten query arguments into wire pairs.
///
/// Arrays become `Name.member.N` (1-based) and objects `Name.Field`, recursively,
/// so a tag list becomes `Tags.member.1.Key` / `Tags.member.1.Value`. `null` is dropped.
pub fn flatten_query(query: &Args) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (key, value) in query {
        flatten_into(key, value, &mut out);
    }
    out
}

fn flatten_into(prefix: &str, value: &JsonValue, out: &mut Vec<(String, String)>) {
    match value {
        JsonValue::Null => {}
        JsonValue::String(s) => out.push((prefix.to_string(), s.clone())),
        JsonValue::Bool(_) | JsonValue::Number(_) => {
            out.push((prefix.to_string(), value.to_string()))
        }
        JsonValue::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_into(&format!("{prefix}.member.{}", i + 1), item, out);
            }
        }
        JsonValue::Object(map) => {
            for (field, item) in map {
                flatten_into(&format!("{prefix}.{field}"), item, out);
            }
        }
    }
}

/// Apply protocol defaults and produce the unsigned request.
///
/// Method defaults to `GET` without a payload and `POST` with one; path defaults to `/`
/// and is appended to any path on `base`. Object and array payloads are sent as JSON.
pub fn to_http(raw: &RawRequest, base: &Url) -> Result<HttpRequestParts, Error> {
    let default_method = if raw.payload.is_some() { "POST" } else { "GET" };
    let method = raw
        .method
        .as_deref()
        .unwrap_or(default_method)
        .to_ascii_uppercase();

    let path = raw.path.as_deref().unwrap_or("/");
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    let mut url = base.clone();
    url.set_path(&format!("{}{path}", base.path().trim_end_matches('/')));
    url.set_query(None);
    url.set_fragment(None);
    if let Some(query) = &raw.query {
        let pairs = flatten_query(query);
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
    }

    let mut headers = raw.headers.clone();
    let body = match &raw.payload {
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::String(s)) => s.clone().into_bytes(),
        Some(payload) => {
            if header_ci(&headers, "content-type").is_none() {
                headers.insert("content-type".into(), "application/json".into());
            }
            serde_json::to_vec(payload)
                .map_err(|e| Error::InvalidRequest(format!("cannot serialize payload: {e}")))?
        }
    };

    Ok(HttpRequestParts {
        method,
        url,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: JsonValue) -> Args {
        match v {
            JsonValue::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn pairs_of(url: &Url) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = url.query_pairs().into_owned().collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn flattens_tags_and_scalar_lists() {
        let mut pairs = flatten_query(&args(json!({
            "Tags": [{"Key": "env", "Value": "prod"}, {"Key": "team", "Value": "ops"}],
            "ClientIDList": ["a", "b"],
            "MaxItems": 10,
            "Skip": null
        })));
        pairs.sort();
        let expected: Vec<(String, String)> = [
            ("ClientIDList.member.1", "a"),
            ("ClientIDList.member.2", "b"),
            ("MaxItems", "10"),
            ("Tags.member.1.Key", "env"),
            ("Tags.member.1.Value", "prod"),
            ("Tags.member.2.Key", "team"),
            ("Tags.member.2.Value", "ops"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn union_objects_become_json_text() {
        const SCHEMA: &[(&str, ParamSpec)] = &[
            ("PolicyDocument", ParamSpec::string_or_object().required()),
            ("Plain", ParamSpec::object()),
        ];
        let mut a = args(json!({
            "PolicyDocument": {"Version": "2012-10-17", "Statement": []},
            "Plain": {"x": 1}
        }));
        canonicalize_unions(SCHEMA, &mut a).unwrap();
        let doc = a["PolicyDocument"].as_str().unwrap();
        assert_eq!(
            serde_json::from_str::<JsonValue>(doc).unwrap(),
            json!({"Version": "2012-10-17", "Statement": []})
        );
        assert!(a["Plain"].is_object());

        let mut a = args(json!({"PolicyDocument": "{\"already\":true}"}));
        canonicalize_unions(SCHEMA, &mut a).unwrap();
        assert_eq!(a["PolicyDocument"], json!("{\"already\":true}"));
    }

    #[test]
    fn defaults_get_without_payload() {
        let base = Url::parse("https://iam.amazonaws.com").unwrap();
        let raw = RawRequest::with_query(args(json!({"Action": "GetRole", "RoleName": "ops"})));
        let req = to_http(&raw, &base).unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.url.path(), "/");
        assert_eq!(
            pairs_of(&req.url),
            vec![
                ("Action".to_string(), "GetRole".to_string()),
                ("RoleName".to_string(), "ops".to_string())
            ]
        );
        assert!(req.body.is_empty());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn defaults_post_with_json_payload() {
        let base = Url::parse("http://localhost:4566/prefix/").unwrap();
        let raw = RawRequest {
            path: Some("functions".into()),
            ..RawRequest::with_payload(json!({"Name": "fn"}))
        };
        let req = to_http(&raw, &base).unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.url.as_str(), "http://localhost:4566/prefix/functions");
        assert_eq!(req.headers["content-type"], "application/json");
        assert_eq!(serde_json::from_slice::<JsonValue>(&req.body).unwrap(), json!({"Name": "fn"}));
    }

    #[test]
    fn explicit_content_type_is_kept() {
        let base = Url::parse("https://dynamodb.us-east-1.amazonaws.com").unwrap();
        let raw = RawRequest::with_payload(json!({"TableName": "t"}))
            .header("Content-Type", "application/x-amz-json-1.0");
        let req = to_http(&raw, &base).unwrap();
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.headers["Content-Type"], "application/x-amz-json-1.0");
    }
}
