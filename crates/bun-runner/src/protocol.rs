//! Line-delimited JSON messages exchanged with the bun host script.

use camino::Utf8PathBuf;
use melte_pipeline::{
    CompileRequest, InstrumentRequest, PreprocessOutput, PreprocessRequest, StageOutput,
    ToolError, ToolFailure, ToolPosition, TranspileRequest,
};
use serde::{Deserialize, Serialize};
use source_map::PositionMap;

/// One operation for the host.
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub(crate) enum Operation<'a> {
    Preprocess(&'a PreprocessRequest),
    Compile(&'a CompileRequest),
    Hot(&'a InstrumentRequest),
    Transpile(&'a TranspileRequest),
}

impl Operation<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Preprocess(_) => "preprocess",
            Operation::Compile(_) => "compile",
            Operation::Hot(_) => "hot",
            Operation::Transpile(_) => "transpile",
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Request<'a> {
    pub id: u64,
    #[serde(flatten)]
    pub operation: Operation<'a>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Ready {
    pub ready: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Response {
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Payload>,
    #[serde(default)]
    pub error: Option<JsFailure>,
    /// The host could not process the line at all.
    #[serde(default)]
    pub fatal: Option<String>,
}

/// A successful result; fields beyond `code` depend on the operation.
#[derive(Debug, Deserialize)]
pub(crate) struct Payload {
    pub code: String,
    /// Version 3 source map JSON.
    #[serde(default)]
    pub map: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<Utf8PathBuf>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsFailure {
    pub message: String,
    #[serde(default)]
    pub start: Option<JsPosition>,
    #[serde(default)]
    pub frame: Option<String>,
}

/// 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct JsPosition {
    pub line: u32,
    pub column: u32,
}

impl From<JsFailure> for ToolFailure {
    fn from(failure: JsFailure) -> Self {
        ToolFailure {
            message: failure.message,
            start: failure
                .start
                .map(|start| ToolPosition::new(start.line.max(1), start.column)),
            frame: failure.frame.filter(|frame| !frame.is_empty()),
        }
    }
}

impl Payload {
    fn decode_map(&self) -> Result<Option<PositionMap>, ToolError> {
        self.map
            .as_deref()
            .map(|json| {
                PositionMap::from_json(json.as_bytes())
                    .map_err(|err| ToolError::Host(format!("bun returned an unreadable map: {err}")))
            })
            .transpose()
    }

    pub fn into_preprocess(self) -> Result<PreprocessOutput, ToolError> {
        let map = self.decode_map()?;
        Ok(PreprocessOutput {
            code: self.code,
            map,
            dependencies: self.dependencies,
        })
    }

    pub fn into_stage(self) -> Result<StageOutput, ToolError> {
        let map = self.decode_map()?;
        Ok(StageOutput {
            code: self.code,
            map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use melte_pipeline::{SectionLang, StyleLang};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_is_flat_with_op_tag() {
        let request = PreprocessRequest {
            lang: SectionLang::Style(StyleLang::Scss),
            content: "a { b: c }".to_string(),
            attributes: IndexMap::from([("lang".to_string(), "scss".to_string())]),
            filename: "App.svelte".to_string(),
        };
        let line = Request {
            id: 7,
            operation: Operation::Preprocess(&request),
        };
        insta::assert_json_snapshot!(line, @r###"
        {
          "id": 7,
          "op": "preprocess",
          "lang": {
            "kind": "style",
            "lang": "scss"
          },
          "content": "a { b: c }",
          "attributes": {
            "lang": "scss"
          },
          "filename": "App.svelte"
        }
        "###);
    }

    #[test]
    fn test_failure_response() {
        let response: Response = serde_json::from_str(
            r#"{"id":3,"error":{"message":"Unexpected token","start":{"line":2,"column":5},"frame":"1: a\n2: b"}}"#,
        )
        .unwrap();
        assert_eq!(response.id, Some(3));
        let failure = ToolFailure::from(response.error.unwrap());
        assert_eq!(
            failure,
            ToolFailure::new("Unexpected token")
                .with_start(ToolPosition::new(2, 5))
                .with_frame("1: a\n2: b")
        );
    }

    #[test]
    fn test_payload_decodes_map() {
        let response: Response = serde_json::from_str(
            r#"{"id":1,"result":{"code":"x","map":"{\"version\":3,\"sources\":[\"App.svelte\"],\"names\":[],\"mappings\":\"AAAA\"}","dependencies":["a.scss"]}}"#,
        )
        .unwrap();
        let output = response.result.unwrap().into_preprocess().unwrap();
        assert_eq!(output.code, "x");
        assert_eq!(output.dependencies, vec![Utf8PathBuf::from("a.scss")]);
        let map = output.map.unwrap();
        assert_eq!(map.sources(), &["App.svelte".to_string()]);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_bad_map_is_host_error() {
        let payload = Payload {
            code: String::new(),
            map: Some("not json".to_string()),
            dependencies: Vec::new(),
        };
        assert!(matches!(payload.into_stage(), Err(ToolError::Host(_))));
    }
}
