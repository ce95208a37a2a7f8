// Gremlin request/response messages (GraphSON 2 over WebSocket) and the
// state machine that folds response frames into one `ResultSet`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{graphson, ResultSet, StatusAttributes};
use crate::error::{Error, Result};

/// Mime type announced in front of every request frame.
pub const MIME_TYPE: &str = "application/vnd.gremlin-v2.0+json";

pub const SUCCESS: u16 = 200;
pub const NO_CONTENT: u16 = 204;
pub const PARTIAL_CONTENT: u16 = 206;
pub const AUTHENTICATE: u16 = 407;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMessage {
    pub request_id: String,
    pub op: String,
    pub processor: String,
    pub args: Value,
}

impl RequestMessage {
    /// Script evaluation request. The query is sent as-is.
    pub fn eval(request_id: &str, query: &str) -> Self {
        RequestMessage {
            request_id: request_id.to_string(),
            op: "eval".to_string(),
            processor: String::new(),
            args: json!({
                "gremlin": query,
                "bindings": {},
                "language": "gremlin-groovy",
            }),
        }
    }

    /// SASL PLAIN answer to an authentication challenge for `request_id`.
    pub fn authentication(request_id: &str, username: &str, password: &str) -> Self {
        let token = STANDARD.encode(format!("\0{}\0{}", username, password));
        RequestMessage {
            request_id: request_id.to_string(),
            op: "authentication".to_string(),
            processor: String::new(),
            args: json!({
                "SASL": token,
                "saslMechanism": "PLAIN",
            }),
        }
    }

    /// Binary frame: mime length byte, mime type, JSON body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let body = serde_json::to_vec(self)
            .map_err(|e| Error::protocol(format!("Failed to serialize request: {}", e)))?;
        let mut frame = Vec::with_capacity(1 + MIME_TYPE.len() + body.len());
        frame.push(MIME_TYPE.len() as u8);
        frame.extend_from_slice(MIME_TYPE.as_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    #[serde(default)]
    pub request_id: Option<String>,
    pub status: ResponseStatus,
    #[serde(default)]
    pub result: ResponseResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseStatus {
    pub code: u16,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub attributes: StatusAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseResult {
    #[serde(default)]
    pub data: Value,
}

impl ResponseMessage {
    pub fn decode(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw).map_err(|e| {
            Error::protocol(format!(
                "Malformed response: {}, raw: {}",
                e,
                String::from_utf8_lossy(raw)
            ))
        })
    }
}

/// What the connection should do after a frame has been folded in.
#[derive(Debug)]
pub enum Step {
    /// More frames follow for this request.
    Continue,
    /// The server asked for credentials.
    Authenticate,
    Done(ResultSet),
}

/// Accumulates the frames that answer one request.
#[derive(Debug, Default)]
pub struct ResponseCollector {
    records: Vec<Value>,
    challenged: bool,
}

impl ResponseCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, response: ResponseMessage) -> Result<Step> {
        let ResponseMessage { status, result, .. } = response;
        let attributes = untype_attributes(status.attributes);

        match status.code {
            PARTIAL_CONTENT => {
                self.extend(result.data);
                Ok(Step::Continue)
            }
            SUCCESS => {
                self.extend(result.data);
                Ok(Step::Done(ResultSet::new(
                    std::mem::take(&mut self.records),
                    attributes,
                )))
            }
            NO_CONTENT => Ok(Step::Done(ResultSet::new(
                std::mem::take(&mut self.records),
                attributes,
            ))),
            AUTHENTICATE if !self.challenged => {
                self.challenged = true;
                Ok(Step::Authenticate)
            }
            code => Err(Error::Service {
                code,
                message: status.message.unwrap_or_default(),
                attributes,
            }),
        }
    }

    fn extend(&mut self, data: Value) {
        match graphson::untype(data) {
            Value::Null => {}
            Value::Array(items) => self.records.extend(items),
            single => self.records.push(single),
        }
    }
}

fn untype_attributes(attributes: StatusAttributes) -> StatusAttributes {
    attributes
        .into_iter()
        .map(|(key, value)| (key, graphson::untype(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(code: u16, data: Value, attributes: Value) -> ResponseMessage {
        ResponseMessage::decode(
            json!({
                "requestId": "r1",
                "status": {"code": code, "message": "", "attributes": attributes},
                "result": {"data": data, "meta": {}}
            })
            .to_string()
            .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn eval_frame_starts_with_the_mime_header() {
        let frame = RequestMessage::eval("r1", "g.V().count()").encode().unwrap();
        assert_eq!(frame[0] as usize, MIME_TYPE.len());
        assert_eq!(&frame[1..=MIME_TYPE.len()], MIME_TYPE.as_bytes());

        let body: Value = serde_json::from_slice(&frame[1 + MIME_TYPE.len()..]).unwrap();
        assert_eq!(body["requestId"], "r1");
        assert_eq!(body["op"], "eval");
        assert_eq!(body["args"]["gremlin"], "g.V().count()");
    }

    #[test]
    fn authentication_uses_sasl_plain() {
        let msg = RequestMessage::authentication("r1", "/dbs/graphmas/colls/holidays", "key");
        let token = msg.args["SASL"].as_str().unwrap();
        let decoded = STANDARD.decode(token).unwrap();
        assert_eq!(decoded, b"\0/dbs/graphmas/colls/holidays\0key");
        assert_eq!(msg.args["saslMechanism"], "PLAIN");
    }

    #[test]
    fn partial_frames_are_merged_in_order() {
        let mut collector = ResponseCollector::new();
        let step = collector
            .push(response(PARTIAL_CONTENT, json!([1, 2]), json!({})))
            .unwrap();
        assert!(matches!(step, Step::Continue));

        let step = collector
            .push(response(
                SUCCESS,
                json!({"@type": "g:List", "@value": [3]}),
                json!({"x-ms-total-request-charge": 2.5}),
            ))
            .unwrap();
        let Step::Done(result) = step else {
            panic!("expected a finished result set");
        };
        assert_eq!(result.records(), &[json!(1), json!(2), json!(3)]);
        assert_eq!(
            result.status_attributes().get("x-ms-total-request-charge"),
            Some(&json!(2.5))
        );
    }

    #[test]
    fn no_content_finishes_with_an_empty_result() {
        let mut collector = ResponseCollector::new();
        let step = collector
            .push(response(NO_CONTENT, Value::Null, json!({"x-ms-status-code": 200})))
            .unwrap();
        let Step::Done(result) = step else {
            panic!("expected a finished result set");
        };
        assert!(result.is_empty());
    }

    #[test]
    fn only_one_authentication_challenge_is_answered() {
        let mut collector = ResponseCollector::new();
        let first = collector
            .push(response(AUTHENTICATE, Value::Null, json!({})))
            .unwrap();
        assert!(matches!(first, Step::Authenticate));

        let err = collector
            .push(response(AUTHENTICATE, Value::Null, json!({})))
            .unwrap_err();
        assert_eq!(err.status_code(), Some(AUTHENTICATE));
    }

    #[test]
    fn error_codes_carry_the_status_attributes() {
        let mut collector = ResponseCollector::new();
        let err = collector
            .push(response(
                500,
                Value::Null,
                json!({"x-ms-status-code": 429, "x-ms-retry-after-ms": "00:00:00.050"}),
            ))
            .unwrap_err();
        match err {
            Error::Service { code, attributes, .. } => {
                assert_eq!(code, 500);
                assert_eq!(attributes.get("x-ms-status-code"), Some(&json!(429)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn garbage_is_a_protocol_error() {
        let err = ResponseMessage::decode(b"not json").unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }
}
