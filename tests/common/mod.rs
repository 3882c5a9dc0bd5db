//! Shared test fixtures
//!
//! A catalog covering the handshake plus a few provisioning commands,
//! and a scripted in-process server speaking the frame + XML protocol
//! over a pipe transport.

// Each test target compiles its own view of this module; not every
// target uses every fixture.
#![allow(dead_code)]

use std::sync::Arc;
use std::thread::JoinHandle;

use ocilink::codec::{from_xml, to_xml, WireDocument, WireElement};
use ocilink::schema::SchemaCatalog;
use ocilink::session::{decode_frame, encode_frame, Frame};
use ocilink::transport::{FrameRead, FrameWrite, PipeTransport, Transport};
use ocilink::{CredentialSource, DigestCredentials, SessionConfig};

pub const USER: &str = "admin";
pub const PASSWORD: &str = "hunter2";
pub const NONCE: &str = "1747232459";

/// Catalog used by most session tests
pub fn catalog_json() -> &'static str {
    r#"{
        "commands": [
            {
                "name": "AuthenticationRequest",
                "response": "AuthenticationResponse",
                "fields": [
                    {"wire": "userId", "app": "user_id", "type": "string", "required": true}
                ]
            },
            {
                "name": "LoginRequest",
                "response": "LoginResponse",
                "fields": [
                    {"wire": "userId", "app": "user_id", "type": "string", "required": true},
                    {"wire": "signedPassword", "app": "signed_password", "type": "string", "required": true}
                ]
            },
            {
                "name": "UserAddRequest",
                "response": "SuccessResponse",
                "fields": [
                    {"wire": "userId", "app": "user_id", "type": "string", "required": true},
                    {"wire": "firstName", "app": "first_name", "type": "string"},
                    {"wire": "services", "app": "services", "type": "string", "repeated": true},
                    {"wire": "address", "app": "address", "ref": "StreetAddress"}
                ]
            },
            {
                "name": "UserGetRequest",
                "response": "UserGetResponse",
                "fields": [
                    {"wire": "userId", "app": "user_id", "type": "string", "required": true}
                ]
            }
        ],
        "types": [
            {
                "name": "AuthenticationResponse",
                "fields": [
                    {"wire": "userId", "app": "user_id", "type": "string", "required": true},
                    {"wire": "nonce", "app": "nonce", "type": "string", "required": true}
                ]
            },
            {"name": "LoginResponse", "fields": []},
            {"name": "SuccessResponse", "fields": []},
            {
                "name": "UserGetResponse",
                "entity": "user",
                "fields": [
                    {"wire": "userId", "app": "user_id", "type": "string", "required": true},
                    {"wire": "firstName", "app": "first_name", "type": "string"}
                ]
            },
            {
                "name": "StreetAddress",
                "fields": [
                    {"wire": "street", "app": "street", "type": "string", "required": true},
                    {"wire": "city", "app": "city", "type": "string", "required": true}
                ]
            }
        ]
    }"#
}

pub fn catalog() -> Arc<SchemaCatalog> {
    Arc::new(SchemaCatalog::from_json_str(catalog_json()).expect("fixture catalog loads"))
}

pub fn credentials() -> DigestCredentials {
    DigestCredentials::new(USER, PASSWORD)
}

/// Config tuned for fast tests
pub fn fast_config() -> SessionConfig {
    SessionConfig::builder()
        .auth_timeout(std::time::Duration::from_secs(2))
        .response_timeout(std::time::Duration::from_millis(400))
        .sweep_interval(std::time::Duration::from_millis(20))
        .keepalive_interval(std::time::Duration::from_secs(30))
        .drain_timeout(std::time::Duration::from_secs(2))
        .build()
}

/// The server side of a pipe connection
pub struct ServerIo {
    writer: Box<dyn FrameWrite>,
}

impl ServerIo {
    /// Reply to a request with a wire document
    pub fn reply(&mut self, correlation_id: u64, document: &WireDocument) {
        let payload = to_xml(document).expect("server document renders");
        let frame =
            encode_frame(&Frame::new(correlation_id, payload)).expect("server frame encodes");
        let _ = self.writer.write_frame(&frame);
    }

    /// Send a frame with an arbitrary correlation id and payload
    pub fn reply_raw(&mut self, correlation_id: u64, payload: Vec<u8>) {
        let frame =
            encode_frame(&Frame::new(correlation_id, payload)).expect("server frame encodes");
        let _ = self.writer.write_frame(&frame);
    }

    /// Drop the connection
    pub fn disconnect(&mut self) {
        let _ = self.writer.shutdown();
    }
}

/// Answer the two handshake steps; returns false for other documents
///
/// Validates the digest so a passing connect implies the challenge
/// answer actually matched.
pub fn answer_handshake(
    correlation_id: u64,
    document: &WireDocument,
    io: &mut ServerIo,
) -> bool {
    match document.root.name.as_str() {
        "AuthenticationRequest" => {
            io.reply(
                correlation_id,
                &doc(
                    "AuthenticationResponse",
                    vec![
                        WireElement::text("userId", USER),
                        WireElement::text("nonce", NONCE),
                    ],
                ),
            );
            true
        }
        "LoginRequest" => {
            let expected = credentials().respond(NONCE);
            let signed = child_text(document, "signedPassword").unwrap_or_default();
            if signed == expected {
                io.reply(correlation_id, &doc("LoginResponse", vec![]));
            } else {
                io.reply(correlation_id, &error_doc("INVALID_CREDENTIALS", "bad digest"));
            }
            true
        }
        _ => false,
    }
}

/// Spawn a scripted server on one end of a pipe transport
///
/// The handler sees every non-handshake document; the loop ends when the
/// client side closes.
pub fn start_server<F>(transport: PipeTransport, mut handler: F) -> JoinHandle<()>
where
    F: FnMut(u64, WireDocument, &mut ServerIo) + Send + 'static,
{
    init_logging();
    std::thread::spawn(move || {
        let (mut reader, writer) = Box::new(transport).split().expect("pipe splits");
        let mut io = ServerIo { writer };

        while let Ok(raw) = reader.read_frame() {
            let frame = decode_frame(&raw).expect("server decodes frames");
            let document = from_xml(&frame.payload).expect("server parses XML");
            if answer_handshake(frame.correlation_id, &document, &mut io) {
                continue;
            }
            handler(frame.correlation_id, document, &mut io);
        }
    })
}

/// Build a wire document
pub fn doc(root: &str, children: Vec<WireElement>) -> WireDocument {
    WireDocument {
        root: WireElement::parent(root, children),
    }
}

/// Build an error envelope document
pub fn error_doc(code: &str, summary: &str) -> WireDocument {
    doc(
        "ErrorResponse",
        vec![
            WireElement::text("errorCode", code),
            WireElement::text("summary", summary),
        ],
    )
}

/// Route crate logs through the test harness when RUST_LOG asks for them
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Text of a direct child element, if present
pub fn child_text(document: &WireDocument, name: &str) -> Option<String> {
    use ocilink::codec::WireValue;
    match &document.root.value {
        WireValue::Children(children) => children.iter().find_map(|child| {
            if child.name == name {
                match &child.value {
                    WireValue::Text(text) => Some(text.clone()),
                    WireValue::Children(_) => None,
                }
            } else {
                None
            }
        }),
        WireValue::Text(_) => None,
    }
}
