//! Handshake message codec: the first frame exchanged after a TCP accept,
//! carrying `CONNECTION_ACCEPTED` or `CONNECTION_REFUSED`.

use companion_types::message::MessageType;
use companion_types::VersionInfo;

use crate::error::HandshakeError;
use crate::frame::Frame;

/// The parsed outcome of the first frame received after connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    Accepted(VersionInfo),
    Refused(Option<String>),
}

/// Parses the first frame of a connection as a handshake outcome. Any
/// message type other than `CONNECTION_ACCEPTED`/`CONNECTION_REFUSED` is a
/// protocol error.
pub fn decode_first_message(frame: &Frame) -> Result<HandshakeOutcome, HandshakeError> {
    match MessageType::from_tag(frame.msg_type) {
        Some(MessageType::ConnectionAccepted) => {
            let info: VersionInfo = serde_json::from_slice(&frame.payload)?;
            Ok(HandshakeOutcome::Accepted(info))
        }
        Some(MessageType::ConnectionRefused) => {
            let diagnostic = if frame.payload.is_empty() {
                None
            } else {
                Some(String::from_utf8_lossy(&frame.payload).into_owned())
            };
            Ok(HandshakeOutcome::Refused(diagnostic))
        }
        _ => Err(HandshakeError::UnexpectedFirstMessage(frame.msg_type)),
    }
}

/// Builds the server-role `CONNECTION_ACCEPTED` frame.
pub fn encode_accepted(info: &VersionInfo) -> Frame {
    let payload = serde_json::to_vec(info).expect("VersionInfo always serializes");
    Frame::new(MessageType::ConnectionAccepted.tag(), payload)
}

/// Builds the server-role `CONNECTION_REFUSED` frame, with an optional
/// diagnostic carried verbatim.
pub fn encode_refused(diagnostic: Option<&str>) -> Frame {
    let payload = diagnostic.map(|s| s.as_bytes().to_vec()).unwrap_or_default();
    Frame::new(MessageType::ConnectionRefused.tag(), payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_version_only_payload_with_defaulted_language() {
        // `{"version":"1"}`, no "lang" — defaults to "unknown".
        let frame = Frame::new(1, br#"{"version":"1"}"#.to_vec());
        let outcome = decode_first_message(&frame).unwrap();
        assert_eq!(
            outcome,
            HandshakeOutcome::Accepted(VersionInfo {
                version: "1".to_string(),
                lang: "unknown".to_string(),
            })
        );
    }

    #[test]
    fn refused_with_diagnostic() {
        let frame = Frame::new(2, b"server full".to_vec());
        assert_eq!(
            decode_first_message(&frame).unwrap(),
            HandshakeOutcome::Refused(Some("server full".to_string()))
        );
    }

    #[test]
    fn refused_with_empty_payload_has_no_diagnostic() {
        let frame = Frame::new(2, Vec::new());
        assert_eq!(decode_first_message(&frame).unwrap(), HandshakeOutcome::Refused(None));
    }

    #[test]
    fn unexpected_first_message_type_is_an_error() {
        let frame = Frame::new(3, Vec::new());
        assert_eq!(
            decode_first_message(&frame).unwrap_err(),
            HandshakeError::UnexpectedFirstMessage(3)
        );
    }

    #[test]
    fn accepted_round_trips_through_encode() {
        let info = VersionInfo {
            version: "2".to_string(),
            lang: "en".to_string(),
        };
        let frame = encode_accepted(&info);
        assert_eq!(decode_first_message(&frame).unwrap(), HandshakeOutcome::Accepted(info));
    }
}
