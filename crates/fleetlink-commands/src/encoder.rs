//! Wire encoding for the polling protocol.
//!
//! Command payloads are flat `key=value` strings the firmware splits on
//! `&`; values that may contain reserved characters are percent-encoded.

use crate::queue::QueuedCommand;

/// Fixed status-request command.
pub const STATUS_REQUEST: &str = "cmd=get_status";

/// Poll response body when the queue is empty.
pub const NO_MESSAGES: &str = "status=no_messages";

/// A structured command to be encoded for the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandIntent {
    /// Ask the device to report its status on the next poll cycle.
    StatusRequest,
    /// Replace the device's dialing directory.
    ///
    /// `count` is emitted exactly as supplied by the caller, even when
    /// it disagrees with the number of entries. The firmware treats the
    /// field as authoritative and the mismatch must survive as-is.
    DirectoryUpdate { count: u32, numbers: Vec<String> },
}

impl CommandIntent {
    /// Encode into the wire payload string.
    pub fn encode(&self) -> String {
        match self {
            CommandIntent::StatusRequest => STATUS_REQUEST.to_string(),
            CommandIntent::DirectoryUpdate { count, numbers } => {
                let mut payload = format!("cmd=dir_update&count={count}");
                for (i, number) in numbers.iter().take(*count as usize).enumerate() {
                    payload.push_str(&format!(
                        "&number{}={}",
                        i + 1,
                        urlencoding::encode(number)
                    ));
                }
                payload
            }
        }
    }
}

/// Serialize drained commands into the poll response body.
///
/// Each command occupies an indexed `message{i}`/`timestamp{i}` pair,
/// 1-indexed in enqueue order. Payloads are already wire-format and go
/// out verbatim; only the timestamps need escaping.
pub fn encode_pending(commands: &[QueuedCommand]) -> String {
    let mut body = String::new();
    for (i, command) in commands.iter().enumerate() {
        if i > 0 {
            body.push('&');
        }
        body.push_str(&format!("message{}={}", i + 1, command.payload));
        body.push_str(&format!(
            "&timestamp{}={}",
            i + 1,
            urlencoding::encode(&command.enqueued_at.to_rfc3339())
        ));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_status_request_literal() {
        assert_eq!(CommandIntent::StatusRequest.encode(), "cmd=get_status");
    }

    #[test]
    fn test_dir_update_encoding() {
        let intent = CommandIntent::DirectoryUpdate {
            count: 2,
            numbers: vec!["+15551230001".to_string(), "+15551230002".to_string()],
        };

        assert_eq!(
            intent.encode(),
            "cmd=dir_update&count=2&number1=%2B15551230001&number2=%2B15551230002"
        );
    }

    #[test]
    fn test_dir_update_count_mismatch_preserved() {
        // Count says 3, only 2 numbers supplied: the count field stays 3
        // and exactly 2 indexed fields are emitted.
        let intent = CommandIntent::DirectoryUpdate {
            count: 3,
            numbers: vec!["111".to_string(), "222".to_string()],
        };

        let payload = intent.encode();
        assert_eq!(payload, "cmd=dir_update&count=3&number1=111&number2=222");
    }

    #[test]
    fn test_dir_update_entries_beyond_count_ignored() {
        let intent = CommandIntent::DirectoryUpdate {
            count: 1,
            numbers: vec!["111".to_string(), "222".to_string()],
        };

        assert_eq!(intent.encode(), "cmd=dir_update&count=1&number1=111");
    }

    #[test]
    fn test_encode_pending_indexes_in_order() {
        let commands = vec![
            QueuedCommand {
                payload: "cmd=get_status".to_string(),
                enqueued_at: Utc::now(),
            },
            QueuedCommand {
                payload: "cmd=dir_update&count=0".to_string(),
                enqueued_at: Utc::now(),
            },
        ];

        let body = encode_pending(&commands);
        assert!(body.starts_with("message1=cmd=get_status&timestamp1="));
        assert!(body.contains("&message2=cmd=dir_update&count=0&timestamp2="));
    }

    #[test]
    fn test_encode_pending_empty() {
        assert_eq!(encode_pending(&[]), "");
    }
}
