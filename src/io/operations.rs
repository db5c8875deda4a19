//! Streaming reader for JSON-lines operation files
//!
//! Each non-blank line is one JSON object tagged by `op`:
//!
//! ```text
//! {"op":"transfer","alias":"t1","sender_id":"alice",...}
//! {"op":"request","alias":"r1","requester_id":"carol",...}
//! {"op":"act","request":"r1","action":"accept","user":"dave"}
//! {"op":"get","transaction":"t1","role":"USER","user":"alice"}
//! {"op":"list","role":"ADMIN","user":"root","page_size":10,"page_number":1}
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `new()`
//! - A line that fails to read or decode is yielded as `Err` with its line
//!   number; iteration continues with the next line

use crate::types::{PaymentRequestCommand, RequestAction, TransferCommand};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// One engine call read from the operations file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Transfer {
        /// Name later lines can use instead of the transaction id
        #[serde(default)]
        alias: Option<String>,
        #[serde(flatten)]
        command: TransferCommand,
    },
    Request {
        /// Name later lines can use instead of the request id
        #[serde(default)]
        alias: Option<String>,
        #[serde(flatten)]
        command: PaymentRequestCommand,
    },
    Act {
        request: String,
        action: RequestAction,
        user: String,
    },
    Get {
        transaction: String,
        role: String,
        user: String,
    },
    List {
        role: String,
        user: String,
        #[serde(default)]
        page_size: Option<i64>,
        #[serde(default)]
        page_number: Option<i64>,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Transfer { .. } => "transfer",
            Operation::Request { .. } => "request",
            Operation::Act { .. } => "act",
            Operation::Get { .. } => "get",
            Operation::List { .. } => "list",
        }
    }
}

/// Parse one JSON line into an Operation
pub fn parse_operation(line: &str) -> Result<Operation, String> {
    serde_json::from_str(line).map_err(|e| format!("Invalid operation: {}", e))
}

/// Iterator over `(line number, operation)` pairs of a JSON-lines file
#[derive(Debug)]
pub struct OperationReader {
    lines: Lines<BufReader<File>>,
    line_num: usize,
}

impl OperationReader {
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        Ok(Self {
            lines: BufReader::with_capacity(8 * 1024, file).lines(),
            line_num: 0,
        })
    }
}

impl Iterator for OperationReader {
    type Item = (usize, Result<Operation, String>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_num += 1;
            match line {
                Ok(text) if text.trim().is_empty() => continue,
                Ok(text) => {
                    return Some((
                        self.line_num,
                        parse_operation(&text).map_err(|e| format!("Line {}: {}", self.line_num, e)),
                    ))
                }
                Err(e) => {
                    return Some((
                        self.line_num,
                        Err(format!("Line {}: read error: {}", self.line_num, e)),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_jsonl(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    const TRANSFER: &str = r#"{"op":"transfer","alias":"t1","sender_id":"alice","receiver_id":"bob","amount":"200","payment_method":"UPI","receiving_method":"upi","sender_payment_details":{"type":"upi","upi_id":"alice@upi"},"receiver_payment_details":{"type":"upi","upi_id":"bob@upi"}}"#;

    #[test]
    fn test_parse_transfer_with_alias() {
        let operation = parse_operation(TRANSFER).unwrap();

        match operation {
            Operation::Transfer { alias, command } => {
                assert_eq!(alias.as_deref(), Some("t1"));
                assert_eq!(command.sender_id, "alice");
                assert_eq!(command.amount, dec!(200));
                assert_eq!(command.receiving_method, PaymentMethod::Upi);
            }
            other => panic!("Expected transfer, got {:?}", other),
        }
    }

    #[rstest]
    #[case::act(
        r#"{"op":"act","request":"r1","action":"ACCEPT","user":"dave"}"#,
        Operation::Act { request: "r1".into(), action: RequestAction::Accept, user: "dave".into() }
    )]
    #[case::unknown_action(
        r#"{"op":"act","request":"r1","action":"snooze","user":"dave"}"#,
        Operation::Act { request: "r1".into(), action: RequestAction::Other("snooze".into()), user: "dave".into() }
    )]
    #[case::get(
        r#"{"op":"get","transaction":"t1","role":"USER","user":"alice"}"#,
        Operation::Get { transaction: "t1".into(), role: "USER".into(), user: "alice".into() }
    )]
    #[case::list_without_paging(
        r#"{"op":"list","role":"ADMIN","user":"root"}"#,
        Operation::List { role: "ADMIN".into(), user: "root".into(), page_size: None, page_number: None }
    )]
    fn test_parse_simple_operations(#[case] line: &str, #[case] expected: Operation) {
        assert_eq!(parse_operation(line).unwrap(), expected);
    }

    #[rstest]
    #[case::unknown_op(r#"{"op":"refund","id":"t1"}"#)]
    #[case::missing_field(r#"{"op":"act","request":"r1"}"#)]
    #[case::bad_method(r#"{"op":"transfer","sender_id":"a","amount":"1","payment_method":"cash","receiving_method":"upi","sender_payment_details":{"type":"upi","upi_id":"a"},"receiver_payment_details":{"type":"upi","upi_id":"b"}}"#)]
    #[case::not_json("transfer alice bob 10")]
    fn test_parse_errors(#[case] line: &str) {
        assert!(parse_operation(line).unwrap_err().contains("Invalid operation"));
    }

    #[test]
    fn test_reader_skips_blank_lines_and_numbers_lines() {
        let content = format!(
            "{}\n\n{}\nnot json\n",
            TRANSFER, r#"{"op":"list","role":"ADMIN","user":"root"}"#
        );
        let file = create_temp_jsonl(&content);

        let items: Vec<_> = OperationReader::new(file.path()).unwrap().collect();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].0, 1);
        assert!(items[0].1.is_ok());
        assert_eq!(items[1].0, 3);
        assert_eq!(items[1].1.as_ref().unwrap().name(), "list");
        assert_eq!(items[2].0, 4);
        assert!(items[2].1.as_ref().unwrap_err().starts_with("Line 4"));
    }

    #[test]
    fn test_reader_fails_on_missing_file() {
        let result = OperationReader::new(Path::new("nonexistent.jsonl"));
        assert!(result.unwrap_err().contains("Failed to open file"));
    }
}
