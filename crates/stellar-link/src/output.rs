use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use stellar_link_listener::{ConnectionInfo, MessageHandler, PositionReporter, CONNECTION_NOTICE};
use stellar_link_message::{preview, Message, MessageError};

#[derive(Clone, Debug, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Three-line human report per message.
    #[default]
    Pretty,
    /// One JSON record per event.
    Json,
    /// A table row per message.
    Table,
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Record<'a> {
    Connection {
        connection: &'a str,
        peer_pid: Option<i32>,
        peer_uid: Option<u32>,
        timestamp: String,
    },
    Message {
        connection: &'a str,
        message: &'a Message,
        current_position: Option<&'a serde_json::Value>,
        timestamp: String,
    },
    Error {
        connection: &'a str,
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        raw: Option<String>,
        timestamp: String,
    },
}

fn print_record(record: &Record<'_>) {
    println!(
        "{}",
        serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Prints listener events on stdout in the selected format.
pub struct CliReporter {
    format: OutputFormat,
    pretty: PositionReporter<std::io::Stdout>,
}

impl CliReporter {
    pub fn stdout(format: OutputFormat) -> Self {
        Self {
            format,
            pretty: PositionReporter::stdout(),
        }
    }
}

impl MessageHandler for CliReporter {
    fn on_connect(&self, conn: &ConnectionInfo) {
        match self.format {
            OutputFormat::Pretty => self.pretty.on_connect(conn),
            OutputFormat::Json => print_record(&Record::Connection {
                connection: &conn.id,
                peer_pid: conn.peer.and_then(|peer| peer.pid),
                peer_uid: conn.peer.map(|peer| peer.uid),
                timestamp: now_unix_seconds(),
            }),
            OutputFormat::Table => println!("{CONNECTION_NOTICE} ({})", conn.id),
        }
    }

    fn on_message(&self, conn: &ConnectionInfo, message: Message) {
        match self.format {
            OutputFormat::Pretty => self.pretty.on_message(conn, message),
            OutputFormat::Json => print_record(&Record::Message {
                connection: &conn.id,
                message: &message,
                current_position: message.current_position().value(),
                timestamp: now_unix_seconds(),
            }),
            OutputFormat::Table => println!("{}", message_table(&conn.id, &message)),
        }
    }

    fn on_error(&self, conn: &ConnectionInfo, error: &MessageError) {
        if self.format == OutputFormat::Json {
            print_record(&Record::Error {
                connection: &conn.id,
                error: error.to_string(),
                raw: error.raw().map(preview),
                timestamp: now_unix_seconds(),
            });
        }
    }
}

fn message_table(connection: &str, message: &Message) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["CONNECTION", "CURRENT POSITION", "MESSAGE"])
        .add_row(vec![
            connection.to_string(),
            message.current_position().to_string(),
            message.to_string(),
        ]);
    table
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
