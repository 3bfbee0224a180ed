//! passfill background host: runtime messages over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "action":"fill", "url":"https://example.com/login"}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}

use std::path::PathBuf;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

use passfill::app::App;
use passfill::logging;
use passfill::platform;
use passfill::rpc_handler::handle_message;
use passfill::services::settings_engine::SettingsEngine;
use passfill::types::message::RuntimeMessage;

async fn write_line(stdout: &mut tokio::io::Stdout, value: &Value) -> std::io::Result<()> {
    let mut line = value.to_string();
    line.push('\n');
    stdout.write_all(line.as_bytes()).await?;
    stdout.flush().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("info");

    let data_dir = platform::get_data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let db_path: PathBuf = platform::storage_db_path();

    let mut settings_engine = SettingsEngine::new(None);
    let app = match App::new(&db_path.to_string_lossy(), &mut settings_engine) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to initialize passfill");
            return Err(e);
        }
    };

    let mut stdout = tokio::io::stdout();
    write_line(
        &mut stdout,
        &json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}),
    )
    .await?;
    info!("background host ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparseable request");
                write_line(&mut stdout, &json!({"id": null, "error": format!("parse error: {}", e)})).await?;
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        let response = match serde_json::from_value::<RuntimeMessage>(req) {
            Ok(message) => match handle_message(&app, message).await {
                Ok(val) => json!({"id": id, "result": val}),
                Err(err) => json!({"id": id, "error": err}),
            },
            Err(e) => json!({"id": id, "error": format!("invalid message: {}", e)}),
        };
        write_line(&mut stdout, &response).await?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}
