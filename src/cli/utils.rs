use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Print the outcome of a command. Text goes to stdout on success and stderr
/// on failure; JSON always goes to stdout so scripts can parse it.
pub fn output(output_format: &OutputFormat, ok: bool, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json_report(ok, message, data))?);
        }
        OutputFormat::Text if ok => {
            println!("✓ {}", message);
            if let Some(Value::Object(fields)) = data {
                for (key, value) in fields {
                    match value {
                        Value::String(s) => println!("  {}: {}", key, s),
                        other => println!("  {}: {}", key, other),
                    }
                }
            }
        }
        OutputFormat::Text => eprintln!("Error: {}", message),
    }
    Ok(())
}

fn json_report(ok: bool, message: &str, data: Option<Value>) -> Value {
    let mut report = json!({ "success": ok });
    report[if ok { "message" } else { "error" }] = json!(message);
    if let Some(data) = data {
        report["data"] = data;
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_report_carries_message_and_data() {
        let report = json_report(true, "Token generated", Some(json!({ "token": "abc" })));
        assert_eq!(report["success"], true);
        assert_eq!(report["message"], "Token generated");
        assert_eq!(report["data"]["token"], "abc");
    }

    #[test]
    fn failure_report_uses_error_key() {
        let report = json_report(false, "server is degraded", None);
        assert_eq!(report["success"], false);
        assert_eq!(report["error"], "server is degraded");
        assert!(report.get("message").is_none());
        assert!(report.get("data").is_none());
    }
}
