use std::fmt::Write as _;
use std::io::Write;

use protego::{ChatSession, ContractDescriptor, PendingOperation, Session, SocialAlert, Threat};
use serde_json::{json, Value};

use crate::error::CliError;

/// Write `text` followed by a newline and flush.
pub fn emit<W: Write>(writer: &mut W, text: &str) -> Result<(), CliError> {
    writer.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Pretty JSON for `--json` output.
pub fn to_json(value: &Value) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

// ---- wallet ----

/// `key \t value` lines describing the session and token.
pub fn session_tsv(session: &Session, token: Option<&ContractDescriptor>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "status\t{}", label(&session.status));
    let _ = writeln!(
        out,
        "address\t{}",
        session
            .address
            .map(|a| format!("{a:#x}"))
            .unwrap_or_else(|| "-".into())
    );
    let _ = writeln!(
        out,
        "chain_id\t{}",
        session
            .chain_id
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into())
    );
    let symbol = token.map(|t| t.symbol.as_str()).unwrap_or("token");
    let _ = writeln!(out, "balance\t{} {symbol}", session.balance);
    let _ = writeln!(out, "native_balance\t{}", session.native_balance);
    if let Some(token) = token {
        let _ = writeln!(out, "token\t{} ({:#x})", token.name, token.address);
        let _ = writeln!(out, "decimals\t{}", token.decimals);
    }
    let _ = writeln!(out, "message\t{}", session.last_message);
    out
}

pub fn session_json(session: &Session, token: Option<&ContractDescriptor>) -> Value {
    json!({ "session": session, "token": token })
}

/// `kind \t status \t amount \t tx` for a settled operation.
pub fn operation_tsv(op: &PendingOperation) -> String {
    let tx = op
        .transaction_ref
        .map(|h| format!("{h:#x}"))
        .unwrap_or_else(|| "-".into());
    format!("{}\t{}\t{}\t{tx}\n", op.kind, label(&op.status), op.amount)
}

// ---- backend ----

/// One threat per line, most severe first.
pub fn threats_tsv(threats: &[Threat]) -> String {
    let mut sorted: Vec<&Threat> = threats.iter().collect();
    sorted.sort_by(|a, b| b.severity.cmp(&a.severity));
    let mut out = String::new();
    for t in sorted {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            label(&t.severity),
            label(&t.kind),
            t.title,
            t.source,
            t.timestamp
        );
    }
    out
}

pub fn alerts_tsv(alerts: &[SocialAlert]) -> String {
    let mut out = String::new();
    for a in alerts {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            a.platform.as_str(),
            label(&a.kind),
            label(&a.sentiment),
            a.mentions,
            a.title,
            a.group_name.as_deref().unwrap_or("-")
        );
    }
    out
}

pub fn chat_sessions_tsv(sessions: &[ChatSession]) -> String {
    let mut out = String::new();
    for s in sessions {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}",
            s.id,
            s.last_activity.to_rfc3339(),
            s.message_count,
            s.title
        );
    }
    out
}

/// Serialized name of a unit enum (`"critical"`, `"contract"`, ...).
fn label<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::String(s)) => s,
        _ => "-".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protego::types::{AlertType, Platform, Sentiment, Severity, ThreatType};
    use protego::{BalanceState, ConnectionStatus, OperationKind, OperationStatus};

    fn threat(id: &str, severity: Severity) -> Threat {
        Threat {
            id: id.into(),
            kind: ThreatType::Transaction,
            severity,
            title: format!("threat {id}"),
            description: String::new(),
            source: "scanner".into(),
            timestamp: "now".into(),
            action: None,
        }
    }

    #[test]
    fn test_session_tsv_disconnected() {
        let out = session_tsv(&Session::new(), None);
        assert!(out.starts_with("status\tdisconnected\n"));
        assert!(out.contains("address\t-\n"));
        assert!(out.contains("balance\t- token\n"));
    }

    #[test]
    fn test_session_tsv_error_balance() {
        let mut session = Session::new();
        session.status = ConnectionStatus::Connected;
        session.balance = BalanceState::Error;
        let out = session_tsv(&session, None);
        assert!(out.contains("status\tconnected\n"));
        assert!(out.contains("balance\tError token\n"));
    }

    #[test]
    fn test_threats_sorted_by_severity() {
        let out = threats_tsv(&[
            threat("a", Severity::Low),
            threat("b", Severity::Critical),
            threat("c", Severity::Medium),
        ]);
        let first_cols: Vec<&str> = out.lines().map(|l| l.split('\t').next().unwrap()).collect();
        assert_eq!(first_cols, ["critical", "medium", "low"]);
    }

    #[test]
    fn test_alerts_tsv() {
        let alert = SocialAlert {
            id: "1".into(),
            platform: Platform::Discord,
            kind: AlertType::Opportunity,
            title: "New pool".into(),
            message: String::new(),
            mentions: 7,
            sentiment: Sentiment::Positive,
            timestamp: "now".into(),
            group_name: None,
            verified: true,
        };
        assert_eq!(
            alerts_tsv(&[alert]),
            "discord\topportunity\tpositive\t7\tNew pool\t-\n"
        );
    }

    #[test]
    fn test_operation_tsv() {
        let mut op = PendingOperation::new(OperationKind::Deposit, "25");
        op.status = OperationStatus::Failed;
        assert_eq!(operation_tsv(&op), "Deposit\tfailed\t25\t-\n");
    }

    #[test]
    fn test_emit_appends_newline() {
        let mut buf = Vec::new();
        emit(&mut buf, "a\tb").unwrap();
        emit(&mut buf, "c\n").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a\tb\nc\n");
    }
}
