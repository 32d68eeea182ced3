//! Connection diagnostics
//!
//! Read-only observability: every probe failure lands in the report's error
//! list and the function always returns a complete report.

use serde::Serialize;
use serde_json::json;

use crate::config::Config;
use crate::models::TABLES;
use crate::ServiceCore;

/// Per-table probe results.
#[derive(Debug, Clone, Serialize)]
pub struct TableDiagnosis {
    /// The table name
    pub table: String,

    /// Whether a minimal select succeeded
    pub reachable: bool,

    /// Whether row-level security is enabled; `None` when the check was
    /// skipped or failed
    pub rls_enabled: Option<bool>,

    /// Names of the policies attached to the table
    pub policies: Vec<String>,
}

/// The complete diagnosis report.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisReport {
    /// Both required secrets are present
    pub configured: bool,

    /// An identity is active
    pub authenticated: bool,

    /// Every probed table answered
    pub accessible: bool,

    /// Per-table results
    pub tables: Vec<TableDiagnosis>,

    /// Every failure encountered, as text
    pub errors: Vec<String>,
}

pub(crate) async fn diagnose(config: &Config, core: Option<&ServiceCore>) -> DiagnosisReport {
    let mut errors: Vec<String> = config
        .missing()
        .iter()
        .map(|name| format!("missing configuration value: {}", name))
        .collect();

    let Some(core) = core else {
        return DiagnosisReport {
            configured: false,
            authenticated: false,
            accessible: false,
            tables: Vec::new(),
            errors,
        };
    };

    let identity = core.session.current_identity();
    let authenticated = identity.is_some();
    let token = core.session.access_token();

    let mut tables = Vec::with_capacity(TABLES.len());
    let mut accessible = true;

    for table in TABLES {
        let reachable = match core.rest.table(table).probe(token.as_deref()).await {
            Ok(()) => true,
            Err(err) => {
                errors.push(format!("{}: probe failed: {}", table, err));
                false
            }
        };
        accessible &= reachable;

        let mut diagnosis = TableDiagnosis {
            table: table.to_string(),
            reachable,
            rls_enabled: None,
            policies: Vec::new(),
        };

        // RLS introspection needs an authenticated caller.
        if authenticated && reachable {
            let mut rls = core.rest.rpc("rls_enabled", json!({ "target_table": table }));
            if let Some(token) = token.as_deref() {
                rls = rls.auth(token);
            }
            match rls.execute::<bool>().await {
                Ok(enabled) => diagnosis.rls_enabled = Some(enabled),
                Err(err) => errors.push(format!("{}: rls check failed: {}", table, err)),
            }

            let mut policies = core
                .rest
                .rpc("table_policies", json!({ "target_table": table }));
            if let Some(token) = token.as_deref() {
                policies = policies.auth(token);
            }
            match policies.execute::<Vec<String>>().await {
                Ok(names) => diagnosis.policies = names,
                Err(err) => errors.push(format!("{}: policy listing failed: {}", table, err)),
            }
        }

        tables.push(diagnosis);
    }

    if !errors.is_empty() {
        log::warn!("connection diagnosis recorded {} issue(s)", errors.len());
    }

    DiagnosisReport {
        configured: true,
        authenticated,
        accessible,
        tables,
        errors,
    }
}
