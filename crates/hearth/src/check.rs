// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hearth check` command implementation.
//!
//! Confirms the loaded configuration wires up: every provider builds, the
//! default model and each fallback resolve against the catalog. Nothing is
//! sent over the network.

use hearth_config::HearthConfig;
use hearth_core::HearthError;
use hearth_router::ModelRouter;

/// One line of the check report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckLine {
    pub label: String,
    pub ok: bool,
    pub detail: String,
}

/// Runs the `hearth check` command and prints a report.
pub fn run_check(config: &HearthConfig) -> Result<(), HearthError> {
    let lines = collect(config)?;

    println!();
    println!("  hearth check");
    println!("  {}", "-".repeat(50));
    for line in &lines {
        let mark = if line.ok { "ok " } else { "err" };
        println!("  [{mark}] {:<20} {}", line.label, line.detail);
    }
    println!();

    let failed = lines.iter().filter(|l| !l.ok).count();
    if failed > 0 {
        return Err(HearthError::Config(format!("{failed} check(s) failed")));
    }
    Ok(())
}

fn collect(config: &HearthConfig) -> Result<Vec<CheckLine>, HearthError> {
    let providers = hearth_provider::build_providers(config)?;
    let mut lines = vec![CheckLine {
        label: "providers".into(),
        ok: true,
        detail: config
            .providers
            .iter()
            .map(|(name, p)| format!("{name} ({})", p.endpoint))
            .collect::<Vec<_>>()
            .join(", "),
    }];

    let router = ModelRouter::new(config, providers);
    let default = router.default_model().to_string();
    lines.push(resolve_line(&router, "default model", &default));
    for key in &config.models.fallback {
        lines.push(resolve_line(&router, "fallback", key));
    }

    lines.push(CheckLine {
        label: "memory".into(),
        ok: true,
        detail: match (config.memory.enabled, &config.memory.embedding) {
            (false, _) => "disabled".into(),
            (true, Some(embedding)) => format!("hybrid ({})", embedding.model),
            (true, None) => "lexical only".into(),
        },
    });
    lines.push(CheckLine {
        label: "socket".into(),
        ok: true,
        detail: config.ipc.socket_path.clone(),
    });
    lines.push(CheckLine {
        label: "database".into(),
        ok: true,
        detail: config.storage.database_path.clone(),
    });
    Ok(lines)
}

fn resolve_line(router: &ModelRouter, label: &str, key: &str) -> CheckLine {
    match router.resolve(key) {
        Ok((_, model)) => CheckLine {
            label: label.into(),
            ok: true,
            detail: format!("{key} (budget {} tokens)", model.context_budget),
        },
        Err(e) => CheckLine {
            label: label.into(),
            ok: false,
            detail: e.to_string(),
        },
    }
}
