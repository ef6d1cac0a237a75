// Deployment notebook generation
//
// The settled wizard answers are passed in as `DeploymentParameters` and written into the first
// code cell as Python literals. Nothing is read from or written to the process environment, and
// no credential material is ever part of the parameters.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

use crate::error::{DeployError, DeployResult};

pub const DEFAULT_KERNEL: &str = "python3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRule {
    pub name: String,
    pub start_ip_address: String,
    pub end_ip_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentParameters {
    pub account_name: String,
    pub subscription_id: String,
    pub subscription_name: String,
    pub tenant_id: String,
    pub resource_group: String,
    pub server_name: String,
    pub location: Option<String>,
    pub database_name: String,
    pub collation: String,
    pub firewall_rule: Option<FirewallRule>,
}

fn py_str(value: &str) -> String {
    // JSON string literals are valid Python string literals.
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn py_opt(value: Option<&str>) -> String {
    value.map(py_str).unwrap_or_else(|| "None".to_string())
}

fn source_lines(lines: &[String]) -> Value {
    let count = lines.len();
    Value::Array(
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                if i + 1 < count {
                    Value::String(format!("{}\n", line))
                } else {
                    Value::String(line.clone())
                }
            })
            .collect(),
    )
}

fn markdown_cell(lines: &[String]) -> Value {
    json!({
        "cell_type": "markdown",
        "metadata": {},
        "source": source_lines(lines),
    })
}

fn code_cell(lines: &[String], tags: &[&str]) -> Value {
    let metadata = if tags.is_empty() {
        json!({})
    } else {
        json!({ "tags": tags })
    };
    json!({
        "cell_type": "code",
        "execution_count": null,
        "metadata": metadata,
        "outputs": [],
        "source": source_lines(lines),
    })
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}

fn parameters_cell(params: &DeploymentParameters) -> Value {
    let mut lines = vec![
        format!("account_name = {}", py_str(&params.account_name)),
        format!("subscription_id = {}", py_str(&params.subscription_id)),
        format!("subscription_name = {}", py_str(&params.subscription_name)),
        format!("tenant_id = {}", py_str(&params.tenant_id)),
        format!("resource_group = {}", py_str(&params.resource_group)),
        format!("server_name = {}", py_str(&params.server_name)),
        format!("location = {}", py_opt(params.location.as_deref())),
        format!("database_name = {}", py_str(&params.database_name)),
        format!("collation = {}", py_str(&params.collation)),
    ];
    match &params.firewall_rule {
        Some(rule) => {
            lines.push("create_firewall_rule = True".to_string());
            lines.push(format!("firewall_rule_name = {}", py_str(&rule.name)));
            lines.push(format!("start_ip_address = {}", py_str(&rule.start_ip_address)));
            lines.push(format!("end_ip_address = {}", py_str(&rule.end_ip_address)));
        }
        None => lines.push("create_firewall_rule = False".to_string()),
    }
    code_cell(&lines, &["parameters"])
}

/// nbformat 4 notebook that creates the database with the `az` CLI.
pub fn generate_notebook(params: &DeploymentParameters) -> Value {
    generate_notebook_for_kernel(params, DEFAULT_KERNEL)
}

pub fn generate_notebook_for_kernel(params: &DeploymentParameters, kernel_name: &str) -> Value {
    let mut cells = vec![
        markdown_cell(&[
            "# Create Azure SQL Database".to_string(),
            String::new(),
            format!(
                "Creates database `{}` on server `{}` in resource group `{}`.",
                params.database_name, params.server_name, params.resource_group
            ),
            String::new(),
            "Run the cells in order. Sign in with `az login` first if needed.".to_string(),
        ]),
        parameters_cell(params),
        code_cell(
            &owned(&[
                "import shlex",
                "import subprocess",
                "import sys",
                "",
                "def run_command(args):",
                "    print(\"> \" + \" \".join(shlex.quote(a) for a in args))",
                "    completed = subprocess.run(args, capture_output=True, text=True)",
                "    if completed.returncode != 0:",
                "        sys.exit(f\"Command failed ({completed.returncode}):\\n{completed.stderr}\")",
                "    return completed.stdout",
            ]),
            &[],
        ),
        code_cell(
            &owned(&[
                "run_command([\"az\", \"account\", \"set\", \"--subscription\", subscription_id])",
                "print(f\"Using subscription {subscription_name} ({subscription_id})\")",
            ]),
            &[],
        ),
    ];

    if params.firewall_rule.is_some() {
        cells.push(code_cell(
            &owned(&[
                "if create_firewall_rule:",
                "    run_command([",
                "        \"az\", \"sql\", \"server\", \"firewall-rule\", \"create\",",
                "        \"--resource-group\", resource_group,",
                "        \"--server\", server_name,",
                "        \"--name\", firewall_rule_name,",
                "        \"--start-ip-address\", start_ip_address,",
                "        \"--end-ip-address\", end_ip_address,",
                "    ])",
            ]),
            &[],
        ));
    }

    cells.push(code_cell(
        &owned(&[
            "run_command([",
            "    \"az\", \"sql\", \"db\", \"create\",",
            "    \"--resource-group\", resource_group,",
            "    \"--server\", server_name,",
            "    \"--name\", database_name,",
            "    \"--collation\", collation,",
            "])",
        ]),
        &[],
    ));
    cells.push(code_cell(
        &owned(&[
            "print(f\"Database {database_name} created on {server_name}.database.windows.net\")",
        ]),
        &[],
    ));

    let display_name = if kernel_name == DEFAULT_KERNEL {
        "Python 3".to_string()
    } else {
        kernel_name.to_string()
    };
    json!({
        "nbformat": 4,
        "nbformat_minor": 2,
        "metadata": {
            "kernelspec": {
                "name": kernel_name,
                "display_name": display_name,
                "language": "python",
            },
            "language_info": { "name": "python" },
        },
        "cells": cells,
    })
}

pub fn write_notebook(path: &Path, notebook: &Value) -> DeployResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(notebook)?;
    std::fs::write(path, body).map_err(|e| {
        DeployError::Notebook(format!("failed to write {}: {}", path.display(), e))
    })?;
    log::info!(
        "[PHASE: notebook] [STEP: write] Notebook written to {}",
        path.display()
    );
    Ok(())
}
