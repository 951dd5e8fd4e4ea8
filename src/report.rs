//! Human-readable validation reports.

use crate::validate::{ErrorNode, Violation};

pub const REPORT_HEADER: &str = "Configuration is not valid:";

/// Violations of one node, keyed by its dotted path from the root.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry<'a> {
    pub path: String,
    pub violations: &'a [Violation],
}

/// Pre-order walk of the error forest, yielding one entry per node that carries
/// direct violations. Children are visited whether or not their parent failed.
pub fn flatten(errors: &[ErrorNode]) -> Vec<ReportEntry<'_>> {
    fn walk<'a>(node: &'a ErrorNode, prefix: &str, out: &mut Vec<ReportEntry<'a>>) {
        let path =
            if prefix.is_empty() { node.field.clone() } else { format!("{prefix}.{}", node.field) };
        if !node.violations.is_empty() {
            out.push(ReportEntry { path: path.clone(), violations: &node.violations });
        }
        for child in &node.children {
            walk(child, &path, out);
        }
    }

    let mut out = Vec::new();
    for node in errors {
        walk(node, "", &mut out);
    }
    out
}

pub fn format_report(errors: &[ErrorNode]) -> String {
    let blocks = flatten(errors)
        .into_iter()
        .map(|entry| {
            let rules = entry
                .violations
                .iter()
                .map(|v| {
                    format!(
                        "    - {}: {}, current config is `{}`",
                        v.constraint,
                        v.message,
                        render_value(v.value.as_ref())
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!("  - config {} does not match the following rules:\n{}", entry.path, rules)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{REPORT_HEADER}\n{blocks}\n")
}

fn render_value(value: Option<&serde_json::Value>) -> String {
    value.map_or_else(|| "null".to_string(), |v| v.to_string())
}
