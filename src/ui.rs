//! Terminal output for the CLI, styled with `console`.

use console::Style;

use letterhub::api::StatusView;
use letterhub::error::WorkflowError;
use letterhub::workflow::{Applied, HistoryEvent, Order, StatusHistoryEntry, Transition};

pub struct Printer {
    green: Style,
    red: Style,
    yellow: Style,
    dim: Style,
    bold: Style,
}

impl Printer {
    pub fn new() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
            bold: Style::new().bold(),
        }
    }

    pub fn created(&self, order: &Order) {
        println!(
            "  {} Created order {} ({})",
            self.green.apply_to("✓"),
            self.bold.apply_to(&order.id),
            order.status
        );
    }

    pub fn applied(&self, applied: &Applied) {
        let entry = &applied.entry;
        if entry.from_status == entry.to_status {
            println!(
                "  {} {} recorded on {} (status {})",
                self.green.apply_to("✓"),
                describe(&entry.metadata),
                applied.order.id,
                entry.to_status
            );
        } else {
            println!(
                "  {} {} → {} ({})",
                self.green.apply_to("✓"),
                entry.from_status,
                self.bold.apply_to(entry.to_status),
                describe(&entry.metadata)
            );
        }
        if applied.order.needs_escalation() {
            println!(
                "  {} Escalation pending after {} proof rounds",
                self.yellow.apply_to("!"),
                applied.order.revision_round
            );
        }
    }

    pub fn rejected(&self, err: &WorkflowError) {
        eprintln!(
            "  {} {}: {}",
            self.red.apply_to("✗"),
            err.kind(),
            err.user_message()
        );
    }

    pub fn status_view(&self, view: &StatusView) {
        println!("{}", self.bold.apply_to(format!("Order {}", view.order_id)));
        println!("  status:   {}", self.green.apply_to(view.current_status));
        println!("  proofs:   {}", view.revision_round);
        if view.needs_escalation {
            println!("  {}", self.yellow.apply_to("escalation pending"));
        }
        println!();
        println!("{}", self.bold.apply_to("Available transitions"));
        if view.available_transitions.is_empty() {
            println!("  {}", self.dim.apply_to("none"));
        }
        for t in &view.available_transitions {
            let marker = if t.requires_comment { " (comment required)" } else { "" };
            println!("  → {:<24} {}{}", t.to.as_str(), t.description, self.dim.apply_to(marker));
        }
        println!();
        self.history(&view.history);
    }

    pub fn history(&self, history: &[StatusHistoryEntry]) {
        println!("{}", self.bold.apply_to("History"));
        if history.is_empty() {
            println!("  {}", self.dim.apply_to("no changes yet"));
        }
        for entry in history {
            println!(
                "  {} {} → {} by {} ({}) [{}]",
                self.dim.apply_to(entry.timestamp.format("%Y-%m-%d %H:%M:%S")),
                entry.from_status,
                entry.to_status,
                entry.changed_by,
                entry.changed_by_role,
                describe(&entry.metadata)
            );
            if let Some(comments) = &entry.comments {
                println!("      {}", self.yellow.apply_to(comments));
            }
        }
    }

    pub fn catalog(&self, transitions: &[&Transition]) {
        for t in transitions {
            let roles: Vec<&str> = t.allowed_roles.iter().map(|r| r.as_str()).collect();
            let mut flags = Vec::new();
            if t.requires_comment {
                flags.push("comment");
            }
            if t.auto_notify {
                flags.push("notify");
            }
            println!(
                "  {:<22} → {:<22} {:<11} {:<16} {}",
                t.from.as_str(),
                t.to.as_str(),
                roles.join(","),
                flags.join(","),
                self.dim.apply_to(t.description)
            );
        }
    }
}

fn describe(event: &HistoryEvent) -> String {
    match event {
        HistoryEvent::StatusChange {
            escalation_flagged: false,
        } => "status change".to_string(),
        HistoryEvent::StatusChange {
            escalation_flagged: true,
        } => "status change, escalation flagged".to_string(),
        HistoryEvent::ProofUploaded {
            round, artifact, ..
        } => format!("proof {round}: {artifact}"),
        HistoryEvent::Escalation { action } => format!("escalation {action}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use letterhub::workflow::EscalationAction;

    #[test]
    fn describes_history_events() {
        assert_eq!(
            describe(&HistoryEvent::ProofUploaded {
                round: 2,
                artifact: "proofs/2.pdf".into(),
                escalation_flagged: false,
            }),
            "proof 2: proofs/2.pdf"
        );
        assert_eq!(
            describe(&HistoryEvent::Escalation {
                action: EscalationAction::EscalateToManager
            }),
            "escalation ESCALATE_TO_MANAGER"
        );
    }
}
