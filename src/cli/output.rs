//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the A.R.E.S Research CLI.

use crate::a2a::{PlanExecution, RouteOutcome};
use crate::research::ResearchPlan;
use crate::types::{TaskStatus, TaskStatusReport};
use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the banner line
    pub fn banner(&self) {
        if self.colored {
            println!(
                "\n  {} {}\n",
                "A.R.E.S Research".bright_cyan().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
        } else {
            println!("\n  A.R.E.S Research v{}\n", env!("CARGO_PKG_VERSION"));
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a subheader
    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print a table header row
    pub fn table_header(&self, columns: &[&str]) {
        let header = format_row(columns);
        if self.colored {
            println!("    {}", header.bright_white().bold());
            println!("    {}", "─".repeat(columns.len() * 16).dimmed());
        } else {
            println!("    {}", header);
            println!("    {}", "-".repeat(columns.len() * 16));
        }
    }

    /// Print a table row
    pub fn table_row(&self, values: &[&str]) {
        println!("    {}", format_row(values));
    }

    /// Print newline
    pub fn newline(&self) {
        println!();
    }

    /// Print a human-readable research plan
    pub fn plan(&self, plan: &ResearchPlan) {
        self.header(&format!("Research plan: {}", plan.topic));
        self.kv("id", &plan.id.to_string());
        self.kv("methodology", plan.methodology.as_str());
        self.kv("depth", plan.depth.as_str());

        self.subheader("Sources");
        self.table_header(&["Type", "Priority", "Credibility", "Volume"]);
        for source in &plan.sources {
            self.table_row(&[
                source.kind.as_str(),
                &source.priority.to_string(),
                &format!("{:.2}", source.credibility_weight),
                source.estimated_volume.as_str(),
            ]);
        }
        for issue in &plan.source_validation.access_issues {
            self.warning(issue);
        }

        self.subheader("Parallel groups");
        for (index, group) in plan.schedule.parallel_groups.iter().enumerate() {
            self.step_group(index, group);
        }

        self.subheader("Critical path");
        self.list_item(&plan.schedule.critical_path.join(" -> "));
        self.kv(
            "estimated total time",
            &format!("{:.2}", plan.schedule.estimated_total_time),
        );
    }

    /// Print one parallel group
    pub fn step_group(&self, index: usize, step_ids: &[String]) {
        if self.colored {
            println!(
                "    {} {}",
                format!("[{}]", index).dimmed(),
                step_ids.join(", ").bright_white()
            );
        } else {
            println!("    [{}] {}", index, step_ids.join(", "));
        }
    }

    /// Print the outcome of dispatching a plan
    pub fn execution(&self, execution: &PlanExecution) {
        self.header("Execution");
        for (step_id, response) in &execution.responses {
            let line = format!("{} ({})", step_id, response.status);
            match response.status {
                TaskStatus::Success => self.success(&line),
                TaskStatus::Partial => self.warning(&line),
                TaskStatus::Failure | TaskStatus::Cancelled => self.error(&line),
            }
        }
        match &execution.halted_at {
            Some(step_id) => self.warning(&format!(
                "Halted after {} groups: step '{}' failed",
                execution.groups_completed, step_id
            )),
            None => self.success(&format!(
                "All {} groups completed",
                execution.groups_completed
            )),
        }
    }

    /// Print the outcome of routing a message
    pub fn route_outcome(&self, outcome: &RouteOutcome) {
        match outcome {
            RouteOutcome::Response(response) => {
                self.success(&format!("Task '{}' answered", response.task_id));
                self.kv("status", response.status.as_str());
                if let Some(error) = &response.error {
                    self.kv("error", error);
                }
                if let Some(result) = &response.result {
                    self.kv("result", &result.to_string());
                }
            }
            RouteOutcome::Cancelled { cancelled: true } => self.success("Task cancelled"),
            RouteOutcome::Cancelled { cancelled: false } => {
                self.info("Nothing to cancel")
            }
            RouteOutcome::Status(TaskStatusReport::Pending {
                agent_type,
                elapsed_ms,
            }) => self.info(&format!(
                "Pending on {} for {}ms",
                agent_type, elapsed_ms
            )),
            RouteOutcome::Status(TaskStatusReport::NotFound) => self.info("Task not found"),
            RouteOutcome::Rejected { reason, .. } => self.warning(reason),
        }
    }
}

fn format_row(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("{:<15}", v))
        .collect::<Vec<_>>()
        .join(" ")
}
