//! Table rendering for CLI output

use colored::Colorize;
use ninhydrin_sdk::{Namespace, Pool, Tag, Task, Worker};
use tabled::{Table, Tabled};

/// One-line summary of a registry record beyond its ID
pub trait Describe {
    fn id(&self) -> &str;
    fn details(&self) -> String;
}

impl Describe for Namespace {
    fn id(&self) -> &str {
        &self.id
    }

    fn details(&self) -> String {
        String::new()
    }
}

impl Describe for Pool {
    fn id(&self) -> &str {
        &self.id
    }

    fn details(&self) -> String {
        let tags = format_tags(&self.tag_ids);
        match &self.description {
            Some(desc) if tags.is_empty() => desc.clone(),
            Some(desc) => format!("{} ({})", desc, tags),
            None => tags,
        }
    }
}

impl Describe for Tag {
    fn id(&self) -> &str {
        &self.id
    }

    fn details(&self) -> String {
        String::new()
    }
}

impl Describe for Worker {
    fn id(&self) -> &str {
        &self.id
    }

    fn details(&self) -> String {
        format_tags(&self.tag_ids)
    }
}

fn format_tags(tag_ids: &[String]) -> String {
    if tag_ids.is_empty() {
        String::new()
    } else {
        format!("tags: {}", tag_ids.join(", "))
    }
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "DETAILS")]
    details: String,
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAMESPACE")]
    namespace_id: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "TIMEOUT (s)")]
    timeout: u32,
    #[tabled(rename = "RETRIES LEFT")]
    retries_left: u32,
    #[tabled(rename = "UPDATED AT (ms)")]
    updated_at: i64,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            namespace_id: task.namespace_id.clone(),
            status: task.status.to_string(),
            timeout: task.timeout,
            retries_left: task.retries_left,
            updated_at: task.updated_at,
        }
    }
}

pub fn records_table<T: Describe>(records: &[T]) -> String {
    Table::new(records.iter().map(|r| RecordRow {
        id: r.id().to_string(),
        details: r.details(),
    }))
    .to_string()
}

pub fn tasks_table(tasks: &[Task]) -> String {
    Table::new(tasks.iter().map(TaskRow::from)).to_string()
}

pub fn print_records<T: Describe>(kind: &str, records: &[T]) {
    if records.is_empty() {
        println!("{}", format!("No {} registered", kind).yellow());
    } else {
        println!("{}", records_table(records));
    }
}

pub fn print_tasks(tasks: &[Task], empty_message: &str) {
    if tasks.is_empty() {
        println!("{}", empty_message.yellow());
    } else {
        println!("{}", tasks_table(tasks));
    }
}

pub fn success(message: impl AsRef<str>) {
    println!("{}", format!("✓ {}", message.as_ref()).green().bold());
}
