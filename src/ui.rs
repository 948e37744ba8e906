use std::io::{self, IsTerminal};

use crate::entities::{
    FileRecord, GroupRecord, SpaceRecord, TodoRecord, TodoStatus, UserRecord, WhiteboardRecord,
};
use crate::search::PageResult;

/// One-line human rendering of a record.
pub trait Describe {
    const NOUN: &'static str;

    fn id_label(&self) -> String;
    fn summary(&self, palette: &Palette) -> String;
    fn version(&self) -> &str;
}

pub fn print_written<T: Describe>(verb: &str, record: &T) {
    let palette = Palette::auto();
    println!(
        "{verb} {} {} {}",
        T::NOUN,
        palette.id(&record.id_label()),
        record.summary(&palette)
    );
    println!("{}", palette.dim(&format!("version {}", record.version())));
}

pub fn print_record<T: Describe>(record: &T) {
    let palette = Palette::auto();
    println!("{} {}", palette.id(&record.id_label()), record.summary(&palette));
    println!("{}", palette.dim(&format!("version {}", record.version())));
}

pub fn print_list<T: Describe>(heading: &str, records: &[T]) {
    let palette = Palette::auto();
    println!("{}", palette.heading(heading));
    if records.is_empty() {
        println!("{}", palette.dim(&format!("no {}s matched", T::NOUN)));
        return;
    }
    for record in records {
        println!("{}", format_row(record, &palette));
    }
    println!("{}", palette.dim(&format!("{} {}(s)", records.len(), T::NOUN)));
}

pub fn print_page<T: Describe>(heading: &str, page: &PageResult<T>, page_number: u64) {
    let palette = Palette::auto();
    println!("{}", palette.heading(heading));
    for record in &page.items {
        println!("{}", format_row(record, &palette));
    }
    println!("{}", palette.dim(&page_summary(page.items.len(), page.total, page_number)));
}

fn format_row<T: Describe>(record: &T, palette: &Palette) -> String {
    format!("{} {}", palette.id(&record.id_label()), record.summary(palette))
}

fn page_summary(shown: usize, total: u64, page_number: u64) -> String {
    format!("page {} · {shown} shown of {total}", page_number.max(1))
}

impl Describe for UserRecord {
    const NOUN: &'static str = "user";

    fn id_label(&self) -> String {
        self.id.clone()
    }

    fn summary(&self, palette: &Palette) -> String {
        format!("{} {}", self.display_name, palette.dim(&format!("<{}>", self.email)))
    }

    fn version(&self) -> &str {
        &self.modified_at
    }
}

impl Describe for SpaceRecord {
    const NOUN: &'static str = "space";

    fn id_label(&self) -> String {
        format!("#{}", self.id)
    }

    fn summary(&self, palette: &Palette) -> String {
        format!("{} {}", self.name, palette.dim(&format!("rank {}", self.rank)))
    }

    fn version(&self) -> &str {
        &self.modified_at
    }
}

impl Describe for GroupRecord {
    const NOUN: &'static str = "group";

    fn id_label(&self) -> String {
        format!("#{}", self.id)
    }

    fn summary(&self, palette: &Palette) -> String {
        let mut line = format!("{} {}", self.name, palette.dim(&format!("rank {}", self.rank)));
        if let Some(space_id) = self.space_id {
            line.push(' ');
            line.push_str(&palette.parent(&format!("space #{space_id}")));
        }
        line
    }

    fn version(&self) -> &str {
        &self.modified_at
    }
}

impl Describe for TodoRecord {
    const NOUN: &'static str = "todo";

    fn id_label(&self) -> String {
        format!("#{}", self.id)
    }

    fn summary(&self, palette: &Palette) -> String {
        let mut line = format!("{} {}", palette.status(self.status()), self.title);
        line.push(' ');
        line.push_str(&palette.parent(&format!("group #{}", self.group_id)));
        if let Some(due_at) = self.due_at.as_deref() {
            line.push(' ');
            line.push_str(&palette.dim(&format!("due {due_at}")));
        }
        line
    }

    fn version(&self) -> &str {
        &self.modified_at
    }
}

impl Describe for WhiteboardRecord {
    const NOUN: &'static str = "whiteboard";

    fn id_label(&self) -> String {
        format!("#{}", self.id)
    }

    fn summary(&self, palette: &Palette) -> String {
        format!(
            "{} {} {}",
            self.title,
            palette.parent(&format!("space #{}", self.space_id)),
            palette.dim(&format!("{} bytes", self.content.len()))
        )
    }

    fn version(&self) -> &str {
        &self.modified_at
    }
}

impl Describe for FileRecord {
    const NOUN: &'static str = "file";

    fn id_label(&self) -> String {
        format!("#{}", self.id)
    }

    fn summary(&self, palette: &Palette) -> String {
        let mut line = format!(
            "{} {}",
            self.name,
            palette.dim(&format!("{} · {} bytes", self.mime_type, self.size_bytes))
        );
        if let Some(space_id) = self.space_id {
            line.push(' ');
            line.push_str(&palette.parent(&format!("space #{space_id}")));
        }
        line
    }

    fn version(&self) -> &str {
        &self.modified_at
    }
}

pub struct Palette {
    enabled: bool,
}

impl Palette {
    fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn status(&self, status: TodoStatus) -> String {
        let upper = status.as_str().to_ascii_uppercase();
        self.paint(status_color_code(status), &format!("[{upper}]"))
    }

    fn parent(&self, text: &str) -> String {
        self.paint("35", &format!("({text})"))
    }
}

fn status_color_code(status: TodoStatus) -> &'static str {
    match status {
        TodoStatus::Active => "33",
        TodoStatus::Done => "32",
    }
}

#[cfg(test)]
mod tests {
    use super::{page_summary, Describe, Palette};
    use crate::entities::TodoRecord;

    fn plain() -> Palette {
        Palette { enabled: false }
    }

    #[test]
    fn todo_summary_shows_status_parent_and_due_date() {
        let todo = TodoRecord {
            id: 4,
            group_id: 2,
            title: "pay rent".to_string(),
            description: None,
            rank: 0,
            due_at: Some("2026-11-01".to_string()),
            done_at: None,
            created_at: "2026-10-01T00:00:00.000000000Z".to_string(),
            modified_at: "2026-10-01T00:00:00.000000000Z".to_string(),
        };
        assert_eq!(todo.id_label(), "#4");
        assert_eq!(
            todo.summary(&plain()),
            "[ACTIVE] pay rent (group #2) due 2026-11-01"
        );
    }

    #[test]
    fn colors_are_only_emitted_when_enabled() {
        let colored = Palette { enabled: true };
        assert_eq!(colored.id("#1"), "\x1b[1;94m#1\x1b[0m");
        assert_eq!(plain().id("#1"), "#1");
    }

    #[test]
    fn page_summary_reads_page_zero_as_first() {
        assert_eq!(page_summary(3, 10, 0), "page 1 · 3 shown of 10");
    }
}
