use std::fmt;

use serde::Serialize;

pub mod file;
pub mod group;
pub mod space;
pub mod todo;
pub mod user;
pub mod whiteboard;

pub use file::FileRecord;
pub use group::GroupRecord;
pub use space::SpaceRecord;
pub use todo::{TodoRecord, TodoSort, TodoStatus};
pub use user::UserRecord;
pub use whiteboard::WhiteboardRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Space,
    Group,
    Todo,
    Whiteboard,
    File,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Space => "space",
            EntityKind::Group => "group",
            EntityKind::Todo => "todo",
            EntityKind::Whiteboard => "whiteboard",
            EntityKind::File => "file",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
