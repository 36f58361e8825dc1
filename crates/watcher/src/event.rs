//! Decoding raw notify events into per-file actions

use notify::event::{CreateKind, MetadataKind, ModifyKind, RenameMode};
use notify::{Event, EventKind};
use smallvec::SmallVec;
use std::ffi::OsString;
use std::path::Path;

/// What happened to a single file in the watched directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// File created
    Added,
    /// File contents or write time changed
    Modified,
    /// File appeared under this name through a rename
    RenamedTo,
    /// File deleted, or renamed away from this name
    Removed,
}

impl FileAction {
    /// Whether this action may insert or refresh a tracked record
    pub fn is_upsert(self) -> bool {
        !matches!(self, FileAction::Removed)
    }
}

/// Decoded actions for one event; renames carry at most two names
pub type Actions = SmallVec<[(OsString, FileAction); 2]>;

/// Decode `event` into actions on direct children of `directory`
///
/// Folder creation, access events and anything outside the directory
/// are dropped. Renames reported without a direction are resolved by
/// checking whether the path still exists.
pub fn decode(event: &Event, directory: &Path) -> Actions {
    let mut actions = Actions::new();

    match &event.kind {
        EventKind::Create(CreateKind::Folder) => {}
        EventKind::Create(_) => {
            for path in &event.paths {
                push_child(&mut actions, directory, path, FileAction::Added);
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            for path in &event.paths {
                push_child(&mut actions, directory, path, FileAction::Removed);
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            for path in &event.paths {
                push_child(&mut actions, directory, path, FileAction::RenamedTo);
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if let [from, to, ..] = event.paths.as_slice() {
                push_child(&mut actions, directory, from, FileAction::Removed);
                push_child(&mut actions, directory, to, FileAction::RenamedTo);
            }
        }
        EventKind::Modify(ModifyKind::Name(_)) => {
            for path in &event.paths {
                let action = if path.exists() {
                    FileAction::RenamedTo
                } else {
                    FileAction::Removed
                };
                push_child(&mut actions, directory, path, action);
            }
        }
        EventKind::Modify(
            ModifyKind::Any
            | ModifyKind::Data(_)
            | ModifyKind::Metadata(MetadataKind::Any | MetadataKind::WriteTime),
        ) => {
            for path in &event.paths {
                push_child(&mut actions, directory, path, FileAction::Modified);
            }
        }
        EventKind::Remove(_) => {
            for path in &event.paths {
                push_child(&mut actions, directory, path, FileAction::Removed);
            }
        }
        _ => {}
    }

    actions
}

fn push_child(actions: &mut Actions, directory: &Path, path: &Path, action: FileAction) {
    if path.parent() != Some(directory) {
        return;
    }
    if let Some(name) = path.file_name() {
        actions.push((name.to_os_string(), action));
    }
}
