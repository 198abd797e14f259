mod commands;
mod editor;

pub use self::editor::Editor;
