use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use std::{
    fs::{self, File},
    io::{self, BufRead, BufWriter, Write},
    path::{Path, PathBuf},
};
use text_rope::Rope;
use tracing::{debug, info, warn};

use super::commands::{Command, HELP};
use crate::util::Display;

pub struct Editor<W: Write = io::Stdout> {
    pub(crate) buffer: Rope,
    pub(crate) filename: Option<PathBuf>,
    pub(crate) dirty: bool,
    pub(crate) stop: bool,

    pub(crate) edits: usize,
    rebalance_every: Option<usize>,

    pub(crate) display: Display<W>,
}

impl Editor {
    pub fn new(rebalance_every: Option<usize>) -> Self {
        Self::with_display(Display::new(), rebalance_every)
    }
}

impl<W: Write> Editor<W> {
    pub fn with_display(display: Display<W>, rebalance_every: Option<usize>) -> Self {
        Self {
            buffer: Rope::new(),
            filename: None,
            dirty: false,
            stop: false,

            edits: 0,
            rebalance_every,

            display,
        }
    }

    /// Replaces the buffer with the contents of `path`. A missing file starts
    /// an empty buffer that will be written to `path`.
    pub fn load_file(&mut self, path: &Path) -> Result<(), Report> {
        if !path.exists() {
            info!(path = %path.display(), "new file");
            self.buffer = Rope::new();
            self.filename = Some(path.to_path_buf());
            self.dirty = false;
            return Ok(());
        }

        let text =
            fs::read_to_string(path).wrap_err_with(|| format!("Error reading file '{}'", path.display()))?;
        self.buffer = Rope::from_fragments(text.split_inclusive('\n'));
        self.filename = Some(path.to_path_buf());
        self.dirty = false;

        debug!(
            path = %path.display(),
            size = self.buffer.size(),
            leaves = self.buffer.leaf_count(),
            "loaded file"
        );
        Ok(())
    }

    pub fn save_file(&mut self, path: &Path) -> Result<(), Report> {
        let file = File::create(path).wrap_err_with(|| format!("Error opening file '{}'", path.display()))?;
        let mut out = BufWriter::new(file);

        for fragment in self.buffer.fragments() {
            let chunk = fragment.iter().collect::<String>();
            out.write_all(chunk.as_bytes())?;
        }
        out.flush()?;

        if self.filename.is_none() {
            self.filename = Some(path.to_path_buf());
        }
        self.dirty = false;

        debug!(path = %path.display(), size = self.buffer.size(), "wrote file");
        Ok(())
    }

    /// Reads commands from `input` until end of input or a quit command.
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<(), Report> {
        let mut lines = input.lines();

        while !self.stop {
            self.display.prompt()?;

            let line = match lines.next() {
                Some(line) => line?,
                None => break,
            };

            if let Err(error) = self.handle_line(&line) {
                warn!(%error, "command failed");
                self.display.error(&error.to_string())?;
            }
        }

        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Result<(), Report> {
        if line.trim().is_empty() {
            return Ok(());
        }

        let command = line.parse::<Command>()?;
        self.execute(command)
    }

    pub(crate) fn execute(&mut self, command: Command) -> Result<(), Report> {
        match command {
            Command::Insert { pos, text } => {
                self.buffer.insert(&text, pos)?;
                if !text.is_empty() {
                    self.edited();
                }
            }
            Command::Append(text) => {
                self.buffer.insert(&text, self.buffer.size())?;
                if !text.is_empty() {
                    self.edited();
                }
            }
            Command::Erase { pos, len } => {
                self.buffer.erase(pos, len)?;
                if len > 0 {
                    self.edited();
                }
            }
            Command::Print(None) => self.display.text(&self.buffer.to_string())?,
            Command::Print(Some((pos, len))) => self.display.text(&self.buffer.report(pos, len)?)?,
            Command::Char(pos) => self.display.text(&format!("{:?}", self.buffer.index(pos)?))?,
            Command::Stats => {
                let stats = format!(
                    "size {} height {} leaves {}{}",
                    self.buffer.size(),
                    self.buffer.height(),
                    self.buffer.leaf_count(),
                    if self.dirty { " [+]" } else { "" }
                );
                self.display.info(&stats)?;
            }
            Command::Rebalance => {
                self.buffer.rebalance();
                self.display.info(&format!("height {}", self.buffer.height()))?;
            }
            Command::Edit(path) => {
                self.load_file(&path)?;
                self.display.info(&format!("'{}' {} characters", path.display(), self.buffer.size()))?;
            }
            Command::Write(path) => self.write(path)?,
            Command::WriteQuit(path) => {
                self.write(path)?;
                self.stop = true;
            }
            Command::Quit => self.stop = true,
            Command::Help => self.display.text(HELP)?,
        }

        Ok(())
    }

    fn write(&mut self, path: Option<PathBuf>) -> Result<(), Report> {
        let path = path.or_else(|| self.filename.clone()).ok_or_else(|| eyre!("No filename specified"))?;
        self.save_file(&path)?;
        self.display.info(&format!("'{}' {} characters written", path.display(), self.buffer.size()))
    }

    fn edited(&mut self) {
        self.dirty = true;
        self.edits += 1;

        if matches!(self.rebalance_every, Some(every) if every > 0 && self.edits % every == 0) {
            self.buffer.rebalance();
            debug!(edits = self.edits, height = self.buffer.height(), "periodic rebalance");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(rebalance_every: Option<usize>) -> Editor<Vec<u8>> {
        Editor::with_display(Display::with_writer(Vec::new(), false), rebalance_every)
    }

    fn run(editor: &mut Editor<Vec<u8>>, script: &str) -> String {
        editor.run(script.as_bytes()).unwrap();
        String::from_utf8(std::mem::take(&mut editor.display.out)).unwrap()
    }

    #[test]
    fn edit_session() {
        let mut editor = editor(None);
        let out = run(&mut editor, "i 0 hello\na  world\np\nd 0 6\np 0 5\nc 4\n");

        assert_eq!(out, ":::hello world\n::world\n:'d'\n:");
        assert_eq!(editor.buffer, "world");
        assert!(editor.dirty);
        assert_eq!(editor.edits, 3);
    }

    #[test]
    fn errors_do_not_end_the_session() {
        let mut editor = editor(None);
        let out = run(&mut editor, "a abc\nd 2 5\nbogus\n\np\n");

        assert!(out.contains("erase: range 2..7 out of range for rope of size 3\n"));
        assert!(out.contains("Unknown command: 'bogus'"));
        assert!(out.ends_with(":abc\n:"));
        assert_eq!(editor.buffer, "abc");
    }

    #[test]
    fn quit_stops_reading() {
        let mut editor = editor(None);
        run(&mut editor, "a one\nq\na two\n");

        assert!(editor.stop);
        assert_eq!(editor.buffer, "one");
    }

    #[test]
    fn periodic_rebalance() {
        let mut editor = editor(Some(4));
        let script = (0..8).map(|i| format!("a {i}\n")).collect::<String>();
        run(&mut editor, &script);

        assert_eq!(editor.buffer, "01234567");
        assert_eq!(editor.buffer.leaf_count(), 8);
        assert_eq!(editor.buffer.height(), 3);
    }

    #[test]
    fn empty_insert_is_not_an_edit() {
        let mut editor = editor(Some(1));
        let out = run(&mut editor, "i 0 \ni 9 \n");

        assert!(out.contains("insert: range 9..9 out of range for rope of size 0"));
        assert!(!editor.dirty);
        assert_eq!(editor.edits, 0);
        assert!(editor.buffer.is_empty());
    }

    #[test]
    fn write_without_filename_fails() {
        let mut editor = editor(None);
        let out = run(&mut editor, "a text\nw\n");

        assert!(out.contains("No filename specified"));
        assert!(editor.dirty);
    }

    #[test]
    fn load_and_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        let target = dir.path().join("target.txt");
        fs::write(&source, "first line\nsecond line\nthird").unwrap();

        let mut editor = editor(None);
        editor.load_file(&source).unwrap();
        assert_eq!(editor.buffer.leaf_count(), 3);
        assert_eq!(editor.buffer.size(), 28);

        let script = format!("i 6 new \\n\nwq {}\n", target.display());
        run(&mut editor, &script);

        assert!(editor.stop);
        assert!(!editor.dirty);
        assert_eq!(fs::read_to_string(&target).unwrap(), "first new \nline\nsecond line\nthird");
        assert_eq!(editor.filename.as_deref(), Some(source.as_path()));
    }

    #[test]
    fn missing_file_starts_empty_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.txt");

        let mut editor = editor(None);
        editor.load_file(&path).unwrap();
        assert!(editor.buffer.is_empty());

        run(&mut editor, "a hello\nw\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }
}
