use color_eyre::Report;
use crossterm::{queue, style};
use std::io::{self, IsTerminal, Write};

pub struct Display<W: Write = io::Stdout> {
    pub(crate) out: W,
    styled: bool,
}

impl Display {
    pub fn new() -> Self {
        let out = io::stdout();
        let styled = out.is_terminal();

        Self::with_writer(out, styled)
    }
}

impl<W: Write> Display<W> {
    pub fn with_writer(out: W, styled: bool) -> Self {
        Self { out, styled }
    }

    pub fn prompt(&mut self) -> Result<(), Report> {
        self.print(":", None)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn text(&mut self, text: &str) -> Result<(), Report> {
        self.lines(text, None)
    }

    pub fn info(&mut self, info: &str) -> Result<(), Report> {
        self.lines(info, Some(style::Attribute::Bold))
    }

    pub fn error(&mut self, error: &str) -> Result<(), Report> {
        self.lines(error, Some(style::Attribute::Italic))
    }

    fn lines(&mut self, text: &str, attribute: Option<style::Attribute>) -> Result<(), Report> {
        for line in text.split('\n') {
            self.print(line, attribute)?;
            queue!(self.out, style::Print('\n'))?;
        }

        self.out.flush()?;
        Ok(())
    }

    fn print(&mut self, text: &str, attribute: Option<style::Attribute>) -> Result<(), Report> {
        match attribute {
            Some(attribute) if self.styled => queue!(
                self.out,
                style::SetAttribute(attribute),
                style::Print(text),
                style::SetAttribute(style::Attribute::Reset)
            )?,
            _ => queue!(self.out, style::Print(text))?,
        }

        Ok(())
    }
}
