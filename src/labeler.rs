use std::io::{BufRead, StdinLock, Stdout, Write};

use crate::catalog::normalize_label;
use crate::error::MapperError;
use crate::imaging::tiles::Tile;

/// What the operator decided for an unknown tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelDecision {
    Label(String),
    Skip,
    Quit,
}

/// Source of labels for tiles the catalog does not know yet.
pub trait Labeler {
    fn label_tile(&mut self, tile: &Tile) -> Result<LabelDecision, MapperError>;
}

/// Interprets one line of operator input. `None` means ask again.
pub fn parse_response(line: &str) -> Option<LabelDecision> {
    let trimmed = line.trim();
    match trimmed {
        "" => None,
        ":skip" => Some(LabelDecision::Skip),
        ":quit" | ":q" => Some(LabelDecision::Quit),
        _ => normalize_label(trimmed).ok().map(LabelDecision::Label),
    }
}

/// Asks for labels on a line-based terminal.
pub struct PromptLabeler<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptLabeler<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl PromptLabeler<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Labeler for PromptLabeler<R, W> {
    fn label_tile(&mut self, tile: &Tile) -> Result<LabelDecision, MapperError> {
        writeln!(
            self.output,
            "Unknown tile at row {}, col {} (pixel {}, {}). Type :skip to leave it unknown, :quit (or :q) to stop.",
            tile.row, tile.col, tile.x, tile.y
        )?;
        loop {
            write!(self.output, "Enter tile type: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(LabelDecision::Quit);
            }
            match parse_response(&line) {
                Some(decision) => return Ok(decision),
                None if line.trim().is_empty() => {}
                None => writeln!(self.output, "'{}' is not a usable tile type.", line.trim())?,
            }
        }
    }
}

/// Leaves every unknown tile unlabeled, for unattended runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkipLabeler;

impl Labeler for SkipLabeler {
    fn label_tile(&mut self, _tile: &Tile) -> Result<LabelDecision, MapperError> {
        Ok(LabelDecision::Skip)
    }
}
