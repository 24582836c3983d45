//! Status markers printed in front of command output.

use std::fmt;

use console::style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Done,
    Failed,
    Step,
    Caution,
    Detail,
    Keyword,
}

impl Icon {
    /// Marker for a finished intake item.
    pub fn for_item(stored: bool) -> Self {
        if stored {
            Icon::Done
        } else {
            Icon::Failed
        }
    }

    fn glyph(self) -> &'static str {
        match self {
            Icon::Done => "✓",
            Icon::Failed => "✗",
            Icon::Step | Icon::Detail => "→",
            Icon::Caution => "!",
            Icon::Keyword => "•",
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let glyph = style(self.glyph());
        let styled = match self {
            Icon::Done => glyph.green(),
            Icon::Failed => glyph.red(),
            Icon::Step => glyph.cyan(),
            Icon::Caution => glyph.yellow(),
            Icon::Detail | Icon::Keyword => glyph.dim(),
        };
        write!(f, "{}", styled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_marker() {
        assert_eq!(Icon::for_item(true), Icon::Done);
        assert_eq!(Icon::for_item(false), Icon::Failed);
        assert!(Icon::Done.to_string().contains('✓'));
        assert!(Icon::Failed.to_string().contains('✗'));
    }
}
