//! Indented tree listing appended to a bundle on request.
//!
//! Input paths must be `/`-separated and sorted as strings. Under that order
//! every directory's descendants are contiguous, so the tree can be printed in
//! one pass without building an intermediate structure.

use std::io::{self, Write};

use crate::bundle::write_header;

/// Header text for the tree block.
pub const TREE_TITLE: &str = "Project tree";

const INDENT: &str = "  ";

/// Write the tree block: header, one line per directory and file, blank line.
pub fn render_tree<S: AsRef<str>>(paths: &[S], out: &mut impl Write) -> io::Result<()> {
    write_header(out, TREE_TITLE)?;

    let mut open_dirs: Vec<&str> = Vec::new();
    for path in paths {
        let segments: Vec<&str> = path.as_ref().split('/').collect();
        let Some((name, dirs)) = segments.split_last() else {
            continue;
        };

        let shared = open_dirs
            .iter()
            .zip(dirs)
            .take_while(|(open, dir)| *open == *dir)
            .count();
        open_dirs.truncate(shared);

        for dir in &dirs[shared..] {
            writeln!(out, "{}{}/", INDENT.repeat(open_dirs.len()), dir)?;
            open_dirs.push(*dir);
        }
        writeln!(out, "{}{}", INDENT.repeat(open_dirs.len()), name)?;
    }

    writeln!(out)
}
