/// Usage rendering for command trees.
use std::io::{self, Write};

use super::{Callback, Command};
use crate::arguments::Arguments;

/// Writer that prefixes lines with two spaces per depth level.
struct Indenter<'w> {
    writer: &'w mut dyn Write,
    depth: usize,
}

impl<'w> Indenter<'w> {
    fn new(writer: &'w mut dyn Write) -> Self {
        Self { writer, depth: 0 }
    }

    fn indent(&mut self) -> io::Result<()> {
        write!(self.writer, "{}", "  ".repeat(self.depth))
    }

    fn line(&mut self, text: &str) -> io::Result<()> {
        self.indent()?;
        writeln!(self.writer, "{text}")
    }
}

fn describe(arguments: &Arguments) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = arguments.usage(&mut buf);
    String::from_utf8_lossy(&buf).trim().to_owned()
}

impl Command {
    /// Text shown after the command name: the usage string, or the
    /// positional argument descriptions when none was set.
    fn inline_usage(&self) -> String {
        if self.usage.is_empty() {
            self.argument_usage()
        } else {
            self.usage.clone()
        }
    }

    /// Positional argument descriptions: own list, then the bound function's.
    fn argument_usage(&self) -> String {
        let bound = match &self.callback {
            Some(Callback::Bound(binder)) => Some(binder.arguments()),
            _ => None,
        };
        [Some(&self.arguments), bound]
            .into_iter()
            .flatten()
            .map(describe)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Write usage: header, flag defaults, then the nested command list.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write_usage(&self, writer: &mut dyn Write) -> io::Result<()> {
        self.render(&mut Indenter::new(writer))
    }

    fn render(&self, out: &mut Indenter<'_>) -> io::Result<()> {
        if out.depth == 0 {
            self.render_header(out)?;
        }

        let mut defaults = Vec::new();
        self.flags.print_defaults(&mut defaults)?;
        if !defaults.is_empty() {
            for line in String::from_utf8_lossy(&defaults).split('\n') {
                out.line(line)?;
            }
        }

        if self.children.is_empty() {
            return Ok(());
        }
        out.line("Commands:")?;
        let width = self.children.keys().map(String::len).max().unwrap_or(0);
        let mut prev_leaf = false;
        for child in self.children.values() {
            let has_children = !child.children.is_empty();
            if prev_leaf && has_children {
                writeln!(out.writer)?;
            }
            out.indent()?;
            write!(out.writer, "{:<width$}", child.name)?;

            let usage = child.inline_usage();
            if usage.is_empty() {
                if child.description.is_empty() {
                    writeln!(out.writer)?;
                } else {
                    writeln!(out.writer, " {}", child.description)?;
                }
            } else {
                writeln!(out.writer, " {usage}")?;
                if !child.description.is_empty() {
                    out.line(&format!("{} {}", " ".repeat(width), child.description))?;
                }
            }

            out.depth += width;
            let rendered = child.render(out);
            out.depth -= width;
            rendered?;
            prev_leaf = !has_children;
        }
        writeln!(out.writer)
    }

    fn render_header(&self, out: &mut Indenter<'_>) -> io::Result<()> {
        write!(out.writer, "Usage: {}", self.name)?;
        if !self.usage.is_empty() {
            return writeln!(out.writer, " {}", self.usage);
        }
        if !self.flags.is_empty() {
            write!(out.writer, " [global options]")?;
        }
        let arguments = self.argument_usage();
        if !arguments.is_empty() {
            write!(out.writer, " {arguments}")?;
        }
        if self.children.is_empty() {
            writeln!(out.writer)
        } else {
            writeln!(out.writer, " <command> [command options]")
        }
    }
}
