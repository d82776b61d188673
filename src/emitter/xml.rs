//! Minimal indented XML writer.
//!
//! The archival document is a fixed tree of simple elements, so a small
//! push-style writer is all that is needed. Text content is escaped; no
//! attributes, namespaces or mixed content.

pub struct XmlWriter {
    buf: String,
    depth: usize,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            buf: String::from("<?xml version=\"1.0\"?>\n"),
            depth: 0,
        }
    }

    pub fn open(&mut self, tag: &str) {
        self.indent();
        self.buf.push('<');
        self.buf.push_str(tag);
        self.buf.push_str(">\n");
        self.depth += 1;
    }

    pub fn close(&mut self, tag: &str) {
        self.depth -= 1;
        self.indent();
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push_str(">\n");
    }

    /// A leaf element with escaped text content. Empty text renders as a
    /// self-closing element.
    pub fn leaf(&mut self, tag: &str, text: &str) {
        self.indent();
        if text.is_empty() {
            self.buf.push('<');
            self.buf.push_str(tag);
            self.buf.push_str("/>\n");
            return;
        }
        self.buf.push('<');
        self.buf.push_str(tag);
        self.buf.push('>');
        push_escaped(&mut self.buf, text);
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push_str(">\n");
    }

    /// Empty leaf elements, in order.
    pub fn empty_leaves(&mut self, tags: &[&str]) {
        for tag in tags {
            self.leaf(tag, "");
        }
    }

    pub fn finish(self) -> String {
        debug_assert_eq!(self.depth, 0, "unclosed XML elements");
        self.buf
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.buf.push_str("  ");
        }
    }
}

fn push_escaped(buf: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            '"' => buf.push_str("&quot;"),
            '\'' => buf.push_str("&apos;"),
            _ => buf.push(c),
        }
    }
}
