//! Directory listing producer
//!
//! Renders an HTML index of one open directory across several pulls. The phase
//! only moves forward: header, then one entry per pull, then footer, then done.
//! Dot-files are skipped by emitting an empty chunk, so the caller simply pulls again.

use super::{released_error, Chunk, Producer};
use crate::error::{ServeError, ServeResult};
use html_escape::{encode_double_quoted_attribute, encode_text};
use hyper::body::Bytes;
use std::borrow::Cow;
use std::ffi::OsString;
use std::fs::{self, ReadDir};
use std::io;
use std::path::Path;

/// Rendering phase of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Header,
    Entries,
    Footer,
    Done,
}

/// Entry names of an open directory handle
pub struct DirNames(ReadDir);

impl Iterator for DirNames {
    type Item = io::Result<OsString>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|entry| entry.map(|e| e.file_name()))
    }
}

pub struct DirectoryProducer<I = DirNames> {
    entries: Option<I>,
    /// Used for rendering only, never for filesystem access
    display_path: String,
    phase: Phase,
    escape_names: bool,
    /// Tail of a fragment that did not fit into the previous chunk
    pending: Bytes,
}

impl DirectoryProducer<DirNames> {
    pub fn open(path: &Path, display_path: String, escape_names: bool) -> ServeResult<Self> {
        let dir = fs::read_dir(path).map_err(|_| ServeError::NotFound(path.to_path_buf()))?;
        Ok(Self::new(DirNames(dir), display_path, escape_names))
    }
}

impl<I> DirectoryProducer<I>
where
    I: Iterator<Item = io::Result<OsString>>,
{
    /// Below this many bytes a pull emits nothing and leaves the phase untouched,
    /// so a generated fragment is never cut short by a tiny buffer.
    pub const MIN_CHUNK: usize = 512;

    pub const fn new(entries: I, display_path: String, escape_names: bool) -> Self {
        Self {
            entries: Some(entries),
            display_path,
            phase: Phase::Header,
            escape_names,
            pending: Bytes::new(),
        }
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn is_open(&self) -> bool {
        self.entries.is_some()
    }

    fn header(&self) -> String {
        let path = if self.escape_names {
            encode_text(&self.display_path)
        } else {
            Cow::Borrowed(self.display_path.as_str())
        };
        format!(
            "<!DOCTYPE html>\
             <html>\
             <head><title>Index of {path}</title></head>\
             <body>\
             <h1>Index of {path}</h1>\
             <ul>"
        )
    }

    /// Links are percent-encoded so they survive the request-side decoding
    fn entry(&self, name: &str) -> String {
        let href = urlencoding::encode(name);
        if self.escape_names {
            format!(
                "<li><a href=\"{}\">{}</a></li>",
                encode_double_quoted_attribute(&href),
                encode_text(name)
            )
        } else {
            format!("<li><a href=\"{href}\">{name}</a></li>")
        }
    }

    /// Hand out at most `max_len` bytes of `fragment`, keeping the rest pending
    fn emit(&mut self, mut fragment: Bytes, max_len: usize) -> Chunk {
        if fragment.len() > max_len {
            self.pending = fragment.split_off(max_len);
        }
        Chunk::Data(fragment)
    }
}

impl<I> Producer for DirectoryProducer<I>
where
    I: Iterator<Item = io::Result<OsString>> + Send + 'static,
{
    fn pull(&mut self, _offset: u64, max_len: usize) -> Chunk {
        if self.entries.is_none() {
            return Chunk::Abort(released_error());
        }
        if max_len < Self::MIN_CHUNK {
            return Chunk::empty();
        }
        if !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            return self.emit(pending, max_len);
        }

        match self.phase {
            Phase::Header => {
                self.phase = Phase::Entries;
                let header = self.header();
                self.emit(Bytes::from(header), max_len)
            }
            Phase::Entries => {
                let next = self.entries.as_mut().and_then(Iterator::next);
                match next {
                    None => {
                        self.phase = Phase::Footer;
                        Chunk::empty()
                    }
                    Some(Err(e)) => Chunk::Abort(e),
                    Some(Ok(name)) => {
                        let name = name.to_string_lossy();
                        if name.starts_with('.') {
                            return Chunk::empty();
                        }
                        let entry = self.entry(&name);
                        self.emit(Bytes::from(entry), max_len)
                    }
                }
            }
            Phase::Footer => {
                self.phase = Phase::Done;
                Chunk::Data(Bytes::from_static(b"</ul></body></html>"))
            }
            Phase::Done => Chunk::EndOfStream,
        }
    }

    fn release(&mut self) {
        self.entries.take();
    }

    fn min_chunk(&self) -> usize {
        Self::MIN_CHUNK
    }
}

impl<I> Drop for DirectoryProducer<I> {
    fn drop(&mut self) {
        self.entries.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::testing::{HandleCounter, HandleGuard};
    use std::vec;

    struct TrackedEntries {
        names: vec::IntoIter<io::Result<OsString>>,
        _guard: HandleGuard,
    }

    impl Iterator for TrackedEntries {
        type Item = io::Result<OsString>;

        fn next(&mut self) -> Option<Self::Item> {
            self.names.next()
        }
    }

    fn listing(names: &[&str], counter: &HandleCounter) -> DirectoryProducer<TrackedEntries> {
        let names: Vec<_> = names.iter().map(|n| Ok(OsString::from(n))).collect();
        let entries = TrackedEntries {
            names: names.into_iter(),
            _guard: counter.open(),
        };
        DirectoryProducer::new(entries, "/docs/".to_string(), true)
    }

    fn render_all<P: Producer>(producer: &mut P, chunk_size: usize) -> String {
        let mut out = Vec::new();
        let mut offset = 0u64;
        loop {
            match producer.pull(offset, chunk_size) {
                Chunk::Data(bytes) => {
                    assert!(bytes.len() <= chunk_size);
                    offset += bytes.len() as u64;
                    out.extend_from_slice(&bytes);
                }
                Chunk::EndOfStream => return String::from_utf8(out).unwrap(),
                Chunk::Abort(e) => panic!("unexpected abort: {e}"),
            }
        }
    }

    #[test]
    fn test_listing_skips_hidden_entries() {
        let counter = HandleCounter::default();
        let mut producer = listing(&["a.txt", ".hidden", "b"], &counter);
        let html = render_all(&mut producer, 4096);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Index of /docs/</title>"));
        assert!(html.contains("<h1>Index of /docs/</h1>"));
        assert!(html.contains("<li><a href=\"a.txt\">a.txt</a></li>"));
        assert!(html.contains("<li><a href=\"b\">b</a></li>"));
        assert!(!html.contains("hidden"));
        assert!(html.ends_with("</ul></body></html>"));
    }

    #[test]
    fn test_phases_advance_in_order() {
        let counter = HandleCounter::default();
        let mut producer = listing(&["one", ".skip"], &counter);
        assert_eq!(producer.phase(), Phase::Header);

        assert!(matches!(producer.pull(0, 512), Chunk::Data(b) if !b.is_empty()));
        assert_eq!(producer.phase(), Phase::Entries);

        assert!(matches!(producer.pull(0, 512), Chunk::Data(b) if !b.is_empty()));
        // Hidden entry: zero bytes, still enumerating
        assert!(matches!(producer.pull(0, 512), Chunk::Data(b) if b.is_empty()));
        assert_eq!(producer.phase(), Phase::Entries);
        // Exhausted: zero bytes, moves on to the footer
        assert!(matches!(producer.pull(0, 512), Chunk::Data(b) if b.is_empty()));
        assert_eq!(producer.phase(), Phase::Footer);

        assert!(matches!(producer.pull(0, 512), Chunk::Data(b) if !b.is_empty()));
        assert_eq!(producer.phase(), Phase::Done);

        assert!(matches!(producer.pull(0, 512), Chunk::EndOfStream));
        assert!(matches!(producer.pull(0, 512), Chunk::EndOfStream));
        assert_eq!(producer.phase(), Phase::Done);
    }

    #[test]
    fn test_small_buffer_leaves_state_untouched() {
        let counter = HandleCounter::default();
        let mut producer = listing(&["first", "second"], &counter);

        let mut html = String::new();
        for _ in 0..6 {
            let phase = producer.phase();
            match producer.pull(0, 10) {
                Chunk::Data(bytes) => assert!(bytes.is_empty()),
                other => panic!("expected empty chunk, got {other:?}"),
            }
            assert_eq!(producer.phase(), phase);

            match producer.pull(0, 512) {
                Chunk::Data(bytes) => html.push_str(std::str::from_utf8(&bytes).unwrap()),
                Chunk::EndOfStream => break,
                Chunk::Abort(e) => panic!("unexpected abort: {e}"),
            }
        }

        assert_eq!(html.matches("<a href=\"first\">").count(), 1);
        assert_eq!(html.matches("<a href=\"second\">").count(), 1);
        assert!(html.find("first").unwrap() < html.find("second").unwrap());
        assert!(html.ends_with("</ul></body></html>"));
    }

    #[test]
    fn test_oversized_fragment_spans_chunks() {
        let counter = HandleCounter::default();
        let long = "x".repeat(400);
        let mut producer = listing(&[&long], &counter);
        let html = render_all(&mut producer, DirectoryProducer::<TrackedEntries>::MIN_CHUNK);
        assert!(html.contains(&format!("<li><a href=\"{long}\">{long}</a></li>")));
    }

    #[test]
    fn test_names_are_escaped() {
        let counter = HandleCounter::default();
        let mut producer = listing(&["<script>\"x\"&.txt"], &counter);
        let html = render_all(&mut producer, 4096);
        assert!(html.contains(
            "<a href=\"%3Cscript%3E%22x%22%26.txt\">&lt;script&gt;\"x\"&amp;.txt</a>"
        ));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_verbatim_rendering_when_escaping_disabled() {
        let names: Vec<io::Result<OsString>> = vec![Ok(OsString::from("a&b"))];
        let mut producer = DirectoryProducer::new(names.into_iter(), "/<x>/".to_string(), false);
        let html = render_all(&mut producer, 4096);
        assert!(html.contains("Index of /<x>/"));
        assert!(html.contains("<a href=\"a%26b\">a&b</a>"));
    }

    #[test]
    fn test_enumeration_error_aborts() {
        let names = vec![
            Ok(OsString::from("ok")),
            Err(io::Error::other("readdir failed")),
        ];
        let mut producer = DirectoryProducer::new(names.into_iter(), "/".to_string(), true);
        assert!(matches!(producer.pull(0, 512), Chunk::Data(_)));
        assert!(matches!(producer.pull(0, 512), Chunk::Data(_)));
        assert!(matches!(producer.pull(0, 512), Chunk::Abort(_)));
    }

    #[test]
    fn test_release_mid_listing_closes_once() {
        let counter = HandleCounter::default();
        let mut producer = listing(&["a", "b", "c"], &counter);
        assert!(matches!(producer.pull(0, 512), Chunk::Data(_)));
        assert!(matches!(producer.pull(0, 512), Chunk::Data(_)));

        producer.release();
        producer.release();
        assert!(!producer.is_open());
        assert!(matches!(producer.pull(0, 512), Chunk::Abort(_)));
        drop(producer);

        assert_eq!(counter.opened(), 1);
        assert_eq!(counter.closed(), 1);
    }

    #[test]
    fn test_open_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join(".hidden"), b"h").unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();

        let mut producer = DirectoryProducer::open(dir.path(), "/".to_string(), true).unwrap();
        let html = render_all(&mut producer, 131_072);
        assert!(html.contains("<a href=\"a.txt\">a.txt</a>"));
        assert!(html.contains("<a href=\"b\">b</a>"));
        assert!(!html.contains(".hidden"));
    }

    #[test]
    fn test_links_are_percent_encoded() {
        let counter = HandleCounter::default();
        let mut producer = listing(&["50%41off.txt", "a#1.txt", "q?.txt", "my file"], &counter);
        let html = render_all(&mut producer, 4096);
        assert!(html.contains("<a href=\"50%2541off.txt\">50%41off.txt</a>"));
        assert!(html.contains("<a href=\"a%231.txt\">a#1.txt</a>"));
        assert!(html.contains("<a href=\"q%3F.txt\">q?.txt</a>"));
        assert!(html.contains("<a href=\"my%20file\">my file</a>"));
    }
}
