//! Clipboard plumbing between the engine and the OS pasteboard.

use std::collections::HashMap;
use std::path::PathBuf;

/// Characters a shell would interpret when a path is pasted unquoted.
const SHELL_ESCAPE_CHARS: &str = "\\ ()[]{}<>\"'`!#$&;|*?\t";

/// Named clipboard the engine reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipboardLocation {
    Standard,
    Selection,
}

/// Opaque engine token completing an asynchronous clipboard read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipboardRequestId(pub u64);

/// One representation of a clipboard write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardContent {
    pub mime: String,
    pub data: String,
}

/// OS pasteboard type a MIME type is written as.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PasteboardType {
    /// Generic plain string type.
    String,
    /// Uniform type identifier, or the MIME type itself when unknown.
    Named(String),
}

impl PasteboardType {
    pub fn from_mime(mime: &str) -> Self {
        let uti = match mime {
            "text/plain" => return Self::String,
            "text/html" => "public.html",
            "text/rtf" | "application/rtf" => "public.rtf",
            "text/uri-list" => "public.url",
            "application/json" => "public.json",
            "image/png" => "public.png",
            "image/jpeg" => "public.jpeg",
            "image/tiff" => "public.tiff",
            "application/pdf" => "com.adobe.pdf",
            other => other,
        };
        Self::Named(uti.to_string())
    }
}

/// URL found on a pasteboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteboardUrl {
    File(PathBuf),
    Remote(String),
}

/// OS pasteboard as seen by the runtime.
pub trait Pasteboard {
    fn urls(&self, location: ClipboardLocation) -> Vec<PasteboardUrl>;
    fn string(&self, location: ClipboardLocation) -> Option<String>;
    /// Replace the pasteboard contents with `items`.
    fn write(
        &mut self,
        location: ClipboardLocation,
        items: Vec<(PasteboardType, String)>,
    );
}

/// Backslash-escape shell metacharacters.
pub fn shell_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if SHELL_ESCAPE_CHARS.contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Contents to paste into a terminal: URLs joined with spaces (file paths
/// escaped) when present, otherwise the plain string.
pub fn opinionated_contents(
    pasteboard: &dyn Pasteboard,
    location: ClipboardLocation,
) -> Option<String> {
    let urls = pasteboard.urls(location);
    if !urls.is_empty() {
        let joined = urls
            .iter()
            .map(|url| match url {
                PasteboardUrl::File(path) => {
                    shell_escape(&path.to_string_lossy())
                },
                PasteboardUrl::Remote(url) => url.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        return Some(joined);
    }

    pasteboard.string(location)
}

/// Map engine clipboard items to pasteboard types, dropping empty ones.
pub fn pasteboard_items(
    items: Vec<ClipboardContent>,
) -> Vec<(PasteboardType, String)> {
    items
        .into_iter()
        .filter(|item| !item.mime.is_empty())
        .map(|item| (PasteboardType::from_mime(&item.mime), item.data))
        .collect()
}

#[derive(Debug, Default, Clone)]
struct MemoryBoard {
    urls: Vec<PasteboardUrl>,
    items: Vec<(PasteboardType, String)>,
}

/// In-process pasteboard for headless hosts and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryPasteboard {
    boards: HashMap<ClipboardLocation, MemoryBoard>,
}

impl MemoryPasteboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_string(&mut self, location: ClipboardLocation, text: &str) {
        let board = self.boards.entry(location).or_default();
        board.urls.clear();
        board.items = vec![(PasteboardType::String, text.to_string())];
    }

    pub fn set_urls(
        &mut self,
        location: ClipboardLocation,
        urls: Vec<PasteboardUrl>,
    ) {
        let board = self.boards.entry(location).or_default();
        board.items.clear();
        board.urls = urls;
    }

    pub fn items(
        &self,
        location: ClipboardLocation,
    ) -> &[(PasteboardType, String)] {
        self.boards
            .get(&location)
            .map(|board| board.items.as_slice())
            .unwrap_or(&[])
    }
}

impl Pasteboard for MemoryPasteboard {
    fn urls(&self, location: ClipboardLocation) -> Vec<PasteboardUrl> {
        self.boards
            .get(&location)
            .map(|board| board.urls.clone())
            .unwrap_or_default()
    }

    fn string(&self, location: ClipboardLocation) -> Option<String> {
        self.items(location)
            .iter()
            .find(|(kind, _)| *kind == PasteboardType::String)
            .map(|(_, text)| text.clone())
    }

    fn write(
        &mut self,
        location: ClipboardLocation,
        items: Vec<(PasteboardType, String)>,
    ) {
        let board = self.boards.entry(location).or_default();
        board.urls.clear();
        board.items = items;
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{
        ClipboardContent, ClipboardLocation, MemoryPasteboard, Pasteboard,
        PasteboardType, PasteboardUrl, opinionated_contents, pasteboard_items,
        shell_escape,
    };

    #[test]
    fn escapes_every_shell_metacharacter() {
        assert_eq!(shell_escape("a b"), "a\\ b");
        assert_eq!(shell_escape("it's(1)"), "it\\'s\\(1\\)");
        assert_eq!(shell_escape("tab\there"), "tab\\\there");
        assert_eq!(shell_escape("back\\slash"), "back\\\\slash");
        assert_eq!(shell_escape("plain"), "plain");
    }

    #[test]
    fn given_file_urls_when_reading_then_paths_are_escaped_and_joined() {
        let mut board = MemoryPasteboard::new();
        board.set_urls(
            ClipboardLocation::Standard,
            vec![
                PasteboardUrl::File(PathBuf::from("/tmp/my file.txt")),
                PasteboardUrl::Remote("https://example.com/a b".into()),
            ],
        );

        let contents =
            opinionated_contents(&board, ClipboardLocation::Standard);

        assert_eq!(
            contents.as_deref(),
            Some("/tmp/my\\ file.txt https://example.com/a b")
        );
    }

    #[test]
    fn given_plain_string_when_reading_then_it_is_returned_verbatim() {
        let mut board = MemoryPasteboard::new();
        board.set_string(ClipboardLocation::Selection, "echo $HOME");

        assert_eq!(
            opinionated_contents(&board, ClipboardLocation::Selection)
                .as_deref(),
            Some("echo $HOME")
        );
        assert_eq!(
            opinionated_contents(&board, ClipboardLocation::Standard),
            None
        );
    }

    #[test]
    fn maps_mime_types_to_pasteboard_types() {
        let items = pasteboard_items(vec![
            ClipboardContent {
                mime: "text/plain".into(),
                data: "hi".into(),
            },
            ClipboardContent {
                mime: "text/html".into(),
                data: "<b>hi</b>".into(),
            },
            ClipboardContent {
                mime: "application/x-custom".into(),
                data: "raw".into(),
            },
        ]);

        assert_eq!(items[0].0, PasteboardType::String);
        assert_eq!(items[1].0, PasteboardType::Named("public.html".into()));
        assert_eq!(
            items[2].0,
            PasteboardType::Named("application/x-custom".into())
        );

        let mut board = MemoryPasteboard::new();
        board.write(ClipboardLocation::Standard, items);
        assert_eq!(
            board.string(ClipboardLocation::Standard).as_deref(),
            Some("hi")
        );
    }
}
