use core::fmt;

use crate::EntryType;

/// Longest short name a path component may carry: 8 + '.' + 3.
pub const MAX_FILENAME_SIZE: usize = 12;

const SEPARATORS: [char; 2] = ['/', '\\'];

/// A borrowed, absolute path on the volume. Both `/` and `\` separate components,
/// and the leading separator always refers to the root directory.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Path<'a>(&'a str);

/// One step of a path walk: the name to look up and what kind of entry it must be.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Component<'a> {
    pub name: &'a str,
    pub kind: EntryType,
}

impl<'a> Path<'a> {
    pub fn new(path: &'a str) -> Self {
        Self(path)
    }

    pub fn to_str(&self) -> &'a str {
        self.0
    }

    /// A trailing separator means the path names a directory.
    pub fn is_directory(&self) -> bool {
        self.0.ends_with(SEPARATORS)
    }

    /// Leading whitespace and a single leading separator are dropped. Every component but
    /// the last is a directory, the last one is a file unless the path ends in a separator.
    pub fn components(&self) -> Components<'a> {
        let mut body = self.0.trim_start();
        if let Some(stripped) = body.strip_prefix(SEPARATORS) {
            body = stripped;
        }
        let trailing_dir = body.ends_with(SEPARATORS);
        if trailing_dir {
            body = &body[..body.len() - 1];
        }
        Components {
            rest: (!body.is_empty()).then_some(body),
            trailing_dir,
        }
    }
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'a> From<&'a str> for Path<'a> {
    fn from(s: &'a str) -> Self {
        Self::new(s)
    }
}

pub struct Components<'a> {
    rest: Option<&'a str>,
    trailing_dir: bool,
}

impl<'a> Iterator for Components<'a> {
    type Item = Component<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest.take()?;
        match rest.split_once(SEPARATORS) {
            Some((name, tail)) => {
                self.rest = Some(tail);
                Some(Component {
                    name,
                    kind: EntryType::Directory,
                })
            }
            None => Some(Component {
                name: rest,
                kind: if self.trailing_dir {
                    EntryType::Directory
                } else {
                    EntryType::File
                },
            }),
        }
    }
}
