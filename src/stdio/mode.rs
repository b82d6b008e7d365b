use std::{fs::OpenOptions, str::FromStr};

use crate::error::Error;

/// A parsed ANSI C `fopen` mode string such as `"r"`, `"wb"` or `"a+"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenMode {
    read: bool,
    write: bool,
    append: bool,
    truncate: bool,
    create: bool,
    exclusive: bool,
}

impl OpenMode {
    /// Whether the file is opened for reading.
    pub fn is_read(&self) -> bool {
        self.read
    }

    /// Whether the file is opened for writing (including appending).
    pub fn is_write(&self) -> bool {
        self.write || self.append
    }

    /// Whether every write goes to the end of the file.
    pub fn is_append(&self) -> bool {
        self.append
    }

    /// The equivalent [`OpenOptions`].
    pub fn options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options
            .read(self.read)
            .write(self.write)
            .append(self.append)
            .truncate(self.truncate);
        if self.exclusive {
            options.create_new(true);
        } else {
            options.create(self.create);
        }
        options
    }
}

impl FromStr for OpenMode {
    type Err = Error;

    fn from_str(mode: &str) -> Result<Self, Error> {
        let invalid = || Error::invalid(format!("malformed open mode {mode:?}"));

        let mut chars = mode.chars();
        let mut parsed = match chars.next() {
            Some('r') => Self {
                read: true,
                write: false,
                append: false,
                truncate: false,
                create: false,
                exclusive: false,
            },
            Some('w') => Self {
                read: false,
                write: true,
                append: false,
                truncate: true,
                create: true,
                exclusive: false,
            },
            Some('a') => Self {
                read: false,
                write: false,
                append: true,
                truncate: false,
                create: true,
                exclusive: false,
            },
            _ => return Err(invalid()),
        };

        let (mut plus, mut binary) = (false, false);
        for c in chars {
            match c {
                '+' if !plus => {
                    plus = true;
                    parsed.read = true;
                    if !parsed.append {
                        parsed.write = true;
                    }
                }
                'b' if !binary => binary = true,
                'x' if !parsed.exclusive && parsed.truncate => parsed.exclusive = true,
                _ => return Err(invalid()),
            }
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::OpenMode;

    fn parse(mode: &str) -> OpenMode {
        mode.parse().unwrap()
    }

    #[test]
    fn plain_modes() {
        let r = parse("r");
        assert!(r.is_read() && !r.is_write());

        let w = parse("w");
        assert!(!w.is_read() && w.is_write() && !w.is_append());

        let a = parse("a");
        assert!(!a.is_read() && a.is_write() && a.is_append());
    }

    #[test]
    fn update_and_binary_modes() {
        assert_eq!(parse("r+"), parse("rb+"));
        assert_eq!(parse("r+b"), parse("rb+"));
        assert!(parse("r+").is_write());
        assert!(parse("w+").is_read());
        let a = parse("a+b");
        assert!(a.is_read() && a.is_append());
        assert!(parse("wx").exclusive);
    }

    #[test]
    fn malformed_modes() {
        for mode in ["", "q", "rw", "r++", "rbb", "rx", "ax", "+r"] {
            let err = mode.parse::<OpenMode>().unwrap_err();
            assert_eq!(err.kind(), crate::StatusKind::InvalidArgument, "{mode:?}");
        }
    }
}
