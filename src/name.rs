use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Human-readable identifier with case-insensitive comparison semantics.
///
/// Display preserves the text the name was created with; equality and
/// hashing fold ASCII case so `"Sun"` and `"sun"` refer to the same name.
#[derive(Clone)]
pub struct Name {
    display: Arc<str>,
}

impl Name {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            display: Arc::from(text.as_ref()),
        }
    }

    /// The empty name.
    pub fn none() -> Self {
        Self {
            display: Arc::from(""),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.display
    }

    pub fn is_none(&self) -> bool {
        self.display.is_empty()
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::none()
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.display.eq_ignore_ascii_case(&other.display)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.display.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.display.eq_ignore_ascii_case(other)
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.display.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", &*self.display)
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Name {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
