//! Portable locale identifiers.
//!
//! A [`LocaleIdent`] can be built from a BCP 47 subset tag
//! (`language ["-" script] ["-" region]`), from a POSIX locale name
//! (`language[_REGION][.charset][@modifier]`), or piece by piece:
//!
//! ```
//! use gdk_debug_log::locale::{LocaleIdent, NameStyle};
//!
//! let loc = LocaleIdent::new().with_language("fr").with_region("BE").with_modifier("euro");
//! assert_eq!(loc.name(NameStyle::Unix), "fr_BE@euro");
//! assert_eq!(loc.name(NameStyle::Windows), "fr-BE");
//! assert_eq!(LocaleIdent::from_tag("fr-BE"), LocaleIdent::new().with_language("fr").with_region("BE"));
//! ```
//!
//! Only identification lives here. Nothing in this module asks the OS which
//! locale is in use or changes it.

use std::fmt;

use serde::Serialize;

/// How platform locale names are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NameStyle {
    /// `<language>-<script>-<REGION>`
    Windows,
    /// `<language>_<REGION>.<charset>@<modifier>`; script is not used.
    Unix,
    /// `<language>-<script>_<REGION>`
    MacOs,
}

impl NameStyle {
    pub fn native() -> Self {
        if cfg!(windows) {
            NameStyle::Windows
        } else if cfg!(target_os = "macos") {
            NameStyle::MacOs
        } else {
            NameStyle::Unix
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct LocaleIdent {
    language: String,
    region: String,
    script: String,
    charset: String,
    modifier: String,
}

fn is_language(s: &str) -> bool {
    (2..=3).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_alphabetic())
}

fn is_script(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|b| b.is_ascii_alphabetic())
}

fn is_region(s: &str) -> bool {
    (s.len() == 2 && s.bytes().all(|b| b.is_ascii_alphabetic()))
        || (s.len() == 3 && s.bytes().all(|b| b.is_ascii_digit()))
}

fn title_case(s: &str) -> String {
    let mut out = s.to_ascii_lowercase();
    if let Some(first) = out.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    out
}

impl LocaleIdent {
    /// An empty identifier. Set at least the language to make it usable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `language ["-" script] ["-" region]`.
    ///
    /// Anything else, including the empty string, underscores, and BCP 47
    /// extensions or variants, gives an empty identifier.
    pub fn from_tag(tag: &str) -> Self {
        let mut parts = tag.split('-');
        let language = match parts.next() {
            Some(l) if is_language(l) => l.to_ascii_lowercase(),
            _ => return Self::default(),
        };
        let mut ident = Self::new().with_language(language);

        let mut next = parts.next();
        if let Some(s) = next.filter(|s| is_script(s)) {
            ident.script = title_case(s);
            next = parts.next();
        }
        if let Some(r) = next {
            if !is_region(r) {
                return Self::default();
            }
            ident.region = r.to_ascii_uppercase();
        }
        if parts.next().is_some() {
            return Self::default();
        }
        ident
    }

    /// Parse a POSIX locale name such as `fr_BE.UTF-8@euro`.
    ///
    /// `C`, `POSIX` and malformed names give an empty identifier.
    pub fn from_posix(name: &str) -> Self {
        let (rest, modifier) = match name.split_once('@') {
            Some((r, m)) if !m.is_empty() => (r, m),
            Some(_) => return Self::default(),
            None => (name, ""),
        };
        let (rest, charset) = match rest.split_once('.') {
            Some((r, c)) if !c.is_empty() => (r, c),
            Some(_) => return Self::default(),
            None => (rest, ""),
        };
        let (language, region) = match rest.split_once('_') {
            Some((l, r)) if is_region(r) => (l, r),
            Some(_) => return Self::default(),
            None => (rest, ""),
        };
        if !is_language(language) {
            return Self::default();
        }
        Self {
            language: language.to_ascii_lowercase(),
            region: region.to_ascii_uppercase(),
            script: String::new(),
            charset: charset.to_string(),
            modifier: modifier.to_string(),
        }
    }

    /// ISO 639-1 two-letter code, or ISO 639-2 three-letter code.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Uppercase ISO 3166-1 code.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Title-case ISO 15924 code. Not part of Unix names.
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    /// Unix only, e.g. `UTF-8`.
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Unix only, ISO/IEC 15897 modifier, e.g. `euro`.
    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifier = modifier.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn modifier(&self) -> &str {
        &self.modifier
    }

    pub fn is_empty(&self) -> bool {
        self.language.is_empty()
    }

    /// Platform name in the given style. Missing parts are left out along
    /// with their separators.
    pub fn name(&self, style: NameStyle) -> String {
        let mut out = self.language.clone();
        let push = |out: &mut String, sep: char, part: &str| {
            if !part.is_empty() {
                out.push(sep);
                out.push_str(part);
            }
        };
        match style {
            NameStyle::Windows => {
                push(&mut out, '-', &self.script);
                push(&mut out, '-', &self.region);
            }
            NameStyle::Unix => {
                push(&mut out, '_', &self.region);
                push(&mut out, '.', &self.charset);
                push(&mut out, '@', &self.modifier);
            }
            NameStyle::MacOs => {
                push(&mut out, '-', &self.script);
                push(&mut out, '_', &self.region);
            }
        }
        out
    }

    /// BCP 47 form: `language[-Script][-REGION]`.
    pub fn tag(&self) -> String {
        self.name(NameStyle::Windows)
    }
}

impl fmt::Display for LocaleIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name(NameStyle::native()))
    }
}
