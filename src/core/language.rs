use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, PartialOrd, Ord)]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Java,
    Go,
    Ruby,
    Php,
    CSharp,
    C,
    Cpp,
    Rust,
    Swift,
    Kotlin,
    Scala,
    Vue,
    Html,
    Css,
    Shell,
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        static EXTENSION_MAP: &[(&[&str], Language)] = &[
            (&["js", "jsx", "mjs", "cjs"], Language::JavaScript),
            (&["ts", "tsx", "mts", "cts"], Language::TypeScript),
            (&["py", "pyw"], Language::Python),
            (&["java"], Language::Java),
            (&["go"], Language::Go),
            (&["rb"], Language::Ruby),
            (&["php"], Language::Php),
            (&["cs"], Language::CSharp),
            (&["c", "h"], Language::C),
            (&["cpp", "cc", "cxx", "hpp", "hh"], Language::Cpp),
            (&["rs"], Language::Rust),
            (&["swift"], Language::Swift),
            (&["kt", "kts"], Language::Kotlin),
            (&["scala"], Language::Scala),
            (&["vue"], Language::Vue),
            (&["html", "htm"], Language::Html),
            (&["css", "scss", "sass", "less"], Language::Css),
            (&["sh", "bash"], Language::Shell),
        ];

        let ext = ext.to_ascii_lowercase();
        EXTENSION_MAP
            .iter()
            .find(|(exts, _)| exts.contains(&ext.as_str()))
            .map(|(_, lang)| *lang)
            .unwrap_or(Language::Unknown)
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Programming languages, as opposed to markup/styling or unknown files.
    pub fn is_code(&self) -> bool {
        !matches!(
            self,
            Language::Html | Language::Css | Language::Unknown
        )
    }

    /// Languages whose syntax follows the C brace/keyword family.
    pub fn is_c_family(&self) -> bool {
        matches!(
            self,
            Language::JavaScript
                | Language::TypeScript
                | Language::Java
                | Language::CSharp
                | Language::C
                | Language::Cpp
                | Language::Php
                | Language::Swift
                | Language::Kotlin
                | Language::Scala
                | Language::Vue
        )
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(Language, &str)] = &[
            (Language::JavaScript, "JavaScript"),
            (Language::TypeScript, "TypeScript"),
            (Language::Python, "Python"),
            (Language::Java, "Java"),
            (Language::Go, "Go"),
            (Language::Ruby, "Ruby"),
            (Language::Php, "PHP"),
            (Language::CSharp, "C#"),
            (Language::C, "C"),
            (Language::Cpp, "C++"),
            (Language::Rust, "Rust"),
            (Language::Swift, "Swift"),
            (Language::Kotlin, "Kotlin"),
            (Language::Scala, "Scala"),
            (Language::Vue, "Vue"),
            (Language::Html, "HTML"),
            (Language::Css, "CSS"),
            (Language::Shell, "Shell"),
            (Language::Unknown, "Unknown"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(l, _)| l == self)
            .map(|(_, s)| *s)
            .unwrap_or("Unknown");

        write!(f, "{display_str}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension_is_case_insensitive() {
        assert_eq!(Language::from_extension("TSX"), Language::TypeScript);
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("xyz"), Language::Unknown);
    }

    #[test]
    fn test_markup_is_not_code() {
        assert!(!Language::Html.is_code());
        assert!(!Language::Css.is_code());
        assert!(Language::Go.is_code());
    }

    #[test]
    fn test_from_path_without_extension() {
        assert_eq!(Language::from_path(Path::new("Makefile")), Language::Unknown);
        assert_eq!(Language::from_path(Path::new("src/app.JS")), Language::JavaScript);
    }
}
