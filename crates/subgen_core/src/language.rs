/// A selectable subtitle language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub name: &'static str,
    pub code: &'static str,
}

/// Languages offered for selection. The service accepts these codes.
pub const LANGUAGES: [Language; 12] = [
    Language { name: "English", code: "en" },
    Language { name: "Spanish", code: "es" },
    Language { name: "French", code: "fr" },
    Language { name: "German", code: "de" },
    Language { name: "Italian", code: "it" },
    Language { name: "Portuguese", code: "pt" },
    Language { name: "Russian", code: "ru" },
    Language { name: "Japanese", code: "ja" },
    Language { name: "Chinese", code: "zh" },
    Language { name: "Korean", code: "ko" },
    Language { name: "Arabic", code: "ar" },
    Language { name: "Hindi", code: "hi" },
];

/// Looks up a catalog entry by code or by name, ignoring case and surrounding whitespace.
pub fn find_language(code_or_name: &str) -> Option<&'static Language> {
    let needle = code_or_name.trim();
    if needle.is_empty() {
        return None;
    }
    LANGUAGES.iter().find(|lang| {
        lang.code.eq_ignore_ascii_case(needle) || lang.name.eq_ignore_ascii_case(needle)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_accepts_codes_and_names() {
        assert_eq!(find_language("fr").map(|l| l.code), Some("fr"));
        assert_eq!(find_language(" Japanese ").map(|l| l.code), Some("ja"));
        assert_eq!(find_language("EN").map(|l| l.name), Some("English"));
        assert!(find_language("xx").is_none());
        assert!(find_language("   ").is_none());
    }

    #[test]
    fn catalog_codes_are_unique() {
        let mut codes: Vec<_> = LANGUAGES.iter().map(|l| l.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), LANGUAGES.len());
    }
}
