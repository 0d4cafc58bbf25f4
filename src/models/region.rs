//! Region catalogue and language-based defaults.

use serde::Serialize;

/// A selectable archive region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub code: &'static str,
    pub label: &'static str,
}

/// Regions offered by the gallery, in menu order.
pub const REGIONS: &[Region] = &[
    Region { code: "bing_ROW", label: "Rest of World" },
    Region { code: "bing_en-US", label: "United States" },
    Region { code: "bing_en-GB", label: "United Kingdom" },
    Region { code: "bing_en-CA", label: "Canada (EN)" },
    Region { code: "bing_en-IN", label: "India" },
    Region { code: "bing_de-DE", label: "Germany" },
    Region { code: "bing_fr-FR", label: "France" },
    Region { code: "bing_fr-CA", label: "Canada (FR)" },
    Region { code: "bing_es-ES", label: "Spain" },
    Region { code: "bing_it-IT", label: "Italy" },
    Region { code: "bing_pt-BR", label: "Brazil" },
    Region { code: "bing_ja-JP", label: "Japan" },
    Region { code: "bing_zh-CN", label: "China" },
];

/// Returns true if `code` is in the catalogue.
pub fn is_known_region(code: &str) -> bool {
    REGIONS.iter().any(|r| r.code == code)
}

/// Picks a region for a browser language tag such as `en-GB` or `zh-TW`.
pub fn region_for_language(lang: &str, default_region: &str) -> String {
    let exact = format!("bing_{}", lang);
    if let Some(region) = REGIONS.iter().find(|r| r.code == exact) {
        return region.code.to_string();
    }

    let lang = lang.to_ascii_lowercase();
    let mapped = [
        ("zh", "bing_zh-CN"),
        ("en", "bing_en-US"),
        ("ja", "bing_ja-JP"),
        ("de", "bing_de-DE"),
        ("fr", "bing_fr-FR"),
        ("es", "bing_es-ES"),
    ]
    .iter()
    .find(|(prefix, _)| lang.contains(prefix))
    .map(|(_, code)| *code);

    mapped.unwrap_or(default_region).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_language_match() {
        assert_eq!(region_for_language("en-GB", "bing_ROW"), "bing_en-GB");
        assert_eq!(region_for_language("pt-BR", "bing_ROW"), "bing_pt-BR");
    }

    #[test]
    fn test_language_family_match() {
        assert_eq!(region_for_language("zh-TW", "bing_ROW"), "bing_zh-CN");
        assert_eq!(region_for_language("en-AU", "bing_ROW"), "bing_en-US");
        assert_eq!(region_for_language("nl-NL", "bing_ROW"), "bing_ROW");
    }
}
