/// Canonical comparison form of a free-text name. Only used for matching
/// records across sources, never stored.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .replace('&', "and")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-cases the first letter of every alphabetic run, lower-cases the rest.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_alpha = false;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

pub fn country_slug(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

pub fn position_slug(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

/// "First Last" from optional parts; `None` when neither part carries text.
pub fn join_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let joined = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_handles_ampersand_and_spacing() {
        assert_eq!(
            normalize_name("  Brighton &  Hove Albion "),
            "brighton and hove albion"
        );
        assert_eq!(
            normalize_name("Brighton and Hove Albion"),
            normalize_name("BRIGHTON & HOVE ALBION")
        );
    }

    #[test]
    fn title_case_follows_alpha_runs() {
        assert_eq!(title_case("centre-back"), "Centre-Back");
        assert_eq!(title_case("GOALKEEPER"), "Goalkeeper");
        assert_eq!(title_case("left wing 2nd"), "Left Wing 2Nd");
    }

    #[test]
    fn slugs() {
        assert_eq!(position_slug("Centre-Back"), "centre_back");
        assert_eq!(country_slug("Ivory Coast"), "ivory_coast");
    }

    #[test]
    fn join_name_skips_missing_parts() {
        assert_eq!(join_name(Some("Bukayo"), Some("Saka")).as_deref(), Some("Bukayo Saka"));
        assert_eq!(join_name(None, Some("Rodri")).as_deref(), Some("Rodri"));
        assert_eq!(join_name(Some(" "), None), None);
    }
}
