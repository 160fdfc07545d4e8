//! Field rules applied to the state text.
//!
//! Each scalar field is anchored on the key name it is stored under and
//! the first match wins. Keys that repeat in the blob (`description` is the
//! usual offender) therefore resolve to whichever occurrence comes first.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Scalar fields of [`super::ExtractedRecord`] filled by a single pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarField {
    Description,
    WebsiteUrl,
    FoundingDate,
    Email,
    Phone,
    CompanyOverview,
    OperatingStatus,
    EmployeeCount,
}

/// Pattern table: capture group 1 holds the value.
const SCALAR_RULES: &[(ScalarField, &str)] = &[
    (
        ScalarField::Description,
        r#""target_short_description"\s*:\s*"([^"]+)""#,
    ),
    (
        ScalarField::WebsiteUrl,
        r#""website"\s*:\s*\{\s*"value"\s*:\s*"([^"]+)""#,
    ),
    (
        ScalarField::FoundingDate,
        r#""started_on"\s*:\s*\{\s*"value"\s*:\s*"([^"]+)""#,
    ),
    (ScalarField::Email, r#""contact_email"\s*:\s*"([^"]+)""#),
    (ScalarField::Phone, r#""phone_number"\s*:\s*"([^"]+)""#),
    (
        ScalarField::CompanyOverview,
        r#""description"\s*:\s*"([^"]+)""#,
    ),
    (
        ScalarField::OperatingStatus,
        r#""operating_status"\s*:\s*"([^"]+)""#,
    ),
    (
        ScalarField::EmployeeCount,
        r#""num_employees_enum"\s*:\s*"([^"]+)""#,
    ),
];

/// Key names of the array-shaped blocks read by the composite rules.
pub const LOCATION_BLOCK: &str = "location_identifiers";
pub const FOUNDER_BLOCK: &str = "founder_identifiers";
pub const CATEGORY_BLOCK: &str = "categories";

fn scalar_rules() -> &'static [(ScalarField, Regex)] {
    static RULES: OnceLock<Vec<(ScalarField, Regex)>> = OnceLock::new();
    RULES.get_or_init(|| {
        SCALAR_RULES
            .iter()
            .map(|(field, pattern)| {
                (
                    *field,
                    Regex::new(pattern).expect("scalar field regex is valid"),
                )
            })
            .collect()
    })
}

fn block_regex(key: &str) -> Regex {
    Regex::new(&format!(r#""{}"\s*:\s*\[(.*?)\]"#, regex::escape(key)))
        .expect("block regex is valid")
}

fn value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""value"\s*:\s*"([^"]+)""#).expect("value regex is valid"))
}

fn location_pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""location_type"\s*:\s*"([^"]+)".*?"value"\s*:\s*"([^"]+)""#)
            .expect("location pair regex is valid")
    })
}

fn employee_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:c_)?0*(\d+)[_-]0*(\d+|max)").expect("employee code regex is valid")
    })
}

/// Run every scalar rule over `text`, yielding the fields that matched.
pub fn scalar_matches(text: &str) -> impl Iterator<Item = (ScalarField, String)> + '_ {
    scalar_rules().iter().filter_map(move |(field, re)| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| (*field, m.as_str().to_string()))
    })
}

/// Inner text of the first `"key": [ ... ]` block, if present and non-empty.
///
/// The block ends at the first `]`, so nested arrays truncate it.
pub fn find_block<'t>(text: &'t str, key: &str) -> Option<&'t str> {
    block_regex(key)
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|inner| !inner.is_empty())
}

/// Every `"value": "..."` inside a block, in order.
pub fn block_values(block: &str) -> Vec<String> {
    value_re()
        .captures_iter(block)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Build `"city, region, country"` from a location-identifier block.
///
/// Missing parts stay as empty segments; a repeated location type keeps the
/// last value seen.
pub fn assemble_location(block: &str) -> String {
    let mut parts: HashMap<String, String> = HashMap::new();
    for caps in location_pair_re().captures_iter(block) {
        parts.insert(caps[1].to_string(), caps[2].to_string());
    }
    ["city", "region", "country"]
        .iter()
        .map(|key| parts.get(*key).map(String::as_str).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rewrite an employee-count code like `c_0010_0050` into `10-50`.
///
/// An upper bound of `max` gives `"{lower}+"`. Codes that do not fit the
/// shape are returned unchanged.
pub fn normalize_employee_count(code: &str) -> String {
    let Some(caps) = employee_code_re().captures(code) else {
        return code.to_string();
    };
    match &caps[2] {
        "max" => format!("{}+", &caps[1]),
        upper => format!("{}-{upper}", &caps[1]),
    }
}
