//! Company-profile extraction from rendered page markup.
//!
//! The page carries its application state as a JSON blob inside
//! `<script id="ng-state">`. Field rules search that text by key name rather
//! than walking its structure, which keeps extraction working when the
//! surrounding shape drifts. Every field is optional; a page missing the
//! blob still yields a record, just a thinner one.

pub mod rules;
pub mod source;

use crate::normalize::Clean;
use rules::ScalarField;
use serde::{Deserialize, Serialize};
use source::{PageSource, SourceKind, CATEGORY_CHIP_SELECTOR};

/// A normalized company profile.
///
/// Every key is always serialized; absent scalars are `null` and absent
/// lists are `[]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedRecord {
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub founding_date: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_overview: Option<String>,
    pub headquarters_location: Option<String>,
    pub operating_status: Option<String>,
    pub employee_count: Option<String>,
    pub founder_names: Vec<String>,
    pub industry_categories: Vec<String>,
}

impl ExtractedRecord {
    fn set_scalar(&mut self, field: ScalarField, value: String) {
        let slot = match field {
            ScalarField::Description => &mut self.description,
            ScalarField::WebsiteUrl => &mut self.website_url,
            ScalarField::FoundingDate => &mut self.founding_date,
            ScalarField::Email => &mut self.email,
            ScalarField::Phone => &mut self.phone,
            ScalarField::CompanyOverview => &mut self.company_overview,
            ScalarField::OperatingStatus => &mut self.operating_status,
            ScalarField::EmployeeCount => &mut self.employee_count,
        };
        *slot = Some(value);
    }

    /// Number of populated fields, out of eleven.
    pub fn filled_fields(&self) -> usize {
        let scalars = [
            &self.description,
            &self.website_url,
            &self.founding_date,
            &self.email,
            &self.phone,
            &self.company_overview,
            &self.headquarters_location,
            &self.operating_status,
            &self.employee_count,
        ];
        scalars.iter().filter(|s| s.is_some()).count()
            + usize::from(!self.founder_names.is_empty())
            + usize::from(!self.industry_categories.is_empty())
    }
}

impl Clean for ExtractedRecord {
    fn clean(self) -> Self {
        Self {
            description: self.description.clean(),
            website_url: self.website_url.clean(),
            founding_date: self.founding_date.clean(),
            email: self.email.clean(),
            phone: self.phone.clean(),
            company_overview: self.company_overview.clean(),
            headquarters_location: self.headquarters_location.clean(),
            operating_status: self.operating_status.clean(),
            employee_count: self.employee_count.clean(),
            founder_names: self.founder_names.clean(),
            industry_categories: self.industry_categories.clean(),
        }
    }
}

/// Sources tried, in order, for the industry category list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CategorySource {
    /// `"categories": [...]` block in the state text.
    StateBlock,
    /// Visible chip labels in the rendered DOM.
    DomChips,
}

impl CategorySource {
    const ORDER: [CategorySource; 2] = [CategorySource::StateBlock, CategorySource::DomChips];

    fn read(self, page: &PageSource<'_>) -> Option<Vec<String>> {
        match self {
            CategorySource::StateBlock => {
                rules::find_block(page.state_text(), rules::CATEGORY_BLOCK).map(rules::block_values)
            }
            CategorySource::DomChips => Some(page.dom_texts(CATEGORY_CHIP_SELECTOR)),
        }
    }
}

/// Extract a company profile from page markup.
pub fn extract(markup: &str) -> ExtractedRecord {
    extract_with_source(markup).0
}

/// Like [`extract`], also reporting which text the rules ran against.
pub fn extract_with_source(markup: &str) -> (ExtractedRecord, SourceKind) {
    let page = PageSource::parse(markup);
    let text = page.state_text();
    let mut record = ExtractedRecord::default();

    for (field, value) in rules::scalar_matches(text) {
        record.set_scalar(field, value);
    }

    record.headquarters_location =
        rules::find_block(text, rules::LOCATION_BLOCK).map(rules::assemble_location);

    if let Some(block) = rules::find_block(text, rules::FOUNDER_BLOCK) {
        record.founder_names = rules::block_values(block);
    }

    record.industry_categories = CategorySource::ORDER
        .iter()
        .find_map(|source| source.read(&page))
        .unwrap_or_default();

    record.employee_count = record
        .employee_count
        .as_deref()
        .map(rules::normalize_employee_count);

    (record.clean(), page.kind())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>Acme</title>
<script id="ng-state" type="application/json">{"properties":{
  "identifier":{"value":"Acme"},
  "target_short_description":"Acme builds rockets &amp; more",
  "website":{"value":"https://acme.example"},
  "started_on":{"value":"2013-05-01","precision":"day"},
  "contact_email":"hello@acme.example",
  "phone_number":"+1 415\n555 0100",
  "description":"Acme is a <b>rocket</b> company.",
  "location_identifiers":[{"location_type":"city","value":"San Francisco"},{"location_type":"region","value":"California"},{"location_type":"country","value":"United States"}],
  "operating_status":"active",
  "num_employees_enum":"c_00051_00100",
  "founder_identifiers":[{"value":"Ada Lovelace"},{"value":"Grace  Hopper"}],
  "categories":[{"value":"Aerospace"},{"value":"Manufacturing"}]
}}</script>
</head><body><div class="chip-text">Ignored</div></body></html>"#;

    #[test]
    fn test_extract_full_profile() {
        let (record, kind) = extract_with_source(PROFILE_HTML);
        assert_eq!(kind, SourceKind::EmbeddedBlob);
        assert_eq!(
            record.description.as_deref(),
            Some("Acme builds rockets & more")
        );
        assert_eq!(record.website_url.as_deref(), Some("https://acme.example"));
        assert_eq!(record.founding_date.as_deref(), Some("2013-05-01"));
        assert_eq!(record.email.as_deref(), Some("hello@acme.example"));
        assert_eq!(record.phone.as_deref(), Some("+1 415 555 0100"));
        assert_eq!(
            record.company_overview.as_deref(),
            Some("Acme is a <b>rocket</b> company.")
        );
        assert_eq!(
            record.headquarters_location.as_deref(),
            Some("San Francisco, California, United States")
        );
        assert_eq!(record.operating_status.as_deref(), Some("active"));
        assert_eq!(record.employee_count.as_deref(), Some("51-100"));
        assert_eq!(record.founder_names, vec!["Ada Lovelace", "Grace Hopper"]);
        assert_eq!(record.industry_categories, vec!["Aerospace", "Manufacturing"]);
        assert_eq!(record.filled_fields(), 11);
    }

    #[test]
    fn test_missing_blob_falls_back_to_dom_categories() {
        let html = r#"<html><body>
            <div class="chip-text"> Fintech </div>
            <div class="chip-text">Payments</div>
        </body></html>"#;
        let (record, kind) = extract_with_source(html);
        assert_eq!(kind, SourceKind::RawMarkup);
        assert_eq!(record.industry_categories, vec!["Fintech", "Payments"]);
        assert_eq!(record.description, None);
        assert!(record.founder_names.is_empty());
    }

    #[test]
    fn test_raw_markup_patterns_still_apply() {
        let html = r#"<html><body><script>window.x={"operating_status":"closed"}</script></body></html>"#;
        let record = extract(html);
        assert_eq!(record.operating_status.as_deref(), Some("closed"));
    }

    #[test]
    fn test_empty_markup_gives_empty_record() {
        assert_eq!(extract(""), ExtractedRecord::default());
    }

    #[test]
    fn test_unmatched_employee_code_passes_through() {
        let html = r#"<script id="ng-state" type="application/json">{"num_employees_enum":"unknown"}</script>"#;
        assert_eq!(extract(html).employee_count.as_deref(), Some("unknown"));
    }

    #[test]
    fn test_record_always_serializes_every_key() {
        let json = serde_json::to_value(ExtractedRecord::default()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 11);
        assert!(obj["description"].is_null());
        assert_eq!(obj["founder_names"], serde_json::json!([]));
    }
}
