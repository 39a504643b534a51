//! URL construction for resource and query endpoints

use url::{form_urlencoded, Url};

use crate::entity::Entity;
use crate::error::{ApiError, Result};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 20;
/// Largest page the service returns; used when draining every page
pub const MAX_PER_PAGE: u32 = 1000;

/// Filter text plus 1-based pagination
///
/// `per_page` has no upper bound here; the service caps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    filter: String,
    page: u32,
    per_page: u32,
}

impl QuerySpec {
    pub fn new(filter: impl Into<String>, page: u32, per_page: u32) -> Result<Self> {
        if page == 0 {
            return Err(ApiError::InvalidParameter("page must be at least 1".to_string()));
        }
        if per_page == 0 {
            return Err(ApiError::InvalidParameter("per_page must be at least 1".to_string()));
        }
        Ok(Self {
            filter: filter.into(),
            page,
            per_page,
        })
    }

    /// Query for `E` using its default filter when none is given
    pub fn for_entity<E: Entity>(filter: Option<&str>, page: u32, per_page: u32) -> Result<Self> {
        let filter = filter.map(str::to_string).unwrap_or_else(E::default_query);
        Self::new(filter, page, per_page)
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// 1-based offset of the first record on this page
    pub fn start_position(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.per_page) + 1
    }

    pub fn max_results(&self) -> u32 {
        self.per_page
    }

    /// Filter with the pagination clause appended
    pub fn query_string(&self) -> String {
        format!(
            "{} STARTPOSITION {} MAXRESULTS {}",
            self.filter,
            self.start_position(),
            self.max_results()
        )
    }
}

/// Builds absolute URLs scoped to one company
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    base_url: &'a str,
    company_id: Option<&'a str>,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(base_url: &'a str, company_id: Option<&'a str>) -> Self {
        Self { base_url, company_id }
    }

    /// `{base}/{company}`
    pub fn company_url(&self) -> Result<String> {
        match self.company_id.map(str::trim) {
            Some(id) if !id.is_empty() => {
                Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), id))
            }
            _ => Err(ApiError::Configuration(
                "company id must be set before building request URLs".to_string(),
            )),
        }
    }

    /// `{base}/{company}/{resource}`
    pub fn resource_url(&self, resource: &str) -> Result<String> {
        Ok(format!("{}/{}", self.company_url()?, resource))
    }

    /// `{base}/{company}/{resource}/{id}`, with `id` percent-encoded as one path segment
    pub fn entity_url(&self, resource: &str, id: &str) -> Result<String> {
        let resource_url = self.resource_url(resource)?;
        let mut url = Url::parse(&resource_url)
            .map_err(|e| ApiError::Configuration(format!("invalid base url {}: {}", resource_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Configuration(format!("base url {} cannot take a path", resource_url)))?
            .push(id);
        Ok(url.into())
    }

    /// `{base}/{company}/query?query=<encoded filter and pagination>`
    pub fn query_url(&self, spec: &QuerySpec) -> Result<String> {
        let encoded: String = form_urlencoded::byte_serialize(spec.query_string().as_bytes()).collect();
        Ok(format!("{}/query?query={}", self.company_url()?, encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use xmltree::Element;

    struct Customer;

    impl Entity for Customer {
        const XML_NODE: &'static str = "Customer";
        const RESOURCE: &'static str = "customer";

        fn from_xml(_node: &Element) -> std::result::Result<Self, crate::entity::EntityError> {
            Ok(Customer)
        }
    }

    const BASE: &str = "https://sandbox-quickbooks.api.intuit.com/v3/company";

    fn decoded_query(url: &str) -> String {
        let parsed = url::Url::parse(url).unwrap();
        parsed
            .query_pairs()
            .find(|(k, _)| k == "query")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[test]
    fn test_resource_url() {
        let builder = RequestBuilder::new(BASE, Some("9130"));
        assert_eq!(
            builder.resource_url("customer").unwrap(),
            "https://sandbox-quickbooks.api.intuit.com/v3/company/9130/customer"
        );
    }

    #[test]
    fn test_entity_url_keeps_id_in_one_segment() {
        let builder = RequestBuilder::new(BASE, Some("9130"));
        assert_eq!(
            builder.entity_url("customer", "42").unwrap(),
            "https://sandbox-quickbooks.api.intuit.com/v3/company/9130/customer/42"
        );

        let url = builder.entity_url("customer", "1/2?x=y#frag").unwrap();
        assert_eq!(
            url,
            "https://sandbox-quickbooks.api.intuit.com/v3/company/9130/customer/1%2F2%3Fx=y%23frag"
        );
        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.query(), None);
        assert_eq!(parsed.fragment(), None);
    }

    #[test]
    fn test_missing_or_blank_company_is_configuration_error() {
        for company in [None, Some(""), Some("  ")] {
            let builder = RequestBuilder::new(BASE, company);
            assert!(matches!(builder.resource_url("customer"), Err(ApiError::Configuration(_))));
            assert!(matches!(builder.entity_url("customer", "1"), Err(ApiError::Configuration(_))));
            let spec = QuerySpec::new("SELECT * FROM Customer", 1, 20).unwrap();
            assert!(matches!(builder.query_url(&spec), Err(ApiError::Configuration(_))));
        }
    }

    #[test]
    fn test_query_url_round_trip() {
        let builder = RequestBuilder::new(BASE, Some("9130"));
        let spec = QuerySpec::new("SELECT * FROM Customer", 1, 20).unwrap();
        let url = builder.query_url(&spec).unwrap();

        assert!(url.starts_with("https://sandbox-quickbooks.api.intuit.com/v3/company/9130/query?query="));
        assert_eq!(
            decoded_query(&url),
            "SELECT * FROM Customer STARTPOSITION 1 MAXRESULTS 20"
        );
    }

    #[test]
    fn test_query_url_encodes_special_characters() {
        let builder = RequestBuilder::new(BASE, Some("1"));
        let spec = QuerySpec::new("SELECT * FROM Customer WHERE DisplayName = 'A&B'", 2, 10).unwrap();
        let url = builder.query_url(&spec).unwrap();

        assert!(!url.contains("'A&B'"));
        assert_eq!(
            decoded_query(&url),
            "SELECT * FROM Customer WHERE DisplayName = 'A&B' STARTPOSITION 11 MAXRESULTS 10"
        );
    }

    #[test]
    fn test_default_filter_from_entity() {
        let spec = QuerySpec::for_entity::<Customer>(None, 3, 5).unwrap();
        assert_eq!(spec.query_string(), "SELECT * FROM Customer STARTPOSITION 11 MAXRESULTS 5");

        let spec = QuerySpec::for_entity::<Customer>(Some("SELECT Id FROM Customer"), 1, 1).unwrap();
        assert_eq!(spec.filter(), "SELECT Id FROM Customer");
    }

    #[test]
    fn test_zero_page_or_size_rejected() {
        assert!(matches!(QuerySpec::new("q", 0, 20), Err(ApiError::InvalidParameter(_))));
        assert!(matches!(QuerySpec::new("q", 1, 0), Err(ApiError::InvalidParameter(_))));
    }

    #[test]
    fn test_page_size_is_not_capped() {
        let spec = QuerySpec::new("q", 1, 5000).unwrap();
        assert_eq!(spec.max_results(), 5000);
    }

    #[test]
    fn test_start_position_example() {
        let spec = QuerySpec::new("q", 2, 10).unwrap();
        assert_eq!(spec.start_position(), 11);
    }

    proptest! {
        #[test]
        fn prop_start_position_formula(page in 1u32..=u32::MAX, per_page in 1u32..=u32::MAX) {
            let spec = QuerySpec::new("q", page, per_page).unwrap();
            prop_assert_eq!(
                spec.start_position(),
                (u64::from(page) - 1) * u64::from(per_page) + 1
            );
            prop_assert_eq!(spec.max_results(), per_page);
        }

        #[test]
        fn prop_pages_are_contiguous(page in 1u32..100_000, per_page in 1u32..10_000) {
            let this = QuerySpec::new("q", page, per_page).unwrap();
            let next = QuerySpec::new("q", page + 1, per_page).unwrap();
            prop_assert_eq!(next.start_position() - this.start_position(), u64::from(per_page));
        }
    }
}
