// Copyright 2026 The HinatureDB Client Authors
// SPDX-License-Identifier: BSD-3-Clause

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::ClientError;
use super::geometry::{GeometryCodec, Location};

/// Server message that marks a single-record lookup miss. Mapped to an empty
/// result instead of an error.
pub(crate) const RECORD_NOT_FOUND: &str = "Record not found";

/// Page size used by searches that are not constrained to external IDs.
const DEFAULT_PAGE_SIZE: u32 = 50;

/// A biodiversity record as stored by the backend. The schema is owned by
/// the server; the client treats records as open JSON documents.
pub type Record = serde_json::Map<String, Value>;

/// A partial record carrying the fields to change in an update.
pub type RecordUpdate = serde_json::Map<String, Value>;

/// Wire shape shared by every endpoint response.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct RawEnvelope<T> {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    has_more: Option<bool>,
    #[serde(default)]
    cursor: Option<String>,
}

/// Decoded response envelope: either the endpoint's data or the server's
/// failure message. Decoding happens once at the response boundary.
#[derive(Debug)]
pub(crate) enum Envelope<T> {
    Success(T),
    Failure { message: String },
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Envelope<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawEnvelope::<T>::deserialize(deserializer)?;
        match (raw.success, raw.data) {
            (true, Some(data)) => Ok(Envelope::Success(data)),
            (true, None) => Err(serde::de::Error::missing_field("data")),
            (false, _) => Ok(Envelope::Failure {
                message: raw.message.unwrap_or_default(),
            }),
        }
    }
}

impl<T> Envelope<T> {
    /// Unwraps the envelope, turning a failure into [`ClientError::Rejected`].
    pub fn into_data(self) -> Result<T, ClientError> {
        match self {
            Envelope::Success(data) => Ok(data),
            Envelope::Failure { message } => Err(ClientError::Rejected { message }),
        }
    }

    /// Absence-aware unwrap for single-record lookups: the documented
    /// "Record not found" message is a valid empty result, every other
    /// failure is an error.
    pub fn into_optional(self) -> Result<Option<T>, ClientError> {
        match self {
            Envelope::Success(data) => Ok(Some(data)),
            Envelope::Failure { message } if message == RECORD_NOT_FOUND => Ok(None),
            Envelope::Failure { message } => Err(ClientError::Rejected { message }),
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone)]
pub struct SearchPage {
    /// Records on this page, in server order.
    pub records: Vec<Record>,
    /// Whether the server holds further pages.
    pub has_more: bool,
    /// Opaque continuation token for the next page.
    pub cursor: Option<String>,
}

/// Paged variant of the response envelope; carries the pagination fields
/// alongside the data.
#[derive(Debug)]
pub(crate) enum PageEnvelope {
    Success(SearchPage),
    Failure { message: String },
}

impl<'de> Deserialize<'de> for PageEnvelope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawEnvelope::<Vec<Record>>::deserialize(deserializer)?;
        if raw.success {
            let records = raw
                .data
                .ok_or_else(|| serde::de::Error::missing_field("data"))?;
            Ok(PageEnvelope::Success(SearchPage {
                records,
                has_more: raw.has_more.unwrap_or(false),
                cursor: raw.cursor,
            }))
        } else {
            Ok(PageEnvelope::Failure {
                message: raw.message.unwrap_or_default(),
            })
        }
    }
}

impl PageEnvelope {
    pub fn into_page(self) -> Result<SearchPage, ClientError> {
        match self {
            PageEnvelope::Success(page) => Ok(page),
            PageEnvelope::Failure { message } => Err(ClientError::Rejected { message }),
        }
    }
}

/// A dataset registered with the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: Uuid,
    pub name: String,
    /// Server-side fields the client does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Filters for the record search endpoint.
///
/// Unset filters are omitted from the request body entirely, never sent as
/// null. The page size defaults to 50, or to the number of requested
/// external IDs so an ID-constrained search returns in a single page.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    pub taxon_id: Option<String>,
    pub dataset_id: Option<Uuid>,
    pub external_ids: Option<Vec<String>>,
    pub kingdom: Option<String>,
    pub location: Option<Location>,
    /// Search radius around `location`, in meters.
    pub distance: Option<u32>,
    /// Lower bound on the record update timestamp (epoch seconds).
    pub update_min: Option<i64>,
    /// Upper bound on the record update timestamp (epoch seconds).
    pub update_max: Option<i64>,
    /// Explicit page size, overriding the defaulting rules.
    pub page_size: Option<u32>,
    /// Ask the server to include record geometries in the results.
    pub include_geometry: bool,
    /// Ask the server to include patch history in the results.
    pub include_patch: bool,
}

/// Wire form of the search request body.
#[derive(Serialize)]
struct SearchBody<'a> {
    geom: bool,
    patch: bool,
    page_size: u32,
    #[serde(rename = "taxonID", skip_serializing_if = "Option::is_none")]
    taxon_id: Option<&'a str>,
    #[serde(rename = "datasetID", skip_serializing_if = "Option::is_none")]
    dataset_id: Option<String>,
    #[serde(rename = "externalIDs", skip_serializing_if = "Option::is_none")]
    external_ids: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kingdom: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    update_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    update_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
}

impl RecordQuery {
    /// Builds the JSON body for one search call.
    pub(crate) fn to_body(
        &self,
        cursor: Option<&str>,
        codec: Option<&dyn GeometryCodec>,
    ) -> Result<Value, ClientError> {
        let external_ids = self.external_ids.as_deref().filter(|ids| !ids.is_empty());
        let page_size = self.page_size.unwrap_or_else(|| match external_ids {
            Some(ids) => ids.len() as u32,
            None => DEFAULT_PAGE_SIZE,
        });
        let location = self
            .location
            .as_ref()
            .map(|loc| loc.to_wire(codec))
            .transpose()?;

        let body = SearchBody {
            geom: self.include_geometry,
            patch: self.include_patch,
            page_size,
            taxon_id: self.taxon_id.as_deref(),
            // JSON has no UUID type; send the canonical string form.
            dataset_id: self.dataset_id.map(|id| id.to_string()),
            external_ids,
            kingdom: self.kingdom.as_deref(),
            location,
            distance: self.distance,
            update_min: self.update_min,
            update_max: self.update_max,
            cursor,
        };
        Ok(serde_json::to_value(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::geometry::tests::{JsonBytesCodec, point};
    use super::*;

    #[test]
    fn envelope_success_decodes_data() {
        let envelope: Envelope<Vec<u32>> =
            serde_json::from_value(json!({"success": true, "data": [1, 2, 3]})).unwrap();
        assert_eq!(envelope.into_data().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn envelope_failure_carries_the_server_message() {
        let envelope: Envelope<Vec<u32>> =
            serde_json::from_value(json!({"success": false, "message": "bad filter"})).unwrap();
        match envelope.into_data() {
            Err(ClientError::Rejected { message }) => assert_eq!(message, "bad filter"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn record_not_found_is_absence_not_an_error() {
        let envelope: Envelope<Record> =
            serde_json::from_value(json!({"success": false, "message": "Record not found"}))
                .unwrap();
        assert!(envelope.into_optional().unwrap().is_none());
    }

    #[test]
    fn other_failures_on_lookup_are_still_errors() {
        let envelope: Envelope<Record> =
            serde_json::from_value(json!({"success": false, "message": "Access denied"})).unwrap();
        assert!(matches!(
            envelope.into_optional(),
            Err(ClientError::Rejected { .. })
        ));
    }

    #[test]
    fn page_envelope_decodes_pagination_fields() {
        let envelope: PageEnvelope = serde_json::from_value(json!({
            "success": true,
            "data": [{"external_id": "a"}],
            "has_more": true,
            "cursor": "c1",
        }))
        .unwrap();
        let page = envelope.into_page().unwrap();
        assert_eq!(page.records.len(), 1);
        assert!(page.has_more);
        assert_eq!(page.cursor.as_deref(), Some("c1"));
    }

    #[test]
    fn page_size_matches_the_external_id_count() {
        let query = RecordQuery {
            external_ids: Some(vec!["a".into(), "b".into(), "c".into()]),
            ..RecordQuery::default()
        };
        let body = query.to_body(None, None).unwrap();
        assert_eq!(body["page_size"], 3);
        assert_eq!(body["externalIDs"], json!(["a", "b", "c"]));
    }

    #[test]
    fn page_size_defaults_to_fifty_without_external_ids() {
        let body = RecordQuery::default().to_body(None, None).unwrap();
        assert_eq!(body["page_size"], 50);
        assert!(body.get("externalIDs").is_none());
    }

    #[test]
    fn explicit_page_size_wins() {
        let query = RecordQuery {
            external_ids: Some(vec!["a".into(), "b".into()]),
            page_size: Some(500),
            ..RecordQuery::default()
        };
        let body = query.to_body(None, None).unwrap();
        assert_eq!(body["page_size"], 500);
    }

    #[test]
    fn empty_external_id_list_is_treated_as_unset() {
        let query = RecordQuery {
            external_ids: Some(Vec::new()),
            ..RecordQuery::default()
        };
        let body = query.to_body(None, None).unwrap();
        assert_eq!(body["page_size"], 50);
        assert!(body.get("externalIDs").is_none());
    }

    #[test]
    fn unset_filters_are_omitted_not_null() {
        let body = RecordQuery::default().to_body(None, None).unwrap();
        let object = body.as_object().unwrap();
        for key in [
            "taxonID",
            "datasetID",
            "kingdom",
            "location",
            "distance",
            "update_min",
            "update_max",
            "cursor",
        ] {
            assert!(!object.contains_key(key), "{key} should be omitted");
        }
        // The flags are always present.
        assert_eq!(body["geom"], false);
        assert_eq!(body["patch"], false);
    }

    #[test]
    fn dataset_id_is_serialized_in_canonical_string_form() {
        let id = Uuid::new_v4();
        let query = RecordQuery {
            dataset_id: Some(id),
            ..RecordQuery::default()
        };
        let body = query.to_body(None, None).unwrap();
        assert_eq!(body["datasetID"], json!(id.to_string()));
    }

    #[test]
    fn cursor_and_filters_round_trip_into_the_body() {
        let query = RecordQuery {
            taxon_id: Some("urn:lsid:1234".into()),
            kingdom: Some("Animalia".into()),
            distance: Some(250),
            update_min: Some(1_700_000_000),
            include_geometry: true,
            ..RecordQuery::default()
        };
        let body = query.to_body(Some("c2"), None).unwrap();
        assert_eq!(body["taxonID"], "urn:lsid:1234");
        assert_eq!(body["kingdom"], "Animalia");
        assert_eq!(body["distance"], 250);
        assert_eq!(body["update_min"], 1_700_000_000i64);
        assert_eq!(body["cursor"], "c2");
        assert_eq!(body["geom"], true);
    }

    #[test]
    fn structured_location_is_encoded_through_the_codec() {
        let query = RecordQuery {
            location: Some(Location::Geometry(point())),
            ..RecordQuery::default()
        };
        let body = query.to_body(None, Some(&JsonBytesCodec)).unwrap();
        let wire = body["location"].as_str().unwrap();
        assert!(!wire.is_empty());

        let query = RecordQuery {
            location: Some(Location::Encoded("opaque".into())),
            ..RecordQuery::default()
        };
        let body = query.to_body(None, None).unwrap();
        assert_eq!(body["location"], "opaque");
    }
}
