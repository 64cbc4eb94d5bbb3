//! Location filters and the geometry codec seam.
//!
//! Search filters may constrain results to a location. The backend accepts a
//! pre-encoded wire string, or a structured GeoJSON geometry that must be
//! packed into the backend's compact binary geometry format. That packing is
//! domain-specific and lives behind the [`GeometryCodec`] trait; this crate
//! only hands the codec a geometry, base64-encodes whatever bytes come back
//! and places the result in the JSON request body.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use geojson::Geometry;

use super::error::ClientError;

/// Compact binary encoder for GeoJSON geometries.
///
/// Implementations wrap an external codec (geobuf or compatible). The codec
/// output is treated as an opaque byte payload.
pub trait GeometryCodec: Send + Sync {
    /// Encodes a GeoJSON geometry into the backend's binary geometry format.
    fn encode(
        &self,
        geometry: &Geometry,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>;
}

/// A location filter for record searches.
#[derive(Debug, Clone)]
pub enum Location {
    /// A value already in wire form; passed through verbatim.
    Encoded(String),
    /// A structured geometry, encoded through the configured [`GeometryCodec`].
    Geometry(Geometry),
}

impl Location {
    /// Converts the location into the string sent in the search body.
    pub(crate) fn to_wire(&self, codec: Option<&dyn GeometryCodec>) -> Result<String, ClientError> {
        match self {
            Location::Encoded(value) => Ok(value.clone()),
            Location::Geometry(geometry) => {
                let codec = codec.ok_or_else(|| {
                    ClientError::Geometry(
                        "no geometry codec configured for structured locations".to_string(),
                    )
                })?;
                let bytes = codec
                    .encode(geometry)
                    .map_err(|e| ClientError::Geometry(e.to_string()))?;
                Ok(BASE64.encode(bytes))
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use geojson::{Geometry, Value};

    use super::*;

    /// Codec stub that "encodes" a geometry as its GeoJSON text.
    pub(crate) struct JsonBytesCodec;

    impl GeometryCodec for JsonBytesCodec {
        fn encode(
            &self,
            geometry: &Geometry,
        ) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(serde_json::to_vec(geometry)?)
        }
    }

    pub(crate) fn point() -> Geometry {
        Geometry::new(Value::Point(vec![13.4, 52.5]))
    }

    #[test]
    fn encoded_locations_pass_through() {
        let loc = Location::Encoded("already-encoded".to_string());
        assert_eq!(loc.to_wire(None).unwrap(), "already-encoded");
    }

    #[test]
    fn structured_geometry_is_codec_encoded_then_base64d() {
        let loc = Location::Geometry(point());
        let wire = loc.to_wire(Some(&JsonBytesCodec)).unwrap();

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(wire)
            .unwrap();
        let geojson: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(geojson["type"], "Point");
    }

    #[test]
    fn structured_geometry_without_codec_is_an_error() {
        let loc = Location::Geometry(point());
        let err = loc.to_wire(None).unwrap_err();
        assert!(matches!(err, ClientError::Geometry(_)));
    }
}
