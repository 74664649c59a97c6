//! Encoded polyline decoding.
//!
//! Directions responses carry each route's geometry as a Google-style encoded
//! polyline: every coordinate component is a zig-zag encoded delta split into
//! 5-bit groups, each group offset by 63 into printable ASCII, with `0x20`
//! marking "more groups follow".

use super::LatLng;

const COORDINATE_PRECISION: f64 = 1e5;
const ELEVATION_PRECISION: f64 = 1e2;
const CONTINUATION_BIT: i64 = 0x20;
const GROUP_MASK: i64 = 0x1f;
// Past 32 bits the encoder could not have produced the value.
const MAX_SHIFT: u32 = 30;

/// One decoded polyline vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedPoint {
    pub lat: f64,
    pub lng: f64,
    pub elevation: Option<f64>,
}

impl DecodedPoint {
    pub fn lat_lng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Decodes an encoded polyline, optionally with a third (elevation) component.
///
/// Never fails: the first malformed or truncated point ends the decode and
/// the points decoded up to that point are returned. An empty string decodes
/// to an empty sequence.
pub fn decode_polyline(encoded: &str, include_elevation: bool) -> Vec<DecodedPoint> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut points = Vec::new();
    let (mut lat, mut lng, mut ele) = (0i64, 0i64, 0i64);

    while index < bytes.len() {
        let Some(d_lat) = next_value(bytes, &mut index) else {
            break;
        };
        let Some(d_lng) = next_value(bytes, &mut index) else {
            break;
        };
        let d_ele = if include_elevation {
            match next_value(bytes, &mut index) {
                Some(v) => v,
                None => break,
            }
        } else {
            0
        };

        lat += d_lat;
        lng += d_lng;
        ele += d_ele;

        points.push(DecodedPoint {
            lat: lat as f64 / COORDINATE_PRECISION,
            lng: lng as f64 / COORDINATE_PRECISION,
            elevation: include_elevation.then(|| ele as f64 / ELEVATION_PRECISION),
        });
    }

    points
}

/// Convenience wrapper returning plain coordinates.
pub fn decode_coordinates(encoded: &str) -> Vec<LatLng> {
    decode_polyline(encoded, false)
        .iter()
        .map(DecodedPoint::lat_lng)
        .collect()
}

/// Reads one zig-zag encoded value, advancing `index`. `None` on truncated
/// input, a byte below the encoding offset, or an oversized value.
fn next_value(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes.get(*index)?;
        *index += 1;

        let group = i64::from(byte) - 63;
        if group < 0 || shift > MAX_SHIFT {
            return None;
        }
        result |= (group & GROUP_MASK) << shift;
        shift += 5;

        if group < CONTINUATION_BIT {
            break;
        }
    }

    Some(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &DecodedPoint, lat: f64, lng: f64) {
        assert!((actual.lat - lat).abs() < 1e-5, "lat {} != {}", actual.lat, lat);
        assert!((actual.lng - lng).abs() < 1e-5, "lng {} != {}", actual.lng, lng);
    }

    #[test]
    fn test_decodes_reference_polyline() {
        let points = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@", false);
        assert_eq!(points.len(), 3);
        assert_close(&points[0], 38.5, -120.2);
        assert_close(&points[1], 40.7, -120.95);
        assert_close(&points[2], 43.252, -126.453);
        assert!(points.iter().all(|p| p.elevation.is_none()));
    }

    #[test]
    fn test_empty_input_decodes_to_nothing() {
        assert!(decode_polyline("", false).is_empty());
        assert!(decode_polyline("", true).is_empty());
    }

    #[test]
    fn test_single_malformed_byte_does_not_panic() {
        // '!' sits below the encoding offset.
        assert!(decode_polyline("!", false).is_empty());
        // A lone continuation group is truncated.
        assert!(decode_polyline("_", false).is_empty());
    }

    #[test]
    fn test_malformed_tail_keeps_decoded_prefix() {
        let valid = decode_polyline("_p~iF~ps|U", false);
        assert_eq!(valid.len(), 1);

        let with_garbage = decode_polyline("_p~iF~ps|U!", false);
        assert!(with_garbage.len() <= valid.len());
        assert_close(&with_garbage[0], 38.5, -120.2);

        // Latitude present, longitude missing.
        let truncated = decode_polyline("_p~iF~ps|U_ulL", false);
        assert_eq!(truncated.len(), 1);
    }

    #[test]
    fn test_decodes_elevation_component() {
        // (38.5, -120.2, 10.0): elevation 1000 zig-zags to 2000, encoded "o}@".
        let points = decode_polyline("_p~iF~ps|Uo}@", true);
        assert_eq!(points.len(), 1);
        assert_close(&points[0], 38.5, -120.2);
        let elevation = points[0].elevation.expect("elevation requested");
        assert!((elevation - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_decode_coordinates_maps_to_lat_lng() {
        let coords = decode_coordinates("_p~iF~ps|U");
        assert_eq!(coords.len(), 1);
        assert!((coords[0].lat - 38.5).abs() < 1e-9);
    }
}
