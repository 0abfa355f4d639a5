//! Geometry value objects used by the `geo` filter of a query document.
//!
//! Only enough validation is performed to keep malformed requests from reaching
//! the service: coordinate bounds, bounding box ordering, and linear ring shape.
//! No self-intersection checks are made.

use geojson::GeoJson;
use serde_json::{json, Value};

use crate::error::{Result, ValidationError};

pub const LONGITUDE_MIN: f64 = -180.0;
pub const LONGITUDE_MAX: f64 = 180.0;
pub const LATITUDE_MIN: f64 = -90.0;
pub const LATITUDE_MAX: f64 = 90.0;

/// Minimum number of vertices in a closed linear ring
pub const MIN_VERTICES: usize = 4;

const BBOX_LENGTH: usize = 4;

/// A single vertex, always within the open longitude/latitude ranges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    lon: f64,
    lat: f64,
}

impl Point {
    /// Create a point, checking `-180 < lon < 180` and `-90 < lat < 90`
    pub fn new(lon: f64, lat: f64) -> Result<Self> {
        let point = Self { lon, lat };
        point.validate()?;
        Ok(point)
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn validate(&self) -> Result<()> {
        // Written as negated ranges so NaN is rejected too
        if !(LONGITUDE_MIN < self.lon && self.lon < LONGITUDE_MAX) {
            return Err(ValidationError::LongitudeOutOfBounds { value: self.lon });
        }
        if !(LATITUDE_MIN < self.lat && self.lat < LATITUDE_MAX) {
            return Err(ValidationError::LatitudeOutOfBounds { value: self.lat });
        }
        Ok(())
    }

    /// Canonical `(lon, lat)` form
    pub fn build(&self) -> (f64, f64) {
        (self.lon, self.lat)
    }
}

/// Order of the two values in a raw coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateOrder {
    /// `(longitude, latitude)`, as GeoJSON specifies
    #[default]
    LonLat,
    /// `(latitude, longitude)`
    LatLon,
}

impl CoordinateOrder {
    fn point(&self, pair: [f64; 2]) -> Result<Point> {
        match self {
            CoordinateOrder::LonLat => Point::new(pair[0], pair[1]),
            CoordinateOrder::LatLon => Point::new(pair[1], pair[0]),
        }
    }
}

/// A 2D bounding box as defined in GeoJSON (RFC 7946 section 5)
///
/// `BoundingBox::default()` is the undefined box; it fails `validate` and
/// `build` with [`ValidationError::BBoxUndefined`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    bounds: Option<[f64; 4]>,
}

impl BoundingBox {
    /// Create a bounding box from its corners
    pub fn from_corners(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self> {
        let bbox = Self {
            bounds: Some([min_lon, min_lat, max_lon, max_lat]),
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Create a bounding box from `[min_lon, min_lat, max_lon, max_lat]`
    pub fn from_slice(bounds: &[f64]) -> Result<Self> {
        let [min_lon, min_lat, max_lon, max_lat] = <[f64; BBOX_LENGTH]>::try_from(bounds)
            .map_err(|_| ValidationError::BBoxLength { found: bounds.len() })?;
        Self::from_corners(min_lon, min_lat, max_lon, max_lat)
    }

    /// `[min_lon, min_lat, max_lon, max_lat]`, or `None` while undefined
    pub fn bounds(&self) -> Option<[f64; 4]> {
        self.bounds
    }

    pub fn is_defined(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        let [min_lon, min_lat, max_lon, max_lat] =
            self.bounds.ok_or(ValidationError::BBoxUndefined)?;

        Point::new(min_lon, min_lat)?;
        Point::new(max_lon, max_lat)?;

        if min_lon >= max_lon {
            return Err(ValidationError::BBoxLongitudeMismatch { min_lon, max_lon });
        }
        if min_lat >= max_lat {
            return Err(ValidationError::BBoxLatitudeMismatch { min_lat, max_lat });
        }

        Ok(())
    }

    /// `{"type": "BoundingBox", "bounds": [min_lon, min_lat, max_lon, max_lat]}`
    pub fn build(&self) -> Result<Value> {
        self.validate()?;
        let bounds = self.bounds.ok_or(ValidationError::BBoxUndefined)?;
        Ok(json!({
            "type": "BoundingBox",
            "bounds": bounds,
        }))
    }
}

/// A 2D polygon made of a single closed linear ring
///
/// Multi-polygons and polygons with holes are not supported.
/// `Polygon::default()` is the undefined polygon.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    ring: Option<Vec<Point>>,
}

impl Polygon {
    /// Create a polygon from raw coordinate pairs
    pub fn from_raw_coords(coordinates: &[[f64; 2]], order: CoordinateOrder) -> Result<Self> {
        let ring = coordinates
            .iter()
            .map(|pair| order.point(*pair))
            .collect::<Result<Vec<_>>>()?;

        Self::from_ring(ring)
    }

    /// Create a polygon from points
    ///
    /// With [`CoordinateOrder::LatLon`] each point was built as `(lat, lon)` and is
    /// swapped back, which re-checks its bounds.
    pub fn from_points(points: Vec<Point>, order: CoordinateOrder) -> Result<Self> {
        let ring = match order {
            CoordinateOrder::LonLat => points,
            CoordinateOrder::LatLon => points
                .into_iter()
                .map(|point| Point::new(point.lat(), point.lon()))
                .collect::<Result<Vec<_>>>()?,
        };

        Self::from_ring(ring)
    }

    /// Create a polygon from a GeoJSON `Polygon` geometry object
    pub fn from_geojson(value: &Value) -> Result<Self> {
        let geojson = GeoJson::from_json_value(value.clone())
            .map_err(|e| ValidationError::InvalidGeoJson { reason: e.to_string() })?;

        Self::from_parsed_geojson(&geojson)
    }

    /// Create a polygon from GeoJSON text
    pub fn from_geojson_str(text: &str) -> Result<Self> {
        let geojson: GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| ValidationError::InvalidGeoJson { reason: e.to_string() })?;

        Self::from_parsed_geojson(&geojson)
    }

    fn from_parsed_geojson(geojson: &GeoJson) -> Result<Self> {
        let geometry = match geojson {
            GeoJson::Geometry(geometry) => geometry,
            GeoJson::Feature(_) => {
                return Err(ValidationError::GeoJsonNotPolygon { found: "Feature".to_string() })
            }
            GeoJson::FeatureCollection(_) => {
                return Err(ValidationError::GeoJsonNotPolygon {
                    found: "FeatureCollection".to_string(),
                })
            }
        };

        let rings = match &geometry.value {
            geojson::Value::Polygon(rings) => rings,
            other => {
                return Err(ValidationError::GeoJsonNotPolygon {
                    found: geometry_type_name(other).to_string(),
                })
            }
        };

        let exterior = match rings.as_slice() {
            [] => return Err(ValidationError::LinearRing { found: 0 }),
            [exterior] => exterior,
            _ => {
                return Err(ValidationError::InvalidGeoJson {
                    reason: format!(
                        "polygons with interior rings are not supported, found {} rings",
                        rings.len()
                    ),
                })
            }
        };

        let ring = exterior
            .iter()
            .map(|position| {
                if position.len() < 2 {
                    return Err(ValidationError::InvalidGeoJson {
                        reason: format!("position with {} values", position.len()),
                    });
                }
                Point::new(position[0], position[1])
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_ring(ring)
    }

    fn from_ring(ring: Vec<Point>) -> Result<Self> {
        let polygon = Self { ring: Some(ring) };
        polygon.validate()?;
        Ok(polygon)
    }

    /// Vertices of the ring; empty while undefined
    pub fn points(&self) -> &[Point] {
        self.ring.as_deref().unwrap_or_default()
    }

    pub fn is_defined(&self) -> bool {
        self.ring.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        let ring = self.ring.as_ref().ok_or(ValidationError::PolygonUndefined)?;

        if ring.len() < MIN_VERTICES {
            return Err(ValidationError::LinearRing { found: ring.len() });
        }

        for point in ring {
            point.validate()?;
        }

        let (first, last) = (ring[0], ring[ring.len() - 1]);
        if first != last {
            return Err(ValidationError::PolygonNotClosed {
                first: first.build(),
                last: last.build(),
            });
        }

        Ok(())
    }

    /// `{"type": "Polygon", "coordinates": [[lon, lat], ...]}`
    pub fn build(&self) -> Result<Value> {
        self.validate()?;
        let coordinates: Vec<(f64, f64)> = self.points().iter().map(Point::build).collect();
        Ok(json!({
            "type": "Polygon",
            "coordinates": coordinates,
        }))
    }
}

fn geometry_type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Spatial bound of a query
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Polygon),
    BoundingBox(BoundingBox),
}

impl Geometry {
    pub fn validate(&self) -> Result<()> {
        match self {
            Geometry::Polygon(polygon) => polygon.validate(),
            Geometry::BoundingBox(bbox) => bbox.validate(),
        }
    }

    pub fn build(&self) -> Result<Value> {
        match self {
            Geometry::Polygon(polygon) => polygon.build(),
            Geometry::BoundingBox(bbox) => bbox.build(),
        }
    }
}

impl From<Polygon> for Geometry {
    fn from(polygon: Polygon) -> Self {
        Geometry::Polygon(polygon)
    }
}

impl From<BoundingBox> for Geometry {
    fn from(bbox: BoundingBox) -> Self {
        Geometry::BoundingBox(bbox)
    }
}
