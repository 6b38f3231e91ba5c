use crate::circles::error::CircleIndexError;
use crate::circles::record::CircleFeatureCollection;
use crate::types::circle::Circle;
use crate::types::geo::{BoundingBox, LatLon};
use crate::utils::write_atomically;
use async_compression::tokio::bufread::GzipDecoder;
use bincode::config::{Configuration, Fixint, LittleEndian};
use futures_util::TryStreamExt;
use log::info;
use ordered_float::OrderedFloat;
use reqwest::Client;
use rstar::{PointDistance, RTree};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio_util::io::StreamReader;

const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const MAX_SEARCH_RESULTS: usize = 10;
const MIN_NEEDLE_CHARS: usize = 2;
/// Added to scores of abbreviation matches so name matches rank first.
const ABBREV_PENALTY: f64 = 2000.0;

/// Session-wide index of count circles, supporting text search and point lookup.
#[derive(Debug, Clone)]
pub struct CircleIndex {
    rtree: RTree<Circle>,
    max_buffer_miles: f64,
}

impl CircleIndex {
    pub fn new(circles: Vec<Circle>) -> Self {
        let max_buffer_miles = circles
            .iter()
            .map(|c| c.buffer_miles)
            .fold(0.0, f64::max);
        Self {
            rtree: RTree::bulk_load(circles),
            max_buffer_miles,
        }
    }

    /// Builds the index from a GeoJSON feature collection.
    pub fn from_geojson(bytes: &[u8]) -> Result<Self, CircleIndexError> {
        let collection: CircleFeatureCollection = serde_json::from_slice(bytes)?;
        Ok(Self::new(collection.into_circles()))
    }

    /// Loads a GeoJSON dataset from disk; gzip-compressed files are detected by
    /// their magic bytes.
    pub async fn load_file(path: &Path) -> Result<Self, CircleIndexError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CircleIndexError::DatasetRead(path.to_path_buf(), e))?;
        let json = if bytes.starts_with(&GZIP_MAGIC) {
            read_gzip(bytes.as_slice()).await?
        } else {
            bytes
        };
        let index = tokio::task::spawn_blocking(move || Self::from_geojson(&json)).await??;
        info!("Loaded {} circles from {}", index.len(), path.display());
        Ok(index)
    }

    /// Loads a GeoJSON dataset from `url`, keeping a binary snapshot in
    /// `cache_dir` that later loads read instead of the network.
    pub async fn load_url(url: &str, cache_dir: &Path) -> Result<Self, CircleIndexError> {
        let cache_file = cache_dir.join(cache_file_name(url));
        let circles = if cache_file.exists() {
            let path_clone = cache_file.clone();
            tokio::task::spawn_blocking(move || Self::read_cache(&path_clone)).await??
        } else {
            info!("Circle cache not found. Fetching from URL: {}", url);
            let circles = Self::fetch_circles(url).await?;
            Self::write_cache(circles.clone(), &cache_file).await?;
            circles
        };
        Ok(Self::new(circles))
    }

    fn read_cache(cache_path: &Path) -> Result<Vec<Circle>, CircleIndexError> {
        let bytes = std::fs::read(cache_path)
            .map_err(|e| CircleIndexError::CacheRead(cache_path.to_path_buf(), e))?;
        let (circles, _) = bincode::serde::decode_from_slice::<Vec<Circle>, _>(&bytes, BINCODE_CONFIG)
            .map_err(|e| CircleIndexError::CacheDecode(cache_path.to_path_buf(), Box::new(e)))?;
        Ok(circles)
    }

    async fn fetch_circles(url: &str) -> Result<Vec<Circle>, CircleIndexError> {
        let response = Client::new()
            .get(url)
            .send()
            .await
            .map_err(|e| CircleIndexError::NetworkRequest(url.to_string(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match e.status() {
                    Some(status) => CircleIndexError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    },
                    None => CircleIndexError::NetworkRequest(url.to_string(), e),
                });
            }
        };
        let stream = response.bytes_stream().map_err(io::Error::other);
        let mut reader = BufReader::new(StreamReader::new(stream));
        let json = if url.ends_with(".gz") {
            read_gzip(reader).await?
        } else {
            let mut body = Vec::new();
            reader.read_to_end(&mut body).await?;
            body
        };
        let circles = tokio::task::spawn_blocking(move || {
            serde_json::from_slice::<CircleFeatureCollection>(&json)
                .map(CircleFeatureCollection::into_circles)
                .map_err(CircleIndexError::from)
        })
        .await??;
        info!("Parsed {} circles from {}", circles.len(), url);
        Ok(circles)
    }

    async fn write_cache(circles: Vec<Circle>, cache_path: &Path) -> Result<(), CircleIndexError> {
        let cache_path = cache_path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let data = bincode::serde::encode_to_vec(circles, BINCODE_CONFIG)
                .map_err(|e| CircleIndexError::CacheEncode(Box::new(e)))?;
            write_atomically(&cache_path, &data)
                .map_err(|e| CircleIndexError::CacheWrite(cache_path.clone(), e))?;
            info!("Wrote circle cache ({} bytes) to {}", data.len(), cache_path.display());
            Ok(())
        })
        .await?
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Circle> {
        self.rtree.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Circle> {
        self.iter().find(|c| c.id == id)
    }

    /// Ranked text search over circle names and abbreviations.
    ///
    /// Matching ignores case and punctuation. A match at the start scores best,
    /// then a match anywhere, then a match at the start of a later word. Name
    /// matches outrank abbreviation matches and shorter names break near-ties.
    /// Needles with fewer than two alphanumeric characters match nothing.
    pub fn search(&self, query: &str) -> Vec<&Circle> {
        let needle = normalize_for_search(query);
        if needle.chars().count() < MIN_NEEDLE_CHARS {
            return Vec::new();
        }
        let mut scored: Vec<(OrderedFloat<f64>, &Circle)> = self
            .iter()
            .filter_map(|circle| {
                let name_score = match_score(&circle.name, &needle);
                let abbrev_score = match_score(&circle.abbrev, &needle).map(|s| s + ABBREV_PENALTY);
                let best = [name_score, abbrev_score]
                    .into_iter()
                    .flatten()
                    .min_by_key(|s| OrderedFloat(*s))?;
                let length_bias = (circle.name.chars().count() as f64 / 10.0).min(25.0);
                Some((OrderedFloat(best + length_bias), circle))
            })
            .collect();
        scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
        scored
            .into_iter()
            .take(MAX_SEARCH_RESULTS)
            .map(|(_, circle)| circle)
            .collect()
    }

    /// Circles whose buffer contains `point`, nearest centre first.
    pub fn containing(&self, point: LatLon) -> Vec<&Circle> {
        let Some(bbox) = BoundingBox::around(point, self.max_buffer_miles * 1.05) else {
            return Vec::new();
        };
        // No circle reaching the point has its centre outside this box, so the
        // degree-space walk can stop at the box's half-diagonal.
        let reach_2 = (bbox.max_lat - point.0).powi(2) + (bbox.max_lon - point.1).powi(2);
        let query = [point.0, point.1];
        let mut hits: Vec<(OrderedFloat<f64>, &Circle)> = self
            .rtree
            .nearest_neighbor_iter(&query)
            .take_while(|circle| circle.distance_2(&query) <= reach_2)
            .filter_map(|circle| {
                let miles = circle.distance_miles(point)?;
                (miles <= circle.buffer_miles).then_some((OrderedFloat(miles), circle))
            })
            .collect();
        hits.sort_by_key(|(miles, _)| *miles);
        hits.into_iter().map(|(_, circle)| circle).collect()
    }

    /// The circle with the centre closest to `point`.
    pub fn nearest(&self, point: LatLon) -> Option<&Circle> {
        self.rtree.nearest_neighbor(&[point.0, point.1])
    }
}

async fn read_gzip<R: AsyncRead + tokio::io::AsyncBufRead + Unpin>(
    reader: R,
) -> Result<Vec<u8>, CircleIndexError> {
    let mut decoder = GzipDecoder::new(reader);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed).await?;
    Ok(decompressed)
}

/// Cache file for a dataset URL, named after its last path segment.
fn cache_file_name(url: &str) -> PathBuf {
    let stem = url
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .map(|segment| segment.split('.').next().unwrap_or(segment))
        .filter(|stem| !stem.is_empty())
        .unwrap_or("circles");
    let safe: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    PathBuf::from(format!("{safe}.bin"))
}

/// Lowercase ASCII alphanumerics only.
fn normalize_for_search(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn match_score(haystack: &str, needle: &str) -> Option<f64> {
    let hay = normalize_for_search(haystack);
    if hay.is_empty() {
        return None;
    }
    if hay.starts_with(needle) {
        return Some(0.0);
    }
    if let Some(idx) = hay.find(needle) {
        return Some(50.0 + idx as f64);
    }
    let lower = haystack.to_ascii_lowercase();
    lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .position(|word| word.starts_with(needle))
        .map(|pos| 120.0 + pos as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::circle::DEFAULT_BUFFER_MILES;
    use async_compression::tokio::write::GzipEncoder;
    use tokio::io::AsyncWriteExt;

    fn circle(name: &str, abbrev: &str, center: LatLon, buffer_miles: f64) -> Circle {
        Circle {
            id: format!("{abbrev}:{},{}", center.0, center.1),
            name: name.to_string(),
            abbrev: abbrev.to_string(),
            center,
            buffer_miles,
            count_date: None,
        }
    }

    fn index() -> CircleIndex {
        CircleIndex::new(vec![
            circle("Point Reyes Peninsula", "CAPR", LatLon(38.07, -122.88), DEFAULT_BUFFER_MILES),
            circle("Oakland", "CAOA", LatLon(37.8, -122.2), DEFAULT_BUFFER_MILES),
            circle("San Francisco", "CASF", LatLon(37.75, -122.45), DEFAULT_BUFFER_MILES),
            circle("South Reyes", "CASR", LatLon(37.9, -122.7), 12.0),
            circle("Caspar", "CACP", LatLon(39.36, -123.8), DEFAULT_BUFFER_MILES),
        ])
    }

    const SAMPLE: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"Name": "Oakland", "Abbrev": "CAOA", "Latitude": 37.8, "Longitude": -122.2, "Count_Date": "12/15/24"}},
        {"type": "Feature", "properties": {"Name": "San Francisco", "Abbrev": "CASF", "Latitude": 37.75, "Longitude": -122.45}}
    ]}"#;

    fn names(circles: &[&Circle]) -> Vec<String> {
        circles.iter().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn test_search_ranks_prefix_then_substring_then_word() {
        let idx = index();
        assert_eq!(names(&idx.search("oak")), ["Oakland"]);
        assert_eq!(
            names(&idx.search("reyes")),
            ["South Reyes", "Point Reyes Peninsula"]
        );
        assert!(idx.search("o").is_empty());
        assert!(idx.search("--").is_empty());
    }

    #[test]
    fn test_search_prefers_names_over_abbreviations() {
        let idx = index();
        // "Caspar" matches by name; the others only through their "CA" abbreviation.
        let hits = idx.search("cas");
        assert_eq!(hits[0].name, "Caspar");
        assert_eq!(hits.len(), 3);
        assert_eq!(idx.search("CAPR")[0].name, "Point Reyes Peninsula");
    }

    #[test]
    fn test_containing_nearest_first() {
        let idx = index();
        let point = LatLon(38.0, -122.8);
        let hits = idx.containing(point);
        assert_eq!(names(&hits), ["Point Reyes Peninsula", "South Reyes"]);
        assert!(idx.containing(LatLon(0.0, 0.0)).is_empty());
        assert_eq!(idx.nearest(LatLon(37.81, -122.21)).unwrap().abbrev, "CAOA");
    }

    #[test]
    fn test_from_geojson() {
        let idx = CircleIndex::from_geojson(SAMPLE.as_bytes()).unwrap();
        assert_eq!(idx.len(), 2);
        let oakland = idx.get("CAOA:37.8,-122.2").unwrap();
        assert_eq!(oakland.count_date_iso().as_deref(), Some("2024-12-15"));
    }

    #[tokio::test]
    async fn test_load_gzip_file() {
        let mut encoder = GzipEncoder::new(Vec::new());
        encoder.write_all(SAMPLE.as_bytes()).await.unwrap();
        encoder.shutdown().await.unwrap();
        let compressed = encoder.into_inner();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circles.geojson.gz");
        std::fs::write(&path, compressed).unwrap();
        let idx = CircleIndex::load_file(&path).await.unwrap();
        assert_eq!(idx.len(), 2);
    }

    #[tokio::test]
    async fn test_load_url_prefers_cache() {
        let dir = tempfile::tempdir().unwrap();
        let url = "http://127.0.0.1:9/data/cbc_circles_merged.geojson";
        let circles = index().iter().cloned().collect::<Vec<_>>();
        CircleIndex::write_cache(circles, &dir.path().join(cache_file_name(url)))
            .await
            .unwrap();
        // The URL is unreachable; only the cache can satisfy this.
        let idx = CircleIndex::load_url(url, dir.path()).await.unwrap();
        assert_eq!(idx.len(), 5);
        assert!(idx.get("CAPR:38.07,-122.88").is_some());
    }

    #[test]
    fn test_cache_file_name() {
        assert_eq!(
            cache_file_name("https://x.org/data/cbc_circles_merged.geojson?v=1"),
            PathBuf::from("cbc_circles_merged.bin")
        );
        assert_eq!(cache_file_name("https://x.org/"), PathBuf::from("circles.bin"));
    }
}
