use regex::Regex;
use std::sync::OnceLock;

use crate::{error::LocationError, units::UnitSystem};

/// Normalized location sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocationQuery {
    /// `q=<city>` or `q=<city>,<country>`
    City(String),
    /// `lat=..&lon=..`, kept as the strings produced while parsing.
    Coordinates { lat: String, lon: String },
}

impl LocationQuery {
    pub fn city(name: impl Into<String>) -> Self {
        Self::City(name.into())
    }

    pub fn coordinates(lat: f64, lon: f64) -> Self {
        Self::Coordinates {
            lat: lat.to_string(),
            lon: lon.to_string(),
        }
    }

    /// Provider query parameters for this location.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            LocationQuery::City(q) => vec![("q", q.clone())],
            LocationQuery::Coordinates { lat, lon } => {
                vec![("lat", lat.clone()), ("lon", lon.clone())]
            }
        }
    }

    /// The city string, if this is a name query.
    pub fn as_city(&self) -> Option<&str> {
        match self {
            LocationQuery::City(q) => Some(q),
            LocationQuery::Coordinates { .. } => None,
        }
    }

    /// Numeric coordinates, if this is a coordinate query that parses.
    pub fn as_coordinates(&self) -> Option<(f64, f64)> {
        match self {
            LocationQuery::City(_) => None,
            LocationQuery::Coordinates { lat, lon } => {
                Some((lat.parse().ok()?, lon.parse().ok()?))
            }
        }
    }

    /// Key for response caches kept by a presentation layer.
    pub fn cache_key(&self, units: UnitSystem, endpoint: &str) -> String {
        let location_part = match self {
            LocationQuery::City(q) => format!("q_{q}"),
            LocationQuery::Coordinates { lat, lon } => format!("coords_{lat}_{lon}"),
        };
        format!("{endpoint}_{location_part}_{units}")
    }
}

impl std::fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationQuery::City(q) => f.write_str(q),
            LocationQuery::Coordinates { lat, lon } => write!(f, "{lat},{lon}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopularCity {
    /// Korean display name.
    pub name: &'static str,
    /// Provider query, `"City,CC"`.
    pub query: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityGroup {
    pub region: &'static str,
    pub cities: &'static [PopularCity],
}

const fn city(name: &'static str, query: &'static str) -> PopularCity {
    PopularCity { name, query }
}

static POPULAR_CITIES: &[CityGroup] = &[
    CityGroup {
        region: "한국",
        cities: &[
            city("서울", "Seoul,KR"),
            city("부산", "Busan,KR"),
            city("대구", "Daegu,KR"),
            city("인천", "Incheon,KR"),
            city("광주", "Gwangju,KR"),
            city("대전", "Daejeon,KR"),
            city("울산", "Ulsan,KR"),
            city("제주", "Jeju,KR"),
        ],
    },
    CityGroup {
        region: "아시아",
        cities: &[
            city("도쿄", "Tokyo,JP"),
            city("베이징", "Beijing,CN"),
            city("상하이", "Shanghai,CN"),
            city("방콕", "Bangkok,TH"),
            city("싱가포르", "Singapore,SG"),
            city("홍콩", "Hong Kong,HK"),
            city("타이베이", "Taipei,TW"),
            city("자카르타", "Jakarta,ID"),
        ],
    },
    CityGroup {
        region: "유럽",
        cities: &[
            city("런던", "London,GB"),
            city("파리", "Paris,FR"),
            city("베를린", "Berlin,DE"),
            city("로마", "Rome,IT"),
            city("마드리드", "Madrid,ES"),
            city("암스테르담", "Amsterdam,NL"),
            city("취리히", "Zurich,CH"),
            city("스톡홀름", "Stockholm,SE"),
        ],
    },
    CityGroup {
        region: "아메리카",
        cities: &[
            city("뉴욕", "New York,US"),
            city("로스앤젤레스", "Los Angeles,US"),
            city("토론토", "Toronto,CA"),
            city("멕시코시티", "Mexico City,MX"),
            city("상파울루", "São Paulo,BR"),
            city("부에노스아이레스", "Buenos Aires,AR"),
            city("시카고", "Chicago,US"),
            city("마이애미", "Miami,US"),
        ],
    },
];

/// Quick-pick city groups. Their entries also form the Korean name lookup table.
pub fn popular_cities() -> &'static [CityGroup] {
    POPULAR_CITIES
}

fn korean_city_table() -> impl Iterator<Item = &'static PopularCity> {
    POPULAR_CITIES.iter().flat_map(|group| group.cities.iter())
}

/// Translate a Korean city name to its provider query.
///
/// Exact matches win; otherwise the first table entry (in table order) whose key
/// contains the input, or is contained in it, is used. Unknown input is returned unchanged.
pub fn translate_korean_city(input: &str) -> String {
    let input = input.trim();

    if let Some(hit) = korean_city_table().find(|c| c.name == input) {
        return hit.query.to_string();
    }

    if input.is_empty() {
        return String::new();
    }

    korean_city_table()
        .find(|c| c.name.contains(input) || input.contains(c.name))
        .map(|c| c.query.to_string())
        .unwrap_or_else(|| input.to_string())
}

/// Table entries whose Korean name contains `fragment`, or whose query contains it
/// case-insensitively. Results keep table order.
pub fn search_korean_cities(fragment: &str) -> Vec<PopularCity> {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return Vec::new();
    }

    let lower = fragment.to_lowercase();
    korean_city_table()
        .filter(|c| c.name.contains(fragment) || c.query.to_lowercase().contains(&lower))
        .copied()
        .collect()
}

fn coordinate_pattern() -> &'static Regex {
    static RE_COORDS: OnceLock<Regex> = OnceLock::new();
    RE_COORDS.get_or_init(|| {
        Regex::new(r"^-?[0-9]+\.?[0-9]*,-?[0-9]+\.?[0-9]*$").expect("coordinate pattern is valid")
    })
}

/// Parse free-text input into a [`LocationQuery`].
///
/// Accepts a city name, `"City,Country"`, a Korean city name, or `"lat,lon"`.
pub fn parse_location_input(input: &str) -> Result<LocationQuery, LocationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(LocationError::Empty);
    }

    // Table lookup comes first; a hit is never parsed as coordinates.
    let translated = translate_korean_city(input);
    if translated != input {
        return Ok(LocationQuery::City(translated));
    }

    if coordinate_pattern().is_match(input) {
        let (lat_str, lon_str) = input
            .split_once(',')
            .ok_or_else(|| LocationError::MalformedCoordinates(input.to_string()))?;

        let lat: f64 = lat_str
            .parse()
            .map_err(|_| LocationError::MalformedCoordinates(input.to_string()))?;
        let lon: f64 = lon_str
            .parse()
            .map_err(|_| LocationError::MalformedCoordinates(input.to_string()))?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(LocationError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(LocationError::LongitudeOutOfRange(lon));
        }

        return Ok(LocationQuery::coordinates(lat, lon));
    }

    Ok(LocationQuery::City(input.to_string()))
}
