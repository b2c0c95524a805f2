//! Central Oxford attractions for realistic test fixtures.
//!
//! Coordinates are approximate OpenStreetMap positions. Popularity is on a
//! 0-100 scale, price is the entry fee in GBP.

use trip_planner::model::{Attraction, GeoPoint};

/// A named attraction with coordinates, popularity and price.
#[derive(Debug, Clone)]
pub struct Poi {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub popularity: f64,
    pub price: f64,
}

impl Poi {
    pub const fn new(name: &'static str, lat: f64, lng: f64, popularity: f64, price: f64) -> Self {
        Self {
            name,
            lat,
            lng,
            popularity,
            price,
        }
    }

    pub fn id(&self) -> String {
        trip_planner::catalog::slugify(self.name)
    }

    pub fn to_attraction(&self) -> Attraction {
        Attraction::new(self.id(), self.name, GeoPoint::new(self.lat, self.lng))
            .with_popularity(self.popularity)
            .with_price(self.price)
    }
}

// ============================================================================
// City centre (all within walking distance of Carfax)
// ============================================================================

pub const CITY_CENTRE: &[Poi] = &[
    Poi::new("Bodleian Library", 51.7540, -1.2544, 92.0, 0.0),
    Poi::new("Radcliffe Camera", 51.7536, -1.2540, 88.0, 0.0),
    Poi::new("Christ Church College", 51.7500, -1.2568, 85.0, 8.0),
    Poi::new("Ashmolean Museum", 51.7555, -1.2610, 80.0, 0.0),
    Poi::new("University Church", 51.7527, -1.2536, 60.0, 0.0),
    Poi::new("Carfax Tower", 51.7517, -1.2578, 55.0, 3.0),
    Poi::new("Covered Market", 51.7521, -1.2560, 65.0, 0.0),
    Poi::new("Pitt Rivers Museum", 51.7586, -1.2553, 72.0, 0.0),
    Poi::new("Oxford Castle", 51.7510, -1.2625, 70.0, 12.0),
    Poi::new("Botanic Garden", 51.7507, -1.2482, 58.0, 6.0),
    Poi::new("Bridge of Sighs", 51.7540, -1.2530, 75.0, 0.0),
    Poi::new("Sheldonian Theatre", 51.7545, -1.2548, 62.0, 5.0),
    Poi::new("Museum of Natural History", 51.7585, -1.2555, 68.0, 0.0),
    Poi::new("St Mary the Virgin", 51.7528, -1.2538, 45.0, 5.0),
    Poi::new("Magdalen College", 51.7518, -1.2462, 50.0, 7.0),
    Poi::new("New College", 51.7535, -1.2510, 48.0, 5.0),
    Poi::new("Tom Tower", 51.7502, -1.2570, 42.0, 0.0),
];

// ============================================================================
// Outskirts (a bus ride or long walk from the centre)
// ============================================================================

pub const OUTSKIRTS: &[Poi] = &[
    Poi::new("Port Meadow", 51.7680, -1.2770, 35.0, 0.0),
    Poi::new("Iffley Lock", 51.7360, -1.2340, 20.0, 0.0),
    Poi::new("Headington Shark", 51.7580, -1.2110, 25.0, 0.0),
];

/// Start/end points for day trips.
pub const OXFORD_STATION: GeoPoint = GeoPoint::new(51.7535, -1.2700);
pub const CARFAX: GeoPoint = GeoPoint::new(51.7520, -1.2577);
pub const CHRIST_CHURCH: GeoPoint = GeoPoint::new(51.7500, -1.2568);

pub fn all_pois() -> impl Iterator<Item = &'static Poi> {
    CITY_CENTRE.iter().chain(OUTSKIRTS.iter())
}

pub fn all_attractions() -> Vec<Attraction> {
    all_pois().map(Poi::to_attraction).collect()
}

/// The same data as a catalog CSV, with prices rendered as the loader expects.
pub fn catalog_csv() -> String {
    let mut csv = String::from("attraction,lat,lng,popularity,price_range\n");
    for poi in all_pois() {
        let price = if poi.price == 0.0 {
            "free".to_string()
        } else {
            format!("{}", poi.price)
        };
        csv.push_str(&format!("{},{},{},{},{}\n", poi.name, poi.lat, poi.lng, poi.popularity, price));
    }
    csv
}
