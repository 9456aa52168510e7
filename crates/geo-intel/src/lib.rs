pub mod distance;
pub mod lookup;
pub mod models;

pub use distance::{haversine_km, Coordinate};
pub use lookup::{country_from_ip, country_from_tld};
pub use models::{load_countries_from_file, load_ip_ranges, load_ip_ranges_from_file, Country, CountryDatabase, IPRange};
