pub mod nominatim;
pub mod osrm;
