pub mod air_quality;
pub mod cities;
pub mod health;
pub mod selections;
