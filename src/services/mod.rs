pub mod air_quality;
pub mod cities;
pub mod openaq;
pub mod selections;
