pub mod co2mini;
pub mod influx;
pub mod lineprotocol;
