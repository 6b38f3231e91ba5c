use cbc_weather::{CbcWeather, CbcWeatherError, LatLon};
use std::env;
use std::path::PathBuf;

/// Usage: search_circles <circles.geojson[.gz]> [query]
#[tokio::main]
async fn main() -> Result<(), CbcWeatherError> {
    let mut args = env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: search_circles <circles.geojson[.gz]> [query]");
        return Ok(());
    };
    let query = args.next().unwrap_or_else(|| "point reyes".to_string());

    let weather = CbcWeather::new()?;
    let circles = weather.circles().path(path).call().await?;
    println!("Loaded {} circles", circles.len());

    for circle in circles.search(&query) {
        println!("{} (count date {:?})", circle.label(), circle.count_date_iso());
    }

    let here = LatLon(38.0, -122.8);
    for circle in circles.containing(here) {
        println!("{} covers {}", circle.label(), here);
    }
    Ok(())
}
