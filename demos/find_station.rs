use cbc_weather::{CbcWeather, CbcWeatherError, LatLon};

#[tokio::main]
async fn main() -> Result<(), CbcWeatherError> {
    let weather = CbcWeather::new()?;
    let point_reyes = LatLon(38.0689, -122.8069);

    match weather.find_station().center(point_reyes).call().await? {
        Some(station) => println!("Nearest observing station: {}", station.describe()),
        None => println!("No observing station within {} mi", weather.config().station_radius_miles),
    }

    let wider = weather
        .find_station()
        .center(point_reyes)
        .radius_miles(40.0)
        .call()
        .await?;
    dbg!(wider);
    Ok(())
}
