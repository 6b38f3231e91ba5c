use cbc_weather::{merge_prefill, CbcWeather, CbcWeatherError, LatLon, ReportField, ReportForm};
use chrono::NaiveDate;

#[tokio::main]
async fn main() -> Result<(), CbcWeatherError> {
    let weather = CbcWeather::new()?;
    let Some(station) = weather
        .find_station()
        .center(LatLon(38.0689, -122.8069))
        .call()
        .await?
    else {
        println!("No observing station nearby");
        return Ok(());
    };
    println!("Using {}", station.describe());

    let Some(date) = NaiveDate::from_ymd_opt(2024, 12, 21) else {
        return Ok(());
    };
    let reconstruction = weather
        .count_day_observations()
        .station(&station)
        .date(date)
        .call()
        .await?;
    println!("{} reports fell on the count day", reconstruction.used_count);

    let mut form = ReportForm::default();
    form.set(ReportField::TempMinF, "41");
    let form = merge_prefill(&form, reconstruction.patch.as_ref());
    for field in ReportField::ALL {
        println!("{:>14}: {}", field.name(), form.get(field));
    }
    Ok(())
}
