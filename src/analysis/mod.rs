pub mod aggregate;
pub mod preprocess;

pub use aggregate::{
    available_years, city_trends, country_averages, default_regions, hottest_country,
    regional_averages, regional_extreme, seasonal_trends,
};
pub use preprocess::{parse_city_lookup_csv, parse_temperature_csv, preprocess, write_cleaned_csv};
