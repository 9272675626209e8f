mod client;

pub use client::OpenWeatherClient;
