pub mod chrome;

pub use chrome::{ChromeParseError, parse_chrome_trace};
