mod exchange;
mod instrument;
mod daily_bar;
mod intraday_bar;
mod interval;
mod analytics;
pub mod timestamp_format;

pub use exchange::{Exchange, CreateExchange};
pub use instrument::{Instrument, CreateInstrument, PLACEHOLDER_KIND};
pub use daily_bar::{DailyBar, DailyBarSample, NewDailyBar};
pub use intraday_bar::{IntradayBar, IntradayBarSample, NewIntradayBar};
pub use interval::IntradayInterval;
pub use analytics::{MovingAverage, RefreshSummary};
