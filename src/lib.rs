pub mod config;
pub mod http;

pub use crate::config::{ClientSettings, load_settings};
pub use crate::http::{
    ClientError, Dataset, GeometryCodec, HinatureDbClient, Location, Record, RecordQuery,
    RecordUpdate, RetryPolicy, SearchPage,
};
