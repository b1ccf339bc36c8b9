//! Near-Earth object feed: upstream client, local proxy server and the
//! impact table page.

pub mod client;
pub mod error;
pub mod page;
pub mod proxy;
pub mod table;


pub use client::{
    CloseApproach, DiameterRange, EstimatedDiameter, NearEarthObject, NeoFeedClient,
    RelativeVelocity,
};
pub use error::{FeedError, FeedServerError};
pub use page::{ERROR_MESSAGE, HEADERS, LOADING_MESSAGE, PageState, impact_row, impact_table};
pub use proxy::FeedServer;
pub use table::ImpactTable;
