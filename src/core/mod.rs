pub mod booking;
pub mod countdown;
pub mod form;
pub mod monitor;
pub mod parser;
pub mod resolver;

pub use crate::domain::model::{AvailabilityMap, BookingReceipt, BookingTarget, DesiredSlot};
pub use crate::domain::ports::{
    BrowserLauncher, BrowserSession, CountdownObserver, FetchedPage, PageSource,
};
pub use crate::utils::error::Result;
