pub mod item;
pub mod result;
pub mod state;

pub use item::FetchItem;
pub use result::{BatchResult, FetchOutcome, FetchResult};
pub use state::ItemState;
