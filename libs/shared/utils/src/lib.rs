pub mod clock;
pub mod extractor;
pub mod state;
pub mod test_utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use extractor::{AppJson, AppPath, AppQuery, CurrentUser};
pub use state::AppState;
