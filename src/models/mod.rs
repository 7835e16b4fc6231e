pub mod aspects;
pub mod body;
pub mod chart;
pub mod dignity;
pub mod reports;
pub mod zodiac;

pub use aspects::*;
pub use body::*;
pub use chart::*;
pub use dignity::*;
pub use reports::*;
pub use zodiac::*;
